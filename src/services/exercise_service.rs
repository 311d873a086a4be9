use sqlx::PgPool;
use std::collections::HashSet;

use crate::error::{AppError, Result};
use crate::models::{Exercise, ExerciseRequest};

#[derive(Clone)]
pub struct ExerciseService {
    db: PgPool,
}

impl ExerciseService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_exercises(&self) -> Result<Vec<Exercise>> {
        let exercises = sqlx::query_as::<_, Exercise>(
            "SELECT id, name, description, difficulty, main_muscle, repetitions
             FROM exercises ORDER BY name, id",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(exercises)
    }

    pub async fn get_exercise(&self, exercise_id: i64) -> Result<Exercise> {
        sqlx::query_as::<_, Exercise>(
            "SELECT id, name, description, difficulty, main_muscle, repetitions
             FROM exercises WHERE id = $1",
        )
        .bind(exercise_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Exercise", exercise_id))
    }

    pub async fn create_exercise(&self, request: ExerciseRequest) -> Result<Exercise> {
        let exercise = sqlx::query_as::<_, Exercise>(
            "INSERT INTO exercises (name, description, difficulty, main_muscle, repetitions)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, name, description, difficulty, main_muscle, repetitions",
        )
        .bind(request.name.trim())
        .bind(request.description.trim())
        .bind(request.difficulty.trim())
        .bind(request.main_muscle.trim())
        .bind(request.repetitions)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(exercise_id = exercise.id, "Created exercise");
        Ok(exercise)
    }

    pub async fn update_exercise(&self, exercise_id: i64, request: ExerciseRequest) -> Result<Exercise> {
        let exercise = sqlx::query_as::<_, Exercise>(
            "UPDATE exercises
             SET name = $2, description = $3, difficulty = $4, main_muscle = $5, repetitions = $6
             WHERE id = $1
             RETURNING id, name, description, difficulty, main_muscle, repetitions",
        )
        .bind(exercise_id)
        .bind(request.name.trim())
        .bind(request.description.trim())
        .bind(request.difficulty.trim())
        .bind(request.main_muscle.trim())
        .bind(request.repetitions)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Exercise", exercise_id))?;

        tracing::info!(exercise_id, "Updated exercise");
        Ok(exercise)
    }

    /// Exercises still used by a routine cannot be deleted.
    pub async fn delete_exercise(&self, exercise_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM exercises WHERE id = $1")
            .bind(exercise_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Exercise", exercise_id));
        }

        tracing::info!(exercise_id, "Deleted exercise");
        Ok(())
    }

    /// Which of `ids` name an existing exercise.
    pub async fn existing_ids(&self, ids: &[i64]) -> Result<HashSet<i64>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM exercises WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.db)
            .await?;

        Ok(found.into_iter().collect())
    }
}
