use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::auth::UserSession;
use crate::error::{AppError, Result};
use crate::models::{
    accepted_lines, like_pattern, AcceptedLine, Paginated, Routine, RoutineDetails, RoutineExerciseRow,
    RoutineFilters, RoutineList, RoutineQuery, RoutineRequest, RoutineSummary, StudentOption,
};
use crate::services::{ExerciseService, UserService};

const ROUTINE_SUMMARIES: &str = "
    SELECT r.id, r.name, r.student_id,
           CONCAT_WS(' ', u.first_name, u.first_surname, NULLIF(u.second_surname, '')) AS student_name,
           (SELECT COUNT(*) FROM routine_exercises re WHERE re.routine_id = r.id) AS exercise_count
    FROM routines r
    JOIN students s ON s.id = r.student_id
    JOIN users u ON u.id = s.user_id";

const ROUTINE_COUNT: &str = "
    SELECT COUNT(*)
    FROM routines r
    JOIN students s ON s.id = r.student_id
    JOIN users u ON u.id = s.user_id";

/// Who is looking at routines. Staff see every routine; a student only their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Staff,
    Student(i64),
}

impl Viewer {
    pub fn can_see(&self, routine: &Routine) -> bool {
        match self {
            Viewer::Staff => true,
            Viewer::Student(student_id) => routine.student_id == *student_id,
        }
    }
}

fn push_routine_filters(query: &mut QueryBuilder<'_, Postgres>, viewer: Viewer, filters: &RoutineFilters) {
    if let Viewer::Student(student_id) = viewer {
        query.push(" AND r.student_id = ");
        query.push_bind(student_id);
    }

    if let Some(q) = &filters.q {
        let pattern = like_pattern(q);
        query.push(" AND (LOWER(r.name) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR LOWER(u.first_name) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR LOWER(u.first_surname) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR LOWER(COALESCE(u.second_surname, '')) LIKE ");
        query.push_bind(pattern);
        query.push(")");
    }

    if let Some(student_id) = filters.student_id {
        query.push(" AND r.student_id = ");
        query.push_bind(student_id);
    }
}

#[derive(Clone)]
pub struct RoutineService {
    db: PgPool,
}

impl RoutineService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Resolve the caller's view; a student account without a student profile has none.
    pub async fn viewer(&self, session: &UserSession) -> Result<Viewer> {
        if session.role.is_staff() {
            return Ok(Viewer::Staff);
        }

        UserService::new(self.db.clone())
            .student_id_for_user(session.user_id)
            .await?
            .map(Viewer::Student)
            .ok_or_else(|| AppError::Forbidden("No student profile is linked to this account".to_string()))
    }

    pub async fn list_routines(&self, viewer: Viewer, query: &RoutineQuery) -> Result<RoutineList> {
        let filters = query.filters();
        let params = query.page_params();

        let mut count = QueryBuilder::new(format!("{} WHERE 1=1", ROUTINE_COUNT));
        push_routine_filters(&mut count, viewer, &filters);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        let mut select = QueryBuilder::new(format!("{} WHERE 1=1", ROUTINE_SUMMARIES));
        push_routine_filters(&mut select, viewer, &filters);
        // column and direction come from closed enums, never from raw input
        select.push(format!(
            " ORDER BY {} {}, r.id LIMIT ",
            filters.sort.column(),
            filters.direction.as_sql()
        ));
        select.push_bind(params.per_page());
        select.push(" OFFSET ");
        select.push_bind(params.offset());

        let routines = select.build_query_as::<RoutineSummary>().fetch_all(&self.db).await?;

        let students = match viewer {
            Viewer::Staff => UserService::new(self.db.clone()).student_options().await?,
            Viewer::Student(student_id) => self.own_student_option(student_id).await?,
        };

        Ok(RoutineList {
            page: Paginated::new(routines, total, params),
            students,
        })
    }

    pub async fn get_routine(&self, viewer: Viewer, routine_id: i64) -> Result<RoutineDetails> {
        let routine = self.find_visible(viewer, routine_id).await?;

        let student_name: String = sqlx::query_scalar(
            "SELECT CONCAT_WS(' ', u.first_name, u.first_surname, NULLIF(u.second_surname, ''))
             FROM students s JOIN users u ON u.id = s.user_id WHERE s.id = $1",
        )
        .bind(routine.student_id)
        .fetch_one(&self.db)
        .await?;

        let exercises = sqlx::query_as::<_, RoutineExerciseRow>(
            "SELECT re.position, re.repetitions, e.id AS exercise_id, e.name AS exercise_name,
                    e.main_muscle, e.difficulty
             FROM routine_exercises re
             JOIN exercises e ON e.id = re.exercise_id
             WHERE re.routine_id = $1
             ORDER BY re.position, re.id",
        )
        .bind(routine_id)
        .fetch_all(&self.db)
        .await?;

        Ok(RoutineDetails {
            id: routine.id,
            name: routine.name,
            student_id: routine.student_id,
            student_name,
            exercises,
        })
    }

    pub async fn create_routine(&self, viewer: Viewer, request: RoutineRequest) -> Result<RoutineDetails> {
        let student_id = self.owner_for(viewer, request.student_id).await?;
        let lines = self.accepted(&request).await?;

        let mut tx = self.db.begin().await?;

        let routine_id: i64 =
            sqlx::query_scalar("INSERT INTO routines (name, student_id) VALUES ($1, $2) RETURNING id")
                .bind(request.name.trim())
                .bind(student_id)
                .fetch_one(&mut *tx)
                .await?;

        insert_lines(&mut tx, routine_id, &lines).await?;
        tx.commit().await?;

        tracing::info!(routine_id, student_id, exercises = lines.len(), "Created routine");

        self.get_routine(viewer, routine_id).await
    }

    /// Rename or reassign a routine and replace its exercise lines wholesale.
    pub async fn update_routine(
        &self,
        viewer: Viewer,
        routine_id: i64,
        request: RoutineRequest,
    ) -> Result<RoutineDetails> {
        let routine = self.find_visible(viewer, routine_id).await?;
        let student_id = match (viewer, request.student_id) {
            (Viewer::Staff, Some(student_id)) => self.owner_for(viewer, Some(student_id)).await?,
            _ => routine.student_id,
        };
        let lines = self.accepted(&request).await?;

        let mut tx = self.db.begin().await?;

        sqlx::query("UPDATE routines SET name = $2, student_id = $3 WHERE id = $1")
            .bind(routine_id)
            .bind(request.name.trim())
            .bind(student_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM routine_exercises WHERE routine_id = $1")
            .bind(routine_id)
            .execute(&mut *tx)
            .await?;

        insert_lines(&mut tx, routine_id, &lines).await?;
        tx.commit().await?;

        tracing::info!(routine_id, exercises = lines.len(), "Updated routine");

        self.get_routine(viewer, routine_id).await
    }

    pub async fn delete_routine(&self, viewer: Viewer, routine_id: i64) -> Result<()> {
        self.find_visible(viewer, routine_id).await?;

        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM routine_exercises WHERE routine_id = $1")
            .bind(routine_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM routines WHERE id = $1")
            .bind(routine_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(routine_id, "Deleted routine");
        Ok(())
    }

    async fn find_visible(&self, viewer: Viewer, routine_id: i64) -> Result<Routine> {
        let routine = sqlx::query_as::<_, Routine>("SELECT id, name, student_id FROM routines WHERE id = $1")
            .bind(routine_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Routine", routine_id))?;

        if !viewer.can_see(&routine) {
            return Err(AppError::Forbidden("This routine belongs to another student".to_string()));
        }

        Ok(routine)
    }

    /// Student a new routine belongs to: the caller for students, the requested one for staff.
    async fn owner_for(&self, viewer: Viewer, requested: Option<i64>) -> Result<i64> {
        match viewer {
            Viewer::Student(student_id) => Ok(student_id),
            Viewer::Staff => {
                let student_id = requested
                    .ok_or_else(|| AppError::BadRequest("A student must be selected".to_string()))?;

                let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM students WHERE id = $1)")
                    .bind(student_id)
                    .fetch_one(&self.db)
                    .await?;

                if exists {
                    Ok(student_id)
                } else {
                    Err(AppError::BadRequest(format!("Student {} does not exist", student_id)))
                }
            }
        }
    }

    async fn accepted(&self, request: &RoutineRequest) -> Result<Vec<AcceptedLine>> {
        let mut ids: Vec<i64> = request.exercises.iter().filter_map(|line| line.exercise_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let known = ExerciseService::new(self.db.clone()).existing_ids(&ids).await?;
        Ok(accepted_lines(&request.exercises, &known))
    }

    async fn own_student_option(&self, student_id: i64) -> Result<Vec<StudentOption>> {
        let students = sqlx::query_as::<_, StudentOption>(
            "SELECT s.id, CONCAT_WS(' ', u.first_name, u.first_surname, NULLIF(u.second_surname, '')) AS name
             FROM students s JOIN users u ON u.id = s.user_id WHERE s.id = $1",
        )
        .bind(student_id)
        .fetch_all(&self.db)
        .await?;

        Ok(students)
    }
}

async fn insert_lines(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    routine_id: i64,
    lines: &[AcceptedLine],
) -> Result<()> {
    if lines.is_empty() {
        return Ok(());
    }

    let mut insert: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO routine_exercises (routine_id, exercise_id, position, repetitions) ");
    insert.push_values(lines, |mut row, line| {
        row.push_bind(routine_id)
            .push_bind(line.exercise_id)
            .push_bind(line.position)
            .push_bind(line.repetitions);
    });
    insert.build().execute(&mut **tx).await?;

    Ok(())
}
