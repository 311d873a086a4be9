use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::calendar::MonthRef;
use crate::error::{AppError, Result};
use crate::models::{
    parse_date_filter, BookableClass, CalendarEntry, ClassDetails, ClassQuery, ClassRequest, GymClass,
    TeacherOption,
};

const CLASS_COLUMNS: &str =
    "id, name, class_date, start_time, duration_minutes, location, capacity, teacher_id";

const CLASS_DETAILS: &str = "
    SELECT c.id, c.name, c.class_date, c.start_time, c.duration_minutes, c.location, c.capacity,
           c.teacher_id,
           CONCAT_WS(' ', u.first_name, u.first_surname) AS teacher_name,
           (SELECT COUNT(*) FROM reservations r WHERE r.class_id = c.id) AS enrolled
    FROM classes c
    JOIN teachers t ON t.id = c.teacher_id
    JOIN users u ON u.id = t.user_id";

#[derive(Clone)]
pub struct ClassService {
    db: PgPool,
}

impl ClassService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Classes ordered by date and start time.
    pub async fn list_classes(&self, query: &ClassQuery) -> Result<Vec<ClassDetails>> {
        let mut select: QueryBuilder<Postgres> = QueryBuilder::new(format!("{} WHERE 1=1", CLASS_DETAILS));

        if let Some(from) = parse_date_filter(query.from.as_deref()) {
            select.push(" AND c.class_date >= ");
            select.push_bind(from);
        }
        if let Some(to) = parse_date_filter(query.to.as_deref()) {
            select.push(" AND c.class_date <= ");
            select.push_bind(to);
        }
        if let Some(teacher_id) = query.teacher_id {
            select.push(" AND c.teacher_id = ");
            select.push_bind(teacher_id);
        }
        select.push(" ORDER BY c.class_date, c.start_time, c.id");

        let classes = select.build_query_as::<ClassDetails>().fetch_all(&self.db).await?;
        Ok(classes)
    }

    pub async fn get_class(&self, class_id: i64) -> Result<ClassDetails> {
        sqlx::query_as::<_, ClassDetails>(&format!("{} WHERE c.id = $1", CLASS_DETAILS))
            .bind(class_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Class", class_id))
    }

    pub async fn create_class(&self, request: ClassRequest) -> Result<GymClass> {
        self.ensure_teacher(request.teacher_id).await?;

        let class = sqlx::query_as::<_, GymClass>(&format!(
            "INSERT INTO classes (name, class_date, start_time, duration_minutes, location, capacity, teacher_id)
             VALUES ($1, $2, $3, $4, NULLIF($5, ''), $6, $7)
             RETURNING {}",
            CLASS_COLUMNS
        ))
        .bind(request.name.trim())
        .bind(request.class_date)
        .bind(request.start_time)
        .bind(request.duration_minutes)
        .bind(request.location.as_deref().map(str::trim))
        .bind(request.capacity)
        .bind(request.teacher_id)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(class_id = class.id, date = %class.class_date, "Created class");
        Ok(class)
    }

    pub async fn update_class(&self, class_id: i64, request: ClassRequest) -> Result<GymClass> {
        self.ensure_teacher(request.teacher_id).await?;

        let class = sqlx::query_as::<_, GymClass>(&format!(
            "UPDATE classes
             SET name = $2, class_date = $3, start_time = $4, duration_minutes = $5,
                 location = NULLIF($6, ''), capacity = $7, teacher_id = $8
             WHERE id = $1
             RETURNING {}",
            CLASS_COLUMNS
        ))
        .bind(class_id)
        .bind(request.name.trim())
        .bind(request.class_date)
        .bind(request.start_time)
        .bind(request.duration_minutes)
        .bind(request.location.as_deref().map(str::trim))
        .bind(request.capacity)
        .bind(request.teacher_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Class", class_id))?;

        tracing::info!(class_id, "Updated class");
        Ok(class)
    }

    /// Delete a class and its reservations.
    pub async fn delete_class(&self, class_id: i64) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let cancelled = sqlx::query("DELETE FROM reservations WHERE class_id = $1")
            .bind(class_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(class_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Class", class_id));
        }

        tx.commit().await?;

        tracing::info!(class_id, cancelled_reservations = cancelled, "Deleted class");
        Ok(())
    }

    pub async fn teacher_options(&self) -> Result<Vec<TeacherOption>> {
        let teachers = sqlx::query_as::<_, TeacherOption>(
            "SELECT t.id, CONCAT_WS(' ', u.first_name, u.first_surname) AS name
             FROM teachers t JOIN users u ON u.id = t.user_id
             ORDER BY u.first_name, u.first_surname, t.id",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(teachers)
    }

    /// Classes strictly after `today`, soonest first, labelled with their free seats.
    pub async fn bookable_classes(&self, today: NaiveDate) -> Result<Vec<BookableClass>> {
        let classes = sqlx::query_as::<_, ClassDetails>(&format!(
            "{} WHERE c.class_date > $1 ORDER BY c.class_date, c.start_time, c.id",
            CLASS_DETAILS
        ))
        .bind(today)
        .fetch_all(&self.db)
        .await?;

        Ok(classes.into_iter().map(BookableClass::from).collect())
    }

    /// Calendar entries for every class in `month`.
    pub async fn month_entries(&self, month: MonthRef) -> Result<Vec<CalendarEntry>> {
        let entries = sqlx::query_as::<_, CalendarEntry>(
            "SELECT id, class_date AS date, name, start_time AS time
             FROM classes
             WHERE class_date BETWEEN $1 AND $2
             ORDER BY class_date, start_time, id",
        )
        .bind(month.first_day())
        .bind(month.last_day())
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    async fn ensure_teacher(&self, teacher_id: i64) -> Result<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teachers WHERE id = $1)")
            .bind(teacher_id)
            .fetch_one(&self.db)
            .await?;

        if exists {
            Ok(())
        } else {
            Err(AppError::BadRequest(format!("Teacher {} does not exist", teacher_id)))
        }
    }
}
