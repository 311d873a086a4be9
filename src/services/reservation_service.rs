use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::calendar;
use crate::error::{AppError, Result};
use crate::models::{
    check_booking, like_pattern, CreateReservationRequest, Paginated, Reservation, ReservationDetails,
    ReservationFilters, ReservationList, ReservationQuery,
};
use crate::services::ClassService;

const RESERVATION_DETAILS: &str = "
    SELECT r.id, r.reserved_on, r.student_id,
           CONCAT_WS(' ', su.first_name, su.first_surname, NULLIF(su.second_surname, '')) AS student_name,
           su.email AS student_email,
           c.id AS class_id, c.name AS class_name, c.class_date, c.start_time,
           t.id AS teacher_id,
           CONCAT_WS(' ', tu.first_name, tu.first_surname) AS teacher_name
    FROM reservations r
    JOIN students s ON s.id = r.student_id
    JOIN users su ON su.id = s.user_id
    JOIN classes c ON c.id = r.class_id
    JOIN teachers t ON t.id = c.teacher_id
    JOIN users tu ON tu.id = t.user_id";

const RESERVATION_COUNT: &str = "
    SELECT COUNT(*)
    FROM reservations r
    JOIN students s ON s.id = r.student_id
    JOIN users su ON su.id = s.user_id
    JOIN classes c ON c.id = r.class_id
    JOIN teachers t ON t.id = c.teacher_id
    JOIN users tu ON tu.id = t.user_id";

fn push_reservation_filters(query: &mut QueryBuilder<'_, Postgres>, filters: &ReservationFilters) {
    if let Some(q) = &filters.q {
        let pattern = like_pattern(q);
        query.push(" AND (");
        let columns = [
            "su.first_name",
            "su.first_surname",
            "COALESCE(su.second_surname, '')",
            "su.email",
            "tu.first_name",
            "tu.first_surname",
            "COALESCE(tu.second_surname, '')",
            "c.name",
        ];
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                query.push(" OR ");
            }
            query.push(format!("LOWER({}) LIKE ", column));
            query.push_bind(pattern.clone());
        }
        query.push(")");
    }

    if let Some(from) = filters.reserved_from {
        query.push(" AND r.reserved_on >= ");
        query.push_bind(from);
    }
    if let Some(to) = filters.reserved_to {
        query.push(" AND r.reserved_on <= ");
        query.push_bind(to);
    }
    if let Some(from) = filters.class_from {
        query.push(" AND c.class_date >= ");
        query.push_bind(from);
    }
    if let Some(to) = filters.class_to {
        query.push(" AND c.class_date <= ");
        query.push_bind(to);
    }
    if let Some(teacher_id) = filters.teacher_id {
        query.push(" AND t.id = ");
        query.push_bind(teacher_id);
    }
}

/// A recorded reservation with the class occupancy right after it.
#[derive(Debug, Clone)]
pub struct Booking {
    pub reservation: Reservation,
    pub enrolled: i64,
    pub capacity: i32,
}

impl Booking {
    pub fn is_full(&self) -> bool {
        self.enrolled >= i64::from(self.capacity)
    }
}

#[derive(sqlx::FromRow)]
struct LockedClass {
    class_date: chrono::NaiveDate,
    capacity: i32,
}

#[derive(Clone)]
pub struct ReservationService {
    db: PgPool,
}

impl ReservationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Filtered reservations, newest first.
    pub async fn list_reservations(&self, query: &ReservationQuery) -> Result<ReservationList> {
        let filters = query.filters();
        let params = query.page_params();

        let mut count = QueryBuilder::new(format!("{} WHERE 1=1", RESERVATION_COUNT));
        push_reservation_filters(&mut count, &filters);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        let mut select = QueryBuilder::new(format!("{} WHERE 1=1", RESERVATION_DETAILS));
        push_reservation_filters(&mut select, &filters);
        select.push(" ORDER BY r.reserved_on DESC, r.id DESC LIMIT ");
        select.push_bind(params.per_page());
        select.push(" OFFSET ");
        select.push_bind(params.offset());

        let reservations = select
            .build_query_as::<ReservationDetails>()
            .fetch_all(&self.db)
            .await?;

        let teachers = ClassService::new(self.db.clone()).teacher_options().await?;

        Ok(ReservationList {
            page: Paginated::new(reservations, total, params),
            teachers,
        })
    }

    pub async fn get_reservation(&self, reservation_id: i64) -> Result<ReservationDetails> {
        sqlx::query_as::<_, ReservationDetails>(&format!("{} WHERE r.id = $1", RESERVATION_DETAILS))
            .bind(reservation_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Reservation", reservation_id))
    }

    pub async fn create_reservation(&self, request: CreateReservationRequest) -> Result<Booking> {
        self.book(request.student_id, request.class_id).await
    }

    /// Book a seat for a student.
    ///
    /// The class row stays locked until commit, so two requests racing for
    /// the last seat are serialised and only one of them gets it.
    pub async fn book(&self, student_id: i64, class_id: i64) -> Result<Booking> {
        let mut tx = self.db.begin().await?;

        let class = sqlx::query_as::<_, LockedClass>(
            "SELECT class_date, capacity FROM classes WHERE id = $1 FOR UPDATE",
        )
        .bind(class_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Class", class_id))?;

        let student_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM students WHERE id = $1)")
            .bind(student_id)
            .fetch_one(&mut *tx)
            .await?;
        if !student_exists {
            return Err(AppError::not_found("Student", student_id));
        }

        let already_reserved: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reservations WHERE student_id = $1 AND class_id = $2)",
        )
        .bind(student_id)
        .bind(class_id)
        .fetch_one(&mut *tx)
        .await?;

        let enrolled: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE class_id = $1")
            .bind(class_id)
            .fetch_one(&mut *tx)
            .await?;

        let today = calendar::today();
        if let Err(refusal) = check_booking(class.class_date, today, already_reserved, enrolled, class.capacity) {
            tracing::info!(student_id, class_id, reason = ?refusal, "Refused reservation");
            return Err(refusal.into());
        }

        let reservation = sqlx::query_as::<_, Reservation>(
            "INSERT INTO reservations (reserved_on, student_id, class_id)
             VALUES ($1, $2, $3)
             RETURNING id, reserved_on, student_id, class_id",
        )
        .bind(today)
        .bind(student_id)
        .bind(class_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(reservation_id = reservation.id, student_id, class_id, "Reserved class");

        Ok(Booking {
            reservation,
            enrolled: enrolled + 1,
            capacity: class.capacity,
        })
    }

    pub async fn has_reservation(&self, student_id: i64, class_id: i64) -> Result<bool> {
        let exists = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reservations WHERE student_id = $1 AND class_id = $2)",
        )
        .bind(student_id)
        .bind(class_id)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }

    pub async fn delete_reservation(&self, reservation_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(reservation_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Reservation", reservation_id));
        }

        tracing::info!(reservation_id, "Deleted reservation");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_booking_fullness() {
        let booking = Booking {
            reservation: Reservation {
                id: 1,
                reserved_on: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                student_id: 2,
                class_id: 3,
            },
            enrolled: 4,
            capacity: 4,
        };
        assert!(booking.is_full());
    }
}
