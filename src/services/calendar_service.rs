use chrono::NaiveDate;
use sqlx::PgPool;

use crate::auth::{UserRole, UserSession};
use crate::calendar::MonthRef;
use crate::error::{AppError, Result};
use crate::models::{CalendarEntry, CalendarMonth, ClassSlot};
use crate::services::{Booking, ClassService, ReservationService, UserService};

/// Data behind the reservations calendar, always seen from the calling user.
#[derive(Clone)]
pub struct CalendarService {
    classes: ClassService,
    reservations: ReservationService,
    users: UserService,
}

impl CalendarService {
    pub fn new(db: PgPool) -> Self {
        Self {
            classes: ClassService::new(db.clone()),
            reservations: ReservationService::new(db.clone()),
            users: UserService::new(db),
        }
    }

    pub async fn month_entries(&self, month: MonthRef) -> Result<Vec<CalendarEntry>> {
        self.classes.month_entries(month).await
    }

    pub async fn month_view(&self, month: MonthRef, today: NaiveDate) -> Result<CalendarMonth> {
        let entries = self.classes.month_entries(month).await?;
        Ok(CalendarMonth::build(month, today, &entries))
    }

    pub async fn class_slot(&self, session: &UserSession, class_id: i64, today: NaiveDate) -> Result<ClassSlot> {
        let class = self.classes.get_class(class_id).await?;

        let student_id = self.caller_student_id(session).await?;
        let already_reserved = match student_id {
            Some(student_id) => self.reservations.has_reservation(student_id, class_id).await?,
            None => false,
        };

        Ok(ClassSlot::new(class, student_id.is_some(), already_reserved, today))
    }

    /// Book the calling student into a class.
    pub async fn reserve(&self, session: &UserSession, class_id: i64) -> Result<Booking> {
        let student_id = self
            .caller_student_id(session)
            .await?
            .ok_or_else(|| AppError::Forbidden("Only students can reserve classes".to_string()))?;

        self.reservations.book(student_id, class_id).await
    }

    /// Student profile of the caller when the caller acts as a student.
    async fn caller_student_id(&self, session: &UserSession) -> Result<Option<i64>> {
        if session.role != UserRole::Student {
            return Ok(None);
        }
        self.users.student_id_for_user(session.user_id).await
    }
}
