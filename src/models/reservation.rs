use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;
use crate::models::{parse_date_filter, search_term, PageParams, Paginated, TeacherOption};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub id: i64,
    pub reserved_on: NaiveDate,
    pub student_id: i64,
    pub class_id: i64,
}

/// Reservation joined with its student, class and teacher.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReservationDetails {
    pub id: i64,
    pub reserved_on: NaiveDate,
    pub student_id: i64,
    pub student_name: String,
    pub student_email: String,
    pub class_id: i64,
    pub class_name: String,
    pub class_date: NaiveDate,
    pub start_time: NaiveTime,
    pub teacher_id: i64,
    pub teacher_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReservationRequest {
    #[validate(range(min = 1))]
    pub student_id: i64,
    #[validate(range(min = 1))]
    pub class_id: i64,
}

/// Raw list query; every value is optional and malformed values are ignored.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReservationQuery {
    pub q: Option<String>,
    pub reserved_from: Option<String>,
    pub reserved_to: Option<String>,
    pub class_from: Option<String>,
    pub class_to: Option<String>,
    pub teacher_id: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReservationFilters {
    pub q: Option<String>,
    pub reserved_from: Option<NaiveDate>,
    pub reserved_to: Option<NaiveDate>,
    pub class_from: Option<NaiveDate>,
    pub class_to: Option<NaiveDate>,
    pub teacher_id: Option<i64>,
}

impl ReservationQuery {
    pub fn filters(&self) -> ReservationFilters {
        ReservationFilters {
            q: search_term(self.q.as_deref()),
            reserved_from: parse_date_filter(self.reserved_from.as_deref()),
            reserved_to: parse_date_filter(self.reserved_to.as_deref()),
            class_from: parse_date_filter(self.class_from.as_deref()),
            class_to: parse_date_filter(self.class_to.as_deref()),
            teacher_id: self.teacher_id.as_deref().and_then(|id| id.trim().parse().ok()),
        }
    }

    pub fn page_params(&self) -> PageParams {
        PageParams::from_raw(self.page.as_deref(), self.per_page.as_deref())
    }
}

#[derive(Debug, Serialize)]
pub struct ReservationList {
    #[serde(flatten)]
    pub page: Paginated<ReservationDetails>,
    pub teachers: Vec<TeacherOption>,
}

/// Why a reservation cannot be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingRefusal {
    NotBookable,
    AlreadyReserved,
    Full,
}

impl BookingRefusal {
    pub fn message(&self) -> &'static str {
        match self {
            BookingRefusal::NotBookable => "Only future classes can be reserved",
            BookingRefusal::AlreadyReserved => "The student already has a reservation in this class",
            BookingRefusal::Full => "The class is full",
        }
    }
}

impl From<BookingRefusal> for AppError {
    fn from(refusal: BookingRefusal) -> Self {
        match refusal {
            BookingRefusal::NotBookable => AppError::BadRequest(refusal.message().to_string()),
            BookingRefusal::AlreadyReserved | BookingRefusal::Full => {
                AppError::Conflict(refusal.message().to_string())
            }
        }
    }
}

/// Decide whether a student may take a seat.
///
/// Checks run in a fixed order: the class date, then an existing
/// reservation, then capacity.
pub fn check_booking(
    class_date: NaiveDate,
    today: NaiveDate,
    already_reserved: bool,
    enrolled: i64,
    capacity: i32,
) -> Result<(), BookingRefusal> {
    if class_date <= today {
        return Err(BookingRefusal::NotBookable);
    }
    if already_reserved {
        return Err(BookingRefusal::AlreadyReserved);
    }
    if enrolled >= i64::from(capacity) {
        return Err(BookingRefusal::Full);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_booking_allowed() {
        assert_eq!(check_booking(day(10), day(9), false, 3, 4), Ok(()));
    }

    #[test]
    fn test_booking_refusal_order() {
        // past, duplicate and full at once: the date wins
        assert_eq!(
            check_booking(day(9), day(9), true, 4, 4),
            Err(BookingRefusal::NotBookable)
        );
        // duplicate is reported before capacity
        assert_eq!(
            check_booking(day(10), day(9), true, 4, 4),
            Err(BookingRefusal::AlreadyReserved)
        );
        assert_eq!(
            check_booking(day(10), day(9), false, 4, 4),
            Err(BookingRefusal::Full)
        );
    }

    #[test]
    fn test_refusal_status_codes() {
        assert_eq!(
            AppError::from(BookingRefusal::NotBookable).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_matches!(AppError::from(BookingRefusal::Full), AppError::Conflict(_));
        assert_matches!(AppError::from(BookingRefusal::AlreadyReserved), AppError::Conflict(_));
    }

    #[test]
    fn test_filters_ignore_malformed_values() {
        let query = ReservationQuery {
            q: Some("  ana ".to_string()),
            reserved_from: Some("2025-03-01".to_string()),
            reserved_to: Some("yesterday".to_string()),
            class_from: Some(String::new()),
            class_to: Some("2025-03-31".to_string()),
            teacher_id: Some("abc".to_string()),
            ..Default::default()
        };

        assert_eq!(
            query.filters(),
            ReservationFilters {
                q: Some("ana".to_string()),
                reserved_from: Some(day(1)),
                reserved_to: None,
                class_from: None,
                class_to: Some(day(31)),
                teacher_id: None,
            }
        );
    }

    #[test]
    fn test_page_params_from_query() {
        let query = ReservationQuery {
            page: Some("0".to_string()),
            per_page: Some("50".to_string()),
            ..Default::default()
        };
        let params = query.page_params();
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), 50);
    }
}
