use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::calendar::Scheduled;
use crate::models::not_blank;

/// A scheduled class row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GymClass {
    pub id: i64,
    pub name: String,
    pub class_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
    pub location: Option<String>,
    pub capacity: i32,
    pub teacher_id: i64,
}

impl GymClass {
    /// Only classes strictly after `today` accept reservations.
    pub fn is_bookable(&self, today: NaiveDate) -> bool {
        self.class_date > today
    }
}

impl Scheduled for GymClass {
    fn date(&self) -> NaiveDate {
        self.class_date
    }

    fn time(&self) -> NaiveTime {
        self.start_time
    }
}

/// Class joined with its teacher name and occupancy.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClassDetails {
    pub id: i64,
    pub name: String,
    pub class_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
    pub location: Option<String>,
    pub capacity: i32,
    pub teacher_id: i64,
    pub teacher_name: String,
    pub enrolled: i64,
}

impl ClassDetails {
    pub fn free_seats(&self) -> i64 {
        (i64::from(self.capacity) - self.enrolled).max(0)
    }

    pub fn is_full(&self) -> bool {
        self.enrolled >= i64::from(self.capacity)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClassRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"), custom(function = "not_blank"))]
    pub name: String,
    pub class_date: NaiveDate,
    pub start_time: NaiveTime,
    #[validate(range(min = 1, message = "Duration must be at least one minute"))]
    pub duration_minutes: i32,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: i32,
    pub teacher_id: i64,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ClassQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub teacher_id: Option<i64>,
}

/// Teacher entry for selectors.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TeacherOption {
    pub id: i64,
    pub name: String,
}

/// Future class offered when booking, with its seat label.
#[derive(Debug, Clone, Serialize)]
pub struct BookableClass {
    pub id: i64,
    pub name: String,
    pub class_date: NaiveDate,
    pub free_seats: i64,
    pub label: String,
}

impl From<ClassDetails> for BookableClass {
    fn from(class: ClassDetails) -> Self {
        let free_seats = class.free_seats();
        let label = seat_label(&class.name, class.class_date, free_seats);
        Self {
            id: class.id,
            name: class.name,
            class_date: class.class_date,
            free_seats,
            label,
        }
    }
}

/// `"Yoga (04/03/2025) - 3 seats left"`, or `"... - FULL"` with no seats.
pub fn seat_label(name: &str, date: NaiveDate, free_seats: i64) -> String {
    let seats = match free_seats {
        n if n <= 0 => "FULL".to_string(),
        1 => "1 seat left".to_string(),
        n => format!("{} seats left", n),
    };
    format!("{} ({}) - {}", name, date.format("%d/%m/%Y"), seats)
}
