use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;

use crate::calendar::{group_by_day, month_grid, year_options, DayCell, MonthRef, Scheduled, SUPPORTED_YEARS};
use crate::error::AppError;
use crate::models::ClassDetails;

fn hh_mm<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&time.format("%H:%M"))
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl CalendarQuery {
    /// Requested month, defaulting to the month containing `today`.
    pub fn month(&self, today: NaiveDate) -> Result<MonthRef, AppError> {
        let year = self.year.unwrap_or_else(|| today.year());
        let month = self.month.unwrap_or_else(|| today.month());
        if !(1..=12).contains(&month) {
            return Err(AppError::BadRequest("Month must be between 1 and 12".to_string()));
        }

        MonthRef::new(year, month).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Year must be between {} and {}",
                SUPPORTED_YEARS.start(),
                SUPPORTED_YEARS.end()
            ))
        })
    }
}

/// A class as shown on a calendar day.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CalendarEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub name: String,
    #[serde(serialize_with = "hh_mm")]
    pub time: NaiveTime,
}

impl Scheduled for CalendarEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn time(&self) -> NaiveTime {
        self.time
    }
}

/// Class popup data for the calling user.
#[derive(Debug, Clone, Serialize)]
pub struct ClassSlot {
    pub id: i64,
    pub name: String,
    pub teacher: String,
    pub date: NaiveDate,
    #[serde(serialize_with = "hh_mm")]
    pub time: NaiveTime,
    pub duration: i32,
    pub place: Option<String>,
    pub capacity: i32,
    pub enrolled: i64,
    pub is_full: bool,
    pub already_reserved: bool,
    pub can_reserve: bool,
}

impl ClassSlot {
    pub fn new(class: ClassDetails, caller_is_student: bool, already_reserved: bool, today: NaiveDate) -> Self {
        let is_full = class.is_full();
        let can_reserve =
            caller_is_student && !already_reserved && !is_full && class.class_date > today;
        Self {
            id: class.id,
            name: class.name,
            teacher: class.teacher_name,
            date: class.class_date,
            time: class.start_time,
            duration: class.duration_minutes,
            place: class.location,
            capacity: class.capacity,
            enrolled: class.enrolled,
            is_full,
            already_reserved,
            can_reserve,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReserveRequest {
    pub clase_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReserveResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrolled: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_full: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReserveResponse {
    pub fn booked(enrolled: i64, is_full: bool) -> Self {
        Self {
            ok: true,
            enrolled: Some(enrolled),
            is_full: Some(is_full),
            error: None,
        }
    }

    pub fn refused(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            enrolled: None,
            is_full: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    #[serde(flatten)]
    pub cell: DayCell,
    pub classes: Vec<CalendarEntry>,
}

/// Everything the month view needs in one payload.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub title: String,
    pub year_options: Vec<i32>,
    pub prev: Option<MonthRef>,
    pub next: Option<MonthRef>,
    pub days: Vec<CalendarDay>,
}

impl CalendarMonth {
    pub fn build(month: MonthRef, today: NaiveDate, entries: &[CalendarEntry]) -> Self {
        let mut by_day = group_by_day(entries);
        let days = month_grid(month, today)
            .into_iter()
            .map(|cell| {
                let classes = by_day.remove(&cell.date).unwrap_or_default();
                CalendarDay { cell, classes }
            })
            .collect();

        Self {
            year: month.year(),
            month: month.month(),
            title: month.title(),
            year_options: year_options(today),
            prev: month.prev(),
            next: month.next(),
            days,
        }
    }
}
