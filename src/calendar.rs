//! Month-grid arithmetic for the reservations calendar.
//!
//! The grid always holds 42 cells (six Monday-first weeks): the tail of the
//! previous month, every day of the requested month, and the head of the
//! next month. Cells outside the requested month are `muted`.

use chrono::{Datelike, Days, Local, Month, NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Number of cells in a rendered month (6 rows x 7 days).
pub const GRID_CELLS: usize = 42;

/// Years the calendar accepts.
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1..=9999;

/// A calendar month with a one-based month number.
///
/// Only constructible for a year in [`SUPPORTED_YEARS`], so its first and
/// last day always exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthRef {
    year: i32,
    month: u32,
    #[serde(skip)]
    first_day: NaiveDate,
    #[serde(skip)]
    last_day: NaiveDate,
}

impl MonthRef {
    /// Build a month, rejecting months outside 1..=12 and unsupported years.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(1..=12).contains(&month) || !SUPPORTED_YEARS.contains(&year) {
            return None;
        }
        let first_day = NaiveDate::from_ymd_opt(year, month, 1)?;
        let following = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };

        Some(Self {
            year,
            month,
            first_day,
            last_day: following.pred_opt()?,
        })
    }

    /// Fold a year and a zero-based month offset into a valid month.
    ///
    /// `month0` may be negative or larger than 11: `(2025, -1)` is December
    /// 2024 and `(2025, 12)` is January 2026.
    pub fn normalize(year: i32, month0: i32) -> Option<Self> {
        let year = year.checked_add(month0.div_euclid(12))?;
        Self::new(year, month0.rem_euclid(12) as u32 + 1)
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// `None` before January of the first supported year.
    pub fn prev(self) -> Option<Self> {
        Self::normalize(self.year, self.month as i32 - 2)
    }

    /// `None` after December of the last supported year.
    pub fn next(self) -> Option<Self> {
        Self::normalize(self.year, self.month as i32)
    }

    pub fn first_day(self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(self) -> NaiveDate {
        self.last_day
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        (self.first_day..=self.last_day).contains(&date)
    }

    pub fn days(self) -> u32 {
        self.last_day.day()
    }

    /// Day-of-week index of the 1st of the month with Monday = 0 ... Sunday = 6.
    pub fn monday_first_offset(self) -> u32 {
        self.first_day.weekday().num_days_from_monday()
    }

    pub fn title(self) -> String {
        let name = u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("");
        format!("{} {}", name, self.year)
    }
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    MonthRef::new(year, month).map(MonthRef::days)
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Years offered by the calendar's year selector.
pub fn year_options(today: NaiveDate) -> Vec<i32> {
    (today.year() - 2..=today.year() + 6).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub day: u32,
    pub muted: bool,
    pub today: bool,
}

/// Build the 42-cell grid for `month`.
pub fn month_grid(month: MonthRef, today: NaiveDate) -> Vec<DayCell> {
    // at most six days before 1 January of year 1, which chrono still represents
    let start = month.first_day() - Days::new(u64::from(month.monday_first_offset()));

    start
        .iter_days()
        .take(GRID_CELLS)
        .map(|date| {
            let muted = !month.contains(date);
            DayCell {
                date,
                day: date.day(),
                muted,
                today: !muted && date == today,
            }
        })
        .collect()
}

/// Anything that can be placed on a calendar day.
pub trait Scheduled {
    fn date(&self) -> NaiveDate;
    fn time(&self) -> NaiveTime;
}

/// Group entries by date, each day ordered by start time.
pub fn group_by_day<T: Scheduled + Clone>(entries: &[T]) -> BTreeMap<NaiveDate, Vec<T>> {
    let mut by_day: BTreeMap<NaiveDate, Vec<T>> = BTreeMap::new();
    for entry in entries {
        by_day.entry(entry.date()).or_default().push(entry.clone());
    }
    for day in by_day.values_mut() {
        day.sort_by_key(|e| e.time());
    }
    by_day
}
