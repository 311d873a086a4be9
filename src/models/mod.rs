// Domain records, request payloads and query filters

pub mod calendar;
pub mod exercise;
pub mod gym_class;
pub mod pagination;
pub mod reservation;
pub mod routine;
pub mod user;

pub use calendar::*;
pub use exercise::*;
pub use gym_class::*;
pub use pagination::*;
pub use reservation::*;
pub use routine::*;
pub use user::*;

use chrono::NaiveDate;
use validator::ValidationError;

/// Reject text that is empty once surrounding whitespace is dropped.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// "first_name first_surname second_surname", skipping a missing second surname.
pub fn full_name(first_name: &str, first_surname: &str, second_surname: Option<&str>) -> String {
    [Some(first_name), Some(first_surname), second_surname]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse an optional `YYYY-MM-DD` query value; blank or malformed input means "no filter".
pub fn parse_date_filter(value: Option<&str>) -> Option<NaiveDate> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Trimmed search term, `None` when blank.
pub fn search_term(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
}

/// `%term%` pattern for case-insensitive LIKE searches, with LIKE wildcards escaped.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name() {
        assert_eq!(full_name("Ana", "García", Some("López")), "Ana García López");
        assert_eq!(full_name("Ana", "García", None), "Ana García");
        assert_eq!(full_name("Ana", "García", Some("  ")), "Ana García");
    }

    #[test]
    fn test_parse_date_filter_ignores_bad_input() {
        assert_eq!(
            parse_date_filter(Some("2025-03-04")),
            NaiveDate::from_ymd_opt(2025, 3, 4)
        );
        assert_eq!(parse_date_filter(Some("")), None);
        assert_eq!(parse_date_filter(Some("04/03/2025")), None);
        assert_eq!(parse_date_filter(Some("2025-02-30")), None);
        assert_eq!(parse_date_filter(None), None);
    }

    #[test]
    fn test_search_helpers() {
        assert_eq!(search_term(Some("  yoga ")), Some("yoga".to_string()));
        assert_eq!(search_term(Some("   ")), None);
        assert_eq!(like_pattern("Yoga"), "%yoga%");
        assert_eq!(like_pattern("100%_x"), "%100\\%\\_x%");
    }
}
