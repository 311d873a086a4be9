use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use validator::Validate;

use crate::models::{not_blank, search_term, PageParams, Paginated};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Routine {
    pub id: i64,
    pub name: String,
    pub student_id: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RoutineSummary {
    pub id: i64,
    pub name: String,
    pub student_id: i64,
    pub student_name: String,
    pub exercise_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RoutineExerciseRow {
    pub position: i32,
    pub repetitions: i32,
    pub exercise_id: i64,
    pub exercise_name: String,
    pub main_muscle: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoutineDetails {
    pub id: i64,
    pub name: String,
    pub student_id: i64,
    pub student_name: String,
    pub exercises: Vec<RoutineExerciseRow>,
}

/// One submitted exercise line; incomplete lines are dropped, not rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExerciseLine {
    pub exercise_id: Option<i64>,
    pub repetitions: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RoutineRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"), custom(function = "not_blank"))]
    pub name: String,
    /// Ignored for students, who always own the routines they write.
    pub student_id: Option<i64>,
    #[serde(default)]
    pub exercises: Vec<ExerciseLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptedLine {
    pub position: i32,
    pub exercise_id: i64,
    pub repetitions: i32,
}

/// Keep complete lines naming a known exercise, numbered 1..n in submission order.
pub fn accepted_lines(lines: &[ExerciseLine], known_exercises: &HashSet<i64>) -> Vec<AcceptedLine> {
    lines
        .iter()
        .filter_map(|line| match (line.exercise_id, line.repetitions) {
            (Some(exercise_id), Some(repetitions))
                if repetitions > 0 && known_exercises.contains(&exercise_id) =>
            {
                Some((exercise_id, repetitions))
            }
            _ => None,
        })
        .zip(1..)
        .map(|((exercise_id, repetitions), position)| AcceptedLine {
            position,
            exercise_id,
            repetitions,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoutineSort {
    #[default]
    Name,
    Student,
}

impl RoutineSort {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("student") => RoutineSort::Student,
            _ => RoutineSort::Name,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            RoutineSort::Name => "r.name",
            RoutineSort::Student => "student_name",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RoutineQuery {
    pub q: Option<String>,
    pub student_id: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RoutineFilters {
    pub q: Option<String>,
    pub student_id: Option<i64>,
    pub sort: RoutineSort,
    pub direction: SortDirection,
}

impl RoutineQuery {
    pub fn filters(&self) -> RoutineFilters {
        RoutineFilters {
            q: search_term(self.q.as_deref()),
            student_id: self.student_id.as_deref().and_then(|id| id.trim().parse().ok()),
            sort: RoutineSort::parse(self.sort.as_deref()),
            direction: SortDirection::parse(self.direction.as_deref()),
        }
    }

    pub fn page_params(&self) -> PageParams {
        PageParams::from_raw(self.page.as_deref(), self.per_page.as_deref())
    }
}

/// Student entry for selectors.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StudentOption {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct RoutineList {
    #[serde(flatten)]
    pub page: Paginated<RoutineSummary>,
    pub students: Vec<StudentOption>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn line(exercise_id: Option<i64>, repetitions: Option<i32>) -> ExerciseLine {
        ExerciseLine { exercise_id, repetitions }
    }

    #[test]
    fn test_incomplete_lines_are_skipped_and_renumbered() {
        let known: HashSet<i64> = [1, 2, 3].into_iter().collect();
        let lines = vec![
            line(Some(1), Some(10)),
            line(None, Some(5)),
            line(Some(2), None),
            line(Some(2), Some(0)),
            line(Some(99), Some(8)),
            line(Some(3), Some(12)),
            line(Some(1), Some(6)),
        ];

        assert_eq!(
            accepted_lines(&lines, &known),
            vec![
                AcceptedLine { position: 1, exercise_id: 1, repetitions: 10 },
                AcceptedLine { position: 2, exercise_id: 3, repetitions: 12 },
                AcceptedLine { position: 3, exercise_id: 1, repetitions: 6 },
            ]
        );
    }

    #[test]
    fn test_no_lines() {
        let known: HashSet<i64> = HashSet::new();
        assert!(accepted_lines(&[line(Some(1), Some(3))], &known).is_empty());
        assert!(accepted_lines(&[], &known).is_empty());
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!(RoutineSort::parse(Some("student")), RoutineSort::Student);
        assert_eq!(RoutineSort::parse(Some("created_at; DROP TABLE")), RoutineSort::Name);
        assert_eq!(RoutineSort::parse(None), RoutineSort::Name);
        assert_eq!(SortDirection::parse(Some("DESC")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(Some("sideways")), SortDirection::Asc);
    }

    #[test]
    fn test_routine_filters() {
        let query = RoutineQuery {
            q: Some(" legs ".to_string()),
            student_id: Some("7".to_string()),
            sort: Some("student".to_string()),
            direction: Some("desc".to_string()),
            ..Default::default()
        };
        let filters = query.filters();
        assert_eq!(filters.q.as_deref(), Some("legs"));
        assert_eq!(filters.student_id, Some(7));
        assert_eq!(filters.sort.column(), "student_name");
        assert_eq!(filters.direction.as_sql(), "DESC");
    }

    #[test]
    fn test_routine_name_must_not_be_blank() {
        let request: RoutineRequest = serde_json::from_str(r#"{"name": "   "}"#).unwrap();
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.field_errors()["name"][0].code, "blank");

        let request: RoutineRequest = serde_json::from_str(r#"{"name": " Legs "}"#).unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_routine_lines_default_to_empty() {
        let request: RoutineRequest = serde_json::from_str(r#"{"name": "Push day"}"#).unwrap();
        assert!(request.exercises.is_empty());
        assert!(request.student_id.is_none());
    }
}
