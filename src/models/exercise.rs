use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::not_blank;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub difficulty: String,
    pub main_muscle: String,
    pub repetitions: i32,
}

/// Body of both create and update; an exercise is always replaced whole.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExerciseRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub description: String,
    #[validate(length(min = 1, max = 70), custom(function = "not_blank"))]
    pub difficulty: String,
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub main_muscle: String,
    #[validate(range(min = 1, message = "Repetitions must be at least 1"))]
    pub repetitions: i32,
}
