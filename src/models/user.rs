use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use crate::auth::UserRole;
use crate::models::{not_blank, search_term, PageParams};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub first_surname: String,
    pub second_surname: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of the user list; `role` is `None` for a user without any profile.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Validate)]
pub struct StudentProfile {
    pub birth_date: NaiveDate,
    #[validate(range(min = 1, max = 500))]
    pub weight: i32,
    #[validate(range(min = 1, max = 300))]
    pub height: i32,
    #[validate(length(min = 1, max = 10))]
    pub sex: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Validate)]
pub struct TeacherProfile {
    #[validate(length(min = 1, max = 255))]
    pub specialty: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdministratorProfile {
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// The single role profile attached to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ProfileInput {
    Student(StudentProfile),
    Teacher(TeacherProfile),
    Admin(AdministratorProfile),
}

impl ProfileInput {
    pub fn role(&self) -> UserRole {
        match self {
            ProfileInput::Student(_) => UserRole::Student,
            ProfileInput::Teacher(_) => UserRole::Teacher,
            ProfileInput::Admin(_) => UserRole::Admin,
        }
    }
}

fn validate_profile(profile: &ProfileInput) -> Result<(), ValidationError> {
    let result = match profile {
        ProfileInput::Student(student) => student.validate(),
        ProfileInput::Teacher(teacher) => teacher.validate(),
        ProfileInput::Admin(_) => Ok(()),
    };
    result.map_err(|_| ValidationError::new("invalid_profile"))
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDetails {
    #[serde(flatten)]
    pub user: User,
    pub role: Option<UserRole>,
    pub student: Option<StudentProfile>,
    pub teacher: Option<TeacherProfile>,
    pub administrator: Option<AdministratorProfile>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email, length(max = 100))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 20), custom(function = "not_blank"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 20), custom(function = "not_blank"))]
    pub first_surname: String,
    #[validate(length(max = 20))]
    pub second_surname: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(custom(function = "validate_profile"))]
    pub profile: ProfileInput,
}

/// Partial update. For the optional personal fields an empty string clears
/// the stored value and an absent field leaves it untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email, length(max = 100))]
    pub email: Option<String>,
    pub password: Option<String>,
    #[validate(length(min = 1, max = 20), custom(function = "not_blank"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 20), custom(function = "not_blank"))]
    pub first_surname: Option<String>,
    #[validate(length(max = 20))]
    pub second_surname: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(custom(function = "validate_profile"))]
    pub profile: Option<ProfileInput>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct UserQuery {
    pub q: Option<String>,
    pub role: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl UserQuery {
    pub fn search(&self) -> Option<String> {
        search_term(self.q.as_deref())
    }

    /// Unknown roles are ignored rather than rejected.
    pub fn role(&self) -> Option<UserRole> {
        self.role.as_deref().and_then(|r| r.trim().parse().ok())
    }

    pub fn page_params(&self) -> PageParams {
        PageParams::from_raw(self.page.as_deref(), self.per_page.as_deref())
    }
}
