use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

/// User roles for role-based access control.
///
/// A user's role comes from the profile attached to it: an active
/// administrator profile wins over a teacher profile, which wins over a
/// student profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Teacher,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Teacher => "teacher",
            UserRole::Admin => "admin",
        }
    }

    /// Check if this role has permission to access another role's resources
    pub fn can_access(&self, target_role: &UserRole) -> bool {
        match self {
            UserRole::Admin => true,
            UserRole::Teacher => matches!(target_role, UserRole::Student | UserRole::Teacher),
            UserRole::Student => matches!(target_role, UserRole::Student),
        }
    }

    /// Teachers and administrators manage the gym; students only book and train.
    pub fn is_staff(&self) -> bool {
        self.can_access(&UserRole::Teacher)
    }

    pub fn from_profiles(active_admin: bool, teacher: bool, student: bool) -> Option<Self> {
        if active_admin {
            Some(UserRole::Admin)
        } else if teacher {
            Some(UserRole::Teacher)
        } else if student {
            Some(UserRole::Student)
        } else {
            None
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(UserRole::Student),
            "teacher" => Ok(UserRole::Teacher),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// JWT token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // user id
    pub email: String,
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: usize,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
}

/// Authenticated caller, stored in request extensions by the JWT middleware.
#[derive(Debug, Clone)]
pub struct UserSession {
    pub user_id: i64,
    pub email: String,
    pub role: UserRole,
    pub jti: String,
}

impl UserSession {
    pub fn from_claims(claims: &Claims) -> Result<Self, std::num::ParseIntError> {
        Ok(Self {
            user_id: claims.sub.parse()?,
            email: claims.email.clone(),
            role: claims.role,
            jti: claims.jti.clone(),
        })
    }
}
