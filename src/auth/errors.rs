use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::password::PasswordError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing authorization header")]
    MissingAuthHeader,
    #[error("Invalid authorization header format")]
    InvalidAuthHeaderFormat,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("Account has no active profile")]
    AccountLocked,
    #[error("Password validation failed: {0}")]
    Password(#[from] PasswordError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeaderFormat
            | AuthError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions | AuthError::AccountLocked => StatusCode::FORBIDDEN,
            AuthError::Password(err) if err.is_policy_violation() => StatusCode::BAD_REQUEST,
            AuthError::Password(_) | AuthError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AuthError::Database(_) => "Internal server error".to_string(),
            AuthError::Jwt(_) => "Invalid token".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match &self {
            AuthError::InvalidCredentials => "Invalid credentials",
            AuthError::InvalidToken => "Invalid token",
            AuthError::TokenExpired => "Token expired",
            AuthError::MissingAuthHeader => "Missing authorization header",
            AuthError::InvalidAuthHeaderFormat => "Invalid authorization header format",
            AuthError::InsufficientPermissions => "Insufficient permissions",
            AuthError::AccountLocked => "Account locked",
            AuthError::Password(err) if err.is_policy_violation() => "Password validation failed",
            AuthError::Password(_) => "Password processing error",
            AuthError::Database(_) => "Database error",
            AuthError::Jwt(_) => "Token error",
        };

        if status.is_server_error() {
            tracing::error!("Authentication failure: {}", self);
        }

        let body = Json(json!({
            "error": error_message,
            "message": self.user_message(),
        }));

        (status, body).into_response()
    }
}
