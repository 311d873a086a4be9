use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: &'static str, id: i64 },
    #[error("{0}")]
    BadRequest(String),
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn not_found(resource: &'static str, id: i64) -> Self {
        AppError::NotFound { resource, id }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Auth(err) => err.status_code(),
            AppError::Database(err) => match err {
                sqlx::Error::RowNotFound => StatusCode::NOT_FOUND,
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StatusCode::CONFLICT,
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    if is_still_referenced(db_err.message()) {
                        StatusCode::CONFLICT
                    } else {
                        StatusCode::BAD_REQUEST
                    }
                }
                sqlx::Error::Database(db_err) if db_err.is_check_violation() => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self.status_code() {
            StatusCode::NOT_FOUND => "not_found",
            StatusCode::BAD_REQUEST => "bad_request",
            StatusCode::UNAUTHORIZED => "unauthorized",
            StatusCode::FORBIDDEN => "forbidden",
            StatusCode::CONFLICT => "conflict",
            _ => "internal_error",
        }
    }

    /// Message safe to show to API clients.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(_) => "Validation failed".to_string(),
            AppError::Auth(err) => err.user_message(),
            AppError::Database(sqlx::Error::RowNotFound) => "Resource not found".to_string(),
            AppError::Database(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                match db_err.constraint() {
                    Some("reservations_student_class_unique") => {
                        "The student already has a reservation in this class".to_string()
                    }
                    Some(c) if c.contains("email") => {
                        "An account with this email address already exists".to_string()
                    }
                    _ => "Resource already exists".to_string(),
                }
            }
            AppError::Database(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                if is_still_referenced(db_err.message()) {
                    "Resource is still in use and cannot be deleted".to_string()
                } else {
                    "Invalid reference to related resource".to_string()
                }
            }
            AppError::Database(sqlx::Error::Database(db_err)) if db_err.is_check_violation() => {
                "Invalid data provided".to_string()
            }
            AppError::Database(_) => "Database error occurred".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Postgres words a delete blocked by a referencing row as
/// `update or delete on table ... violates foreign key constraint`.
fn is_still_referenced(message: &str) -> bool {
    message.starts_with("update or delete on table")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Internal service error: {:#}", self);
        } else {
            tracing::debug!("Client error: {}", self);
        }

        let mut body = json!({
            "error": self.error_code(),
            "message": self.user_message(),
        });
        if let AppError::Validation(errors) = &self {
            body["fields"] = json!(errors.field_errors());
        }

        (status, Json(body)).into_response()
    }
}
