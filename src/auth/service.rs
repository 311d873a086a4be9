use sqlx::PgPool;

use crate::auth::password::verify_password;
use crate::auth::{AuthError, AuthResponse, JwtService, LoginRequest, UserInfo, UserRole, UserSession};
use crate::models::full_name;

#[derive(Debug, Clone, sqlx::FromRow)]
struct Credentials {
    id: i64,
    email: String,
    password_hash: String,
    first_name: String,
    first_surname: String,
    second_surname: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileFlags {
    is_admin: bool,
    is_teacher: bool,
    is_student: bool,
}

#[derive(Debug, Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    db: PgPool,
}

impl AuthService {
    pub fn new(db: PgPool, jwt_secret: &str, expires_minutes: i64) -> Self {
        Self {
            jwt_service: JwtService::with_expiry(jwt_secret, expires_minutes),
            db,
        }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt_service
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let user = sqlx::query_as::<_, Credentials>(
            "SELECT id, email, password_hash, first_name, first_surname, second_surname
             FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(request.email.trim())
        .fetch_optional(&self.db)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&request.password, &user.password_hash)? {
            tracing::info!(user_id = user.id, "Rejected login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let role = self.resolve_role(user.id).await?.ok_or(AuthError::AccountLocked)?;
        let access_token = self.jwt_service.create_access_token(user.id, &user.email, role)?;

        tracing::info!(user_id = user.id, role = role.as_str(), "User logged in");

        Ok(AuthResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_expires_in_seconds(),
            user: UserInfo {
                id: user.id,
                full_name: full_name(&user.first_name, &user.first_surname, user.second_surname.as_deref()),
                email: user.email,
                role,
            },
        })
    }

    /// Validate user session from token
    pub fn validate_session(&self, token: &str) -> Result<UserSession, AuthError> {
        self.jwt_service.extract_user_session(token)
    }

    /// Current profile of the caller, re-reading the role from the database.
    pub async fn current_user(&self, session: &UserSession) -> Result<UserInfo, AuthError> {
        let user = sqlx::query_as::<_, Credentials>(
            "SELECT id, email, password_hash, first_name, first_surname, second_surname
             FROM users WHERE id = $1",
        )
        .bind(session.user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AuthError::InvalidToken)?;

        let role = self.resolve_role(user.id).await?.ok_or(AuthError::AccountLocked)?;

        Ok(UserInfo {
            id: user.id,
            full_name: full_name(&user.first_name, &user.first_surname, user.second_surname.as_deref()),
            email: user.email,
            role,
        })
    }

    async fn resolve_role(&self, user_id: i64) -> Result<Option<UserRole>, AuthError> {
        let flags = sqlx::query_as::<_, ProfileFlags>(
            "SELECT
                EXISTS(SELECT 1 FROM administrators WHERE user_id = $1 AND active) AS is_admin,
                EXISTS(SELECT 1 FROM teachers WHERE user_id = $1) AS is_teacher,
                EXISTS(SELECT 1 FROM students WHERE user_id = $1) AS is_student",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(UserRole::from_profiles(flags.is_admin, flags.is_teacher, flags.is_student))
    }
}
