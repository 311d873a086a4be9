use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use sqlx::PgPool;
use validator::Validate;

use crate::auth::{admin_only_middleware, jwt_auth_middleware, AuthService};
use crate::error::AppError;
use crate::models::{CreateUserRequest, Paginated, UpdateUserRequest, UserDetails, UserQuery, UserSummary};
use crate::services::UserService;

/// User management, administrators only
pub fn user_routes(db: PgPool, auth_service: AuthService) -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:user_id", get(get_user).put(update_user).delete(delete_user))
        .route_layer(middleware::from_fn(admin_only_middleware))
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(UserService::new(db))
}

#[tracing::instrument(skip(users))]
async fn list_users(
    State(users): State<UserService>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Paginated<UserSummary>>, AppError> {
    Ok(Json(users.list_users(&query).await?))
}

#[tracing::instrument(skip(users))]
async fn get_user(State(users): State<UserService>, Path(user_id): Path<i64>) -> Result<Json<UserDetails>, AppError> {
    Ok(Json(users.get_user(user_id).await?))
}

#[tracing::instrument(skip(users, request), fields(role = request.profile.role().as_str()))]
async fn create_user(
    State(users): State<UserService>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserDetails>), AppError> {
    request.validate()?;
    let user = users.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[tracing::instrument(skip(users, request))]
async fn update_user(
    State(users): State<UserService>,
    Path(user_id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserDetails>, AppError> {
    request.validate()?;
    Ok(Json(users.update_user(user_id, request).await?))
}

#[tracing::instrument(skip(users))]
async fn delete_user(State(users): State<UserService>, Path(user_id): Path<i64>) -> Result<StatusCode, AppError> {
    users.delete_user(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
