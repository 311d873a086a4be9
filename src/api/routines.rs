use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Extension, Router,
};
use sqlx::PgPool;
use validator::Validate;

use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::error::AppError;
use crate::models::{RoutineDetails, RoutineList, RoutineQuery, RoutineRequest};
use crate::services::RoutineService;

/// Workout routines; students only ever reach their own
pub fn routine_routes(db: PgPool, auth_service: AuthService) -> Router {
    Router::new()
        .route("/", get(list_routines).post(create_routine))
        .route("/:routine_id", get(get_routine).put(update_routine).delete(delete_routine))
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(RoutineService::new(db))
}

#[tracing::instrument(skip(routines, session), fields(user_id = session.user_id))]
async fn list_routines(
    State(routines): State<RoutineService>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<RoutineQuery>,
) -> Result<Json<RoutineList>, AppError> {
    let viewer = routines.viewer(&session).await?;
    Ok(Json(routines.list_routines(viewer, &query).await?))
}

#[tracing::instrument(skip(routines, session), fields(user_id = session.user_id))]
async fn get_routine(
    State(routines): State<RoutineService>,
    Extension(session): Extension<UserSession>,
    Path(routine_id): Path<i64>,
) -> Result<Json<RoutineDetails>, AppError> {
    let viewer = routines.viewer(&session).await?;
    Ok(Json(routines.get_routine(viewer, routine_id).await?))
}

#[tracing::instrument(skip(routines, session, request), fields(user_id = session.user_id))]
async fn create_routine(
    State(routines): State<RoutineService>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<RoutineRequest>,
) -> Result<(StatusCode, Json<RoutineDetails>), AppError> {
    request.validate()?;
    let viewer = routines.viewer(&session).await?;
    let routine = routines.create_routine(viewer, request).await?;
    Ok((StatusCode::CREATED, Json(routine)))
}

#[tracing::instrument(skip(routines, session, request), fields(user_id = session.user_id))]
async fn update_routine(
    State(routines): State<RoutineService>,
    Extension(session): Extension<UserSession>,
    Path(routine_id): Path<i64>,
    Json(request): Json<RoutineRequest>,
) -> Result<Json<RoutineDetails>, AppError> {
    request.validate()?;
    let viewer = routines.viewer(&session).await?;
    Ok(Json(routines.update_routine(viewer, routine_id, request).await?))
}

#[tracing::instrument(skip(routines, session), fields(user_id = session.user_id))]
async fn delete_routine(
    State(routines): State<RoutineService>,
    Extension(session): Extension<UserSession>,
    Path(routine_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let viewer = routines.viewer(&session).await?;
    routines.delete_routine(viewer, routine_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
