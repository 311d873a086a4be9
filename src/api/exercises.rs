use axum::{
    extract::{Path, State},
    handler::Handler,
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use sqlx::PgPool;
use validator::Validate;

use crate::auth::{jwt_auth_middleware, staff_only_middleware, AuthService};
use crate::error::AppError;
use crate::models::{Exercise, ExerciseRequest};
use crate::services::ExerciseService;

/// Exercise catalogue: anyone signed in reads, staff write
pub fn exercise_routes(db: PgPool, auth_service: AuthService) -> Router {
    let staff_only = middleware::from_fn(staff_only_middleware);

    Router::new()
        .route("/", get(list_exercises).post(create_exercise.layer(staff_only.clone())))
        .route(
            "/:exercise_id",
            get(get_exercise)
                .put(update_exercise.layer(staff_only.clone()))
                .delete(delete_exercise.layer(staff_only)),
        )
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(ExerciseService::new(db))
}

#[tracing::instrument(skip(exercises))]
async fn list_exercises(State(exercises): State<ExerciseService>) -> Result<Json<Vec<Exercise>>, AppError> {
    Ok(Json(exercises.list_exercises().await?))
}

#[tracing::instrument(skip(exercises))]
async fn get_exercise(
    State(exercises): State<ExerciseService>,
    Path(exercise_id): Path<i64>,
) -> Result<Json<Exercise>, AppError> {
    Ok(Json(exercises.get_exercise(exercise_id).await?))
}

#[tracing::instrument(skip(exercises, request))]
async fn create_exercise(
    State(exercises): State<ExerciseService>,
    Json(request): Json<ExerciseRequest>,
) -> Result<(StatusCode, Json<Exercise>), AppError> {
    request.validate()?;
    let exercise = exercises.create_exercise(request).await?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

#[tracing::instrument(skip(exercises, request))]
async fn update_exercise(
    State(exercises): State<ExerciseService>,
    Path(exercise_id): Path<i64>,
    Json(request): Json<ExerciseRequest>,
) -> Result<Json<Exercise>, AppError> {
    request.validate()?;
    Ok(Json(exercises.update_exercise(exercise_id, request).await?))
}

#[tracing::instrument(skip(exercises))]
async fn delete_exercise(
    State(exercises): State<ExerciseService>,
    Path(exercise_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    exercises.delete_exercise(exercise_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
