use axum::{
    extract::{Path, Query, State},
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
use crate::models::{ClassDetails, ClassQuery, ClassRequest, GymClass, TeacherOption};
use crate::services::ClassService;

/// Class schedule: anyone signed in reads, staff write
pub fn class_routes(db: PgPool, auth_service: AuthService) -> Router {
    let staff_only = middleware::from_fn(staff_only_middleware);

    Router::new()
        .route("/", get(list_classes).post(create_class.layer(staff_only.clone())))
        .route("/teachers", get(teacher_options))
        .route(
            "/:class_id",
            get(get_class)
                .put(update_class.layer(staff_only.clone()))
                .delete(delete_class.layer(staff_only)),
        )
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(ClassService::new(db))
}

#[tracing::instrument(skip(classes))]
async fn list_classes(
    State(classes): State<ClassService>,
    Query(query): Query<ClassQuery>,
) -> Result<Json<Vec<ClassDetails>>, AppError> {
    Ok(Json(classes.list_classes(&query).await?))
}

#[tracing::instrument(skip(classes))]
async fn get_class(State(classes): State<ClassService>, Path(class_id): Path<i64>) -> Result<Json<ClassDetails>, AppError> {
    Ok(Json(classes.get_class(class_id).await?))
}

#[tracing::instrument(skip(classes, request), fields(date = %request.class_date))]
async fn create_class(
    State(classes): State<ClassService>,
    Json(request): Json<ClassRequest>,
) -> Result<(StatusCode, Json<GymClass>), AppError> {
    request.validate()?;
    let class = classes.create_class(request).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

#[tracing::instrument(skip(classes, request))]
async fn update_class(
    State(classes): State<ClassService>,
    Path(class_id): Path<i64>,
    Json(request): Json<ClassRequest>,
) -> Result<Json<GymClass>, AppError> {
    request.validate()?;
    Ok(Json(classes.update_class(class_id, request).await?))
}

#[tracing::instrument(skip(classes))]
async fn delete_class(State(classes): State<ClassService>, Path(class_id): Path<i64>) -> Result<StatusCode, AppError> {
    classes.delete_class(class_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn teacher_options(State(classes): State<ClassService>) -> Result<Json<Vec<TeacherOption>>, AppError> {
    Ok(Json(classes.teacher_options().await?))
}
