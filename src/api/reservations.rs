use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use sqlx::PgPool;
use validator::Validate;

use crate::auth::{jwt_auth_middleware, staff_only_middleware, AuthService};
use crate::calendar;
use crate::error::AppError;
use crate::models::{
    BookableClass, CreateReservationRequest, Reservation, ReservationDetails, ReservationList,
    ReservationQuery, StudentOption,
};
use crate::services::{ClassService, ReservationService, UserService};

#[derive(Clone)]
pub struct ReservationsState {
    reservations: ReservationService,
    classes: ClassService,
    users: UserService,
}

/// Choices offered by the "new reservation" form.
#[derive(Debug, Serialize)]
pub struct BookingOptions {
    pub students: Vec<StudentOption>,
    pub classes: Vec<BookableClass>,
}

#[derive(Debug, Serialize)]
pub struct CreatedReservation {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub enrolled: i64,
    pub is_full: bool,
}

/// Reservation management, staff only
pub fn reservation_routes(db: PgPool, auth_service: AuthService) -> Router {
    let state = ReservationsState {
        reservations: ReservationService::new(db.clone()),
        classes: ClassService::new(db.clone()),
        users: UserService::new(db),
    };

    Router::new()
        .route("/", get(list_reservations).post(create_reservation))
        .route("/options", get(booking_options))
        .route("/:reservation_id", get(get_reservation).delete(delete_reservation))
        .route_layer(middleware::from_fn(staff_only_middleware))
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(state)
}

#[tracing::instrument(skip(state))]
async fn list_reservations(
    State(state): State<ReservationsState>,
    Query(query): Query<ReservationQuery>,
) -> Result<Json<ReservationList>, AppError> {
    Ok(Json(state.reservations.list_reservations(&query).await?))
}

/// Students and bookable future classes
#[tracing::instrument(skip(state))]
async fn booking_options(State(state): State<ReservationsState>) -> Result<Json<BookingOptions>, AppError> {
    let students = state.users.student_options().await?;
    let classes = state.classes.bookable_classes(calendar::today()).await?;
    Ok(Json(BookingOptions { students, classes }))
}

#[tracing::instrument(skip(state, request), fields(student_id = request.student_id, class_id = request.class_id))]
async fn create_reservation(
    State(state): State<ReservationsState>,
    Json(request): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<CreatedReservation>), AppError> {
    request.validate()?;
    let booking = state.reservations.create_reservation(request).await?;
    let is_full = booking.is_full();
    Ok((
        StatusCode::CREATED,
        Json(CreatedReservation {
            reservation: booking.reservation,
            enrolled: booking.enrolled,
            is_full,
        }),
    ))
}

#[tracing::instrument(skip(state))]
async fn get_reservation(
    State(state): State<ReservationsState>,
    Path(reservation_id): Path<i64>,
) -> Result<Json<ReservationDetails>, AppError> {
    Ok(Json(state.reservations.get_reservation(reservation_id).await?))
}

#[tracing::instrument(skip(state))]
async fn delete_reservation(
    State(state): State<ReservationsState>,
    Path(reservation_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.reservations.delete_reservation(reservation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
