//! JSON endpoints behind the reservations calendar.
//!
//! Paths keep the `/reservas/api` prefix the browser widget already calls.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use sqlx::PgPool;

use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::calendar;
use crate::error::AppError;
use crate::models::{CalendarEntry, CalendarMonth, CalendarQuery, ClassSlot, ReserveRequest, ReserveResponse};
use crate::services::CalendarService;

pub fn calendar_routes(db: PgPool, auth_service: AuthService) -> Router {
    Router::new()
        .route("/clases", get(month_classes))
        .route("/clase/:class_id", get(class_slot))
        .route("/reservar", post(reserve))
        .route("/calendario", get(month_view))
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(CalendarService::new(db))
}

/// Classes of one month, for placing on the grid
#[tracing::instrument(skip(calendar_service))]
async fn month_classes(
    State(calendar_service): State<CalendarService>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<CalendarEntry>>, AppError> {
    let month = query.month(calendar::today())?;
    Ok(Json(calendar_service.month_entries(month).await?))
}

#[tracing::instrument(skip(calendar_service))]
async fn month_view(
    State(calendar_service): State<CalendarService>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarMonth>, AppError> {
    let today = calendar::today();
    let month = query.month(today)?;
    Ok(Json(calendar_service.month_view(month, today).await?))
}

#[tracing::instrument(skip(calendar_service, session), fields(user_id = session.user_id))]
async fn class_slot(
    State(calendar_service): State<CalendarService>,
    Extension(session): Extension<UserSession>,
    Path(class_id): Path<i64>,
) -> Result<Json<ClassSlot>, AppError> {
    let slot = calendar_service
        .class_slot(&session, class_id, calendar::today())
        .await?;
    Ok(Json(slot))
}

/// Book the calling student; failures keep the `{ok: false, error}` shape
#[tracing::instrument(skip(calendar_service, session), fields(user_id = session.user_id))]
async fn reserve(
    State(calendar_service): State<CalendarService>,
    Extension(session): Extension<UserSession>,
    payload: Result<Json<ReserveRequest>, JsonRejection>,
) -> (StatusCode, Json<ReserveResponse>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("Unreadable reservation body: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(ReserveResponse::refused("Request body must be {\"clase_id\": <class id>}")),
            );
        }
    };

    match calendar_service.reserve(&session, request.clase_id).await {
        Ok(booking) => (
            StatusCode::OK,
            Json(ReserveResponse::booked(booking.enrolled, booking.is_full())),
        ),
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                tracing::error!("Reservation failed: {:#}", err);
            }
            (status, Json(ReserveResponse::refused(err.user_message())))
        }
    }
}
