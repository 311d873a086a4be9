use axum::{routing::get, Router};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use super::auth::auth_routes;
use super::calendar::calendar_routes;
use super::classes::class_routes;
use super::exercises::exercise_routes;
use super::health::health_check;
use super::reservations::reservation_routes;
use super::routines::routine_routes;
use super::users::user_routes;
use crate::auth::{cors_layer, security_headers_layer, AuthService};
use crate::config::AppConfig;

pub fn create_routes(db: PgPool, config: &AppConfig) -> Router {
    let auth_service = AuthService::new(db.clone(), &config.jwt_secret, config.jwt_expires_minutes);

    let api_v1 = Router::new()
        .nest("/auth", auth_routes(auth_service.clone()))
        .nest("/users", user_routes(db.clone(), auth_service.clone()))
        .nest("/exercises", exercise_routes(db.clone(), auth_service.clone()))
        .nest("/classes", class_routes(db.clone(), auth_service.clone()))
        .nest("/reservations", reservation_routes(db.clone(), auth_service.clone()))
        .nest("/routines", routine_routes(db.clone(), auth_service.clone()));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_v1)
        .nest("/reservas/api", calendar_routes(db, auth_service))
        .layer(TraceLayer::new_for_http())
        .layer(security_headers_layer())
        .layer(cors_layer())
}
