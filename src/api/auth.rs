use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use validator::Validate;

use crate::auth::{jwt_auth_middleware, AuthResponse, AuthService, LoginRequest, UserInfo, UserSession};
use crate::error::AppError;

/// Authentication routes
pub fn auth_routes(auth_service: AuthService) -> Router {
    Router::new()
        .route("/login", post(login))
        .route(
            "/me",
            get(me).route_layer(middleware::from_fn_with_state(
                auth_service.clone(),
                jwt_auth_middleware,
            )),
        )
        .with_state(auth_service)
}

/// Login user
#[tracing::instrument(skip(auth_service, request))]
async fn login(
    State(auth_service): State<AuthService>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    request.validate()?;
    let response = auth_service.login(request).await?;
    Ok(Json(response))
}

/// Profile of the authenticated user
#[tracing::instrument(skip(auth_service, session), fields(user_id = session.user_id))]
async fn me(
    State(auth_service): State<AuthService>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<UserInfo>, AppError> {
    let user = auth_service.current_user(&session).await?;
    Ok(Json(user))
}
