use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        extractors::{require_auth, CurrentUser},
        services::AuthService,
    },
    error::{ApiError, ApiResult, UNAUTHORIZED},
    extract::ValidJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn profile_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/profile", get(profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

#[instrument(skip(auth, payload))]
pub async fn register(
    State(auth): State<AuthService>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let resp = auth.register(payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[instrument(skip(auth, payload))]
pub async fn login(
    State(auth): State<AuthService>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    Ok(Json(auth.login(payload).await?))
}

#[instrument(skip(auth, current))]
pub async fn profile(
    State(auth): State<AuthService>,
    current: CurrentUser,
) -> ApiResult<Json<PublicUser>> {
    let Some(user_id) = current.id().cloned() else {
        // Only reachable if the route is mounted without the guard.
        warn!("profile requested without an authenticated user");
        return Err(ApiError::Unauthorized(UNAUTHORIZED));
    };

    auth.get_profile(&user_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            warn!(%user_id, "authenticated user missing from store");
            ApiError::not_found("User not found")
        })
}
