//! Authenticated user directory.

use axum::{extract::State, middleware, routing::get, Json, Router};
use tracing::instrument;

use crate::{
    auth::{dto::PublicUser, require_auth, AuthService},
    error::{ApiError, ApiResult},
    object_id::ValidId,
    state::AppState,
};

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

#[instrument(skip(auth))]
pub async fn list_users(State(auth): State<AuthService>) -> ApiResult<Json<Vec<PublicUser>>> {
    Ok(Json(auth.list_users().await?))
}

#[instrument(skip(auth))]
pub async fn get_user(
    State(auth): State<AuthService>,
    ValidId(id): ValidId,
) -> ApiResult<Json<PublicUser>> {
    auth.get_profile(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("User {id} not found")))
}
