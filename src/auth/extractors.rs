use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tracing::{debug, warn};

use super::{dto::PublicUser, services::AuthService};
use crate::{
    error::{ApiError, UNAUTHORIZED},
    object_id::ObjectId,
};

/// Identity resolved by [`require_auth`] for the current request only.
#[derive(Debug, Clone)]
pub struct AuthenticatedContext {
    pub user: PublicUser,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware for protected routers. Rejects with 401 unless the request
/// carries a valid bearer token whose subject still exists; otherwise
/// attaches an [`AuthenticatedContext`] and runs the handler.
pub async fn require_auth(
    State(auth): State<AuthService>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(request.headers()).map(str::to_owned) else {
        warn!("missing or malformed Authorization header");
        return Err(ApiError::Unauthorized(UNAUTHORIZED));
    };

    let user = auth.resolve_token(&token).await?;
    debug!(user_id = %user.id, "request authenticated");

    request.extensions_mut().insert(AuthenticatedContext { user: user.into() });
    Ok(next.run(request).await)
}

/// Result of looking up a user field by name.
#[derive(Debug, Clone, PartialEq)]
pub enum UserField {
    /// No authenticated user on this request.
    NoUser,
    /// The user has no field with that name.
    Missing,
    Value(Value),
}

/// The user attached by [`require_auth`], or `None` on routes it does not
/// guard. Reading it never resolves anything.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<PublicUser>);

impl CurrentUser {
    pub fn get(&self) -> Option<&PublicUser> {
        self.0.as_ref()
    }

    pub fn id(&self) -> Option<&ObjectId> {
        self.0.as_ref().map(|u| &u.id)
    }

    pub fn email(&self) -> Option<&str> {
        self.0.as_ref().map(|u| u.email.as_str())
    }

    /// Looks up a field by its JSON name (`"firstName"`, `"profilePic"`...).
    pub fn field(&self, name: &str) -> UserField {
        let Some(user) = &self.0 else {
            return UserField::NoUser;
        };
        match serde_json::to_value(user) {
            Ok(Value::Object(mut map)) => {
                map.remove(name).map_or(UserField::Missing, UserField::Value)
            }
            _ => UserField::Missing,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(
            parts
                .extensions
                .get::<AuthenticatedContext>()
                .map(|ctx| ctx.user.clone()),
        ))
    }
}
