use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        claims::TokenPayload,
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        jwt::JwtKeys,
        password,
        repo::{StoreError, UserStore},
        repo_types::{NewUser, User},
    },
    error::{ApiError, ApiResult, INVALID_CREDENTIALS, UNAUTHORIZED},
    object_id::ObjectId,
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 8;

const EMAIL_TAKEN: &str = "User with this email already exists";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Register, login and profile lookups over a [`UserStore`].
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    keys: Arc<JwtKeys>,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.store.clone(), state.jwt.clone())
    }
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, keys: Arc<JwtKeys>) -> Self {
        Self { store, keys }
    }

    pub async fn register(&self, mut req: RegisterRequest) -> ApiResult<AuthResponse> {
        req.email = req.email.trim().to_string();

        if !is_valid_email(&req.email) {
            warn!(email = %req.email, "invalid email");
            return Err(ApiError::validation("Invalid email"));
        }
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            warn!("password too short");
            return Err(ApiError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if req.profile.first_name.trim().is_empty() || req.profile.last_name.trim().is_empty() {
            return Err(ApiError::validation("First and last name are required"));
        }

        // The store's unique constraint still decides races past this point.
        if self.store.find_by_email(&req.email).await.map_err(internal)?.is_some() {
            warn!(email = %req.email, "email already registered");
            return Err(ApiError::conflict(EMAIL_TAKEN));
        }

        let password_hash = hash_blocking(req.password).await?;

        let user = match self
            .store
            .create(NewUser {
                email: req.email,
                password_hash,
                profile: req.profile,
            })
            .await
        {
            Ok(u) => u,
            Err(StoreError::DuplicateEmail) => {
                warn!("email registered concurrently");
                return Err(ApiError::conflict(EMAIL_TAKEN));
            }
            Err(e) => return Err(internal(e)),
        };

        info!(user_id = %user.id, email = %user.email, "user registered");
        self.respond_with_token(user)
    }

    pub async fn login(&self, mut req: LoginRequest) -> ApiResult<AuthResponse> {
        req.email = req.email.trim().to_string();

        let user = match self.store.find_by_email(&req.email).await.map_err(internal)? {
            Some(u) => u,
            None => {
                // Burn the same argon2 work as a real mismatch.
                verify_blocking(req.password, password::dummy_hash().to_owned()).await?;
                warn!(email = %req.email, "login unknown email");
                return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
            }
        };

        if !verify_blocking(req.password, user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
        }

        info!(user_id = %user.id, email = %user.email, "user logged in");
        self.respond_with_token(user)
    }

    /// `None` means the id no longer resolves.
    pub async fn get_profile(&self, user_id: &ObjectId) -> ApiResult<Option<PublicUser>> {
        let user = self.store.find_by_id(user_id).await.map_err(internal)?;
        Ok(user.map(PublicUser::from))
    }

    pub async fn list_users(&self) -> ApiResult<Vec<PublicUser>> {
        let users = self.store.list().await.map_err(internal)?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    /// Verifies a bearer token and loads the user it names. Every failure is
    /// the same `Unauthorized`.
    pub async fn resolve_token(&self, token: &str) -> ApiResult<User> {
        let payload = self.keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::Unauthorized(UNAUTHORIZED)
        })?;

        match self.store.find_by_id(&payload.subject).await.map_err(internal)? {
            Some(user) => Ok(user),
            None => {
                warn!(user_id = %payload.subject, "token subject no longer exists");
                Err(ApiError::Unauthorized(UNAUTHORIZED))
            }
        }
    }

    fn respond_with_token(&self, user: User) -> ApiResult<AuthResponse> {
        let access_token = self
            .keys
            .issue(&TokenPayload {
                subject: user.id.clone(),
                email: user.email.clone(),
            })
            .context("jwt sign failed")?;
        Ok(AuthResponse {
            access_token,
            user: user.into(),
        })
    }
}

fn internal(e: StoreError) -> ApiError {
    match e {
        StoreError::Backend(e) => ApiError::Internal(e),
        other => ApiError::Internal(anyhow::Error::new(other)),
    }
}

async fn hash_blocking(plain: String) -> ApiResult<String> {
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .context("hash task failed")??;
    Ok(hash)
}

async fn verify_blocking(plain: String, hash: String) -> ApiResult<bool> {
    let ok = tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .context("verify task failed")?;
    Ok(ok)
}
