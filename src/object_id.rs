//! 24-character hex record identifiers.
//!
//! The store mints these for new users and every route that takes an id in
//! its path validates it here first, so a malformed id is a client error and
//! never reaches the store.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ApiError;

lazy_static! {
    static ref OBJECT_ID_RE: Regex = Regex::new(r"^[a-fA-F0-9]{24}$").unwrap();
}

pub fn is_valid(value: &str) -> bool {
    OBJECT_ID_RE.is_match(value)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid ObjectId: {0}")]
pub struct InvalidObjectId(pub String);

impl From<InvalidObjectId> for ApiError {
    fn from(e: InvalidObjectId) -> Self {
        ApiError::validation(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "String", into = "String")]
#[sqlx(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Four bytes of big-endian unix seconds followed by eight random bytes.
    pub fn generate() -> Self {
        let secs = OffsetDateTime::now_utc().unix_timestamp() as u32;
        let tail: [u8; 8] = rand::random();

        let mut id = String::with_capacity(24);
        for b in secs.to_be_bytes().iter().chain(tail.iter()) {
            let _ = write!(id, "{b:02x}");
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ObjectId {
    type Error = InvalidObjectId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidObjectId(value))
        }
    }
}

impl FromStr for ObjectId {
    type Err = InvalidObjectId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path extractor for routes with a single `:id` segment.
pub struct ValidId(pub ObjectId);

#[async_trait]
impl<S> FromRequestParts<S> for ValidId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?;
        Ok(ValidId(ObjectId::try_from(raw)?))
    }
}
