use serde::{Deserialize, Serialize};

use crate::object_id::ObjectId;

/// The identity a token vouches for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPayload {
    pub subject: ObjectId,
    pub email: String,
}

/// JWT payload as it goes over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: ObjectId, // user ID
    pub email: String,
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}

impl From<Claims> for TokenPayload {
    fn from(c: Claims) -> Self {
        Self {
            subject: c.sub,
            email: c.email,
        }
    }
}
