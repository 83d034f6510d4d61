//! Session tokens
//!
//! HS256 JWTs carrying the authenticated user's identity. Claims mirror the
//! payload the web client expects: `sub` duplicates `userId`, and
//! `iat`/`nbf`/`exp` bound the token's validity window.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

/// Claims carried by an Agnosis session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's id
    pub sub: String,
    /// The user's id (duplicated for client convenience)
    #[serde(rename = "userId")]
    pub user_id: String,
    /// The user's email
    pub email: String,
    /// The user's username
    pub username: String,
    /// Issued-at (unix seconds)
    pub iat: i64,
    /// Not-before (unix seconds)
    pub nbf: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

/// Issues and verifies session tokens with a shared secret
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    /// Create a signer from the configured secret and token lifetime
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issue a token for a user
    pub fn issue(&self, user_id: &str, email: &str, username: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            user_id: user_id.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            iat: now,
            nbf: now,
            exp: now + self.ttl.as_secs() as i64,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| Error::internal(format!("token encoding failed: {}", e)))
    }

    /// Verify a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.validate_nbf = true;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    Error::unauthorized("Token has expired")
                }
                jsonwebtoken::errors::ErrorKind::ImmatureSignature => {
                    Error::unauthorized("Token not yet valid")
                }
                _ => Error::unauthorized("Invalid token"),
            })
    }
}
