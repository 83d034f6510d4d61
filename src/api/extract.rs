//! Request extractors
//!
//! `Valid<T>` deserializes a JSON body into a typed request and runs its
//! declared validation before the handler body executes. `AuthClaims` pulls
//! the bearer token out of the Authorization header and verifies it against
//! the configured secret.

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::auth::Claims;
use crate::core::error::{Error, Result};
use crate::system::metrics;

use super::server::AppState;

/// Request-body validation, checked after deserialization
pub trait Validate {
    /// Check declared constraints, accumulating per-field violations
    fn validate(&self) -> Result<()>;
}

/// Collects per-field violations while a request body is checked
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<(String, String)>,
}

impl FieldErrors {
    /// Record a violation for `field` unless `ok` holds
    pub fn require(&mut self, field: &str, ok: bool, violation: &str) {
        if !ok {
            self.errors.push((field.to_string(), violation.to_string()));
        }
    }

    /// Resolve to a validation error if any violation was recorded
    pub fn finish(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::validation("Invalid request body", self.errors))
        }
    }
}

/// A JSON body that deserialized cleanly and passed validation
pub struct Valid<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rej| {
            Error::validation(
                "Invalid request body",
                [("body".to_string(), rej.body_text())],
            )
        })?;
        value.validate()?;
        Ok(Valid(value))
    }
}

/// Verified claims of the requesting user
pub struct AuthClaims(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthClaims {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| reject("Missing Authorization Header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| reject("Invalid Authorization Header"))?;

        let claims = state.tokens.verify(token).map_err(|err| {
            metrics::metrics().auth_failures.inc();
            err
        })?;

        Ok(AuthClaims(claims))
    }
}

fn reject(msg: &str) -> Error {
    metrics::metrics().auth_failures.inc();
    Error::unauthorized(msg.to_string())
}
