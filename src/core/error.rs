//! Error types and handling for the Agnosis API
//!
//! This module defines all error types used throughout the system. The API
//! layer maps this taxonomy onto HTTP statuses; everything below it only
//! deals in these variants.

use std::collections::HashMap;

use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Agnosis API
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request payload failed schema validation
    #[error("{message}")]
    Validation {
        /// Human-readable summary of the failure
        message: String,
        /// Per-field violations
        errors: HashMap<String, String>,
    },

    /// Authentication failed (bad credentials, missing/invalid/expired token)
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to touch this resource
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness conflict (duplicate email, username, source name)
    #[error("{0}")]
    Conflict(String),

    /// Storage layer errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal system errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Node not found
    #[error("node not found: {id}")]
    NodeNotFound {
        /// ID of the missing node
        id: String,
    },

    /// A unique property constraint was violated
    #[error("{label}.{key} already exists")]
    ConstraintViolation {
        /// Node label the constraint is declared on
        label: String,
        /// Property key that must be unique
        key: String,
    },

    /// A constrained property was missing or not a string
    #[error("invalid value for constrained property {label}.{key}")]
    InvalidProperty {
        /// Node label the constraint is declared on
        label: String,
        /// Offending property key
        key: String,
    },

    /// Unsupported storage backend requested
    #[error("unsupported storage backend: {0}")]
    UnsupportedBackend(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error with per-field details
    pub fn validation(
        msg: impl Into<String>,
        errors: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self::Validation {
            message: msg.into(),
            errors: errors.into_iter().collect(),
        }
    }

    /// Create an authentication error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create an authorization error
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this is a client error (4xx equivalent)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation { .. }
                | Error::Unauthorized(_)
                | Error::Forbidden(_)
                | Error::NotFound(_)
                | Error::Conflict(_)
        )
    }

    /// Check if this is a server error (5xx equivalent)
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_and_server_errors_are_disjoint() {
        let unauthorized = Error::unauthorized("no token");
        assert!(unauthorized.is_client_error());
        assert!(!unauthorized.is_server_error());

        let internal = Error::internal("boom");
        assert!(internal.is_server_error());
        assert!(!internal.is_client_error());
    }

    #[test]
    fn validation_error_keeps_field_details() {
        let err = Error::validation(
            "Invalid request body",
            [("url".to_string(), "required".to_string())],
        );
        match err {
            Error::Validation { errors, .. } => {
                assert_eq!(errors.get("url").map(String::as_str), Some("required"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
