//! Password hashing with bcrypt

use crate::core::error::{Error, Result};

/// Hash a plaintext password with the configured work factor
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).map_err(|e| Error::internal(format!("bcrypt hash failed: {}", e)))
}

/// Check a plaintext password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash)
        .map_err(|e| Error::internal(format!("bcrypt verify failed: {}", e)))
}
