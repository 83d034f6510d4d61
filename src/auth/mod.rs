//! Authentication primitives
//!
//! Password hashing (bcrypt) and stateless session tokens (HS256 JWTs).
//! Route-level bearer extraction lives in `crate::api::extract`.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenSigner};
