//! Core system types and foundations
//!
//! This module contains the fundamental building blocks of the Agnosis API:
//! configuration and error handling shared by every other module.

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::Config;
pub use error::{Error, Result, StorageError};
