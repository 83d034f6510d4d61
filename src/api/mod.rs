//! HTTP API for Agnosis
//!
//! Router construction, request extractors, handlers, and the mapping of
//! the crate's error taxonomy onto HTTP responses.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod server;

pub use server::{create_app, start_server, AppState};
