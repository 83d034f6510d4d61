//! Agnosis - a graph-backed JSON API for sharing ideas
//!
//! Agnosis stores users, ideas, and sources as nodes in an embedded property
//! graph and records posting, seeing, and reacting as relationships. On top
//! of the reaction graph it answers recommendation queries: random, unseen,
//! popular, and collaboratively-scored "agreeable"/"disagreeable" ideas.
#![warn(missing_docs)]

// Core foundational modules
pub mod core;

// Main functional modules
pub mod api;
pub mod auth;
pub mod domain;
pub mod graph;
pub mod storage;
pub mod system;

// Re-export commonly used items for convenience
pub use crate::core::{Config, Error, Result};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize tracing and the metrics registry
pub fn init(logging: &crate::core::config::LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(logging.level.clone()));

    match logging.format.as_str() {
        "json" => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!("Initializing {} v{}", NAME, VERSION);

    // Touch the lazily-registered metrics so registration errors surface at startup
    system::metrics::init_registry();

    Ok(())
}
