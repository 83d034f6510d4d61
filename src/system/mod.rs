//! System-level facilities
//!
//! Metrics collection and process uptime tracking.

pub mod metrics;
