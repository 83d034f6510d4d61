//! Metrics collection and monitoring for the Agnosis API
//!
//! Prometheus counters behind a lazily-initialized registry, with minimal
//! overhead on the request path. `render` produces the text exposition
//! format served at `/metrics`.

use std::time::Instant;

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, Opts, Registry, TextEncoder};

use crate::core::error::{Error, Result};

/// Global metrics registry
static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Process start, for uptime reporting
static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

/// Operation counters for the API and the graph store
pub struct ApiMetrics {
    /// Total HTTP requests handled
    pub http_requests: IntCounter,
    /// Failed authentication attempts (bad credentials or bad tokens)
    pub auth_failures: IntCounter,
    /// Session tokens issued
    pub tokens_issued: IntCounter,
    /// Total graph nodes created
    pub nodes_created: IntCounter,
    /// Total graph edges created
    pub edges_created: IntCounter,
    /// Reactions recorded (likes and dislikes)
    pub reactions_recorded: IntCounter,
}

impl ApiMetrics {
    fn register(registry: &Registry) -> std::result::Result<Self, prometheus::Error> {
        let make = |name: &str, help: &str| -> std::result::Result<IntCounter, prometheus::Error> {
            let counter = IntCounter::with_opts(Opts::new(name, help))?;
            registry.register(Box::new(counter.clone()))?;
            Ok(counter)
        };

        Ok(Self {
            http_requests: make("agnosis_http_requests_total", "HTTP requests handled")?,
            auth_failures: make("agnosis_auth_failures_total", "Failed authentication attempts")?,
            tokens_issued: make("agnosis_tokens_issued_total", "Session tokens issued")?,
            nodes_created: make("agnosis_nodes_created_total", "Graph nodes created")?,
            edges_created: make("agnosis_edges_created_total", "Graph edges created")?,
            reactions_recorded: make("agnosis_reactions_recorded_total", "Reactions recorded")?,
        })
    }
}

static METRICS: Lazy<ApiMetrics> = Lazy::new(|| {
    // Counter names are unique and static, so registration cannot collide
    ApiMetrics::register(&REGISTRY).expect("metrics registration failed")
});

/// Force registration of all metrics and start the uptime clock
pub fn init_registry() {
    Lazy::force(&METRICS);
    Lazy::force(&STARTED_AT);
}

/// Access the global metrics
pub fn metrics() -> &'static ApiMetrics {
    &METRICS
}

/// Seconds since the process started
pub fn uptime_secs() -> u64 {
    STARTED_AT.elapsed().as_secs()
}

/// Render all registered metrics in the Prometheus text format
pub fn render() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| Error::internal(format!("metrics encoding failed: {}", e)))?;
    String::from_utf8(buffer).map_err(|e| Error::internal(format!("metrics not utf-8: {}", e)))
}
