//! System routes: health and metrics exposition

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::api::server::AppState;
use crate::core::error::{Error, Result};
use crate::system::metrics;

/// Liveness check with version and uptime
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": crate::VERSION,
        "uptime_secs": metrics::uptime_secs(),
    }))
}

/// Prometheus text exposition; 404 when disabled by configuration
pub async fn metrics_export(State(state): State<AppState>) -> Result<Response> {
    if !state.metrics_enabled {
        return Err(Error::not_found("Metrics are disabled"));
    }

    let body = metrics::render()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
