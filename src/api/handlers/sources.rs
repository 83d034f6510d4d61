//! Source routes

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::extract::{AuthClaims, FieldErrors, Valid, Validate};
use crate::api::server::AppState;
use crate::core::error::Result;
use crate::domain::sources;

/// Body of `POST /api/sources`
#[derive(Debug, Deserialize)]
pub struct AddSourceRequest {
    /// Source name; posting the same name twice yields the same source
    pub name: String,
}

impl Validate for AddSourceRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        errors.require("name", !self.name.trim().is_empty(), "must not be empty");
        errors.finish()
    }
}

/// All known sources, ordered by name
pub async fn list_sources(
    State(state): State<AppState>,
    AuthClaims(_): AuthClaims,
) -> Result<Json<Value>> {
    let all = sources::all_sources(&*state.store)?;
    Ok(Json(json!({ "sources": all })))
}

/// Find or create a source by name; responds 201 either way
pub async fn add_source(
    State(state): State<AppState>,
    AuthClaims(_): AuthClaims,
    Valid(req): Valid<AddSourceRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let source = sources::add_source(&*state.store, &req.name)?;
    Ok((StatusCode::CREATED, Json(json!({ "source": source }))))
}
