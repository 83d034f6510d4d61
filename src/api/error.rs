//! HTTP rendering of the error taxonomy
//!
//! Every handler returns `Result<T>`; this impl turns the error half into
//! the `{"msg": ...}` envelope the web client expects, with validation
//! failures adding per-field `"errors"`. Server-side errors are logged and
//! never leak their message to the response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::core::error::Error;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Error::Validation { message, errors } => {
                let mut body = json!({ "msg": message });
                if !errors.is_empty() {
                    body["errors"] = json!(errors);
                }
                (StatusCode::BAD_REQUEST, body)
            }
            Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "msg": msg })),
            Error::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "msg": msg })),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "msg": msg })),
            Error::Conflict(msg) => (StatusCode::CONFLICT, json!({ "msg": msg })),
            other => {
                tracing::error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "msg": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
