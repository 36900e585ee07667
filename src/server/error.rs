// Server error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Failures the chat endpoint can surface to the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("generation failed: {0}")]
    Generation(#[from] anyhow::Error),
    #[error("generation task was cancelled")]
    TaskCancelled,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
