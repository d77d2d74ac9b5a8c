//! Error types for the ingestion boundary.
//!
//! [`IngestError`] converts into an Axum response with a
//! `{"error": ..., "status": ...}` JSON body. Anything the sender got wrong
//! is a `422`; a failure to store a valid input is a `500`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use worldlab_store::StoreError;

/// Errors that can occur while accepting an input.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The body is not JSON, or not shaped like an input.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The body parsed but broke a field rule.
    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// The input queue could not be appended to.
    #[error("queue write failed: {0}")]
    Store(#[from] StoreError),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IngestError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidPayload(_) | Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
