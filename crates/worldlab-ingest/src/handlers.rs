//! HTTP handlers for the ingestion server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness check |
//! | `POST` | `/v1/inputs` | Validate an input and append it to the queue |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::IngestError;
use crate::payload::InputPayload;
use crate::state::IngestState;

/// Response body for an accepted input.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct AcceptedResponse {
    /// Always `true`.
    pub ok: bool,
    /// Trace id stored with the input, if any.
    pub trace_id: Option<String>,
    /// Queue file the input was appended to.
    pub queue_path: String,
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Report that the server is up.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// POST /v1/inputs
// ---------------------------------------------------------------------------

/// Accept one input.
///
/// The body must be an [`InputPayload`]. Malformed JSON and rule violations
/// are rejected with `422` and nothing is stored.
pub async fn post_input(
    State(state): State<Arc<IngestState>>,
    body: Result<Json<InputPayload>, JsonRejection>,
) -> Result<impl IntoResponse, IngestError> {
    let payload = match parse(body) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "Rejected input");
            return Err(err);
        }
    };

    let mut input = payload.into_input();
    if input.trace_id.is_none() && state.assign_trace_ids {
        input.trace_id = Some(Uuid::new_v4().to_string());
    }

    let writer = Arc::clone(&state);
    let record = input.clone();
    tokio::task::spawn_blocking(move || writer.append(&record))
        .await
        .map_err(|e| IngestError::Internal(format!("queue writer failed: {e}")))??;

    info!(
        source = %input.source,
        channel = %input.channel,
        name = %input.name,
        trace_id = input.trace_id.as_deref().unwrap_or(""),
        "Accepted input"
    );

    Ok(Json(AcceptedResponse {
        ok: true,
        trace_id: input.trace_id,
        queue_path: state.queue.path().display().to_string(),
    }))
}

fn parse(body: Result<Json<InputPayload>, JsonRejection>) -> Result<InputPayload, IngestError> {
    let Json(payload) = body.map_err(|rejection| IngestError::InvalidPayload(rejection.body_text()))?;
    payload.validate()?;
    Ok(payload)
}
