//! Axum router construction for the ingestion API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::IngestState;

/// Build the Axum router for the ingestion server.
///
/// The router includes:
/// - `GET /health` -- liveness check
/// - `POST /v1/inputs` -- append one validated input to the queue
///
/// CORS allows any origin so local plugin UIs can post directly.
pub fn build_router(state: Arc<IngestState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/inputs", post(handlers::post_input))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
