//! HTTP ingestion boundary for `WorldLab`.
//!
//! Input plugins post JSON to this server instead of writing the queue file
//! themselves. Each accepted input is validated and appended as one line to
//! the input queue; the runner picks it up on its next ingest.
//!
//! The server never touches the event log or the world state. It is the
//! only writer of the queue file.
//!
//! # Modules
//!
//! - [`error`] -- `IngestError` and its HTTP mapping
//! - [`handlers`] -- `GET /health` and `POST /v1/inputs`
//! - [`payload`] -- the validated wire contract
//! - [`router`] -- Axum router assembly
//! - [`server`] -- bind, serve, shut down
//! - [`state`] -- shared queue handle

pub mod error;
pub mod handlers;
pub mod payload;
pub mod router;
pub mod server;
pub mod state;

pub use error::IngestError;
pub use payload::InputPayload;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, bind, serve_until, start_server};
pub use state::IngestState;
