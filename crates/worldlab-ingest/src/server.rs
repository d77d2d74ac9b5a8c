//! Bind the ingestion router to a TCP socket and serve it.
//!
//! [`start_server`] runs until `Ctrl-C`. [`serve_until`] takes any shutdown
//! future instead, which lets callers and tests stop the server themselves.
//! Either way, requests already accepted are allowed to finish, so an input
//! that was acknowledged is always on disk.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::router::build_router;
use crate::state::IngestState;

/// Where the ingestion server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host address (e.g. `127.0.0.1`).
    pub host: String,
    /// TCP port. `0` asks the OS for a free one.
    pub port: u16,
}

impl ServerConfig {
    /// Resolve `host:port` into a socket address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the host is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ServerError::Bind(format!("invalid address {}: {e}", self.host)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 8000,
        }
    }
}

/// Serve the ingestion API until `Ctrl-C`.
///
/// # Errors
///
/// Returns an error if the address is invalid, the listener cannot bind,
/// or serving fails.
pub async fn start_server(
    config: &ServerConfig,
    state: Arc<IngestState>,
) -> Result<(), ServerError> {
    let listener = bind(config).await?;
    serve_until(listener, state, ctrl_c()).await
}

/// Bind a listener for `config`.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is invalid or in use.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr = config.socket_addr()?;
    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))
}

/// Serve on an already bound `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] on a fatal I/O error.
pub async fn serve_until(
    listener: TcpListener,
    state: Arc<IngestState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let local = listener
        .local_addr()
        .map_err(|e| ServerError::Serve(format!("listener has no address: {e}")))?;
    info!(
        addr = %local,
        queue = %state.queue.path().display(),
        "Ingest server listening"
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Serve(e.to_string()))?;

    info!(addr = %local, "Ingest server stopped");
    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler the server runs until killed.
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Errors from binding or running the ingestion server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The address is invalid or could not be bound.
    #[error("bind error: {0}")]
    Bind(String),

    /// Serving stopped on an I/O error.
    #[error("serve error: {0}")]
    Serve(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use worldlab_store::FileInputQueue;

    use super::*;

    #[test]
    fn defaults_to_loopback() {
        let addr = ServerConfig::default().socket_addr().unwrap();
        assert_eq!(addr, "127.0.0.1:8000".parse().unwrap());
    }

    #[test]
    fn hostname_is_not_an_address() {
        let config = ServerConfig {
            host: "localhost".to_owned(),
            port: 8000,
        };
        assert!(matches!(config.socket_addr(), Err(ServerError::Bind(_))));
    }

    #[tokio::test]
    async fn stops_when_shutdown_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(IngestState::new(
            FileInputQueue::new(dir.path().join("input_queue.jsonl")),
            false,
        ));
        let config = ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: 0,
        };

        let listener = bind(&config).await.unwrap();
        serve_until(listener, state, async {}).await.unwrap();
    }
}
