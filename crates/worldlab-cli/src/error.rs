//! Error types for the `worldlab` binary.
//!
//! [`CliError`] wraps every failure a command can hit, so `main` can
//! propagate with `?` and report one line on stderr.

/// Top-level error for the `worldlab` binary.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: worldlab_core::config::ConfigError,
    },

    /// Running or replaying the world failed.
    #[error("runtime error: {source}")]
    Runtime {
        /// The underlying runtime error.
        #[from]
        source: worldlab_core::RuntimeError,
    },

    /// Reading or writing a data file failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: worldlab_store::StoreError,
    },

    /// The ingestion server failed to start or stopped with an error.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: worldlab_ingest::ServerError,
    },

    /// A report could not be rendered as JSON.
    #[error("output error: {source}")]
    Output {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
