//! Structured logging setup.
//!
//! Logs go to stderr so that command output on stdout stays
//! machine-readable. `RUST_LOG` wins over `logging.level`.

use tracing_subscriber::EnvFilter;
use worldlab_core::config::LoggingConfig;

/// Install the global `tracing` subscriber.
pub fn init(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
