//! Configuration loading and typed config structures for `WorldLab`.
//!
//! The canonical configuration lives in `worldlab-config.yaml` at the project
//! root. Every field has a default, so a missing file or an empty document
//! yields a working configuration. A few deployment knobs can be overridden
//! from the environment:
//!
//! - `WORLDLAB_DATA_DIR` overrides `storage.data_dir`
//! - `WORLDLAB_HTTP_HOST` overrides `ingest.host`
//! - `WORLDLAB_HTTP_PORT` overrides `ingest.port`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "worldlab-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level `WorldLab` configuration.
///
/// Mirrors the structure of `worldlab-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorldLabConfig {
    /// World identity.
    #[serde(default)]
    pub world: WorldConfig,

    /// Where the durable files live and how often to snapshot.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Policy rule parameters.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Defaults for the repeated run loop.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// HTTP ingestion boundary settings.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WorldLabConfig {
    /// Load configuration from a YAML file at the given path, then apply
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load `path` if it exists, otherwise start from defaults. Environment
    /// overrides apply either way.
    ///
    /// # Errors
    ///
    /// Same as [`from_file`](Self::from_file) when the file exists.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `WORLDLAB_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// An unparsable port is ignored with a warning rather than failing the
    /// whole load.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("WORLDLAB_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(val);
        }
        if let Some(val) = lookup("WORLDLAB_HTTP_HOST") {
            self.ingest.host = val;
        }
        if let Some(val) = lookup("WORLDLAB_HTTP_PORT") {
            match val.parse::<u16>() {
                Ok(port) => self.ingest.port = port,
                Err(_) => {
                    tracing::warn!(value = %val, "Ignoring invalid WORLDLAB_HTTP_PORT");
                }
            }
        }
    }
}

/// World identity configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable world name, used in log lines.
    #[serde(default = "default_world_name")]
    pub name: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
        }
    }
}

/// Durable storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the event log, snapshot, queue, and cursor.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Snapshot whenever the log length is a multiple of this. `0` disables
    /// snapshots.
    #[serde(default = "default_snapshot_every")]
    pub snapshot_every: usize,
}

impl StorageConfig {
    /// Resolve the file paths under [`data_dir`](Self::data_dir).
    pub fn paths(&self) -> DataPaths {
        DataPaths::under(&self.data_dir)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            snapshot_every: default_snapshot_every(),
        }
    }
}

/// The durable files of one world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataPaths {
    /// External input queue (JSON lines).
    pub input_queue: PathBuf,
    /// Durable event log (JSON lines).
    pub events: PathBuf,
    /// Latest snapshot.
    pub snapshot: PathBuf,
    /// Persisted queue cursor.
    pub cursor: PathBuf,
}

impl DataPaths {
    /// Standard file names under `dir`.
    pub fn under(dir: &Path) -> Self {
        Self {
            input_queue: dir.join("input_queue.jsonl"),
            events: dir.join("events.jsonl"),
            snapshot: dir.join("snapshot.json"),
            cursor: dir.join("cursor.txt"),
        }
    }
}

/// Policy rule configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolicyConfig {
    /// Temperature (Celsius) above which a `PAUSE` is recommended.
    #[serde(default = "default_temp_high_threshold_c")]
    pub temp_high_threshold_c: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            temp_high_threshold_c: default_temp_high_threshold_c(),
        }
    }
}

/// Defaults for `worldlab run`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunnerConfig {
    /// Number of tick + ingest cycles.
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Pause between cycles in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// HTTP ingestion boundary configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IngestConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Mint a UUID `trace_id` for inputs that arrive without one.
    #[serde(default)]
    pub assign_trace_ids: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            assign_trace_ids: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_world_name() -> String {
    "worldlab".to_owned()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("out")
}

const fn default_snapshot_every() -> usize {
    50
}

const fn default_temp_high_threshold_c() -> f64 {
    92.0
}

const fn default_ticks() -> u64 {
    10
}

const fn default_tick_interval_ms() -> u64 {
    200
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_owned()
}
