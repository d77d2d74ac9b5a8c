//! Error types for the storage layer.
//!
//! All errors are propagated via [`StoreError`], which names the file that
//! failed so corruption reports can be acted on without guesswork.

use std::path::PathBuf;

/// Errors that can occur reading or writing `WorldLab` files.
///
/// A missing file is never an error here: stores treat it as empty history.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O operation on a store file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A non-trailing line failed to parse. The file is corrupt.
    #[error("malformed record at {}:{line}: {source}", path.display())]
    MalformedRecord {
        /// The corrupt file.
        path: PathBuf,
        /// 1-based line number of the bad record.
        line: usize,
        /// The underlying parse error.
        source: serde_json::Error,
    },

    /// The snapshot file exists but does not parse.
    #[error("malformed snapshot {}: {source}", path.display())]
    MalformedSnapshot {
        /// The snapshot file.
        path: PathBuf,
        /// The underlying parse error.
        source: serde_json::Error,
    },

    /// The cursor file holds something other than a non-negative integer.
    #[error("malformed cursor {}: {content:?}", path.display())]
    MalformedCursor {
        /// The cursor file.
        path: PathBuf,
        /// What the file contained.
        content: String,
    },

    /// A value could not be serialized for writing.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
