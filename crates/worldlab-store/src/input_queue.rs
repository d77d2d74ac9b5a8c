//! Durable external-input queue (JSON lines).
//!
//! The ingestion boundary appends one [`ExternalInput`] per line; the world
//! consumes them incrementally by cursor. Queue positions are
//! newline-terminated lines, so a blank line still advances the cursor while
//! a half-written final line does not.

use std::path::{Path, PathBuf};

use worldlab_types::ExternalInput;

use crate::error::StoreError;
use crate::fsutil;

/// Append-only input queue backed by a JSON-lines file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInputQueue {
    path: PathBuf,
}

impl FileInputQueue {
    /// Create a queue for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Return the queue file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably append one input.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be written or synced.
    pub fn append(&self, input: &ExternalInput) -> Result<(), StoreError> {
        let line = serde_json::to_string(input)?;
        fsutil::append_line(&self.path, &line)?;
        tracing::debug!(
            channel = %input.channel,
            name = %input.name,
            "Queued external input"
        );
        Ok(())
    }

    /// Read every input appended at position `cursor` or later.
    ///
    /// Returns the inputs and the new cursor (the number of complete lines
    /// in the queue). A missing file yields nothing and leaves the cursor as
    /// it was. A cursor past the end of the queue means the file was
    /// truncated or replaced; nothing is returned and the cursor is kept so
    /// no record is ever delivered twice.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MalformedRecord`] if a complete line at or after
    /// the cursor does not parse.
    pub fn read_since(&self, cursor: usize) -> Result<(Vec<ExternalInput>, usize), StoreError> {
        let Some(contents) = fsutil::read_optional(&self.path)? else {
            return Ok((Vec::new(), cursor));
        };

        let (lines, _unfinished) = fsutil::split_lines(&contents);
        let total = lines.len();
        if cursor > total {
            tracing::warn!(
                path = %self.path.display(),
                cursor,
                queue_len = total,
                "Cursor is past the end of the input queue"
            );
            return Ok((Vec::new(), cursor));
        }

        let mut inputs = Vec::new();
        for (idx, raw) in lines.iter().enumerate().skip(cursor) {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let input =
                serde_json::from_str(raw).map_err(|source| StoreError::MalformedRecord {
                    path: self.path.clone(),
                    line: idx.saturating_add(1),
                    source,
                })?;
            inputs.push(input);
        }

        Ok((inputs, total))
    }
}
