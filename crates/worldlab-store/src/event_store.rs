//! Append-only durable event log (JSON lines).
//!
//! Events are the source of truth for the world's history. Each record is one
//! JSON object on its own line; append order on disk is replay order.
//!
//! # Read policy
//!
//! - a missing file is an empty log;
//! - blank lines are skipped and occupy no record position;
//! - an unterminated final line is a write in progress (or a crash) and is
//!   ignored;
//! - a terminated final line that does not parse is a torn write and is
//!   dropped with a warning (the next append truncates it, so it never ends
//!   up in the middle of the file);
//! - any other line that does not parse is corruption and fails the read
//!   with [`StoreError::MalformedRecord`].

use std::path::{Path, PathBuf};

use worldlab_types::Event;

use crate::error::StoreError;
use crate::fsutil;

/// Durable, append-only event log backed by a JSON-lines file.
///
/// Safe to read from another process while one writer appends; never safe
/// with two concurrent writers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEventStore {
    path: PathBuf,
}

impl FileEventStore {
    /// Create a store for the log file at `path`. Nothing is touched on disk
    /// until the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Return the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably append one event.
    ///
    /// A trailing line that readers would drop as torn is removed first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be opened, repaired,
    /// written, or synced.
    pub fn append(&self, event: &Event) -> Result<(), StoreError> {
        let line = serde_json::to_string(event)?;
        fsutil::append_checked(&self.path, &line, |raw| {
            serde_json::from_str::<Event>(raw).is_ok()
        })?;
        tracing::debug!(time = event.time, kind = %event.kind, "Appended event");
        Ok(())
    }

    /// Load every well-formed record in append order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MalformedRecord`] on a corrupt non-trailing line
    /// and [`StoreError::Io`] if the file cannot be read.
    pub fn load_all(&self) -> Result<Vec<Event>, StoreError> {
        self.load_from(0)
    }

    /// Load the records at position `offset` and later (0-based).
    ///
    /// Records before `offset` are still decoded so that any record
    /// [`load_all`](Self::load_all) rejects is rejected here too.
    ///
    /// # Errors
    ///
    /// Same as [`load_all`](Self::load_all).
    pub fn load_from(&self, offset: usize) -> Result<Vec<Event>, StoreError> {
        let Some(contents) = fsutil::read_optional(&self.path)? else {
            return Ok(Vec::new());
        };

        let (lines, tail) = fsutil::split_lines(&contents);
        if !tail.trim().is_empty() {
            tracing::debug!(
                path = %self.path.display(),
                "Ignoring unterminated trailing record"
            );
        }

        // The last non-blank line is only "trailing" when nothing follows it.
        let trailing = if tail.trim().is_empty() {
            lines.iter().rposition(|line| !line.trim().is_empty())
        } else {
            None
        };

        let mut events = Vec::new();
        let mut position: usize = 0;

        for (idx, raw) in lines.iter().enumerate() {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            match serde_json::from_str::<Event>(raw) {
                Ok(event) => {
                    if position >= offset {
                        events.push(event);
                    }
                    position = position.saturating_add(1);
                }
                Err(source) if Some(idx) == trailing => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = idx.saturating_add(1),
                        error = %source,
                        "Dropping torn trailing record"
                    );
                }
                Err(source) => {
                    return Err(StoreError::MalformedRecord {
                        path: self.path.clone(),
                        line: idx.saturating_add(1),
                        source,
                    });
                }
            }
        }

        Ok(events)
    }
}
