//! Snapshot persistence for the derived world state.
//!
//! A snapshot pairs a [`WorldState`] with the log offset it covers, so
//! replay only has to fold the records after that offset. Each save
//! supersedes the previous snapshot; it is written atomically so a crash
//! never leaves a half-written file behind.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use worldlab_types::WorldState;

use crate::error::StoreError;
use crate::fsutil;

/// A checkpoint of the world state.
///
/// `state` equals the reduction of log records `0..=covered_up_to_offset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Position of the last log record folded into `state`.
    pub covered_up_to_offset: usize,
    /// The world state at that position.
    pub state: WorldState,
}

/// Single-file snapshot store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Create a store for the snapshot file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Return the snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically replace the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the temp file cannot be written or
    /// renamed into place.
    pub fn save(&self, state: &WorldState, covered_up_to_offset: usize) -> Result<(), StoreError> {
        let snapshot = SnapshotRef {
            covered_up_to_offset,
            state,
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        fsutil::write_atomic(&self.path, &bytes)?;
        tracing::debug!(
            path = %self.path.display(),
            covered_up_to_offset,
            time = state.time,
            "Saved snapshot"
        );
        Ok(())
    }

    /// Load the latest snapshot, or `None` if none has been saved.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MalformedSnapshot`] if the file does not parse
    /// and [`StoreError::Io`] if it cannot be read.
    pub fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let Some(contents) = fsutil::read_optional(&self.path)? else {
            return Ok(None);
        };
        let snapshot =
            serde_json::from_str(&contents).map_err(|source| StoreError::MalformedSnapshot {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(snapshot))
    }
}

/// Borrowing twin of [`Snapshot`] so saving does not clone the state.
#[derive(Serialize)]
struct SnapshotRef<'a> {
    covered_up_to_offset: usize,
    state: &'a WorldState,
}
