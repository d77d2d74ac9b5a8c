//! Persisted consumption cursor for the input queue.
//!
//! The file holds a single decimal integer: the number of queue lines the
//! world has already consumed. It is replaced atomically on every save.

use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::fsutil;

/// Cursor file for a [`FileInputQueue`](crate::FileInputQueue).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorFile {
    path: PathBuf,
}

impl CursorFile {
    /// Create a cursor backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Return the cursor file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted cursor. A missing or empty file means `0`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MalformedCursor`] if the file holds anything
    /// other than a non-negative integer.
    pub fn load(&self) -> Result<usize, StoreError> {
        let Some(contents) = fsutil::read_optional(&self.path)? else {
            return Ok(0);
        };
        let trimmed = contents.trim();
        if trimmed.is_empty() {
            return Ok(0);
        }
        trimmed
            .parse::<usize>()
            .ok()
            .ok_or_else(|| StoreError::MalformedCursor {
                path: self.path.clone(),
                content: trimmed.to_owned(),
            })
    }

    /// Atomically persist `cursor`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be written.
    pub fn save(&self, cursor: usize) -> Result<(), StoreError> {
        fsutil::write_atomic(&self.path, cursor.to_string().as_bytes())?;
        tracing::trace!(cursor, "Persisted input cursor");
        Ok(())
    }
}
