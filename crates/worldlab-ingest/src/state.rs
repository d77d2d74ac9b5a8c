//! Shared application state for the ingestion server.
//!
//! [`IngestState`] is built explicitly by the caller and handed to the
//! router; there is no global app instance. The queue file has exactly one
//! writer, so appends are serialized through a mutex.

use std::sync::{Mutex, PoisonError};

use worldlab_store::{FileInputQueue, StoreError};
use worldlab_types::ExternalInput;

/// State shared by all ingestion handlers.
#[derive(Debug)]
pub struct IngestState {
    /// Queue that accepted inputs are appended to.
    pub queue: FileInputQueue,
    /// Mint a `trace_id` for inputs that arrive without one.
    pub assign_trace_ids: bool,
    append_lock: Mutex<()>,
}

impl IngestState {
    /// Create state that appends to `queue`.
    pub const fn new(queue: FileInputQueue, assign_trace_ids: bool) -> Self {
        Self {
            queue,
            assign_trace_ids,
            append_lock: Mutex::new(()),
        }
    }

    /// Append one input, one writer at a time. Blocks on file I/O.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the queue file cannot be written.
    pub fn append(&self, input: &ExternalInput) -> Result<(), StoreError> {
        let _guard = self
            .append_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.queue.append(input)
    }
}
