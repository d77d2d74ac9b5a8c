//! Input gateway trait and implementations.
//!
//! The [`InputGateway`] trait is the only way the runtime learns about facts
//! produced outside the world. Each call to [`pull`] returns what arrived
//! since the previous call.
//!
//! - [`QueueGateway`] reads the durable input queue by cursor.
//! - [`InMemoryGateway`] drains an in-process buffer; used by tests and
//!   embedders that push inputs directly.
//! - [`Detached`] has no inputs at all; a runtime built without a gateway
//!   uses it, so `ingest()` on such a runtime is a typed no-op.
//!
//! [`pull`]: InputGateway::pull

use std::collections::VecDeque;

use worldlab_store::{FileInputQueue, StoreError};
use worldlab_types::ExternalInput;

/// Errors that can occur while pulling inputs.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The backing queue could not be read.
    #[error("input queue error: {0}")]
    Queue(#[from] StoreError),
}

/// A source of external inputs.
///
/// Implementations must never return the same input twice from one instance
/// and must not skip inputs as long as their source is only appended to.
pub trait InputGateway {
    /// Return every input that arrived since the previous call (or since
    /// construction, on the first call).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the source cannot be read. The gateway's
    /// position is left unchanged in that case.
    fn pull(&mut self) -> Result<Vec<ExternalInput>, GatewayError>;
}

/// Gateway over the durable input queue.
///
/// Holds the number of queue lines already consumed. It does not persist the
/// cursor: callers that want continuity across restarts save
/// [`cursor`](Self::cursor) and hand it back to [`new`](Self::new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueGateway {
    queue: FileInputQueue,
    cursor: usize,
}

impl QueueGateway {
    /// Create a gateway that starts reading at `cursor`.
    pub const fn new(queue: FileInputQueue, cursor: usize) -> Self {
        Self { queue, cursor }
    }

    /// Number of queue lines consumed so far.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// The underlying queue.
    pub const fn queue(&self) -> &FileInputQueue {
        &self.queue
    }
}

impl InputGateway for QueueGateway {
    fn pull(&mut self) -> Result<Vec<ExternalInput>, GatewayError> {
        let (inputs, cursor) = self.queue.read_since(self.cursor)?;
        tracing::debug!(
            from = self.cursor,
            to = cursor,
            pulled = inputs.len(),
            "Pulled inputs from queue"
        );
        self.cursor = cursor;
        Ok(inputs)
    }
}

/// In-process gateway: inputs pushed in are handed out once, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryGateway {
    pending: VecDeque<ExternalInput>,
}

impl InMemoryGateway {
    /// Create an empty gateway.
    pub const fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    /// Queue an input for the next [`pull`](InputGateway::pull).
    pub fn push(&mut self, input: ExternalInput) {
        self.pending.push_back(input);
    }

    /// Number of inputs waiting.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl FromIterator<ExternalInput> for InMemoryGateway {
    fn from_iter<I: IntoIterator<Item = ExternalInput>>(iter: I) -> Self {
        Self {
            pending: iter.into_iter().collect(),
        }
    }
}

impl InputGateway for InMemoryGateway {
    fn pull(&mut self) -> Result<Vec<ExternalInput>, GatewayError> {
        Ok(self.pending.drain(..).collect())
    }
}

/// No gateway: pulling always yields nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Detached;

impl InputGateway for Detached {
    fn pull(&mut self) -> Result<Vec<ExternalInput>, GatewayError> {
        Ok(Vec::new())
    }
}
