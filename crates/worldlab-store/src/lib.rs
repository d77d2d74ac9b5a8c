//! File-backed persistence for `WorldLab`.
//!
//! Everything the world remembers lives in a handful of plain files under a
//! data directory. The event log is the source of truth; the snapshot and
//! cursor are derived conveniences that can always be rebuilt or reset.
//!
//! # Layout
//!
//! ```text
//! <data_dir>/
//!     |-- events.jsonl       FileEventStore   (append-only events)
//!     |-- snapshot.json      SnapshotStore    (latest checkpoint, atomic)
//!     |-- input_queue.jsonl  FileInputQueue   (appended by ingestion)
//!     +-- cursor.txt         CursorFile       (queue lines consumed, atomic)
//! ```
//!
//! # Modules
//!
//! - [`event_store`] -- Durable JSON-lines event log
//! - [`snapshot_store`] -- World state checkpoints
//! - [`input_queue`] -- External input queue read by cursor
//! - [`cursor`] -- Persisted queue cursor
//! - [`error`] -- Shared error types

pub mod cursor;
pub mod error;
pub mod event_store;
mod fsutil;
pub mod input_queue;
pub mod snapshot_store;

// Re-export primary types for convenience.
pub use cursor::CursorFile;
pub use error::StoreError;
pub use event_store::FileEventStore;
pub use input_queue::FileInputQueue;
pub use snapshot_store::{Snapshot, SnapshotStore};
