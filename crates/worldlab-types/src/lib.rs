//! Shared value types for `WorldLab`.
//!
//! Every crate in the workspace speaks in these types: the store persists
//! them, the core folds and judges them, and the ingestion boundary accepts
//! them. Wire-facing types also flow to `TypeScript` via `ts-rs` so that
//! input plugins written in JavaScript share the same contract.
//!
//! # Modules
//!
//! - [`event`] -- [`Event`], [`EventKind`], and the kind wire tags
//! - [`input`] -- [`ExternalInput`], the input queue record
//! - [`decision`] -- [`Decision`], [`Severity`], [`ExecutedAction`]
//! - [`state`] -- [`WorldState`], the derived world snapshot

pub mod decision;
pub mod event;
pub mod input;
pub mod state;

// Re-export all public types at crate root for convenience.
pub use decision::{Decision, ExecutedAction, Severity};
pub use event::{
    ACTION_EXECUTED, EXTERNAL_INPUT, Event, EventKind, POLICY_DECISION, Payload, WORLD_TICK,
};
pub use input::ExternalInput;
pub use state::WorldState;
