//! The derived world state.
//!
//! [`WorldState`] is what the world looks like after folding some prefix of
//! the event log. It is never edited in place: the reducer consumes one value
//! and returns the next.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::event::Payload;

/// Snapshot of the world derived from the event log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldState {
    /// Time of the most recent `WORLD_TICK`.
    pub time: u64,
    /// Number of `WORLD_TICK` events folded so far.
    pub tick_count: u64,
    /// Number of `EXTERNAL_INPUT` events folded so far.
    pub input_count: u64,
    /// Payload of the most recent `EXTERNAL_INPUT`.
    #[ts(type = "Record<string, unknown> | null")]
    pub last_input: Option<Payload>,
    /// Number of `ACTION_EXECUTED` events folded so far.
    #[serde(default)]
    pub action_count: u64,
    /// Payload of the most recent `ACTION_EXECUTED`, plus its `time`.
    #[serde(default)]
    #[ts(type = "Record<string, unknown> | null")]
    pub last_action: Option<Payload>,
}

impl WorldState {
    /// The state of a world in which nothing has happened yet.
    pub const fn initial() -> Self {
        Self {
            time: 0,
            tick_count: 0,
            input_count: 0,
            last_input: None,
            action_count: 0,
            last_action: None,
        }
    }
}
