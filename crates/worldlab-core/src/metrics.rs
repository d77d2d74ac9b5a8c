//! Read-only metrics projected from world state and the event log.
//!
//! [`compute_metrics`] is pure: the same state and log always produce the
//! same [`WorldMetrics`]. Running counters come straight from the state;
//! the per-channel breakdown is a scan over the log.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use worldlab_types::{EventKind, Payload, WorldState};

use crate::event_log::EventLog;

/// Channel bucket for inputs whose payload has no `channel`.
pub const UNKNOWN_CHANNEL: &str = "UNKNOWN";

/// Observability summary of one world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorldMetrics {
    /// Current world time.
    pub time: u64,
    /// Ticks folded so far.
    pub tick_count: u64,
    /// External inputs folded so far.
    pub input_count: u64,
    /// Executed actions folded so far.
    pub action_count: u64,
    /// External inputs in the log, grouped by channel.
    pub inputs_by_channel: BTreeMap<String, u64>,
    /// Compact view of the most recent input.
    pub last_input_summary: Option<InputSummary>,
    /// Compact view of the most recent action.
    pub last_action_summary: Option<ActionSummary>,
}

/// Who sent the most recent input, and what it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputSummary {
    /// Input source.
    pub source: String,
    /// Input channel.
    pub channel: String,
    /// Input name.
    pub name: String,
}

/// What the most recent action was, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionSummary {
    /// Time of the `ACTION_EXECUTED` event.
    pub time: Option<u64>,
    /// Action performed.
    pub action_type: String,
    /// Why it was performed.
    pub reason: String,
}

/// Derive metrics from `state` and `log`.
pub fn compute_metrics(state: &WorldState, log: &EventLog) -> WorldMetrics {
    let mut inputs_by_channel: BTreeMap<String, u64> = BTreeMap::new();
    for event in log.of_kind(&EventKind::ExternalInput) {
        let channel = event
            .payload
            .get("channel")
            .map_or_else(|| UNKNOWN_CHANNEL.to_owned(), text);
        let count = inputs_by_channel.entry(channel).or_insert(0);
        *count = count.saturating_add(1);
    }

    WorldMetrics {
        time: state.time,
        tick_count: state.tick_count,
        input_count: state.input_count,
        action_count: state.action_count,
        inputs_by_channel,
        last_input_summary: state.last_input.as_ref().map(|input| InputSummary {
            source: field_text(input, "source"),
            channel: field_text(input, "channel"),
            name: field_text(input, "name"),
        }),
        last_action_summary: state.last_action.as_ref().map(|action| ActionSummary {
            time: action.get("time").and_then(Value::as_u64),
            action_type: field_text(action, "action_type"),
            reason: field_text(action, "reason"),
        }),
    }
}

/// A payload field as display text; empty when absent.
fn field_text(payload: &Payload, key: &str) -> String {
    payload.get(key).map(text).unwrap_or_default()
}

/// Strings as-is, anything else as its JSON text.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
