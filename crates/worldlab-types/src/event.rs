//! The atomic fact record and its kind tag.
//!
//! An [`Event`] is an immutable record of something that happened in the
//! world: a logical time, a kind tag, and a JSON object payload. Events are
//! appended to the log exactly once and never mutated or deleted. Ordering
//! within a log is by append position, not by `time` -- several events may
//! share the same logical time.

use core::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// JSON object payload carried by events, inputs, and decisions.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Wire tag of a world clock advance.
pub const WORLD_TICK: &str = "WORLD_TICK";

/// Wire tag of a fact injected from outside the world.
pub const EXTERNAL_INPUT: &str = "EXTERNAL_INPUT";

/// Wire tag of a policy judgment about a fact.
pub const POLICY_DECISION: &str = "POLICY_DECISION";

/// Wire tag of a recommended action that was carried out.
pub const ACTION_EXECUTED: &str = "ACTION_EXECUTED";

/// The kind tag of an [`Event`].
///
/// Serialized as the bare wire string. Kinds the engine does not know about
/// are preserved verbatim in [`EventKind::Other`] so that logs written by
/// newer producers still load; the reducer treats them as no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// The world clock advanced by one.
    WorldTick,
    /// An external actor injected a fact.
    ExternalInput,
    /// The policy engine judged a fact.
    PolicyDecision,
    /// A recommended action was executed.
    ActionExecuted,
    /// Any other kind tag.
    Other(String),
}

impl EventKind {
    /// Return the wire string for this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::WorldTick => WORLD_TICK,
            Self::ExternalInput => EXTERNAL_INPUT,
            Self::PolicyDecision => POLICY_DECISION,
            Self::ActionExecuted => ACTION_EXECUTED,
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for EventKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            WORLD_TICK => Self::WorldTick,
            EXTERNAL_INPUT => Self::ExternalInput,
            POLICY_DECISION => Self::PolicyDecision,
            ACTION_EXECUTED => Self::ActionExecuted,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for EventKind {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_owned())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(tag) => tag,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable fact recorded in the event log.
///
/// The persisted form is one JSON object per line with exactly the fields
/// `time`, `kind`, and `payload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// Logical world time at which the fact was recorded.
    pub time: u64,
    /// Kind tag deciding how the reducer folds this fact.
    #[ts(type = "string")]
    pub kind: EventKind,
    /// Kind-specific data.
    #[ts(type = "Record<string, unknown>")]
    pub payload: Payload,
}

impl Event {
    /// Create an event from its parts.
    pub const fn new(time: u64, kind: EventKind, payload: Payload) -> Self {
        Self {
            time,
            kind,
            payload,
        }
    }

    /// Create a `WORLD_TICK` event stamped with the new world time.
    pub const fn world_tick(time: u64, payload: Payload) -> Self {
        Self::new(time, EventKind::WorldTick, payload)
    }

    /// Look up a payload field as a string.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(serde_json::Value::as_str)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn known_kinds_round_trip_through_wire_strings() {
        for tag in [WORLD_TICK, EXTERNAL_INPUT, POLICY_DECISION, ACTION_EXECUTED] {
            let kind = EventKind::from(tag);
            assert!(!matches!(kind, EventKind::Other(_)));
            assert_eq!(String::from(kind), tag);
        }
    }

    #[test]
    fn unknown_kind_is_preserved() {
        let kind = EventKind::from("OPERATOR_NOTE");
        assert_eq!(kind, EventKind::Other("OPERATOR_NOTE".to_owned()));
        assert_eq!(kind.to_string(), "OPERATOR_NOTE");
    }

    #[test]
    fn event_uses_wire_field_names() {
        let mut payload = Payload::new();
        payload.insert("i".to_owned(), json!(0));
        let event = Event::world_tick(1, payload);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({"time": 1, "kind": "WORLD_TICK", "payload": {"i": 0}})
        );
    }

    #[test]
    fn event_parses_unknown_kind() {
        let event: Event =
            serde_json::from_str(r#"{"time":3,"kind":"CUSTOM","payload":{}}"#).unwrap();
        assert_eq!(event.time, 3);
        assert_eq!(event.kind.as_str(), "CUSTOM");
        assert!(event.payload.is_empty());
    }

    #[test]
    fn event_rejects_missing_payload() {
        let parsed = serde_json::from_str::<Event>(r#"{"time":3,"kind":"WORLD_TICK"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn payload_str_reads_string_fields_only() {
        let mut payload = Payload::new();
        payload.insert("channel".to_owned(), json!("equipment"));
        payload.insert("count".to_owned(), json!(2));
        let event = Event::new(0, EventKind::ExternalInput, payload);

        assert_eq!(event.payload_str("channel"), Some("equipment"));
        assert_eq!(event.payload_str("count"), None);
        assert_eq!(event.payload_str("missing"), None);
    }
}
