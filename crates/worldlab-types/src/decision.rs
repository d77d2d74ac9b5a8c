//! Policy decisions and executed actions.
//!
//! Two separate facts close the loop from input to effect:
//!
//! - a [`Decision`] is a judgment -- what the policy recommends and why;
//! - an [`ExecutedAction`] is the record that the recommendation was carried
//!   out.
//!
//! Keeping them apart lets a reader of the log compare "recommended" with
//! "done". Neither is stored directly: both are converted to an [`Event`]
//! before being recorded.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::event::{Event, EventKind, Payload};

/// Risk level attached to a [`Decision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum Severity {
    /// Notable but harmless.
    Info,
    /// Worth a look.
    Warn,
    /// Requires intervention.
    Alert,
    /// Requires immediate intervention.
    Critical,
}

impl Severity {
    /// Return the wire string for this severity.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Alert => "ALERT",
            Self::Critical => "CRITICAL",
        }
    }
}

/// A policy judgment about one fact.
///
/// Ephemeral: the runtime records it as a `POLICY_DECISION` event and then
/// derives an [`ExecutedAction`] from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Decision {
    /// Identifier of the rule that fired (e.g. `TEMP_HIGH_PAUSE`).
    pub rule_id: String,
    /// How serious the triggering condition is.
    pub severity: Severity,
    /// Action the rule recommends (e.g. `PAUSE`).
    pub recommended_action: String,
    /// Human-readable explanation.
    pub reason: String,
    /// Values the rule looked at.
    #[ts(type = "Record<string, unknown>")]
    pub evidence: Payload,
    /// Trace id carried over from the triggering input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub trace_id: Option<String>,
}

impl Decision {
    /// Build the `POLICY_DECISION` event payload.
    pub fn to_payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("rule_id".to_owned(), Value::String(self.rule_id.clone()));
        payload.insert(
            "severity".to_owned(),
            Value::String(self.severity.as_str().to_owned()),
        );
        payload.insert(
            "recommended_action".to_owned(),
            Value::String(self.recommended_action.clone()),
        );
        payload.insert("reason".to_owned(), Value::String(self.reason.clone()));
        payload.insert("evidence".to_owned(), Value::Object(self.evidence.clone()));
        if let Some(trace_id) = &self.trace_id {
            payload.insert("trace_id".to_owned(), Value::String(trace_id.clone()));
        }
        payload
    }

    /// Wrap this decision in a `POLICY_DECISION` event stamped with `time`.
    pub fn to_event(&self, time: u64) -> Event {
        Event::new(time, EventKind::PolicyDecision, self.to_payload())
    }
}

/// Record that a recommended action was carried out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ExecutedAction {
    /// Action that was performed (e.g. `PAUSE`).
    pub action_type: String,
    /// Why it was performed.
    pub reason: String,
    /// Logical time of the decision that caused it.
    ///
    /// A soft reference: several decisions may share one timestamp, in which
    /// case correlation is best-effort.
    pub originating_decision_time: Option<u64>,
    /// Trace id carried over from the triggering input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub trace_id: Option<String>,
}

impl ExecutedAction {
    /// Build the `ACTION_EXECUTED` event payload.
    ///
    /// `originating_decision_time` is always present (`null` when unknown);
    /// `trace_id` is omitted when absent.
    pub fn to_payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert(
            "action_type".to_owned(),
            Value::String(self.action_type.clone()),
        );
        payload.insert("reason".to_owned(), Value::String(self.reason.clone()));
        payload.insert(
            "originating_decision_time".to_owned(),
            self.originating_decision_time.map_or(Value::Null, Value::from),
        );
        if let Some(trace_id) = &self.trace_id {
            payload.insert("trace_id".to_owned(), Value::String(trace_id.clone()));
        }
        payload
    }

    /// Wrap this action in an `ACTION_EXECUTED` event stamped with `time`.
    pub fn to_event(&self, time: u64) -> Event {
        Event::new(time, EventKind::ActionExecuted, self.to_payload())
    }
}
