//! External input records.
//!
//! An [`ExternalInput`] is the shape of one line in the input queue and the
//! payload template of an `EXTERNAL_INPUT` event. It does not introduce a new
//! event type: [`ExternalInput::to_event`] stamps it with the current world
//! time and wraps it in the generic [`Event`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::event::{Event, EventKind, Payload};

/// A fact produced outside the world (sensor reading, operator action, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ExternalInput {
    /// Who produced the input (e.g. `plugin`, `human`, `system`).
    pub source: String,
    /// Logical channel (e.g. `equipment`, `order`, `ops`).
    pub channel: String,
    /// Input name within the channel (e.g. `TEMP_READING`).
    pub name: String,
    /// Input-specific data.
    #[ts(type = "Record<string, unknown>")]
    pub data: Payload,
    /// Correlates one external transaction across input, decision, and action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub trace_id: Option<String>,
}

impl ExternalInput {
    /// Build the event payload for this input.
    ///
    /// `trace_id` is omitted entirely when absent.
    pub fn to_payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("source".to_owned(), Value::String(self.source.clone()));
        payload.insert("channel".to_owned(), Value::String(self.channel.clone()));
        payload.insert("name".to_owned(), Value::String(self.name.clone()));
        payload.insert("data".to_owned(), Value::Object(self.data.clone()));
        if let Some(trace_id) = &self.trace_id {
            payload.insert("trace_id".to_owned(), Value::String(trace_id.clone()));
        }
        payload
    }

    /// Wrap this input in an `EXTERNAL_INPUT` event stamped with `time`.
    pub fn to_event(&self, time: u64) -> Event {
        Event::new(time, EventKind::ExternalInput, self.to_payload())
    }
}
