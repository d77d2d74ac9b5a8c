//! The wire payload accepted by `POST /v1/inputs`.
//!
//! [`InputPayload`] is the published contract for input plugins. It mirrors
//! [`ExternalInput`] but is strict: unknown fields are rejected and every
//! field is checked with `validator` before anything reaches the queue.
//!
//! | Field | Rule |
//! |-------|------|
//! | `source` | one of `plugin`, `human`, `system` |
//! | `channel` | 1-64 characters |
//! | `name` | 1-64 characters |
//! | `data` | JSON object, defaults to `{}` |
//! | `trace_id` | optional, 1-128 characters |

use serde::Deserialize;
use validator::{Validate, ValidationError};
use worldlab_types::{ExternalInput, Payload};

/// Sources an input may claim to come from.
pub const ALLOWED_SOURCES: [&str; 3] = ["plugin", "human", "system"];

/// An input as sent by a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct InputPayload {
    /// Who produced the input.
    #[validate(custom(function = "validate_source"))]
    pub source: String,

    /// Logical channel.
    #[validate(length(min = 1, max = 64))]
    pub channel: String,

    /// Input name within the channel.
    #[validate(length(min = 1, max = 64))]
    pub name: String,

    /// Input-specific data.
    #[serde(default)]
    pub data: Payload,

    /// Correlation id for the external transaction.
    #[serde(default)]
    #[validate(length(min = 1, max = 128))]
    pub trace_id: Option<String>,
}

impl InputPayload {
    /// Convert into the queue record.
    pub fn into_input(self) -> ExternalInput {
        ExternalInput {
            source: self.source,
            channel: self.channel,
            name: self.name,
            data: self.data,
            trace_id: self.trace_id,
        }
    }
}

fn validate_source(source: &str) -> Result<(), ValidationError> {
    if ALLOWED_SOURCES.contains(&source) {
        return Ok(());
    }
    let mut err = ValidationError::new("source");
    err.message = Some(format!("source must be one of {}", ALLOWED_SOURCES.join(", ")).into());
    Err(err)
}
