//! Stateless policy engine: fact in, zero or more decisions out.
//!
//! [`evaluate`] is pure and total. It never fails: an event the rules cannot
//! read (wrong kind, missing fields, non-numeric reading) simply yields no
//! decisions. That keeps replay safe, since the same event always produces
//! the same judgments.
//!
//! # Rules
//!
//! | Rule | Trigger | Severity | Action |
//! |------|---------|----------|--------|
//! | `TEMP_HIGH_PAUSE` | `equipment` / `TEMP_READING` with `data.temp_c` above the threshold | `ALERT` | `PAUSE` |

use serde_json::Value;
use worldlab_types::{Decision, Event, EventKind, Payload, Severity};

use crate::config::PolicyConfig;

/// Rule id of the high-temperature rule.
pub const TEMP_HIGH_PAUSE: &str = "TEMP_HIGH_PAUSE";

/// Action recommended by the high-temperature rule.
pub const PAUSE: &str = "PAUSE";

/// Evaluate every rule against one event.
pub fn evaluate(event: &Event, config: &PolicyConfig) -> Vec<Decision> {
    if event.kind != EventKind::ExternalInput {
        return Vec::new();
    }

    temp_high_pause(event, config).into_iter().collect()
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

fn temp_high_pause(event: &Event, config: &PolicyConfig) -> Option<Decision> {
    if event.payload_str("channel") != Some("equipment")
        || event.payload_str("name") != Some("TEMP_READING")
    {
        return None;
    }

    let temp_c = read_temp_c(&event.payload)?;
    let threshold = config.temp_high_threshold_c;
    if temp_c <= threshold || threshold.is_nan() {
        return None;
    }

    let mut evidence = Payload::new();
    evidence.insert("temp_c".to_owned(), Value::from(temp_c));
    evidence.insert("threshold_c".to_owned(), Value::from(threshold));

    Some(Decision {
        rule_id: TEMP_HIGH_PAUSE.to_owned(),
        severity: Severity::Alert,
        recommended_action: PAUSE.to_owned(),
        reason: format!(
            "TEMP too high: temp_c={temp_c:?} > threshold={threshold:?}. Recommend {PAUSE}."
        ),
        evidence,
        trace_id: event.payload_str("trace_id").map(str::to_owned),
    })
}

/// Read `data.temp_c` as a finite number. Numeric strings are accepted.
fn read_temp_c(payload: &Payload) -> Option<f64> {
    let value = payload.get("data")?.as_object()?.get("temp_c")?;
    let reading = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    reading.is_finite().then_some(reading)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;
    use worldlab_types::ExternalInput;

    use super::*;

    fn reading(channel: &str, name: &str, data: Value) -> Event {
        let Value::Object(data) = data else {
            return Event::new(0, EventKind::ExternalInput, Payload::new());
        };
        ExternalInput {
            source: "plugin".to_owned(),
            channel: channel.to_owned(),
            name: name.to_owned(),
            data,
            trace_id: Some("TR-9".to_owned()),
        }
        .to_event(1)
    }

    fn temp(value: Value) -> Event {
        reading("equipment", "TEMP_READING", json!({ "temp_c": value }))
    }

    #[test]
    fn hot_reading_recommends_pause() {
        let decisions = evaluate(&temp(json!(99.0)), &PolicyConfig::default());
        assert_eq!(decisions.len(), 1);

        let d = &decisions[0];
        assert_eq!(d.rule_id, "TEMP_HIGH_PAUSE");
        assert_eq!(d.severity, Severity::Alert);
        assert_eq!(d.recommended_action, "PAUSE");
        assert_eq!(
            d.reason,
            "TEMP too high: temp_c=99.0 > threshold=92.0. Recommend PAUSE."
        );
        assert_eq!(d.evidence.get("temp_c"), Some(&json!(99.0)));
        assert_eq!(d.evidence.get("threshold_c"), Some(&json!(92.0)));
        assert_eq!(d.trace_id.as_deref(), Some("TR-9"));
    }

    #[test]
    fn reading_at_or_below_threshold_is_quiet() {
        let config = PolicyConfig::default();
        assert!(evaluate(&temp(json!(80.0)), &config).is_empty());
        assert!(evaluate(&temp(json!(92.0)), &config).is_empty());
    }

    #[test]
    fn threshold_comes_from_config() {
        let config = PolicyConfig {
            temp_high_threshold_c: 70.0,
        };
        assert_eq!(evaluate(&temp(json!(80)), &config).len(), 1);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let decisions = evaluate(&temp(json!(" 99.5 ")), &PolicyConfig::default());
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].evidence.get("temp_c"), Some(&json!(99.5)));
    }

    #[test]
    fn unreadable_readings_yield_nothing() {
        let config = PolicyConfig::default();
        assert!(evaluate(&temp(json!("hot")), &config).is_empty());
        assert!(evaluate(&temp(json!(null)), &config).is_empty());
        assert!(evaluate(&temp(json!([99])), &config).is_empty());
        assert!(evaluate(&temp(json!("inf")), &config).is_empty());
        assert!(
            evaluate(
                &reading("equipment", "TEMP_READING", json!({})),
                &config
            )
            .is_empty()
        );
    }

    #[test]
    fn other_inputs_and_kinds_yield_nothing() {
        let config = PolicyConfig::default();
        let wrong_channel = reading("ops", "TEMP_READING", json!({ "temp_c": 120 }));
        let wrong_name = reading("equipment", "PRESSURE", json!({ "temp_c": 120 }));
        assert!(evaluate(&wrong_channel, &config).is_empty());
        assert!(evaluate(&wrong_name, &config).is_empty());

        let tick = Event::world_tick(1, Payload::new());
        assert!(evaluate(&tick, &config).is_empty());
    }

    #[test]
    fn data_that_is_not_an_object_yields_nothing() {
        let mut event = temp(json!(99.0));
        event.payload.insert("data".to_owned(), json!("99.0"));
        assert!(evaluate(&event, &PolicyConfig::default()).is_empty());
    }

    #[test]
    fn missing_trace_id_is_not_invented() {
        let mut event = temp(json!(99.0));
        event.payload.remove("trace_id");
        let decisions = evaluate(&event, &PolicyConfig::default());
        assert!(decisions[0].trace_id.is_none());
    }
}
