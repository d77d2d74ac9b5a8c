//! Action deriver: turns an accepted decision into an executed-action fact.
//!
//! Every decision the policy engine emits is currently accepted. The runtime
//! routes each one through a single response step before calling
//! [`derive_action`], so an approval gate can be added there without
//! touching this module.

use worldlab_types::{Decision, ExecutedAction};

/// Derive the action that carries out `decision`.
///
/// `decision_time` is the logical time of the recorded `POLICY_DECISION`
/// event; it becomes the action's soft back-reference. The trace id is
/// carried through unchanged.
pub fn derive_action(decision: &Decision, decision_time: u64) -> ExecutedAction {
    ExecutedAction {
        action_type: decision.recommended_action.clone(),
        reason: decision.reason.clone(),
        originating_decision_time: Some(decision_time),
        trace_id: decision.trace_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use worldlab_types::{Payload, Severity};

    use super::*;

    fn decision(trace_id: Option<&str>) -> Decision {
        Decision {
            rule_id: "TEMP_HIGH_PAUSE".to_owned(),
            severity: Severity::Alert,
            recommended_action: "PAUSE".to_owned(),
            reason: "TEMP too high".to_owned(),
            evidence: Payload::new(),
            trace_id: trace_id.map(str::to_owned),
        }
    }

    #[test]
    fn action_mirrors_decision() {
        let action = derive_action(&decision(Some("TR-1")), 12);
        assert_eq!(action.action_type, "PAUSE");
        assert_eq!(action.reason, "TEMP too high");
        assert_eq!(action.originating_decision_time, Some(12));
        assert_eq!(action.trace_id.as_deref(), Some("TR-1"));
    }

    #[test]
    fn absent_trace_id_stays_absent() {
        assert!(derive_action(&decision(None), 0).trace_id.is_none());
    }
}
