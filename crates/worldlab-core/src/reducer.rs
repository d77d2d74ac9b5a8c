//! The reducer: the single definition of how facts change world state.
//!
//! [`apply`] is pure, total, and deterministic. It consumes the previous
//! [`WorldState`] and returns the next one; nothing else in the workspace
//! computes state. Live processing and every replay path go through
//! [`apply_sequence`] or [`apply`], so a live runtime and a replay of the
//! same log can never disagree.
//!
//! Rules by event kind:
//!
//! | Kind | Effect |
//! |------|--------|
//! | `WORLD_TICK` | `time := event.time`, `tick_count += 1` |
//! | `EXTERNAL_INPUT` | `input_count += 1`, `last_input := payload` |
//! | `ACTION_EXECUTED` | `action_count += 1`, `last_action := payload + {time}` |
//! | anything else | no change |

use serde_json::Value;
use worldlab_types::{Event, EventKind, WorldState};

/// Fold one event onto `state`.
///
/// Counters saturate at `u64::MAX`. The stored payloads are owned copies of
/// the event's, so the caller's event cannot alter recorded state later.
pub fn apply(state: WorldState, event: &Event) -> WorldState {
    match event.kind {
        EventKind::WorldTick => WorldState {
            time: event.time,
            tick_count: state.tick_count.saturating_add(1),
            ..state
        },
        EventKind::ExternalInput => WorldState {
            input_count: state.input_count.saturating_add(1),
            last_input: Some(event.payload.clone()),
            ..state
        },
        EventKind::ActionExecuted => {
            let mut last_action = event.payload.clone();
            last_action.insert("time".to_owned(), Value::from(event.time));
            WorldState {
                action_count: state.action_count.saturating_add(1),
                last_action: Some(last_action),
                ..state
            }
        }
        EventKind::PolicyDecision | EventKind::Other(_) => state,
    }
}

/// Fold `events` left to right starting from `initial`.
pub fn apply_sequence<'a, I>(initial: WorldState, events: I) -> WorldState
where
    I: IntoIterator<Item = &'a Event>,
{
    events.into_iter().fold(initial, apply)
}
