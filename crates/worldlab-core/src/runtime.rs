//! The runtime orchestrator: one world, advancing one fact at a time.
//!
//! A [`WorldRuntime`] holds the current [`WorldState`], the in-memory
//! [`EventLog`], a [`Persistence`] mode, an [`InputGateway`], and the policy
//! configuration. Every fact goes through one private choke point,
//! `record`, which appends it durably (when configured), appends it to the
//! in-memory log, and folds it through the reducer. State and log therefore
//! never diverge.
//!
//! # Ingest cycle
//!
//! ```text
//! gateway.pull()
//!     |
//!     +-- for each input:
//!         |-- record EXTERNAL_INPUT   (stamped with current time)
//!         +-- for each policy decision:
//!             |-- record POLICY_DECISION
//!             +-- record ACTION_EXECUTED
//! ```
//!
//! # Replay
//!
//! [`replay_from_store`](WorldRuntime::replay_from_store) folds the whole
//! durable log. [`replay_fast_from_store`](WorldRuntime::replay_fast_from_store)
//! starts from the latest snapshot and folds only the records after it;
//! without a snapshot it is exactly a full replay. Replay never re-runs the
//! policy: decisions and actions are already facts in the log.

use tracing::{debug, info};
use worldlab_store::{FileEventStore, SnapshotStore, StoreError};
use worldlab_types::{Decision, Event, Payload, WorldState};

use crate::action;
use crate::config::PolicyConfig;
use crate::event_log::EventLog;
use crate::gateway::{Detached, GatewayError, InputGateway};
use crate::metrics::{self, WorldMetrics};
use crate::policy;
use crate::reducer;

/// Errors that can occur while running or replaying a world.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The durable store or snapshot store failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// The input gateway failed.
    #[error("gateway error: {source}")]
    Gateway {
        /// The underlying gateway error.
        #[from]
        source: GatewayError,
    },

    /// The world clock cannot advance past `u64::MAX`.
    #[error("world clock overflow: cannot advance beyond u64::MAX")]
    ClockOverflow,

    /// The snapshot claims to cover records the log does not have.
    #[error("snapshot covers offset {covered_up_to_offset} but the log has {log_len} records")]
    SnapshotAhead {
        /// Offset recorded in the snapshot.
        covered_up_to_offset: usize,
        /// Number of records in the durable log.
        log_len: usize,
    },
}

/// Where recorded events go besides the in-memory log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    /// Events live only as long as the process.
    InMemory,
    /// Events are also appended to a durable log before they take effect.
    Durable(FileEventStore),
}

impl Persistence {
    /// The durable store, if any.
    pub const fn store(&self) -> Option<&FileEventStore> {
        match self {
            Self::InMemory => None,
            Self::Durable(store) => Some(store),
        }
    }
}

/// A running world.
///
/// `G` is the input gateway. A runtime without one uses [`Detached`], on
/// which [`ingest`](Self::ingest) returns nothing.
#[derive(Debug)]
pub struct WorldRuntime<G = Detached> {
    state: WorldState,
    log: EventLog,
    persistence: Persistence,
    gateway: G,
    policy: PolicyConfig,
}

impl WorldRuntime<Detached> {
    /// Create a fresh world with no history.
    ///
    /// With [`Persistence::Durable`] the store is assumed to be empty; use
    /// [`replay_from_store`](Self::replay_from_store) to resume an existing
    /// log.
    pub fn new(persistence: Persistence) -> Self {
        Self {
            state: WorldState::initial(),
            log: EventLog::new(),
            persistence,
            gateway: Detached,
            policy: PolicyConfig::default(),
        }
    }

    /// Create a fresh, in-memory-only world.
    pub fn in_memory() -> Self {
        Self::new(Persistence::InMemory)
    }

    /// Rebuild a world by folding its entire durable log.
    ///
    /// A missing log file is an empty world.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Store`] if the log cannot be read or holds a
    /// corrupt record.
    pub fn replay_from_store(store: FileEventStore) -> Result<Self, RuntimeError> {
        let events = store.load_all()?;
        let state = reducer::apply_sequence(WorldState::initial(), &events);
        info!(
            path = %store.path().display(),
            events = events.len(),
            time = state.time,
            "Replayed world from full log"
        );
        Ok(Self::resumed(store, state, events))
    }

    /// Rebuild a world from the latest snapshot plus the log records after it.
    ///
    /// Without a snapshot this is [`replay_from_store`](Self::replay_from_store).
    /// The resulting state is identical to a full replay of the same log.
    ///
    /// Only the fold is shortened. The whole log is still read and decoded,
    /// because the runtime keeps every record in memory for metrics and for
    /// absolute snapshot offsets.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Store`] if the log or snapshot cannot be read,
    /// and [`RuntimeError::SnapshotAhead`] if the snapshot covers records the
    /// log does not contain (the snapshot belongs to another log).
    pub fn replay_fast_from_store(
        store: FileEventStore,
        snapshots: &SnapshotStore,
    ) -> Result<Self, RuntimeError> {
        let Some(snapshot) = snapshots.load()? else {
            debug!("No snapshot found, falling back to full replay");
            return Self::replay_from_store(store);
        };

        let events = store.load_all()?;
        let covered = snapshot.covered_up_to_offset;
        if covered >= events.len() {
            return Err(RuntimeError::SnapshotAhead {
                covered_up_to_offset: covered,
                log_len: events.len(),
            });
        }

        let tail = events.get(covered.saturating_add(1)..).unwrap_or_default();
        let state = reducer::apply_sequence(snapshot.state, tail);
        info!(
            path = %store.path().display(),
            events = events.len(),
            covered_up_to_offset = covered,
            folded = tail.len(),
            time = state.time,
            "Replayed world from snapshot"
        );
        Ok(Self::resumed(store, state, events))
    }

    fn resumed(store: FileEventStore, state: WorldState, events: Vec<Event>) -> Self {
        Self {
            state,
            log: EventLog::from(events),
            persistence: Persistence::Durable(store),
            gateway: Detached,
            policy: PolicyConfig::default(),
        }
    }
}

impl<G> WorldRuntime<G> {
    /// Attach an input gateway, replacing the current one.
    pub fn with_gateway<H: InputGateway>(self, gateway: H) -> WorldRuntime<H> {
        WorldRuntime {
            state: self.state,
            log: self.log,
            persistence: self.persistence,
            gateway,
            policy: self.policy,
        }
    }

    /// Use `policy` for subsequent ingests.
    #[must_use]
    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    /// Current world time.
    pub const fn time(&self) -> u64 {
        self.state.time
    }

    /// Current world state.
    pub const fn state(&self) -> &WorldState {
        &self.state
    }

    /// Every event recorded or replayed by this runtime, in log order.
    pub const fn log(&self) -> &EventLog {
        &self.log
    }

    /// The persistence mode.
    pub const fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    /// The policy configuration.
    pub const fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// The input gateway.
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// The input gateway, mutably.
    pub const fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    /// Advance the clock by one and record a `WORLD_TICK` carrying `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::ClockOverflow`] at `u64::MAX` and
    /// [`RuntimeError::Store`] if the durable append fails. Either way the
    /// runtime is unchanged.
    pub fn tick(&mut self, payload: Payload) -> Result<Event, RuntimeError> {
        let time = self
            .time()
            .checked_add(1)
            .ok_or(RuntimeError::ClockOverflow)?;
        let event = Event::world_tick(time, payload);
        self.record(event.clone())?;
        Ok(event)
    }

    /// Persist a snapshot if the log length is a positive multiple of
    /// `every_n_events`. Returns whether a snapshot was written.
    ///
    /// `every_n_events == 0` disables snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Store`] if the snapshot cannot be written.
    pub fn maybe_snapshot(
        &self,
        snapshots: &SnapshotStore,
        every_n_events: usize,
    ) -> Result<bool, RuntimeError> {
        let len = self.log.len();
        if every_n_events == 0 || len == 0 || len.checked_rem(every_n_events) != Some(0) {
            return Ok(false);
        }

        let covered = len.saturating_sub(1);
        snapshots.save(&self.state, covered)?;
        info!(
            covered_up_to_offset = covered,
            time = self.state.time,
            "Snapshot saved"
        );
        Ok(true)
    }

    /// Derive metrics from the current state and log.
    pub fn metrics(&self) -> WorldMetrics {
        metrics::compute_metrics(&self.state, &self.log)
    }

    /// Record one event: durable store first, then memory, then the reducer.
    fn record(&mut self, event: Event) -> Result<(), RuntimeError> {
        if let Persistence::Durable(store) = &self.persistence {
            store.append(&event)?;
        }
        debug!(time = event.time, kind = %event.kind, "Recorded event");
        let state = std::mem::take(&mut self.state);
        self.state = reducer::apply(state, &event);
        self.log.append(event);
        Ok(())
    }

    /// Record a decision and the action that carries it out.
    ///
    /// Every decision is accepted. An approval step would go here.
    fn respond_to(&mut self, decision: &Decision) -> Result<(), RuntimeError> {
        let time = self.time();
        info!(
            rule_id = %decision.rule_id,
            severity = decision.severity.as_str(),
            action = %decision.recommended_action,
            trace_id = decision.trace_id.as_deref().unwrap_or(""),
            "Policy decision"
        );
        self.record(decision.to_event(time))?;

        let executed = action::derive_action(decision, time);
        info!(
            action_type = %executed.action_type,
            originating_decision_time = time,
            "Action executed"
        );
        self.record(executed.to_event(time))
    }
}

impl<G: InputGateway> WorldRuntime<G> {
    /// Pull pending inputs and record them, with any decisions and actions
    /// they trigger.
    ///
    /// Inputs are stamped with the current time; ingest never advances the
    /// clock. Returns only the `EXTERNAL_INPUT` events.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Gateway`] if pulling fails and
    /// [`RuntimeError::Store`] if a durable append fails. On a store failure
    /// the events recorded before it remain recorded and the gateway has
    /// already moved past the pulled inputs, so callers must not persist the
    /// gateway position after an error.
    pub fn ingest(&mut self) -> Result<Vec<Event>, RuntimeError> {
        let inputs = self.gateway.pull()?;
        let mut recorded = Vec::with_capacity(inputs.len());

        for input in inputs {
            let event = input.to_event(self.time());
            self.record(event.clone())?;

            for decision in policy::evaluate(&event, &self.policy) {
                self.respond_to(&decision)?;
            }
            recorded.push(event);
        }

        if !recorded.is_empty() {
            debug!(count = recorded.len(), time = self.time(), "Ingested inputs");
        }
        Ok(recorded)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;
    use worldlab_types::{EventKind, ExternalInput};

    use super::*;
    use crate::gateway::InMemoryGateway;

    fn temp_input(temp_c: f64, trace_id: Option<&str>) -> ExternalInput {
        let mut data = Payload::new();
        data.insert("temp_c".to_owned(), json!(temp_c));
        ExternalInput {
            source: "plugin".to_owned(),
            channel: "equipment".to_owned(),
            name: "TEMP_READING".to_owned(),
            data,
            trace_id: trace_id.map(str::to_owned),
        }
    }

    fn kinds(runtime: &WorldRuntime<impl Sized>) -> Vec<EventKind> {
        runtime.log().iter().map(|e| e.kind.clone()).collect()
    }

    #[test]
    fn tick_advances_time_and_records() {
        let mut runtime = WorldRuntime::in_memory();
        let mut payload = Payload::new();
        payload.insert("cli".to_owned(), json!("run-once"));

        let event = runtime.tick(payload.clone()).unwrap();
        assert_eq!(event.time, 1);
        assert_eq!(event.payload, payload);
        runtime.tick(Payload::new()).unwrap();

        assert_eq!(runtime.time(), 2);
        assert_eq!(runtime.state().tick_count, 2);
        assert_eq!(runtime.log().len(), 2);
    }

    #[test]
    fn detached_ingest_is_empty() {
        let mut runtime = WorldRuntime::in_memory();
        assert!(runtime.ingest().unwrap().is_empty());
        assert!(runtime.log().is_empty());
    }

    #[test]
    fn ingest_does_not_advance_time() {
        let mut runtime = WorldRuntime::in_memory().with_gateway(InMemoryGateway::new());
        runtime.tick(Payload::new()).unwrap();
        runtime.gateway_mut().push(temp_input(20.0, None));
        runtime.gateway_mut().push(temp_input(21.0, None));

        let events = runtime.ingest().unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.time == 1));
        assert_eq!(runtime.time(), 1);
        assert_eq!(runtime.state().input_count, 2);
    }

    #[test]
    fn hot_input_records_decision_then_action() {
        let mut runtime = WorldRuntime::in_memory().with_gateway(InMemoryGateway::new());
        runtime.tick(Payload::new()).unwrap();
        runtime.gateway_mut().push(temp_input(99.0, Some("TR-1")));

        let returned = runtime.ingest().unwrap();
        assert_eq!(returned.len(), 1);
        assert_eq!(returned[0].kind, EventKind::ExternalInput);

        assert_eq!(
            kinds(&runtime),
            vec![
                EventKind::WorldTick,
                EventKind::ExternalInput,
                EventKind::PolicyDecision,
                EventKind::ActionExecuted,
            ]
        );

        let state = runtime.state();
        assert_eq!(state.time, 1);
        assert_eq!(state.tick_count, 1);
        assert_eq!(state.input_count, 1);
        assert_eq!(state.action_count, 1);
        let last_action = state.last_action.as_ref().unwrap();
        assert_eq!(last_action.get("action_type"), Some(&json!("PAUSE")));
        assert_eq!(last_action.get("originating_decision_time"), Some(&json!(1)));
        assert_eq!(last_action.get("trace_id"), Some(&json!("TR-1")));

        let decision = &runtime.log().events()[2];
        assert_eq!(decision.payload_str("trace_id"), Some("TR-1"));
    }

    #[test]
    fn cool_input_records_no_decision() {
        let mut runtime = WorldRuntime::in_memory().with_gateway(InMemoryGateway::new());
        runtime.tick(Payload::new()).unwrap();
        runtime.gateway_mut().push(temp_input(80.0, None));
        runtime.ingest().unwrap();

        assert_eq!(
            runtime.log().of_kind(&EventKind::PolicyDecision).count(),
            0
        );
        assert_eq!(runtime.state().action_count, 0);
    }

    #[test]
    fn each_triggering_input_gets_its_own_pair() {
        let mut runtime = WorldRuntime::in_memory().with_gateway(InMemoryGateway::new());
        runtime.gateway_mut().push(temp_input(95.0, None));
        runtime.gateway_mut().push(temp_input(96.0, None));
        runtime.ingest().unwrap();

        assert_eq!(
            kinds(&runtime),
            vec![
                EventKind::ExternalInput,
                EventKind::PolicyDecision,
                EventKind::ActionExecuted,
                EventKind::ExternalInput,
                EventKind::PolicyDecision,
                EventKind::ActionExecuted,
            ]
        );
        assert_eq!(runtime.state().action_count, 2);
    }

    #[test]
    fn policy_threshold_is_configurable() {
        let mut runtime = WorldRuntime::in_memory()
            .with_policy(PolicyConfig {
                temp_high_threshold_c: 50.0,
            })
            .with_gateway(InMemoryGateway::new());
        runtime.gateway_mut().push(temp_input(60.0, None));
        runtime.ingest().unwrap();
        assert_eq!(runtime.state().action_count, 1);
    }

    #[test]
    fn metrics_are_idempotent() {
        let mut runtime = WorldRuntime::in_memory().with_gateway(InMemoryGateway::new());
        runtime.tick(Payload::new()).unwrap();
        runtime.gateway_mut().push(temp_input(99.0, None));
        runtime.ingest().unwrap();

        let first = runtime.metrics();
        assert_eq!(first, runtime.metrics());
        assert_eq!(first.inputs_by_channel.get("equipment"), Some(&1));
        assert_eq!(first.action_count, 1);
    }

    #[test]
    fn clock_overflow_leaves_runtime_unchanged() {
        let mut runtime = WorldRuntime::in_memory();
        runtime.state.time = u64::MAX;
        let err = runtime.tick(Payload::new()).unwrap_err();
        assert!(matches!(err, RuntimeError::ClockOverflow));
        assert!(runtime.log().is_empty());
        assert_eq!(runtime.state().tick_count, 0);
    }

    #[test]
    fn failed_durable_append_leaves_runtime_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        let store = FileEventStore::new(dir.path());
        let mut runtime = WorldRuntime::new(Persistence::Durable(store));

        let err = runtime.tick(Payload::new()).unwrap_err();
        assert!(matches!(err, RuntimeError::Store { .. }));
        assert!(runtime.log().is_empty());
        assert_eq!(runtime.state(), &WorldState::initial());
    }

    #[test]
    fn durable_runtime_replays_to_same_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileEventStore::new(dir.path().join("events.jsonl"));
        let mut runtime = WorldRuntime::new(Persistence::Durable(store.clone()))
            .with_gateway(InMemoryGateway::new());
        runtime.tick(Payload::new()).unwrap();
        runtime.gateway_mut().push(temp_input(99.0, Some("TR-2")));
        runtime.ingest().unwrap();
        runtime.tick(Payload::new()).unwrap();

        let replayed = WorldRuntime::replay_from_store(store).unwrap();
        assert_eq!(replayed.state(), runtime.state());
        assert_eq!(replayed.log(), runtime.log());
        assert_eq!(replayed.metrics(), runtime.metrics());
    }

    #[test]
    fn maybe_snapshot_on_multiples_only() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = SnapshotStore::new(dir.path().join("snapshot.json"));
        let mut runtime = WorldRuntime::in_memory();

        assert!(!runtime.maybe_snapshot(&snapshots, 2).unwrap());
        runtime.tick(Payload::new()).unwrap();
        assert!(!runtime.maybe_snapshot(&snapshots, 2).unwrap());
        runtime.tick(Payload::new()).unwrap();
        assert!(runtime.maybe_snapshot(&snapshots, 2).unwrap());
        assert!(!runtime.maybe_snapshot(&snapshots, 0).unwrap());

        let snapshot = snapshots.load().unwrap().unwrap();
        assert_eq!(snapshot.covered_up_to_offset, 1);
        assert_eq!(&snapshot.state, runtime.state());
    }

    #[test]
    fn fast_replay_uses_snapshot_and_tail() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileEventStore::new(dir.path().join("events.jsonl"));
        let snapshots = SnapshotStore::new(dir.path().join("snapshot.json"));
        let mut runtime = WorldRuntime::new(Persistence::Durable(store.clone()));
        for _ in 0..3 {
            runtime.tick(Payload::new()).unwrap();
            runtime.maybe_snapshot(&snapshots, 2).unwrap();
        }

        let fast = WorldRuntime::replay_fast_from_store(store.clone(), &snapshots).unwrap();
        let full = WorldRuntime::replay_from_store(store).unwrap();
        assert_eq!(fast.state(), full.state());
        assert_eq!(fast.log().len(), 3);
        assert_eq!(fast.time(), 3);
    }

    #[test]
    fn fast_replay_without_snapshot_is_full_replay() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileEventStore::new(dir.path().join("events.jsonl"));
        let snapshots = SnapshotStore::new(dir.path().join("snapshot.json"));
        let mut runtime = WorldRuntime::new(Persistence::Durable(store.clone()));
        runtime.tick(Payload::new()).unwrap();

        let fast = WorldRuntime::replay_fast_from_store(store, &snapshots).unwrap();
        assert_eq!(fast.state(), runtime.state());
    }

    #[test]
    fn snapshot_from_another_log_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileEventStore::new(dir.path().join("events.jsonl"));
        let snapshots = SnapshotStore::new(dir.path().join("snapshot.json"));
        snapshots.save(&WorldState::initial(), 4).unwrap();
        store.append(&Event::world_tick(1, Payload::new())).unwrap();

        let err = WorldRuntime::replay_fast_from_store(store, &snapshots).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::SnapshotAhead {
                covered_up_to_offset: 4,
                log_len: 1
            }
        ));
    }

    #[test]
    fn replayed_runtime_continues_durably() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileEventStore::new(dir.path().join("events.jsonl"));
        let mut first = WorldRuntime::new(Persistence::Durable(store.clone()));
        first.tick(Payload::new()).unwrap();

        let mut second = WorldRuntime::replay_from_store(store.clone())
            .unwrap()
            .with_gateway(InMemoryGateway::from_iter([temp_input(99.0, None)]));
        second.tick(Payload::new()).unwrap();
        second.ingest().unwrap();

        let events = store.load_all().unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(events[1].time, 2);
        assert_eq!(second.log().len(), 5);
    }
}
