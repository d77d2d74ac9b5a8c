//! Command implementations.
//!
//! Each command is a plain function over [`DataPaths`] that returns a
//! serializable report. `main` only parses arguments and prints, so the
//! commands can be tested against a temp directory.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::info;
use worldlab_core::config::DataPaths;
use worldlab_core::{PolicyConfig, QueueGateway, WorldMetrics, WorldRuntime};
use worldlab_ingest::{IngestState, ServerConfig};
use worldlab_store::{CursorFile, FileEventStore, FileInputQueue, SnapshotStore};
use worldlab_types::{Event, Payload, WorldState};

use crate::error::CliError;

// ---------------------------------------------------------------------------
// serve
// ---------------------------------------------------------------------------

/// Run the ingestion server until Ctrl-C.
pub async fn serve(
    config: &ServerConfig,
    queue: PathBuf,
    assign_trace_ids: bool,
) -> Result<(), CliError> {
    let state = Arc::new(IngestState::new(
        FileInputQueue::new(queue),
        assign_trace_ids,
    ));
    worldlab_ingest::start_server(config, state).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// run-once / run
// ---------------------------------------------------------------------------

/// Outcome of one tick + ingest cycle.
#[derive(Debug, Serialize)]
pub struct RunOnceReport {
    /// The `WORLD_TICK` event recorded by this cycle.
    pub tick: Event,
    /// `EXTERNAL_INPUT` events recorded by this cycle.
    pub ingested: Vec<Event>,
    /// Metrics after the cycle.
    pub metrics: WorldMetrics,
    /// Queue cursor persisted after the cycle.
    pub cursor: usize,
    /// Whether a snapshot was written.
    pub snapshot_saved: bool,
    /// Files the cycle read and wrote.
    pub paths: DataPaths,
}

/// Resume the world, tick once, ingest pending inputs, and persist the
/// cursor.
///
/// The cursor is saved only after every ingested event is durable, so a
/// failed cycle re-reads the same inputs next time.
pub fn run_once(
    paths: &DataPaths,
    policy: &PolicyConfig,
    snapshot_every: usize,
) -> Result<RunOnceReport, CliError> {
    let snapshots = SnapshotStore::new(&paths.snapshot);
    let cursor_file = CursorFile::new(&paths.cursor);
    let gateway = QueueGateway::new(
        FileInputQueue::new(&paths.input_queue),
        cursor_file.load()?,
    );

    let mut runtime =
        WorldRuntime::replay_fast_from_store(FileEventStore::new(&paths.events), &snapshots)?
            .with_policy(policy.clone())
            .with_gateway(gateway);

    let mut payload = Payload::new();
    payload.insert("cli".to_owned(), Value::from("run-once"));
    let tick = runtime.tick(payload)?;
    let ingested = runtime.ingest()?;

    let cursor = runtime.gateway().cursor();
    cursor_file.save(cursor)?;
    let snapshot_saved = runtime.maybe_snapshot(&snapshots, snapshot_every)?;

    Ok(RunOnceReport {
        tick,
        ingested,
        metrics: runtime.metrics(),
        cursor,
        snapshot_saved,
        paths: paths.clone(),
    })
}

/// Repeat [`run_once`] `ticks` times, pausing `interval` between cycles.
///
/// `on_cycle` sees the 1-based cycle number and its report.
pub async fn run(
    paths: &DataPaths,
    policy: &PolicyConfig,
    snapshot_every: usize,
    ticks: u64,
    interval: Duration,
    mut on_cycle: impl FnMut(u64, &RunOnceReport),
) -> Result<(), CliError> {
    info!(ticks, interval_ms = interval.as_millis(), "Runner starting");
    for cycle in 1..=ticks {
        let report = run_once(paths, policy, snapshot_every)?;
        on_cycle(cycle, &report);
        if cycle < ticks && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }
    info!(ticks, "Runner finished");
    Ok(())
}

/// One progress line for `worldlab run`.
pub fn progress_line(cycle: u64, ticks: u64, report: &RunOnceReport) -> String {
    format!(
        "[run {cycle}/{ticks}] t={} inputs={} cursor={}",
        report.metrics.time, report.metrics.input_count, report.cursor
    )
}

/// Compact human-readable view of a [`RunOnceReport`].
pub fn summary(report: &RunOnceReport) -> String {
    let m = &report.metrics;
    let mut lines = vec![format!(
        "t={}  ticks={}  inputs={}  cursor={}",
        m.time, m.tick_count, m.input_count, report.cursor
    )];

    if let Some(input) = &m.last_input_summary {
        lines.push(format!(
            "last_input: source={} channel={} name={}",
            input.source, input.channel, input.name
        ));
    }

    let channels: Vec<String> = m
        .inputs_by_channel
        .iter()
        .map(|(channel, count)| format!("{channel}={count}"))
        .collect();
    lines.push(format!("inputs_by_channel: {{{}}}", channels.join(", ")));

    lines.push(format!("action_count: {}", m.action_count));
    match &m.last_action_summary {
        Some(action) => lines.push(format!(
            "last_action: {}  because {}",
            action.action_type, action.reason
        )),
        None => lines.push("last_action: (none)".to_owned()),
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// replay / metrics / events
// ---------------------------------------------------------------------------

/// A world rebuilt from the durable log.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    /// World time after replay.
    pub time: u64,
    /// Rebuilt state.
    pub state: WorldState,
    /// Metrics over the rebuilt world.
    pub metrics: WorldMetrics,
    /// Records in the durable log.
    pub event_count: usize,
    /// Files replay read from.
    pub paths: ReplayPaths,
}

/// Files read by [`replay`].
#[derive(Debug, Serialize)]
pub struct ReplayPaths {
    /// Durable event log.
    pub events: PathBuf,
    /// Snapshot file (ignored by a full replay).
    pub snapshot: PathBuf,
}

/// Rebuild the world from the durable log.
///
/// With `full` the snapshot is ignored; otherwise it is used when present.
pub fn replay(paths: &DataPaths, full: bool) -> Result<ReplayReport, CliError> {
    let store = FileEventStore::new(&paths.events);
    let runtime = if full {
        WorldRuntime::replay_from_store(store)?
    } else {
        WorldRuntime::replay_fast_from_store(store, &SnapshotStore::new(&paths.snapshot))?
    };

    Ok(ReplayReport {
        time: runtime.time(),
        state: runtime.state().clone(),
        metrics: runtime.metrics(),
        event_count: runtime.log().len(),
        paths: ReplayPaths {
            events: paths.events.clone(),
            snapshot: paths.snapshot.clone(),
        },
    })
}

/// Metrics over the world rebuilt from the durable log.
pub fn metrics(paths: &DataPaths) -> Result<WorldMetrics, CliError> {
    Ok(replay(paths, false)?.metrics)
}

/// Durable log records from `offset` onward.
pub fn events(paths: &DataPaths, offset: usize) -> Result<Vec<Event>, CliError> {
    Ok(FileEventStore::new(&paths.events).load_from(offset)?)
}
