//! `worldlab` command-line runner.
//!
//! Wires configuration, logging, and the world engine together. Every
//! command reads and writes the same data directory:
//!
//! ```text
//! <data_dir>/
//!   input_queue.jsonl   appended by `serve` (or any plugin)
//!   events.jsonl        durable event log
//!   snapshot.json       latest snapshot
//!   cursor.txt          queue position already consumed
//! ```
//!
//! # Startup sequence
//!
//! 1. Parse arguments
//! 2. Load configuration from `--config` (default `worldlab-config.yaml`)
//! 3. Initialize structured logging on stderr
//! 4. Run the command, printing its result on stdout

mod commands;
mod error;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use worldlab_core::WorldLabConfig;
use worldlab_core::config::DEFAULT_CONFIG_FILE;
use worldlab_ingest::ServerConfig;

use crate::error::CliError;

/// Event-sourced world engine.
#[derive(Debug, Parser)]
#[command(name = "worldlab")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Data directory (overrides `storage.data_dir`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP ingestion server
    Serve {
        /// Host to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to bind
        #[arg(long)]
        port: Option<u16>,

        /// Queue file to append to
        #[arg(long)]
        queue: Option<PathBuf>,
    },

    /// Tick the world once and ingest pending inputs
    RunOnce {
        /// Snapshot every N events (0 disables)
        #[arg(long)]
        snapshot_every: Option<usize>,

        /// Print a compact summary instead of the JSON report
        #[arg(long)]
        pretty: bool,
    },

    /// Repeat run-once several times
    Run {
        /// Number of cycles
        #[arg(long)]
        ticks: Option<u64>,

        /// Pause between cycles in milliseconds
        #[arg(long)]
        sleep_ms: Option<u64>,

        /// Snapshot every N events (0 disables)
        #[arg(long)]
        snapshot_every: Option<usize>,
    },

    /// Rebuild the world from the event log and print state and metrics
    Replay {
        /// Ignore the snapshot and fold the whole log
        #[arg(long)]
        full: bool,
    },

    /// Print metrics for the replayed world
    Metrics,

    /// Print event log records as JSON lines
    Events {
        /// First record to print
        #[arg(long, default_value_t = 0)]
        from: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match WorldLabConfig::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir.clone_from(dir);
    }

    logging::init(&config.logging);
    info!(
        world = %config.world.name,
        data_dir = %config.storage.data_dir.display(),
        "worldlab starting"
    );

    match execute(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Command, config: &WorldLabConfig) -> Result<(), CliError> {
    let paths = config.storage.paths();

    match command {
        Command::Serve { host, port, queue } => {
            let server = ServerConfig {
                host: host.unwrap_or_else(|| config.ingest.host.clone()),
                port: port.unwrap_or(config.ingest.port),
            };
            let queue = queue.unwrap_or(paths.input_queue);
            commands::serve(&server, queue, config.ingest.assign_trace_ids).await
        }
        Command::RunOnce {
            snapshot_every,
            pretty,
        } => {
            let every = snapshot_every.unwrap_or(config.storage.snapshot_every);
            let report = commands::run_once(&paths, &config.policy, every)?;
            if pretty {
                println!("{}", commands::summary(&report));
            } else {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(())
        }
        Command::Run {
            ticks,
            sleep_ms,
            snapshot_every,
        } => {
            let ticks = ticks.unwrap_or(config.runner.ticks);
            let interval =
                Duration::from_millis(sleep_ms.unwrap_or(config.runner.tick_interval_ms));
            let every = snapshot_every.unwrap_or(config.storage.snapshot_every);
            commands::run(&paths, &config.policy, every, ticks, interval, |cycle, report| {
                println!("{}", commands::progress_line(cycle, ticks, report));
            })
            .await
        }
        Command::Replay { full } => {
            let report = commands::replay(&paths, full)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Metrics => {
            let metrics = commands::metrics(&paths)?;
            println!("{}", serde_json::to_string_pretty(&metrics)?);
            Ok(())
        }
        Command::Events { from } => {
            for event in commands::events(&paths, from)? {
                println!("{}", serde_json::to_string(&event)?);
            }
            Ok(())
        }
    }
}
