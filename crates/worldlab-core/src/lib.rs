//! Event-sourced world engine for `WorldLab`.
//!
//! This crate turns facts into state and judgments. Everything here is
//! single-threaded and synchronous: a [`WorldRuntime`] owns one world, and
//! each call either completes (including its durable writes) or returns an
//! error.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `worldlab-config.yaml` into
//!   strongly-typed structs.
//! - [`reducer`] -- The pure `apply(state, event)` fold.
//! - [`event_log`] -- In-memory ordered event buffer.
//! - [`gateway`] -- [`InputGateway`] trait with queue, in-memory, and
//!   detached implementations.
//! - [`policy`] -- Stateless rule evaluation.
//! - [`action`] -- Decision to executed-action derivation.
//! - [`runtime`] -- The [`WorldRuntime`] orchestrator and replay.
//! - [`metrics`] -- Read-only [`WorldMetrics`] projection.
//!
//! [`InputGateway`]: gateway::InputGateway
//! [`WorldRuntime`]: runtime::WorldRuntime
//! [`WorldMetrics`]: metrics::WorldMetrics

pub mod action;
pub mod config;
pub mod event_log;
pub mod gateway;
pub mod metrics;
pub mod policy;
pub mod reducer;
pub mod runtime;

pub use config::{PolicyConfig, WorldLabConfig};
pub use event_log::EventLog;
pub use gateway::{Detached, GatewayError, InMemoryGateway, InputGateway, QueueGateway};
pub use metrics::WorldMetrics;
pub use runtime::{Persistence, RuntimeError, WorldRuntime};
