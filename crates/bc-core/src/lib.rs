// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Remote command orchestration engine for the Becon console
//!
//! Commands are submitted to a remote agent, tracked through their delivery
//! and execution stages by polling, and merged into a per-agent ledger that
//! the operator timeline is rendered from. The server is only reached
//! through [`bc_client_api::ConsoleApi`].

pub mod dispatch;
pub mod error;
pub mod health;
pub mod ledger;
pub mod polling;
pub mod render;
pub mod session;
pub mod visibility;

pub use dispatch::DispatchClient;
pub use error::{CoreError, CoreResult};
pub use health::{BackendStatus, HealthMonitor, DEFAULT_HEALTH_INTERVAL};
pub use ledger::{CommandLedger, MergeOutcome, SharedLedger};
pub use polling::{
    PollEvent, PollerConfig, PollingScheduler, RetryPolicy, SweepStats, DEFAULT_POLL_INTERVAL,
};
pub use render::{render, DisplayForm, ResultType};
pub use session::{ConsoleSession, SessionSettings, TimelineEntry};
pub use visibility::{VisibilityFilter, RETURN_RESULTS_COMMAND};
