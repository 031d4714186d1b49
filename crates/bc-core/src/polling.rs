// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Recurring status polling for non-terminal commands
//!
//! The scheduler is either idle or active. While active it runs one sweep per
//! period: it re-reads [`CommandLedger::non_terminal`](crate::ledger::CommandLedger::non_terminal),
//! and spawns one independent result fetch per entry. Fetches are isolated
//! from each other; a failure only affects the retry state of that one
//! command.
//!
//! Every fetch is tagged with the ledger epoch it was issued under and only
//! merges if the ledger still has that epoch and the scheduler has not been
//! stopped. A command with a fetch still in flight is skipped by later
//! sweeps.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bc_client_api::{ClientApiError, ConsoleApi};
use bc_domain_types::{CommandUpdate, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::ledger::{MergeOutcome, SharedLedger};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Shortest period a recurring task runs at; zero is raised to this
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Consecutive-failure backoff, measured in sweeps
///
/// After `k` consecutive failures a command waits
/// `min(multiplier^(k-1), max_backoff_ticks)` sweeps before it is fetched
/// again. The default multiplier of 1 retries on every sweep; a larger
/// multiplier opts into exponential backoff.
///
/// A result that is not found yet is not a failure and never counts here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RetryPolicy {
    pub multiplier: u32,
    pub max_backoff_ticks: u32,
    /// Failures after which a [`PollEvent::Stalled`] is published
    pub warn_after: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::every_tick()
    }
}

impl RetryPolicy {
    /// Retry on every sweep without ever backing off
    pub fn every_tick() -> Self {
        Self {
            multiplier: 1,
            max_backoff_ticks: 10,
            warn_after: 5,
        }
    }

    /// Doubling backoff capped at ten sweeps
    pub fn exponential() -> Self {
        Self {
            multiplier: 2,
            ..Self::every_tick()
        }
    }

    /// Sweeps to wait after `failures` consecutive failures
    pub fn backoff_ticks(&self, failures: u32) -> u64 {
        if failures == 0 {
            return 0;
        }
        let max = u64::from(self.max_backoff_ticks.max(1));
        let multiplier = u64::from(self.multiplier.max(1));
        let mut ticks: u64 = 1;
        for _ in 1..failures {
            ticks = ticks.saturating_mul(multiplier);
            if ticks >= max {
                return max;
            }
        }
        ticks.min(max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            retry: RetryPolicy::default(),
        }
    }
}

/// Notifications published by the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PollEvent {
    /// A merge changed an entry
    Updated { id: String, status: StatusCode },
    /// A command reached the failure warning threshold
    Stalled { id: String, failures: u32 },
    /// A stalled command was fetched successfully again
    Recovered { id: String },
}

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub issued: usize,
    pub skipped_in_flight: usize,
    pub backing_off: usize,
}

#[derive(Debug, Default)]
struct RetryState {
    consecutive_failures: u32,
    next_attempt_tick: u64,
    stalled: bool,
}

#[derive(Debug, Default)]
struct Tracking {
    in_flight: HashSet<String>,
    retry: HashMap<String, RetryState>,
}

struct Inner<C> {
    api: C,
    ledger: SharedLedger,
    config: PollerConfig,
    events: broadcast::Sender<PollEvent>,
    tracking: Mutex<Tracking>,
    ticks: AtomicU64,
    cancel: CancellationToken,
}

/// Periodic sweep over the non-terminal entries of one ledger
///
/// Stopping is final; a new agent selection builds a new scheduler.
pub struct PollingScheduler<C> {
    inner: Arc<Inner<C>>,
    task: Option<JoinHandle<()>>,
}

impl<C> std::fmt::Debug for PollingScheduler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingScheduler")
            .field("config", &self.inner.config)
            .field("active", &(self.task.is_some() && !self.inner.cancel.is_cancelled()))
            .finish()
    }
}

impl<C> PollingScheduler<C>
where
    C: ConsoleApi + 'static,
{
    pub fn new(api: C, ledger: SharedLedger, config: PollerConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self::with_events(api, ledger, config, events)
    }

    /// Build a scheduler that publishes on an existing channel
    pub fn with_events(
        api: C,
        ledger: SharedLedger,
        config: PollerConfig,
        events: broadcast::Sender<PollEvent>,
    ) -> Self {
        let config = PollerConfig {
            interval: config.interval.max(MIN_TICK_PERIOD),
            ..config
        };
        Self {
            inner: Arc::new(Inner {
                api,
                ledger,
                config,
                events,
                tracking: Mutex::new(Tracking::default()),
                ticks: AtomicU64::new(0),
                cancel: CancellationToken::new(),
            }),
            task: None,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PollEvent> {
        self.inner.events.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.task.is_some() && !self.inner.cancel.is_cancelled()
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Idle to active; the first sweep runs one period from now
    pub fn start(&mut self) {
        if self.task.is_some() || self.inner.cancel.is_cancelled() {
            return;
        }
        let inner = self.inner.clone();
        let period = inner.config.interval;
        info!(interval_ms = period.as_millis() as u64, "Starting command polling");

        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = inner.cancel.cancelled() => {
                        debug!("Polling loop cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        Inner::sweep(&inner).await;
                    }
                }
            }
        }));
    }

    /// Active to idle; results of fetches still in flight are discarded
    pub fn stop(&mut self) {
        if !self.inner.cancel.is_cancelled() {
            info!("Stopping command polling");
        }
        self.inner.cancel.cancel();
        self.task.take();
    }

    /// Run exactly one sweep and wait for all of its fetches
    pub async fn sweep_once(&self) -> SweepStats {
        let (stats, handles) = Inner::sweep(&self.inner).await;
        futures::future::join_all(handles).await;
        stats
    }
}

impl<C> Drop for PollingScheduler<C> {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}

impl<C> Inner<C>
where
    C: ConsoleApi + 'static,
{
    /// Issue fetches for every eligible entry without waiting for them
    async fn sweep(this: &Arc<Self>) -> (SweepStats, Vec<JoinHandle<()>>) {
        let mut stats = SweepStats::default();
        if this.cancel.is_cancelled() {
            return (stats, vec![]);
        }

        let tick = this.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        let (epoch, candidates): (u64, Vec<String>) = {
            let ledger = this.ledger.read().await;
            (ledger.epoch(), ledger.non_terminal().map(|e| e.id().to_string()).collect())
        };

        let mut due = Vec::with_capacity(candidates.len());
        {
            let mut tracking = this.tracking.lock().await;
            for id in candidates {
                if tracking.in_flight.contains(&id) {
                    stats.skipped_in_flight += 1;
                    continue;
                }
                if tracking.retry.get(&id).is_some_and(|state| state.next_attempt_tick > tick) {
                    stats.backing_off += 1;
                    continue;
                }
                tracking.in_flight.insert(id.clone());
                due.push(id);
            }
        }

        stats.issued = due.len();
        trace!(tick, epoch, ?stats, "Poll sweep");

        let handles = due
            .into_iter()
            .map(|id| {
                let inner = this.clone();
                tokio::spawn(async move { inner.fetch(id, epoch, tick).await })
            })
            .collect();
        (stats, handles)
    }

    async fn fetch(&self, id: String, epoch: u64, tick: u64) {
        let result = self.api.fetch_command_result(&id).await;

        match result {
            Ok(response) => {
                let update = CommandUpdate::from(response);
                self.merge(&id, epoch, &update).await;
                self.register_success(&id).await;
            }
            // Nothing reported yet; the command stays due on the next sweep
            Err(ClientApiError::NotFound(reason)) => {
                trace!(command_id = %id, reason = %reason, "No command result yet");
                self.register_success(&id).await;
            }
            Err(error) => {
                if !self.cancel.is_cancelled() {
                    self.register_failure(&id, tick, &error.to_string()).await;
                }
            }
        }

        self.tracking.lock().await.in_flight.remove(&id);
    }

    async fn merge(&self, id: &str, epoch: u64, update: &CommandUpdate) {
        let mut ledger = self.ledger.write().await;
        if self.cancel.is_cancelled() || ledger.epoch() != epoch {
            debug!(
                command_id = id,
                epoch,
                current_epoch = ledger.epoch(),
                "Discarding result fetched for a previous session"
            );
            return;
        }

        match ledger.merge_update(id, update) {
            MergeOutcome::Applied => {
                debug!(command_id = id, status = %update.status, "Merged command update");
                let _ = self.events.send(PollEvent::Updated {
                    id: id.to_string(),
                    status: update.status.clone(),
                });
            }
            outcome => trace!(command_id = id, ?outcome, "Command update not applied"),
        }
    }

    async fn register_success(&self, id: &str) {
        let mut tracking = self.tracking.lock().await;
        if let Some(state) = tracking.retry.remove(id) {
            if state.consecutive_failures > 0 {
                info!(
                    command_id = id,
                    consecutive_failures = state.consecutive_failures,
                    "Command polling recovered; resetting backoff"
                );
            }
            if state.stalled {
                let _ = self.events.send(PollEvent::Recovered { id: id.to_string() });
            }
        }
    }

    async fn register_failure(&self, id: &str, tick: u64, error: &str) {
        let policy = self.config.retry;
        let mut tracking = self.tracking.lock().await;
        let state = tracking.retry.entry(id.to_string()).or_default();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        let backoff = policy.backoff_ticks(state.consecutive_failures);
        state.next_attempt_tick = tick + backoff;

        warn!(
            command_id = id,
            consecutive_failures = state.consecutive_failures,
            backoff_ticks = backoff,
            error,
            "Command result fetch failed; will retry"
        );

        if !state.stalled && policy.warn_after > 0 && state.consecutive_failures >= policy.warn_after
        {
            state.stalled = true;
            let _ = self.events.send(PollEvent::Stalled {
                id: id.to_string(),
                failures: state.consecutive_failures,
            });
        }
    }
}
