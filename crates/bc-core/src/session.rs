// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Operator session over one selected agent
//!
//! [`ConsoleSession`] owns the shared ledger and the polling scheduler of the
//! active agent. Selecting an agent replaces the ledger, seeds it from the
//! server history and starts polling; deselecting stops polling and clears
//! the ledger.

use bc_client_api::ConsoleApi;
use bc_domain_types::{CommandEntry, CommandType, TerminalPolicy};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::dispatch::DispatchClient;
use crate::error::{CoreError, CoreResult};
use crate::ledger::{CommandLedger, SharedLedger};
use crate::polling::{PollEvent, PollerConfig, PollingScheduler, SweepStats};
use crate::render::{render, DisplayForm};
use crate::visibility::VisibilityFilter;

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub poller: PollerConfig,
    pub terminal_policy: TerminalPolicy,
    pub visibility: VisibilityFilter,
}

/// One visible timeline row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub entry: CommandEntry,
    pub rendered: Option<DisplayForm>,
}

struct ActiveAgent<C> {
    agent_id: String,
    scheduler: PollingScheduler<C>,
}

pub struct ConsoleSession<C> {
    api: C,
    settings: SessionSettings,
    ledger: SharedLedger,
    events: broadcast::Sender<PollEvent>,
    active: Mutex<Option<ActiveAgent<C>>>,
}

impl<C> ConsoleSession<C>
where
    C: ConsoleApi + Clone + 'static,
{
    pub fn new(api: C, settings: SessionSettings) -> Self {
        let ledger =
            CommandLedger::detached(settings.terminal_policy, settings.visibility.clone()).shared();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            api,
            settings,
            ledger,
            events,
            active: Mutex::new(None),
        }
    }

    pub fn api(&self) -> &C {
        &self.api
    }

    pub fn ledger(&self) -> SharedLedger {
        self.ledger.clone()
    }

    /// Scheduler notifications across every selection
    pub fn subscribe(&self) -> broadcast::Receiver<PollEvent> {
        self.events.subscribe()
    }

    pub async fn active_agent(&self) -> Option<String> {
        self.active.lock().await.as_ref().map(|active| active.agent_id.clone())
    }

    /// Switch to `agent_id` and return the number of history entries loaded
    ///
    /// When the history fetch fails the ledger is still replaced and polling
    /// still starts; the error is returned for the caller to report.
    pub async fn select_agent(&self, agent_id: &str) -> CoreResult<usize> {
        let mut active = self.active.lock().await;
        if let Some(mut previous) = active.take() {
            previous.scheduler.stop();
            info!(agent_id = %previous.agent_id, "Deselected agent");
        }

        let epoch = {
            let mut ledger = self.ledger.write().await;
            *ledger = CommandLedger::new(
                agent_id,
                self.settings.terminal_policy,
                self.settings.visibility.clone(),
            );
            ledger.epoch()
        };

        let history = self.api.fetch_command_history(agent_id).await;
        let loaded = match history {
            Ok(records) => {
                let mut ledger = self.ledger.write().await;
                // active is held, so nothing else replaces the ledger meanwhile
                debug_assert_eq!(ledger.epoch(), epoch);
                ledger.seed(records.into_iter().map(CommandEntry::from));
                Ok(ledger.len())
            }
            Err(error) => {
                warn!(agent_id, %error, "Failed to load command history");
                Err(CoreError::from(error))
            }
        };

        let mut scheduler = PollingScheduler::with_events(
            self.api.clone(),
            self.ledger.clone(),
            self.settings.poller,
            self.events.clone(),
        );
        scheduler.start();
        *active = Some(ActiveAgent {
            agent_id: agent_id.to_string(),
            scheduler,
        });

        if let Ok(count) = &loaded {
            info!(agent_id, epoch, entries = count, "Selected agent");
        }
        loaded
    }

    /// Stop polling and clear the ledger
    pub async fn deselect(&self) {
        let mut active = self.active.lock().await;
        if let Some(mut previous) = active.take() {
            previous.scheduler.stop();
            info!(agent_id = %previous.agent_id, "Deselected agent");
        }
        *self.ledger.write().await =
            CommandLedger::detached(self.settings.terminal_policy, self.settings.visibility.clone());
    }

    /// Submit a command to the active agent
    pub async fn submit(&self, command: &str, command_type: CommandType) -> CoreResult<CommandEntry> {
        let agent_id = self.active_agent().await.ok_or(CoreError::NoActiveAgent)?;
        DispatchClient::new(self.api.clone(), self.ledger.clone())
            .submit(&agent_id, command, command_type)
            .await
    }

    /// Run one sweep immediately on the active agent
    pub async fn refresh(&self) -> CoreResult<SweepStats> {
        let active = self.active.lock().await;
        let active = active.as_ref().ok_or(CoreError::NoActiveAgent)?;
        Ok(active.scheduler.sweep_once().await)
    }

    /// Visible entries with their rendered results
    pub async fn timeline(&self) -> Vec<TimelineEntry> {
        let ledger = self.ledger.read().await;
        ledger
            .visible()
            .map(|entry| TimelineEntry {
                rendered: entry.result().map(|raw| render(raw, entry.result_type())),
                entry: entry.clone(),
            })
            .collect()
    }
}
