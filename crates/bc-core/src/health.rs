// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Periodic backend health probe

use std::sync::Arc;
use std::time::Duration;

use bc_client_api::ConsoleApi;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::polling::MIN_TICK_PERIOD;

pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum BackendStatus {
    Checking,
    Ok(Option<String>),
    Error(String),
}

impl BackendStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, BackendStatus::Ok(_))
    }
}

pub struct HealthMonitor<C> {
    api: Arc<C>,
    interval: Duration,
    status: Arc<watch::Sender<BackendStatus>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<C> HealthMonitor<C>
where
    C: ConsoleApi + 'static,
{
    pub fn new(api: C, interval: Duration) -> Self {
        let (status, _) = watch::channel(BackendStatus::Checking);
        Self {
            api: Arc::new(api),
            interval: interval.max(MIN_TICK_PERIOD),
            status: Arc::new(status),
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<BackendStatus> {
        self.status.subscribe()
    }

    pub fn current(&self) -> BackendStatus {
        self.status.borrow().clone()
    }

    /// Probe once and publish the result
    pub async fn check_once(&self) -> BackendStatus {
        let status = probe(self.api.as_ref()).await;
        self.status.send_replace(status.clone());
        status
    }

    /// Probe immediately, then once per interval until stopped
    pub fn start(&mut self) {
        if self.task.is_some() || self.cancel.is_cancelled() {
            return;
        }
        let api = self.api.clone();
        let status = self.status.clone();
        let cancel = self.cancel.clone();
        let period = self.interval;

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let next = probe(api.as_ref()).await;
                        status.send_if_modified(|current| {
                            if *current == next {
                                false
                            } else {
                                *current = next;
                                true
                            }
                        });
                    }
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        self.cancel.cancel();
        self.task.take();
    }
}

impl<C> Drop for HealthMonitor<C> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn probe<C: ConsoleApi + ?Sized>(api: &C) -> BackendStatus {
    match api.health().await {
        Ok(health) if health.is_ok() => {
            debug!(message = ?health.message, "Backend healthy");
            BackendStatus::Ok(health.message)
        }
        Ok(health) => {
            warn!(status = %health.status, "Backend reported unhealthy status");
            BackendStatus::Error(health.message.unwrap_or(health.status))
        }
        Err(error) => {
            warn!(%error, "Backend health check failed");
            BackendStatus::Error(error.to_string())
        }
    }
}
