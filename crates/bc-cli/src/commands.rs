// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Per-agent command subcommands: history, send and watch

use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use bc_core::{render, ConsoleSession, PollEvent, TimelineEntry};
use bc_domain_types::CommandType;
use clap::Args;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::backend::{Backend, Context};
use crate::output::{banner, event_line, print_json, timeline_row};

#[derive(Args, Clone, Debug)]
pub struct HistoryArgs {
    /// Agent id
    pub agent: String,
    /// Fetch the latest state of pending commands before printing
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Args, Clone, Debug)]
pub struct SendArgs {
    /// Agent id
    pub agent: String,
    /// Command text; multiple words are joined with spaces
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
    /// Declared command type
    #[arg(long = "type", default_value = "shell")]
    pub command_type: CommandType,
    /// Wait for the command to finish and print its result
    #[arg(long)]
    pub wait: bool,
    /// Give up waiting after this many seconds
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,
}

#[derive(Args, Clone, Debug)]
pub struct WatchArgs {
    /// Agent id
    pub agent: String,
    /// Exit once no commands are pending
    #[arg(long)]
    pub until_idle: bool,
}

/// Session on `agent_id`; history failures are reported and the session kept
async fn open_session(ctx: &Context, agent_id: &str) -> Result<ConsoleSession<Backend>> {
    let session = ConsoleSession::new(ctx.backend()?, ctx.config.session_settings());
    match session.select_agent(agent_id).await {
        Ok(count) => debug!(agent_id, count, "History loaded"),
        Err(err) => eprintln!("{}", banner("Failed to load commands", &err)),
    }
    Ok(session)
}

fn print_timeline(ctx: &Context, timeline: &[TimelineEntry]) -> Result<()> {
    if ctx.json {
        return print_json(timeline);
    }
    if timeline.is_empty() {
        println!("No commands yet");
    }
    for row in timeline {
        println!("{}", timeline_row(row));
    }
    Ok(())
}

fn print_event(ctx: &Context, event: &PollEvent) -> Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string(event)?);
    } else {
        println!("{}", event_line(event));
    }
    Ok(())
}

async fn pending_count(session: &ConsoleSession<Backend>) -> usize {
    session.ledger().read().await.non_terminal().count()
}

impl HistoryArgs {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let session = open_session(ctx, &self.agent).await?;
        if self.refresh {
            let stats = session.refresh().await?;
            debug!(issued = stats.issued, "Refreshed pending commands");
        }
        print_timeline(ctx, &session.timeline().await)?;
        session.deselect().await;
        Ok(())
    }
}

impl SendArgs {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let text = self.command.join(" ");
        let session = open_session(ctx, &self.agent).await?;
        let mut events = session.subscribe();

        let entry = session
            .submit(&text, self.command_type.clone())
            .await
            .context("Failed to send command")?;

        if !self.wait {
            if ctx.json {
                print_json(&entry)?;
            } else {
                println!("Queued {} ({})", entry.id(), entry.status().label());
            }
            session.deselect().await;
            return Ok(());
        }

        let timeout = Duration::from_secs(self.timeout_secs);
        let finished = tokio::time::timeout(timeout, async {
            loop {
                {
                    let ledger = session.ledger();
                    let ledger = ledger.read().await;
                    match ledger.get(entry.id()) {
                        Some(current) if current.is_terminal(ledger.policy()) => {
                            return Ok(current.clone());
                        }
                        Some(_) => {}
                        None => bail!("command {} is no longer tracked", entry.id()),
                    }
                }
                match events.recv().await {
                    Ok(PollEvent::Stalled { id, failures }) if id == entry.id() => {
                        eprintln!("{}", event_line(&PollEvent::Stalled { id, failures }));
                    }
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => bail!("session closed while waiting"),
                }
            }
        })
        .await;

        let done = match finished {
            Ok(result) => result?,
            Err(_) => {
                let status = session
                    .ledger()
                    .read()
                    .await
                    .get(entry.id())
                    .map(|current| current.status().clone())
                    .unwrap_or_else(|| entry.status().clone());
                bail!(
                    "command {} still {} after {}s",
                    entry.id(),
                    status.label(),
                    self.timeout_secs
                )
            }
        };

        let row = TimelineEntry {
            rendered: done.result().map(|raw| render(raw, done.result_type())),
            entry: done,
        };
        if ctx.json {
            print_json(&row)?;
        } else {
            println!("{}", timeline_row(&row));
        }
        session.deselect().await;
        Ok(())
    }
}

impl WatchArgs {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let session = open_session(ctx, &self.agent).await?;
        let mut events = session.subscribe();
        print_timeline(ctx, &session.timeline().await)?;

        loop {
            if self.until_idle && pending_count(&session).await == 0 {
                break;
            }
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                event = events.recv() => match event {
                    Ok(event) => print_event(ctx, &event)?,
                    Err(RecvError::Lagged(skipped)) => debug!(skipped, "Missed poll events"),
                    Err(RecvError::Closed) => break,
                },
            }
        }

        session.deselect().await;
        Ok(())
    }
}
