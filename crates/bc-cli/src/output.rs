// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Text and JSON presentation

use std::fmt::Display;

use bc_core::{PollEvent, TimelineEntry};
use bc_domain_types::{AgentSummary, StatusClass};
use serde::Serialize;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Single-line notice for a list-level failure; the command keeps going
pub fn banner(context: &str, error: &impl Display) -> String {
    format!("[!] {}: {}", context, error)
}

pub fn agent_line(agent: &AgentSummary) -> String {
    format!(
        "{} {:<12} {:<16} {:<15} {:<8} {:<6} last seen {}",
        if agent.is_active { "*" } else { " " },
        agent.id,
        agent.hostname,
        agent.ip,
        agent.os,
        agent.protocol,
        agent.last_seen.format("%Y-%m-%d %H:%M:%S"),
    )
}

fn status_marker(class: StatusClass) -> &'static str {
    match class {
        StatusClass::Success => "ok",
        StatusClass::Failure => "!!",
        StatusClass::InProgress => "..",
    }
}

/// Header line plus the rendered result, when there is one
pub fn timeline_row(row: &TimelineEntry) -> String {
    let entry = &row.entry;
    let status = entry.status();
    let mut text = format!(
        "{} [{}] {:<10} {} ({}) {}",
        entry.created_at().format("%Y-%m-%d %H:%M:%S"),
        status_marker(status.classification()),
        status.label(),
        entry.command(),
        entry.command_type(),
        entry.id(),
    );
    if let Some(rendered) = &row.rendered {
        text.push('\n');
        text.push_str(&rendered.to_string());
    }
    text
}

pub fn event_line(event: &PollEvent) -> String {
    match event {
        PollEvent::Updated { id, status } => format!("{} -> {}", id, status.label()),
        PollEvent::Stalled { id, failures } => {
            format!("{}: result fetch failed {} times, still retrying", id, failures)
        }
        PollEvent::Recovered { id } => format!("{}: result fetch recovered", id),
    }
}
