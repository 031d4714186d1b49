// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Backend health command

use anyhow::Result;
use bc_core::{BackendStatus, HealthMonitor};
use clap::Args;

use crate::backend::Context;
use crate::output::print_json;

/// Arguments for the health command
#[derive(Args, Clone, Debug)]
#[command(about = "Check whether the platform server is reachable")]
pub struct HealthArgs {
    /// Keep probing at the configured interval and print every change
    #[arg(long)]
    pub watch: bool,
}

fn describe(status: &BackendStatus) -> String {
    match status {
        BackendStatus::Checking => "Checking backend...".to_string(),
        BackendStatus::Ok(Some(message)) => format!("Backend OK: {}", message),
        BackendStatus::Ok(None) => "Backend OK".to_string(),
        BackendStatus::Error(reason) => format!("Backend unreachable: {}", reason),
    }
}

fn report(ctx: &Context, status: &BackendStatus) -> Result<()> {
    if ctx.json {
        return print_json(status);
    }
    println!("{}", describe(status));
    Ok(())
}

impl HealthArgs {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let mut monitor = HealthMonitor::new(ctx.backend()?, ctx.config.health_interval());

        if !self.watch {
            let status = monitor.check_once().await;
            report(ctx, &status)?;
            if !status.is_ok() {
                anyhow::bail!("health check failed");
            }
            return Ok(());
        }

        let mut updates = monitor.subscribe();
        monitor.start();
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let status = updates.borrow_and_update().clone();
                    report(ctx, &status)?;
                }
            }
        }
        monitor.stop();
        Ok(())
    }
}
