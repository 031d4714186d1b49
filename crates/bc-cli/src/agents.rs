// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context as _, Result};

use crate::backend::Context;
use crate::output::{agent_line, print_json};

pub async fn run(ctx: &Context) -> Result<()> {
    let api = ctx.backend()?;
    let agents = api.fetch_agent_list().await.context("Failed to load agents")?;

    if ctx.json {
        return print_json(&agents);
    }
    if agents.is_empty() {
        println!("No agents registered");
        return Ok(());
    }
    for agent in &agents {
        println!("{}", agent_line(agent));
    }
    Ok(())
}
