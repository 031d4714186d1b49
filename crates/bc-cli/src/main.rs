// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use bc_cli::backend::Context;
use bc_cli::{agents, Cli, Commands, Parser};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.logging.init("becon")?;

    let ctx = Context::from_cli(&cli)?;
    match cli.command {
        Commands::Agents => agents::run(&ctx).await,
        Commands::History(args) => args.run(&ctx).await,
        Commands::Send(args) => args.run(&ctx).await,
        Commands::Watch(args) => args.run(&ctx).await,
        Commands::Health(args) => args.run(&ctx).await,
        Commands::Login(args) => args.run(&ctx).await,
    }
}
