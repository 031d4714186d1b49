// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::PathBuf;

use bc_config::CliOverrides;
use bc_domain_types::TerminalPolicy;
use bc_logging::CliLoggingArgs;
use bc_rest_client::AuthScheme;
use clap::{Args, Subcommand};

pub use clap::Parser;

pub mod agents;
pub mod backend;
pub mod commands;
pub mod health;
pub mod login;
pub mod output;

#[derive(clap::Parser)]
#[command(
    name = "becon",
    about = "Becon operator console",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file (default: <config dir>/becon/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub connection: ConnectionArgs,
    #[command(flatten)]
    pub logging: CliLoggingArgs,
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone, Debug, Default)]
pub struct ConnectionArgs {
    /// Platform server base URL
    #[arg(long, global = true)]
    pub server_url: Option<String>,
    /// Session token
    #[arg(long, global = true, hide = true)]
    pub token: Option<String>,
    /// How the token is sent in the Authorization header
    #[arg(long, global = true)]
    pub auth_scheme: Option<AuthScheme>,
    /// Polling interval for pending commands
    #[arg(long, global = true)]
    pub poll_interval_ms: Option<u64>,
    /// Whether cancelled and timed-out commands stop being polled
    #[arg(long, global = true)]
    pub terminal_policy: Option<TerminalPolicy>,
    /// Use the built-in demo backend instead of a server
    #[arg(long, global = true)]
    pub mock: bool,
}

impl ConnectionArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            server_url: self.server_url.clone(),
            token: self.token.clone(),
            auth_scheme: self.auth_scheme,
            poll_interval_ms: self.poll_interval_ms,
            terminal_policy: self.terminal_policy,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List known agents
    Agents,
    /// Show the command history of an agent
    History(commands::HistoryArgs),
    /// Queue a command for an agent
    Send(commands::SendArgs),
    /// Follow an agent's pending commands until interrupted
    Watch(commands::WatchArgs),
    /// Check backend health
    Health(health::HealthArgs),
    /// Obtain a session token
    Login(login::LoginArgs),
}
