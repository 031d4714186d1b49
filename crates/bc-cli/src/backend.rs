// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Configuration resolution and backend construction

use std::sync::Arc;

use anyhow::{Context as _, Result};
use bc_client_api::ConsoleApi;
use bc_client_mock::MockConsoleApi;
use bc_config::ConsoleConfig;
use bc_logging::redact;
use bc_rest_client::RestClient;
use tracing::{debug, info};

use crate::Cli;

pub type Backend = Arc<dyn ConsoleApi>;

/// Resolved settings shared by every subcommand
pub struct Context {
    pub config: ConsoleConfig,
    pub mock: bool,
    pub json: bool,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let (mut config, report) =
            bc_config::load(cli.config.as_deref()).context("failed to load configuration")?;
        config.apply(&cli.connection.overrides());
        config.validate().context("invalid command-line override")?;

        debug!(
            file = ?report.file,
            env_keys = ?report.env_keys,
            server_url = %config.server_url,
            token = config.token.as_ref().map(redact),
            "Resolved configuration"
        );

        Ok(Self {
            config,
            mock: cli.connection.mock,
            json: cli.json,
        })
    }

    pub fn rest_client(&self) -> Result<RestClient> {
        let base_url = self.config.server_url()?;
        RestClient::with_network_config(base_url, self.config.auth(), &self.config.network())
            .context("failed to build HTTP client")
    }

    pub fn backend(&self) -> Result<Backend> {
        if self.mock {
            info!("Using demo backend");
            return Ok(Arc::new(MockConsoleApi::demo()));
        }
        Ok(Arc::new(self.rest_client()?))
    }
}
