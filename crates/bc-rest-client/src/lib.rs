// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! REST API client for the Becon platform server
//!
//! Provides a small HTTP client for the operator-facing endpoints of the
//! platform and implements the [`ConsoleApi`] trait over it so the console
//! engine can drive a real server.

pub mod auth;
pub mod client;
pub mod error;
pub mod network_config;

pub use auth::*;
pub use client::*;
pub use error::*;
pub use network_config::NetworkConfig;

use async_trait::async_trait;
use bc_client_api::{ClientApiResult, ConsoleApi};
use bc_domain_types::{AgentSummary, CommandType};
use bc_rest_api_contract::*;

#[async_trait]
impl ConsoleApi for client::RestClient {
    async fn fetch_agent_list(&self) -> ClientApiResult<Vec<AgentSummary>> {
        self.list_agents().await.map_err(Into::into)
    }

    async fn fetch_command_history(&self, agent_id: &str) -> ClientApiResult<Vec<CommandRecord>> {
        self.list_agent_commands(agent_id).await.map_err(Into::into)
    }

    async fn submit_command(
        &self,
        agent_id: &str,
        command: &str,
        command_type: &CommandType,
    ) -> ClientApiResult<SubmitCommandResponse> {
        let request = RestClient::submit_request(command, command_type);
        self.queue_command(agent_id, &request).await.map_err(Into::into)
    }

    async fn fetch_command_result(
        &self,
        command_id: &str,
    ) -> ClientApiResult<CommandResultResponse> {
        self.get_command_result(command_id).await.map_err(Into::into)
    }

    async fn health(&self) -> ClientApiResult<HealthResponse> {
        RestClient::health(self).await.map_err(Into::into)
    }
}
