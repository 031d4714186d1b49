// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Collaborator boundary between the console engine and the platform server
//!
//! The engine only talks to the server through [`ConsoleApi`]. The REST
//! client and the scripted mock both implement it.

use async_trait::async_trait;
use bc_domain_types::{AgentSummary, CommandType};
use bc_rest_api_contract::{
    CommandRecord, CommandResultResponse, HealthResponse, SubmitCommandResponse,
};
use thiserror::Error;

/// Errors surfaced at the transport boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientApiError {
    #[error("network error: {0}")]
    Network(String),

    /// The server has nothing for this id yet; for results this is the
    /// normal answer while a command is still queued
    #[error("not found: {0}")]
    NotFound(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

pub type ClientApiResult<T> = Result<T, ClientApiError>;

/// Operations the console needs from the platform server
#[async_trait]
pub trait ConsoleApi: Send + Sync {
    /// List every agent known to the server
    async fn fetch_agent_list(&self) -> ClientApiResult<Vec<AgentSummary>>;

    /// Fetch the stored command history of one agent
    async fn fetch_command_history(&self, agent_id: &str) -> ClientApiResult<Vec<CommandRecord>>;

    /// Queue a command for an agent
    async fn submit_command(
        &self,
        agent_id: &str,
        command: &str,
        command_type: &CommandType,
    ) -> ClientApiResult<SubmitCommandResponse>;

    /// Fetch the latest status and result of one command
    async fn fetch_command_result(&self, command_id: &str)
        -> ClientApiResult<CommandResultResponse>;

    /// Probe the server health endpoint
    async fn health(&self) -> ClientApiResult<HealthResponse>;
}

#[async_trait]
impl<T: ConsoleApi + ?Sized> ConsoleApi for std::sync::Arc<T> {
    async fn fetch_agent_list(&self) -> ClientApiResult<Vec<AgentSummary>> {
        (**self).fetch_agent_list().await
    }

    async fn fetch_command_history(&self, agent_id: &str) -> ClientApiResult<Vec<CommandRecord>> {
        (**self).fetch_command_history(agent_id).await
    }

    async fn submit_command(
        &self,
        agent_id: &str,
        command: &str,
        command_type: &CommandType,
    ) -> ClientApiResult<SubmitCommandResponse> {
        (**self).submit_command(agent_id, command, command_type).await
    }

    async fn fetch_command_result(
        &self,
        command_id: &str,
    ) -> ClientApiResult<CommandResultResponse> {
        (**self).fetch_command_result(command_id).await
    }

    async fn health(&self) -> ClientApiResult<HealthResponse> {
        (**self).health().await
    }
}
