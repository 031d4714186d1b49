// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Scripted in-memory implementation of [`ConsoleApi`]
//!
//! Tests script the responses each endpoint returns, can hold individual
//! result fetches open until released, and inspect how often each endpoint
//! was called. With auto-progress enabled, submitted commands move through
//! running to completed on successive fetches, which is enough for offline
//! demos of the console.

use async_trait::async_trait;
use bc_client_api::{ClientApiError, ClientApiResult, ConsoleApi};
use bc_domain_types::{AgentSummary, CommandType, KnownStatus, StatusCode};
use bc_rest_api_contract::{
    CommandRecord, CommandResultResponse, HealthResponse, SubmitCommandResponse,
};
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;

/// A submission recorded by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedCommand {
    pub agent_id: String,
    pub command: String,
    pub command_type: CommandType,
}

/// Handle that keeps result fetches for one command blocked until released
#[derive(Debug, Clone)]
pub struct ResultGate {
    permits: Arc<Semaphore>,
}

impl ResultGate {
    /// Let one blocked (or future) fetch through
    pub fn release(&self) {
        self.permits.add_permits(1);
    }

    /// Let every fetch through from now on
    pub fn open(&self) {
        self.permits.close();
    }
}

#[derive(Debug, Default)]
struct MockState {
    agents: Vec<AgentSummary>,
    histories: HashMap<String, ClientApiResult<Vec<CommandRecord>>>,
    submit_script: VecDeque<ClientApiResult<SubmitCommandResponse>>,
    result_scripts: HashMap<String, VecDeque<ClientApiResult<CommandResultResponse>>>,
    gates: HashMap<String, ResultGate>,
    health: Option<ClientApiResult<HealthResponse>>,
    submitted: Vec<SubmittedCommand>,
    auto_progress: HashMap<String, (String, usize)>,
    result_calls: HashMap<String, usize>,
    history_calls: usize,
    health_calls: usize,
    next_id: u64,
}

/// Scripted [`ConsoleApi`] implementation
#[derive(Debug, Clone, Default)]
pub struct MockConsoleApi {
    state: Arc<Mutex<MockState>>,
    delay: Option<Duration>,
    auto_progress: bool,
}

impl MockConsoleApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before answering any call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Submitted commands without a result script report running on the
    /// first fetch and completed on every later one
    pub fn with_auto_progress(mut self) -> Self {
        self.auto_progress = true;
        self
    }

    /// Mock preloaded with two agents and a short history
    pub fn demo() -> Self {
        let mock = Self::new().with_auto_progress();
        let now = Utc::now();
        mock.set_agents(vec![
            AgentSummary {
                id: "agent-001".to_string(),
                hostname: "build-box".to_string(),
                ip: "10.0.0.12".to_string(),
                os: "linux".to_string(),
                protocol: "https".to_string(),
                last_seen: now,
                is_active: true,
            },
            AgentSummary {
                id: "agent-002".to_string(),
                hostname: "win-desk".to_string(),
                ip: "10.0.0.31".to_string(),
                os: "windows".to_string(),
                protocol: "dns".to_string(),
                last_seen: now - ChronoDuration::hours(3),
                is_active: false,
            },
        ]);
        mock.set_history(
            "agent-001",
            vec![
                history_record("h-2", "get-system-info", "intern", "cs_cmpltd", now)
                    .with_output(r#"{"hostname":"build-box","os":"linux","cores":8}"#, "key_value"),
                history_record(
                    "h-1",
                    "return_results",
                    "intern",
                    "cs_cmpltd",
                    now - ChronoDuration::minutes(5),
                ),
            ],
        );
        mock
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_agents(&self, agents: Vec<AgentSummary>) {
        self.lock().agents = agents;
    }

    pub fn set_history(&self, agent_id: &str, records: Vec<CommandRecord>) {
        self.lock().histories.insert(agent_id.to_string(), Ok(records));
    }

    pub fn fail_history(&self, agent_id: &str, error: ClientApiError) {
        self.lock().histories.insert(agent_id.to_string(), Err(error));
    }

    /// Queue the next submit response; unscripted submits get `cmd-N` ids
    pub fn push_submit(&self, response: ClientApiResult<SubmitCommandResponse>) {
        self.lock().submit_script.push_back(response);
    }

    /// Queue a result response for a command
    ///
    /// Responses are consumed in order; the last one keeps being returned.
    pub fn push_result(&self, command_id: &str, response: ClientApiResult<CommandResultResponse>) {
        self.lock()
            .result_scripts
            .entry(command_id.to_string())
            .or_default()
            .push_back(response);
    }

    /// Drop any queued result responses for a command
    pub fn reset_results(&self, command_id: &str) {
        self.lock().result_scripts.remove(command_id);
    }

    /// Convenience for a successful result response
    pub fn respond(
        &self,
        command_id: &str,
        status: &str,
        output: Option<&str>,
        result_type: Option<&str>,
    ) {
        self.push_result(
            command_id,
            Ok(CommandResultResponse {
                id: Some(command_id.to_string()),
                status: StatusCode::parse(status),
                output: output.map(str::to_string),
                result_type: result_type.map(str::to_string),
            }),
        );
    }

    /// Block result fetches for `command_id` until the gate is released
    pub fn hold_results(&self, command_id: &str) -> ResultGate {
        let gate = ResultGate {
            permits: Arc::new(Semaphore::new(0)),
        };
        self.lock().gates.insert(command_id.to_string(), gate.clone());
        gate
    }

    pub fn set_health(&self, health: ClientApiResult<HealthResponse>) {
        self.lock().health = Some(health);
    }

    pub fn submitted(&self) -> Vec<SubmittedCommand> {
        self.lock().submitted.clone()
    }

    /// Number of result fetches started for a command
    pub fn result_calls(&self, command_id: &str) -> usize {
        self.lock().result_calls.get(command_id).copied().unwrap_or(0)
    }

    pub fn history_calls(&self) -> usize {
        self.lock().history_calls
    }

    pub fn health_calls(&self) -> usize {
        self.lock().health_calls
    }

    async fn simulate_delay(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn next_result(&self, command_id: &str) -> ClientApiResult<CommandResultResponse> {
        let mut state = self.lock();
        if let Some(script) = state.result_scripts.get_mut(command_id) {
            let response = if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            };
            if let Some(response) = response {
                return response;
            }
        }

        if let Some((command, fetches)) = state.auto_progress.get_mut(command_id) {
            *fetches += 1;
            let response = if *fetches == 1 {
                CommandResultResponse {
                    id: Some(command_id.to_string()),
                    status: KnownStatus::Running.into(),
                    output: None,
                    result_type: None,
                }
            } else {
                CommandResultResponse {
                    id: Some(command_id.to_string()),
                    status: StatusCode::COMPLETED,
                    output: Some(format!("executed: {}", command)),
                    result_type: Some("text".to_string()),
                }
            };
            return Ok(response);
        }

        Err(ClientApiError::NotFound(format!("Command result not found: {}", command_id)))
    }
}

/// Build a history record for scripting
pub fn history_record(
    id: &str,
    command: &str,
    command_type: &str,
    status: &str,
    created_at: chrono::DateTime<Utc>,
) -> CommandRecord {
    CommandRecord {
        id: id.to_string(),
        agent_id: None,
        command: command.to_string(),
        args: vec![],
        command_type: CommandType::from(command_type),
        status: StatusCode::parse(status),
        created_at,
        updated_at: None,
        output: None,
        result_type: None,
    }
}

/// Builder helpers for scripted history records
pub trait CommandRecordExt {
    fn with_output(self, output: &str, result_type: &str) -> Self;
}

impl CommandRecordExt for CommandRecord {
    fn with_output(mut self, output: &str, result_type: &str) -> Self {
        self.output = Some(output.to_string());
        self.result_type = Some(result_type.to_string());
        self
    }
}

#[async_trait]
impl ConsoleApi for MockConsoleApi {
    async fn fetch_agent_list(&self) -> ClientApiResult<Vec<AgentSummary>> {
        self.simulate_delay().await;
        Ok(self.lock().agents.clone())
    }

    async fn fetch_command_history(&self, agent_id: &str) -> ClientApiResult<Vec<CommandRecord>> {
        self.lock().history_calls += 1;
        self.simulate_delay().await;
        self.lock().histories.get(agent_id).cloned().unwrap_or_else(|| Ok(vec![]))
    }

    async fn submit_command(
        &self,
        agent_id: &str,
        command: &str,
        command_type: &CommandType,
    ) -> ClientApiResult<SubmitCommandResponse> {
        self.simulate_delay().await;
        let mut state = self.lock();
        state.submitted.push(SubmittedCommand {
            agent_id: agent_id.to_string(),
            command: command.to_string(),
            command_type: command_type.clone(),
        });

        if let Some(scripted) = state.submit_script.pop_front() {
            return scripted;
        }

        state.next_id += 1;
        let id = format!("cmd-{}", state.next_id);
        if self.auto_progress {
            state.auto_progress.insert(id.clone(), (command.to_string(), 0));
        }
        tracing::debug!(agent_id, command_id = %id, "Mock queued command");
        Ok(SubmitCommandResponse {
            id,
            status: StatusCode::PENDING,
        })
    }

    async fn fetch_command_result(
        &self,
        command_id: &str,
    ) -> ClientApiResult<CommandResultResponse> {
        let gate = {
            let mut state = self.lock();
            *state.result_calls.entry(command_id.to_string()).or_default() += 1;
            state.gates.get(command_id).cloned()
        };

        if let Some(gate) = gate {
            // A closed semaphore means the gate was opened for good
            if let Ok(permit) = gate.permits.acquire().await {
                permit.forget();
            }
        }

        self.simulate_delay().await;
        self.next_result(command_id)
    }

    async fn health(&self) -> ClientApiResult<HealthResponse> {
        self.lock().health_calls += 1;
        self.simulate_delay().await;
        self.lock().health.clone().unwrap_or_else(|| {
            Ok(HealthResponse {
                status: "ok".to_string(),
                message: Some("mock server".to_string()),
            })
        })
    }
}
