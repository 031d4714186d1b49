// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Command submission

use bc_client_api::ConsoleApi;
use bc_domain_types::{CommandEntry, CommandType};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult};
use crate::ledger::SharedLedger;

/// Submits commands and records them in the ledger
///
/// A submission is all-or-nothing: the ledger only changes once the server
/// has accepted the command.
#[derive(Debug, Clone)]
pub struct DispatchClient<C> {
    api: C,
    ledger: SharedLedger,
}

impl<C> DispatchClient<C>
where
    C: ConsoleApi,
{
    pub fn new(api: C, ledger: SharedLedger) -> Self {
        Self { api, ledger }
    }

    pub async fn submit(
        &self,
        agent_id: &str,
        command: &str,
        command_type: CommandType,
    ) -> CoreResult<CommandEntry> {
        if command.trim().is_empty() {
            return Err(CoreError::EmptyCommand);
        }

        let epoch = {
            let ledger = self.ledger.read().await;
            if ledger.agent_id() != agent_id {
                return Err(CoreError::SessionChanged);
            }
            ledger.epoch()
        };
        let created_at = Utc::now();

        debug!(agent_id, command, %command_type, epoch, "Submitting command");
        let response = self.api.submit_command(agent_id, command, &command_type).await?;

        let entry =
            CommandEntry::new(response.id, command, command_type, response.status, created_at);

        let mut ledger = self.ledger.write().await;
        if ledger.epoch() != epoch {
            warn!(
                agent_id,
                command_id = entry.id(),
                epoch,
                current_epoch = ledger.epoch(),
                "Agent changed while submitting; not recording command"
            );
            return Err(CoreError::SessionChanged);
        }
        ledger.insert(entry.clone())?;

        info!(agent_id, command_id = entry.id(), status = %entry.status(), "Command queued");
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::CommandLedger;
    use crate::visibility::VisibilityFilter;
    use bc_client_api::ClientApiError;
    use bc_client_mock::MockConsoleApi;
    use bc_domain_types::{StatusCode, TerminalPolicy};
    use bc_rest_api_contract::SubmitCommandResponse;

    fn shared(agent_id: &str) -> SharedLedger {
        CommandLedger::new(agent_id, TerminalPolicy::default(), VisibilityFilter::default())
            .shared()
    }

    #[tokio::test]
    async fn submit_inserts_at_head() {
        let mock = MockConsoleApi::new();
        let ledger = shared("agent-1");
        let dispatch = DispatchClient::new(mock.clone(), ledger.clone());

        let first = dispatch.submit("agent-1", "whoami", CommandType::Shell).await.unwrap();
        let second = dispatch.submit("agent-1", "uptime", CommandType::Shell).await.unwrap();

        let ledger = ledger.read().await;
        let ids: Vec<_> = ledger.entries().map(|e| e.id().to_string()).collect();
        assert_eq!(ids, [second.id(), first.id()]);
        assert_eq!(first.status(), &StatusCode::PENDING);
    }

    #[tokio::test]
    async fn transport_failure_leaves_ledger_untouched() {
        let mock = MockConsoleApi::new();
        mock.push_submit(Err(ClientApiError::Network("connection reset".to_string())));
        let ledger = shared("agent-1");
        let dispatch = DispatchClient::new(mock, ledger.clone());

        let err = dispatch.submit("agent-1", "whoami", CommandType::Shell).await.unwrap_err();
        assert!(matches!(err, CoreError::Transport(ClientApiError::Network(_))));
        assert!(ledger.read().await.is_empty());
    }

    #[tokio::test]
    async fn blank_command_is_rejected_before_sending() {
        let mock = MockConsoleApi::new();
        let dispatch = DispatchClient::new(mock.clone(), shared("agent-1"));

        let err = dispatch.submit("agent-1", "  \t", CommandType::Shell).await.unwrap_err();
        assert_eq!(err, CoreError::EmptyCommand);
        assert!(mock.submitted().is_empty());
    }

    #[tokio::test]
    async fn duplicate_server_id_is_reported() {
        let mock = MockConsoleApi::new();
        for _ in 0..2 {
            mock.push_submit(Ok(SubmitCommandResponse {
                id: "same".to_string(),
                status: StatusCode::PENDING,
            }));
        }
        let ledger = shared("agent-1");
        let dispatch = DispatchClient::new(mock, ledger.clone());

        dispatch.submit("agent-1", "whoami", CommandType::Shell).await.unwrap();
        let err = dispatch.submit("agent-1", "whoami", CommandType::Shell).await.unwrap_err();
        assert_eq!(err, CoreError::DuplicateId("same".to_string()));
        assert_eq!(ledger.read().await.len(), 1);
    }

    #[tokio::test]
    async fn response_after_agent_switch_is_dropped() {
        let mock = MockConsoleApi::new().with_delay(std::time::Duration::from_millis(50));
        let ledger = shared("agent-1");
        let dispatch = DispatchClient::new(mock, ledger.clone());

        let submit = tokio::spawn({
            let dispatch = dispatch.clone();
            async move { dispatch.submit("agent-1", "whoami", CommandType::Shell).await }
        });
        tokio::task::yield_now().await;
        *ledger.write().await =
            CommandLedger::new("agent-2", TerminalPolicy::default(), VisibilityFilter::default());

        assert_eq!(submit.await.unwrap().unwrap_err(), CoreError::SessionChanged);
        assert!(ledger.read().await.is_empty());
    }
}
