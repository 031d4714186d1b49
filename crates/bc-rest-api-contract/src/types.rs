// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! API contract types for the Becon platform REST service

use bc_domain_types::{AgentSummary, CommandEntry, CommandType, CommandUpdate, StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Agent row returned by `GET /api/v1/frontend/agents`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub id: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub protocol: String,
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub is_active: bool,
}

impl From<AgentResponse> for AgentSummary {
    fn from(agent: AgentResponse) -> Self {
        AgentSummary {
            id: agent.id,
            hostname: agent.hostname,
            ip: agent.ip,
            os: agent.os,
            protocol: agent.protocol,
            last_seen: agent.last_seen,
            is_active: agent.is_active,
        }
    }
}

/// One historical command returned by
/// `GET /api/v1/general/agents/{agent_id}/commands`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub agent_id: Option<String>,
    pub command: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub args: Vec<String>,
    #[serde(rename = "type", default)]
    pub command_type: CommandType,
    pub status: StatusCode,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(alias = "result", skip_serializing_if = "Option::is_none", default)]
    pub output: Option<String>,
    #[serde(alias = "resultType", skip_serializing_if = "Option::is_none", default)]
    pub result_type: Option<String>,
}

impl From<CommandRecord> for CommandEntry {
    fn from(record: CommandRecord) -> Self {
        let entry = CommandEntry::new(
            record.id,
            record.command,
            record.command_type,
            record.status,
            record.created_at,
        );
        match record.output.filter(|output| !output.is_empty()) {
            Some(output) => entry.with_result(output, record.result_type),
            None => entry,
        }
    }
}

/// Body of `POST /api/v1/general/queue/command/{agent_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SubmitCommandRequest {
    #[validate(length(min = 1, message = "Command cannot be empty"))]
    pub command: String,
    #[serde(rename = "type")]
    pub command_type: CommandType,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub args: Vec<String>,
}

impl SubmitCommandRequest {
    pub fn new(command: impl Into<String>, command_type: CommandType) -> Self {
        Self {
            command: command.into(),
            command_type,
            args: vec![],
        }
    }
}

/// Response of the command queue endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitCommandResponse {
    pub id: String,
    pub status: StatusCode,
}

/// Response of `GET /api/v1/general/commands/{command_id}/result`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResultResponse {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    pub status: StatusCode,
    #[serde(alias = "result", skip_serializing_if = "Option::is_none", default)]
    pub output: Option<String>,
    #[serde(alias = "resultType", skip_serializing_if = "Option::is_none", default)]
    pub result_type: Option<String>,
}

impl From<CommandResultResponse> for CommandUpdate {
    fn from(response: CommandResultResponse) -> Self {
        // The server omits empty output, treat "" the same way
        match response.output.filter(|output| !output.is_empty()) {
            Some(output) => CommandUpdate {
                status: response.status,
                result: Some(output),
                result_type: response.result_type,
            },
            None => CommandUpdate::status(response.status),
        }
    }
}

/// Response of `GET /api/v1/general/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

impl HealthResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Body of `POST /api/v1/auth/login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username cannot be empty"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_domain_types::KnownStatus;

    #[test]
    fn command_record_parses_server_history_row() {
        let json = r#"{
            "agent_id": "agent-001",
            "id": "3f1c",
            "command": "whoami",
            "type": "shell",
            "status": "cs_cmpltd",
            "created_at": "2025-04-01T10:00:00Z",
            "updated_at": "2025-04-01T10:00:03Z"
        }"#;

        let record: CommandRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.command_type, CommandType::Shell);
        assert_eq!(record.status, StatusCode::Known(KnownStatus::Completed));

        let entry = CommandEntry::from(record);
        assert_eq!(entry.id(), "3f1c");
        assert!(entry.result().is_none());
    }

    #[test]
    fn result_response_accepts_output_or_result() {
        let from_output: CommandResultResponse =
            serde_json::from_str(r#"{"id":"c-1","status":"cs_cmpltd","output":"root"}"#).unwrap();
        let from_result: CommandResultResponse = serde_json::from_str(
            r#"{"status":"cs_cmpltd","result":"[\"root\"]","resultType":"list"}"#,
        )
        .unwrap();

        assert_eq!(from_output.output.as_deref(), Some("root"));
        assert_eq!(from_result.output.as_deref(), Some("[\"root\"]"));
        assert_eq!(from_result.result_type.as_deref(), Some("list"));
    }

    #[test]
    fn empty_output_becomes_status_only_update() {
        let response = CommandResultResponse {
            id: None,
            status: StatusCode::parse("cs_rng"),
            output: Some(String::new()),
            result_type: Some("text".to_string()),
        };
        let update = CommandUpdate::from(response);
        assert!(update.result.is_none());
        assert!(update.result_type.is_none());
    }

    #[test]
    fn submit_request_serializes_type_field() {
        let request = SubmitCommandRequest::new("get-system-info", CommandType::Intern);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, serde_json::json!({"command": "get-system-info", "type": "intern"}));
    }

    #[test]
    fn submit_response_keeps_unknown_initial_status() {
        let response: SubmitCommandResponse =
            serde_json::from_str(r#"{"status":"queued","id":"c-9"}"#).unwrap();
        assert_eq!(response.status, StatusCode::Unknown("queued".to_string()));
    }
}
