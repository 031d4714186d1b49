// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Command-related domain types
//!
//! A [`CommandEntry`] is one unit of dispatched work and its tracked
//! lifecycle. Entries are mutated only through [`CommandEntry::apply`], which
//! never touches the identity or the creation timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::status::{StatusCode, TerminalPolicy};

/// Declared type of a command
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CommandType {
    /// Executed by the agent's shell
    #[default]
    Shell,
    /// Handled by the agent's built-in command table
    Intern,
    /// Any other declared type, kept verbatim
    Other(String),
}

impl CommandType {
    pub fn as_str(&self) -> &str {
        match self {
            CommandType::Shell => "shell",
            CommandType::Intern => "intern",
            CommandType::Other(raw) => raw,
        }
    }
}

impl From<String> for CommandType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "shell" => CommandType::Shell,
            "intern" => CommandType::Intern,
            _ => CommandType::Other(raw),
        }
    }
}

impl From<&str> for CommandType {
    fn from(raw: &str) -> Self {
        CommandType::from(raw.to_string())
    }
}

impl From<CommandType> for String {
    fn from(kind: CommandType) -> Self {
        match kind {
            CommandType::Other(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CommandType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(CommandType::from(s))
    }
}

/// Latest state of a command as fetched from the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandUpdate {
    pub status: StatusCode,
    /// Raw result payload, possibly JSON-encoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
}

impl CommandUpdate {
    pub fn status(status: impl Into<StatusCode>) -> Self {
        Self {
            status: status.into(),
            result: None,
            result_type: None,
        }
    }

    pub fn with_result(mut self, result: impl Into<String>, result_type: Option<&str>) -> Self {
        self.result = Some(result.into());
        self.result_type = result_type.map(str::to_string);
        self
    }
}

/// One tracked command in an agent's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntry {
    id: String,
    command: String,
    command_type: CommandType,
    status: StatusCode,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result_type: Option<String>,
}

impl CommandEntry {
    pub fn new(
        id: impl Into<String>,
        command: impl Into<String>,
        command_type: CommandType,
        status: StatusCode,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            command: command.into(),
            command_type,
            status,
            created_at,
            result: None,
            result_type: None,
        }
    }

    /// Attach a result payload, used when seeding from history
    pub fn with_result(mut self, result: impl Into<String>, result_type: Option<String>) -> Self {
        self.result = Some(result.into());
        self.result_type = result_type;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn command_type(&self) -> &CommandType {
        &self.command_type
    }

    pub fn status(&self) -> &StatusCode {
        &self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn result_type(&self) -> Option<&str> {
        self.result_type.as_deref()
    }

    pub fn is_terminal(&self, policy: TerminalPolicy) -> bool {
        self.status.is_terminal(policy)
    }

    /// Apply a fetched update in place.
    ///
    /// Replaces the status; replaces result and result type only when the
    /// update carries a result. Returns whether anything changed.
    pub fn apply(&mut self, update: &CommandUpdate) -> bool {
        let mut changed = false;
        if self.status != update.status {
            self.status = update.status.clone();
            changed = true;
        }
        if let Some(result) = &update.result {
            if self.result.as_deref() != Some(result.as_str()) {
                self.result = Some(result.clone());
                changed = true;
            }
            if self.result_type != update.result_type {
                self.result_type = update.result_type.clone();
                changed = true;
            }
        }
        changed
    }
}
