// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Command lifecycle status taxonomy
//!
//! Status codes travel over the wire as short string tokens. The taxonomy is
//! a best-effort lookup: tokens outside the known set are carried verbatim as
//! [`StatusCode::Unknown`] and are displayed unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{EnumIter, EnumString, IntoStaticStr};

/// Status tokens understood by the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
pub enum KnownStatus {
    #[strum(serialize = "cs_pndg")]
    Pending,
    #[strum(serialize = "cs_rng")]
    Running,
    #[strum(serialize = "cs_cmpltd")]
    Completed,
    #[strum(serialize = "cs_fld")]
    Failed,
    #[strum(serialize = "cs_clld")]
    Cancelled,
    #[strum(serialize = "cs_tmt")]
    Timeout,
    #[strum(serialize = "cs_ack")]
    Acknowledged,
    #[strum(serialize = "c_sent")]
    SentToClient,
    #[strum(serialize = "s_sent")]
    SentToServer,
    #[strum(serialize = "c_received")]
    ReceivedFromClient,
    #[strum(serialize = "s_received")]
    ReceivedFromServer,
}

impl KnownStatus {
    /// Wire token for this status
    pub fn token(self) -> &'static str {
        self.into()
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            KnownStatus::Pending => "Pending",
            KnownStatus::Running => "Running",
            KnownStatus::Completed => "Completed",
            KnownStatus::Failed => "Failed",
            KnownStatus::Cancelled => "Cancelled",
            KnownStatus::Timeout => "Timeout",
            KnownStatus::Acknowledged => "Acknowledged",
            KnownStatus::SentToClient => "Sent to Client",
            KnownStatus::SentToServer => "Sent to Server",
            KnownStatus::ReceivedFromClient => "Received from Client",
            KnownStatus::ReceivedFromServer => "Received from Server",
        }
    }
}

/// Coarse classification used for badges and colouring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusClass {
    Success,
    Failure,
    InProgress,
}

/// Which statuses stop polling
///
/// `Strict` only treats completed and failed as terminal. `NonProgressing`
/// additionally stops on cancelled and timed-out commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalPolicy {
    Strict,
    #[default]
    NonProgressing,
}

impl fmt::Display for TerminalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalPolicy::Strict => write!(f, "strict"),
            TerminalPolicy::NonProgressing => write!(f, "non-progressing"),
        }
    }
}

impl FromStr for TerminalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(TerminalPolicy::Strict),
            "non-progressing" | "non_progressing" => Ok(TerminalPolicy::NonProgressing),
            _ => Err(format!(
                "Invalid terminal policy: {}. Use 'strict' or 'non-progressing'",
                s
            )),
        }
    }
}

/// Lifecycle status of a command as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusCode {
    Known(KnownStatus),
    /// A token outside the known taxonomy, kept verbatim
    Unknown(String),
}

impl StatusCode {
    pub const PENDING: StatusCode = StatusCode::Known(KnownStatus::Pending);
    pub const COMPLETED: StatusCode = StatusCode::Known(KnownStatus::Completed);
    pub const FAILED: StatusCode = StatusCode::Known(KnownStatus::Failed);

    /// Parse a wire token; never fails
    pub fn parse(token: &str) -> Self {
        match KnownStatus::from_str(token) {
            Ok(known) => StatusCode::Known(known),
            Err(_) => StatusCode::Unknown(token.to_string()),
        }
    }

    /// Wire token
    pub fn as_str(&self) -> &str {
        match self {
            StatusCode::Known(known) => known.token(),
            StatusCode::Unknown(raw) => raw,
        }
    }

    /// Display label; unknown codes pass through unchanged
    pub fn label(&self) -> &str {
        match self {
            StatusCode::Known(known) => known.label(),
            StatusCode::Unknown(raw) => raw,
        }
    }

    pub fn classification(&self) -> StatusClass {
        match self {
            StatusCode::Known(KnownStatus::Completed) => StatusClass::Success,
            StatusCode::Known(
                KnownStatus::Failed | KnownStatus::Cancelled | KnownStatus::Timeout,
            ) => StatusClass::Failure,
            _ => StatusClass::InProgress,
        }
    }

    pub fn is_terminal(&self, policy: TerminalPolicy) -> bool {
        match self {
            StatusCode::Known(KnownStatus::Completed | KnownStatus::Failed) => true,
            StatusCode::Known(KnownStatus::Cancelled | KnownStatus::Timeout) => {
                policy == TerminalPolicy::NonProgressing
            }
            _ => false,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, StatusCode::Known(_))
    }
}

impl From<KnownStatus> for StatusCode {
    fn from(known: KnownStatus) -> Self {
        StatusCode::Known(known)
    }
}

impl From<String> for StatusCode {
    fn from(token: String) -> Self {
        match KnownStatus::from_str(&token) {
            Ok(known) => StatusCode::Known(known),
            Err(_) => StatusCode::Unknown(token),
        }
    }
}

impl From<&str> for StatusCode {
    fn from(token: &str) -> Self {
        StatusCode::parse(token)
    }
}

impl From<StatusCode> for String {
    fn from(status: StatusCode) -> Self {
        match status {
            StatusCode::Known(known) => known.token().to_string(),
            StatusCode::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
