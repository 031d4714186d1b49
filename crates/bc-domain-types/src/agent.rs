// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Agent-related domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inventory row for a remote agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub id: String,
    pub hostname: String,
    pub ip: String,
    pub os: String,
    pub protocol: String,
    pub last_seen: DateTime<Utc>,
    pub is_active: bool,
}
