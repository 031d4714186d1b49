// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use bc_client_api::ClientApiError;
use thiserror::Error;

/// Errors surfaced by the console engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("command id already present in the ledger: {0}")]
    DuplicateId(String),

    #[error("command text cannot be empty")]
    EmptyCommand,

    #[error("no agent is selected")]
    NoActiveAgent,

    #[error("the agent session changed while the request was in flight")]
    SessionChanged,

    #[error("transport error: {0}")]
    Transport(#[from] ClientApiError),
}

pub type CoreResult<T> = Result<T, CoreError>;
