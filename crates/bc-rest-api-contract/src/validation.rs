// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Validation helpers for API contract types

use crate::error::ApiContractError;
use crate::types::*;
use validator::Validate;

/// Validate a command submission before it is sent
pub fn validate_submit_command_request(
    request: &SubmitCommandRequest,
) -> Result<(), ApiContractError> {
    if request.command.trim().is_empty() {
        return Err(ApiContractError::EmptyCommand);
    }
    request.validate()?;
    Ok(())
}

/// Validate login credentials
pub fn validate_login_request(request: &LoginRequest) -> Result<(), ApiContractError> {
    request.validate()?;
    Ok(())
}

/// Validate a path identifier (agent id or command id)
///
/// Identifiers are interpolated into URL paths, so they must be non-empty and
/// must not contain path separators or query delimiters.
pub fn validate_path_id(id: &str) -> Result<(), ApiContractError> {
    if id.is_empty() {
        return Err(ApiContractError::InvalidId("identifier cannot be empty".to_string()));
    }
    if let Some(c) = id.chars().find(|c| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace())
    {
        return Err(ApiContractError::InvalidId(format!(
            "identifier contains invalid character '{}': {}",
            c, id
        )));
    }
    Ok(())
}
