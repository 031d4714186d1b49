// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for the REST client

use bc_client_api::ClientApiError;
use bc_rest_api_contract::{ApiContractError, ErrorBody};
use thiserror::Error;

pub type RestClientResult<T> = Result<T, RestClientError>;

#[derive(Debug, Error)]
pub enum RestClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to decode response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server returned {status}: {}", details.error)]
    ServerError {
        status: reqwest::StatusCode,
        details: ErrorBody,
    },

    #[error("Unexpected response ({status}): {body}")]
    UnexpectedResponse {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] ApiContractError),
}

impl From<RestClientError> for ClientApiError {
    fn from(err: RestClientError) -> Self {
        match err {
            RestClientError::Http(_) | RestClientError::Url(_) => {
                ClientApiError::Network(err.to_string())
            }
            RestClientError::ServerError { status, .. }
            | RestClientError::UnexpectedResponse { status, .. }
                if status == reqwest::StatusCode::NOT_FOUND =>
            {
                ClientApiError::NotFound(err.to_string())
            }
            RestClientError::ServerError { .. } => ClientApiError::Server(err.to_string()),
            RestClientError::InvalidRequest(_) | RestClientError::Auth(_) => {
                ClientApiError::InvalidRequest(err.to_string())
            }
            RestClientError::Json(_) | RestClientError::UnexpectedResponse { .. } => {
                ClientApiError::UnexpectedResponse(err.to_string())
            }
        }
    }
}
