// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Main REST API client implementation

use bc_domain_types::{AgentSummary, CommandType};
use bc_rest_api_contract::validation::{
    validate_login_request, validate_path_id, validate_submit_command_request,
};
use bc_rest_api_contract::*;
use reqwest::{Client as HttpClient, Method, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::auth::AuthConfig;
use crate::error::{RestClientError, RestClientResult};
use crate::network_config::NetworkConfig;

/// REST API client for the platform server
#[derive(Debug, Clone)]
pub struct RestClient {
    http_client: HttpClient,
    base_url: Url,
    auth: AuthConfig,
}

impl RestClient {
    /// Create a new REST client with default network settings
    pub fn new(base_url: Url, auth: AuthConfig) -> RestClientResult<Self> {
        Self::with_network_config(base_url, auth, &NetworkConfig::default())
    }

    pub fn with_network_config(
        base_url: Url,
        auth: AuthConfig,
        network: &NetworkConfig,
    ) -> RestClientResult<Self> {
        let mut builder = HttpClient::builder().user_agent(network.user_agent());
        if let Some(timeout) = network.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http_client: builder.build()?,
            base_url,
            auth,
        })
    }

    /// Create a client from a base URL string
    pub fn from_url(base_url: &str, auth: AuthConfig) -> RestClientResult<Self> {
        let base_url = Url::parse(base_url)?;
        Self::new(base_url, auth)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    /// Exchange credentials for a session token
    ///
    /// The returned token is also stored on this client for later requests.
    #[instrument(skip(self, password), fields(base_url = %self.base_url))]
    pub async fn login(&mut self, username: &str, password: &str) -> RestClientResult<String> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        validate_login_request(&request)?;

        let response: LoginResponse = self.post("/api/v1/auth/login", &request).await?;
        self.auth.set_token(response.token.clone());
        Ok(response.token)
    }

    /// List all agents
    pub async fn list_agents(&self) -> RestClientResult<Vec<AgentSummary>> {
        let agents: Vec<AgentResponse> = self.get("/api/v1/frontend/agents").await?;
        Ok(agents.into_iter().map(AgentSummary::from).collect())
    }

    /// Get the stored command history of an agent
    pub async fn list_agent_commands(&self, agent_id: &str) -> RestClientResult<Vec<CommandRecord>> {
        validate_path_id(agent_id)?;
        let url = format!("/api/v1/general/agents/{}/commands", agent_id);
        self.get(&url).await
    }

    /// Queue a command for an agent
    pub async fn queue_command(
        &self,
        agent_id: &str,
        request: &SubmitCommandRequest,
    ) -> RestClientResult<SubmitCommandResponse> {
        validate_path_id(agent_id)?;
        validate_submit_command_request(request)?;
        let url = format!("/api/v1/general/queue/command/{}", agent_id);
        self.post(&url, request).await
    }

    /// Get the latest status and output of a command
    pub async fn get_command_result(
        &self,
        command_id: &str,
    ) -> RestClientResult<CommandResultResponse> {
        validate_path_id(command_id)?;
        let url = format!("/api/v1/general/commands/{}/result", command_id);
        self.get(&url).await
    }

    pub async fn health(&self) -> RestClientResult<HealthResponse> {
        self.get("/api/v1/general/health").await
    }

    pub(crate) fn submit_request(command: &str, command_type: &CommandType) -> SubmitCommandRequest {
        SubmitCommandRequest::new(command, command_type.clone())
    }

    // Private helper methods

    async fn get<T: DeserializeOwned>(&self, path: &str) -> RestClientResult<T> {
        self.request(Method::GET, path, None::<&()>).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> RestClientResult<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    fn url_for(&self, path: &str) -> RestClientResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn request<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> RestClientResult<T> {
        let url = self.url_for(path)?;
        debug!(%method, %url, "Sending request");

        let mut request = self.http_client.request(method, url);

        let auth_headers = self.auth.headers().map_err(|e| RestClientError::Auth(e.to_string()))?;
        request = request.headers(auth_headers);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> RestClientResult<T> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(RestClientError::from)
        } else {
            match serde_json::from_str::<ErrorBody>(&text) {
                Ok(details) => Err(RestClientError::ServerError { status, details }),
                Err(_) => Err(RestClientError::UnexpectedResponse { status, body: text }),
            }
        }
    }
}
