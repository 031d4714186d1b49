// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Becon console configuration
//!
//! Precedence, lowest first: built-in defaults, the TOML file (`--config` or
//! the platform config dir), `BC_*` environment variables, command-line
//! flags ([`CliOverrides`]).

pub mod error;
pub mod loader;
pub mod paths;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load, load_with_env, LoadReport};

use std::time::Duration;

use bc_core::{
    PollerConfig, RetryPolicy, SessionSettings, VisibilityFilter, DEFAULT_HEALTH_INTERVAL,
    DEFAULT_POLL_INTERVAL,
};
use bc_domain_types::TerminalPolicy;
use bc_rest_client::{AuthConfig, AuthScheme, NetworkConfig};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConsoleConfig {
    pub server_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub auth_scheme: AuthScheme,
    #[serde(deserialize_with = "lenient::number")]
    pub poll_interval_ms: u64,
    #[serde(deserialize_with = "lenient::number")]
    pub health_interval_ms: u64,
    #[serde(deserialize_with = "lenient::optional_number")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
    pub terminal_policy: TerminalPolicy,
    #[serde(deserialize_with = "lenient::number")]
    pub retry_multiplier: u32,
    #[serde(deserialize_with = "lenient::number")]
    pub retry_max_backoff_ticks: u32,
    #[serde(deserialize_with = "lenient::number")]
    pub retry_warn_after: u32,
    /// Extra command names hidden from the timeline, on top of `return_results`
    #[serde(deserialize_with = "lenient::string_list")]
    pub reserved_commands: Vec<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            token: None,
            auth_scheme: AuthScheme::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            health_interval_ms: DEFAULT_HEALTH_INTERVAL.as_millis() as u64,
            request_timeout_ms: None,
            terminal_policy: TerminalPolicy::default(),
            retry_multiplier: retry.multiplier,
            retry_max_backoff_ticks: retry.max_backoff_ticks,
            retry_warn_after: retry.warn_after,
            reserved_commands: vec![],
        }
    }
}

impl ConsoleConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        Url::parse(&self.server_url).map_err(|e| ConfigError::InvalidValue {
            key: "server-url",
            reason: e.to_string(),
        })?;
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "poll-interval-ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.health_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "health-interval-ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn server_url(&self) -> ConfigResult<Url> {
        Url::parse(&self.server_url).map_err(|e| ConfigError::InvalidValue {
            key: "server-url",
            reason: e.to_string(),
        })
    }

    pub fn auth(&self) -> AuthConfig {
        match &self.token {
            Some(token) => AuthConfig::with_token(token.clone(), self.auth_scheme),
            None => AuthConfig::default(),
        }
    }

    pub fn network(&self) -> NetworkConfig {
        NetworkConfig {
            request_timeout_ms: self.request_timeout_ms,
            user_agent: None,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            multiplier: self.retry_multiplier,
            max_backoff_ticks: self.retry_max_backoff_ticks,
            warn_after: self.retry_warn_after,
        }
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_millis(self.health_interval_ms)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            poller: PollerConfig {
                interval: Duration::from_millis(self.poll_interval_ms),
                retry: self.retry_policy(),
            },
            terminal_policy: self.terminal_policy,
            visibility: VisibilityFilter::with_reserved(self.reserved_commands.iter().cloned()),
        }
    }

    pub fn apply(&mut self, overrides: &CliOverrides) {
        if let Some(url) = &overrides.server_url {
            self.server_url = url.clone();
        }
        if let Some(token) = &overrides.token {
            self.token = Some(token.clone());
        }
        if let Some(scheme) = overrides.auth_scheme {
            self.auth_scheme = scheme;
        }
        if let Some(interval) = overrides.poll_interval_ms {
            self.poll_interval_ms = interval;
        }
        if let Some(policy) = overrides.terminal_policy {
            self.terminal_policy = policy;
        }
    }
}

/// Values given as command-line flags, highest precedence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub server_url: Option<String>,
    pub token: Option<String>,
    pub auth_scheme: Option<AuthScheme>,
    pub poll_interval_ms: Option<u64>,
    pub terminal_policy: Option<TerminalPolicy>,
}

/// Environment values arrive as strings; accept them where TOML gives typed values
mod lenient {
    use serde::{de, Deserialize, Deserializer};
    use std::fmt::Display;
    use std::str::FromStr;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText<T> {
        Number(T),
        Text(String),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrText {
        List(Vec<String>),
        Text(String),
    }

    pub fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + FromStr,
        T::Err: Display,
    {
        match NumberOrText::<T>::deserialize(deserializer)? {
            NumberOrText::Number(value) => Ok(value),
            NumberOrText::Text(text) => text.trim().parse().map_err(de::Error::custom),
        }
    }

    pub fn optional_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + FromStr,
        T::Err: Display,
    {
        match Option::<NumberOrText<T>>::deserialize(deserializer)? {
            None => Ok(None),
            Some(NumberOrText::Number(value)) => Ok(Some(value)),
            Some(NumberOrText::Text(text)) if text.trim().is_empty() => Ok(None),
            Some(NumberOrText::Text(text)) => {
                text.trim().parse().map(Some).map_err(de::Error::custom)
            }
        }
    }

    /// A list, or a comma-separated string
    pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match ListOrText::deserialize(deserializer)? {
            ListOrText::List(items) => items,
            ListOrText::Text(text) => text
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}
