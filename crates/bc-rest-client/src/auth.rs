// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Request authentication

use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the credential is placed in the `Authorization` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// Token sent verbatim, which is what the platform server expects
    #[default]
    Raw,
    /// Token prefixed with `Bearer `
    Bearer,
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthScheme::Raw => write!(f, "raw"),
            AuthScheme::Bearer => write!(f, "bearer"),
        }
    }
}

impl std::str::FromStr for AuthScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(AuthScheme::Raw),
            "bearer" => Ok(AuthScheme::Bearer),
            _ => Err(format!("Invalid auth scheme: {}. Use 'raw' or 'bearer'", s)),
        }
    }
}

/// Opaque credential attached to every request
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    token: Option<String>,
    scheme: AuthScheme,
}

impl AuthConfig {
    pub fn with_token(token: impl Into<String>, scheme: AuthScheme) -> Self {
        Self {
            token: Some(token.into()),
            scheme,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    /// Replace the token, keeping the scheme
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Headers to attach to a request; empty when no token is configured
    pub fn headers(&self) -> Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            let mut value = match self.scheme {
                AuthScheme::Raw => HeaderValue::from_str(token)?,
                AuthScheme::Bearer => HeaderValue::from_str(&format!("Bearer {}", token))?,
            };
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("scheme", &self.scheme)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_scheme_sends_token_verbatim() {
        let auth = AuthConfig::with_token("eyJhbGciOi.payload.sig", AuthScheme::Raw);
        let headers = auth.headers().unwrap();
        assert_eq!(headers[AUTHORIZATION], "eyJhbGciOi.payload.sig");
        assert!(headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn bearer_scheme_prefixes_token() {
        let auth = AuthConfig::with_token("abc", AuthScheme::Bearer);
        assert_eq!(auth.headers().unwrap()[AUTHORIZATION], "Bearer abc");
    }

    #[test]
    fn no_token_means_no_header() {
        let auth = AuthConfig::default();
        assert!(!auth.is_authenticated());
        assert!(auth.headers().unwrap().is_empty());
    }

    #[test]
    fn token_is_redacted_in_debug_output() {
        let auth = AuthConfig::with_token("super-secret", AuthScheme::Raw);
        let debug = format!("{:?}", auth);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn header_rejects_control_characters() {
        let auth = AuthConfig::with_token("bad\ntoken", AuthScheme::Raw);
        assert!(auth.headers().is_err());
    }
}
