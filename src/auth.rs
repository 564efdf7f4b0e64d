//! UAA token acquisition.
//!
//! The nozzle authenticates once at startup with the OAuth2
//! client-credentials grant and hands the resulting token to the firehose.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::{Credentials, DEFAULT_AUTH_TIMEOUT};

/// Errors that can occur while fetching a token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// HTTP client could not be built.
    #[error("auth client error: {0}")]
    Client(String),

    /// Request failed before a response arrived.
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// UAA answered with a non-success status.
    #[error("token request rejected with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not a usable token.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

/// Supplies the bearer token for the firehose subscription.
#[async_trait::async_trait]
pub trait TokenFetcher: Send + Sync {
    /// Fetch a token string ready for the `Authorization` header.
    async fn fetch_token(&self) -> Result<String, AuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    token_type: String,
}

/// Token fetcher for a UAA server.
pub struct UaaTokenFetcher {
    endpoint: String,
    credentials: Credentials,
    client: Client,
}

impl UaaTokenFetcher {
    /// Create a fetcher with the default timeout and TLS validation on.
    ///
    /// # Errors
    /// Returns `AuthError::Client` if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, credentials: Credentials) -> Result<Self, AuthError> {
        Self::with_options(endpoint, credentials, DEFAULT_AUTH_TIMEOUT, false)
    }

    /// Create a fetcher with an explicit timeout and TLS policy.
    ///
    /// # Errors
    /// Returns `AuthError::Client` if the HTTP client cannot be built.
    pub fn with_options(
        endpoint: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
        skip_tls_verify: bool,
    ) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(skip_tls_verify)
            .build()
            .map_err(|e| AuthError::Client(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            credentials,
            client,
        })
    }

    /// Token endpoint URL.
    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.endpoint.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for UaaTokenFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UaaTokenFetcher")
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl TokenFetcher for UaaTokenFetcher {
    async fn fetch_token(&self) -> Result<String, AuthError> {
        let response = self
            .client
            .post(self.token_url())
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;
        format_token(token)
    }
}

fn format_token(token: TokenResponse) -> Result<String, AuthError> {
    if token.access_token.is_empty() {
        return Err(AuthError::InvalidResponse(
            "missing access_token".to_string(),
        ));
    }
    if token.token_type.is_empty() {
        return Err(AuthError::InvalidResponse("missing token_type".to_string()));
    }
    Ok(format!("{} {}", token.token_type, token.access_token))
}
