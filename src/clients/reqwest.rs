//! [`HttpClient`] backed by `reqwest`.
//!
//! # Feature gate
//!
//! Only available with the `http-reqwest` feature (enabled by default).

use std::time::Duration;

use async_trait::async_trait;

use crate::error::BootstrapError;
use crate::http::HttpClient;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// An [`HttpClient`] using a shared `reqwest::Client` connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: ::reqwest::Client,
}

impl ReqwestHttpClient {
    /// Build a client with the default 10 second timeout.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Transport`] if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, BootstrapError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Build a client with a custom per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Transport`] if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, BootstrapError> {
        let client = ::reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BootstrapError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing `reqwest::Client` (custom proxy, headers, TLS roots).
    pub fn from_client(client: ::reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post(&self, url: &str, body: Option<String>) -> Result<String, BootstrapError> {
        tracing::debug!(url = %url, has_body = body.is_some(), "POST");

        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request
                .header(::reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| BootstrapError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = status.as_u16(), "API request failed");
            return Err(BootstrapError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text()
            .await
            .map_err(|e| BootstrapError::Transport(e.to_string()))
    }
}
