// Execution service client
// One POST /execute per call, no retries

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;
use testportal_common::config::ClientConfig;
use testportal_common::types::{execute_url, ExecuteRequest};
use thiserror::Error;
use tracing::debug;

/// A completed HTTP exchange. The body is kept opaque.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: Value,
}

/// The request never produced a usable response
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("request to {url} failed: {}", error_chain(.source))]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("response from {url} (HTTP {status}) is not valid JSON: {}", error_chain(.source))]
    Body {
        url: String,
        status: u16,
        #[source]
        source: reqwest::Error,
    },
}

/// `outer: inner: root` for an error and every source beneath it.
/// reqwest's own message omits the cause (refused, timed out, DNS, ...).
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Seam between the orchestrator and the execution service
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    async fn execute(&self, request: &ExecuteRequest) -> Result<ServiceResponse, TransportError>;
}

/// reqwest-backed client for a remote execution service
pub struct HttpExecutionClient {
    endpoint: String,
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpExecutionClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            endpoint: execute_url(base_url),
            client: reqwest::Client::new(),
            timeout: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let client = Self::new(&config.base_url);
        match config.timeout() {
            Some(timeout) => client.with_timeout(timeout),
            None => client,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ExecutionClient for HttpExecutionClient {
    async fn execute(&self, request: &ExecuteRequest) -> Result<ServiceResponse, TransportError> {
        let payload = serde_json::to_vec(request)?;

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(payload);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|source| TransportError::Request {
            url: self.endpoint.clone(),
            source,
        })?;

        let status = response.status().as_u16();
        debug!(url = %self.endpoint, status, "Execution service responded");

        let body = response.json::<Value>().await.map_err(|source| TransportError::Body {
            url: self.endpoint.clone(),
            status,
            source,
        })?;

        Ok(ServiceResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_config() {
        let mut config = ClientConfig::new();
        config.base_url = "http://runner.internal:8000/".to_string();
        config.timeout_seconds = Some(3);

        let client = HttpExecutionClient::from_config(&config);
        assert_eq!(client.endpoint(), "http://runner.internal:8000/execute");
        assert_eq!(client.timeout, Some(Duration::from_secs(3)));
    }

    #[derive(Debug, Error)]
    #[error("error sending request")]
    struct Outer(#[source] Inner);

    #[derive(Debug, Error)]
    #[error("tcp connect error")]
    struct Inner(#[source] std::io::Error);

    #[test]
    fn test_error_chain_includes_causes() {
        let err = Outer(Inner(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "Connection refused",
        )));
        assert_eq!(
            error_chain(&err),
            "error sending request: tcp connect error: Connection refused"
        );
    }

    #[test]
    fn test_error_chain_skips_repeated_text() {
        let err = Inner(std::io::Error::new(std::io::ErrorKind::Other, "tcp connect error"));
        assert_eq!(error_chain(&err), "tcp connect error");
    }

    #[test]
    fn test_no_timeout_by_default() {
        let client = HttpExecutionClient::from_config(&ClientConfig::new());
        assert_eq!(client.timeout, None);
    }
}
