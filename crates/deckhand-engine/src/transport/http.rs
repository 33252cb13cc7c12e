//! HTTP transport backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use crate::config::PlatformConfig;

use super::{ApiRequest, ApiResponse, Transport, TransportError};

/// HTTP client for one platform API endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTransport {
    /// Create a transport from configuration.
    pub fn new(config: &PlatformConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_owned(),
            token: config.token.clone(),
        })
    }

    /// Create a transport for a custom base URL with default settings.
    pub fn with_url(url: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: url.into().trim_end_matches('/').to_owned(),
            token: None,
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(method = %request.method, url = %url, "sending platform request");

        let mut builder = self.client.request(request.method.clone(), &url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, request.content_type.mime())
                .body(body.clone());
        }

        let connection_error = |e: reqwest::Error| TransportError::Connection {
            path: request.path.clone(),
            message: e.to_string(),
        };

        let response = builder.send().await.map_err(connection_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(connection_error)?;

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn transport_creation() {
        let config = PlatformConfig::default();
        let transport = HttpTransport::new(&config);
        assert!(transport.is_ok());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let transport = HttpTransport::with_url("https://cluster.local:6443/").unwrap();
        assert_eq!(transport.base_url(), "https://cluster.local:6443");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_connection_error() {
        let transport = HttpTransport::with_url("http://127.0.0.1:1").unwrap();
        let err = transport
            .send(&ApiRequest::get("/api/v1/namespaces/prod"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connection { .. }));
    }
}
