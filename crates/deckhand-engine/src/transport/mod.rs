//! Outbound request plumbing.
//!
//! The engine never builds connections itself. It hands [`ApiRequest`]
//! values to a [`Transport`] and gets back a status and a body. The HTTP
//! implementation lives in [`HttpTransport`]; [`MockTransport`] scripts
//! replies for tests.

mod http;
mod mock;

pub use http::HttpTransport;
pub use mock::{MockReply, MockTransport};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;

use crate::descriptor::ContentType;

/// Connection-level failures. These are never retried.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request could not be delivered or the response not read.
    #[error("request to {path} failed: {message}")]
    Connection {
        /// Request path.
        path: String,
        /// Underlying failure.
        message: String,
    },

    /// The transport could not be constructed.
    #[error("invalid transport configuration: {0}")]
    Setup(String),

    /// Internal transport state is unusable.
    #[error("internal transport error: {0}")]
    Internal(String),
}

/// A single logical request to the platform API.
///
/// Requests are plain values so that a retry can re-send a fresh copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path and query, relative to the platform base URL.
    pub path: String,
    /// Request body, if any.
    pub body: Option<Bytes>,
    /// Content type of the body.
    pub content_type: ContentType,
}

impl ApiRequest {
    /// Create a body-less GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
            content_type: ContentType::Json,
        }
    }

    /// Create a request carrying a body.
    #[must_use]
    pub fn with_body(
        method: Method,
        path: impl Into<String>,
        body: impl Into<Bytes>,
        content_type: ContentType,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            body: Some(body.into()),
            content_type,
        }
    }

    /// Create a body-less request with the given method.
    #[must_use]
    pub fn bare(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            content_type: ContentType::Json,
        }
    }
}

/// Raw platform response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl ApiResponse {
    /// Create a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Issues requests against one platform connection.
///
/// Implementations are shared read-only by every handle created from one
/// factory.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the platform's response.
    ///
    /// Any HTTP status, including errors, is a successful delivery. Only
    /// connection failures are reported as [`TransportError`].
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_constructors() {
        let get = ApiRequest::get("/api/v1/namespaces/prod");
        assert_eq!(get.method, Method::GET);
        assert!(get.body.is_none());

        let post = ApiRequest::with_body(
            Method::POST,
            "/api/v1/namespaces",
            "{}",
            ContentType::Yaml,
        );
        assert_eq!(post.body.as_deref(), Some(b"{}".as_slice()));
        assert_eq!(post.content_type, ContentType::Yaml);
    }

    #[test]
    fn clone_is_an_identical_request() {
        let request =
            ApiRequest::with_body(Method::PUT, "/v2/apps/shop/web", "{}", ContentType::Json);
        assert_eq!(request.clone(), request);
    }
}
