//! Single-call execution with response classification and one retry.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::EngineError;
use crate::transport::{ApiRequest, ApiResponse, Transport, TransportError};

/// Classified result of one remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// 200 or 201.
    Success(ApiResponse),
    /// 404.
    NotFound,
    /// 409, retryable.
    Conflict(ApiResponse),
    /// 500, retryable.
    ServerError(ApiResponse),
    /// Any other status.
    Fatal(ApiResponse),
}

impl CallOutcome {
    /// Classify a raw response by status code.
    #[must_use]
    pub fn classify(response: ApiResponse) -> Self {
        match response.status {
            200 | 201 => Self::Success(response),
            404 => Self::NotFound,
            409 => Self::Conflict(response),
            500 => Self::ServerError(response),
            _ => Self::Fatal(response),
        }
    }

    /// Returns true for the statuses that warrant the single retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::ServerError(_))
    }

    /// Returns true for a successful call.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Status code of the underlying response.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Success(r) | Self::Conflict(r) | Self::ServerError(r) | Self::Fatal(r) => {
                r.status
            }
        }
    }

    /// Turn an outcome the caller cannot accept into an error.
    ///
    /// Retryable outcomes reaching this point have already been retried,
    /// so they surface as [`EngineError::Transient`].
    #[must_use]
    pub fn into_error(self, resource: &str, operation: &'static str) -> EngineError {
        let status = self.status();
        match self {
            Self::Conflict(r) | Self::ServerError(r) => EngineError::Transient {
                resource: resource.to_owned(),
                operation,
                status,
                reason: r.body,
            },
            Self::NotFound => EngineError::Platform {
                resource: resource.to_owned(),
                operation,
                status,
                reason: "not found".to_owned(),
            },
            Self::Success(r) | Self::Fatal(r) => EngineError::Platform {
                resource: resource.to_owned(),
                operation,
                status,
                reason: r.body,
            },
        }
    }
}

/// Executes requests against a transport, retrying transient failures once.
#[derive(Clone)]
pub struct CallExecutor {
    transport: Arc<dyn Transport>,
}

impl CallExecutor {
    /// Create an executor over a shared transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Issue a request and classify the response.
    ///
    /// A 409 or 500 triggers exactly one retry with a fresh copy of the
    /// request; whatever the second attempt yields is returned as-is.
    /// Connection failures are never retried.
    pub async fn execute(&self, request: &ApiRequest) -> Result<CallOutcome, TransportError> {
        let outcome = self.attempt(request).await?;
        if !outcome.is_retryable() {
            return Ok(outcome);
        }

        warn!(
            method = %request.method,
            path = %request.path,
            status = outcome.status(),
            "transient platform error, retrying once"
        );

        let retry = request.clone();
        self.attempt(&retry).await
    }

    async fn attempt(&self, request: &ApiRequest) -> Result<CallOutcome, TransportError> {
        let response = self.transport.send(request).await?;
        debug!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            "platform call completed"
        );
        Ok(CallOutcome::classify(response))
    }
}

impl std::fmt::Debug for CallExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallExecutor").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::Method;

    use super::*;
    use crate::transport::{MockReply, MockTransport};

    fn executor(transport: &Arc<MockTransport>) -> CallExecutor {
        CallExecutor::new(transport.clone())
    }

    #[test]
    fn classification_table() {
        let classify = |status| CallOutcome::classify(ApiResponse::new(status, ""));
        assert!(classify(200).is_success());
        assert!(classify(201).is_success());
        assert_eq!(classify(404), CallOutcome::NotFound);
        assert!(matches!(classify(409), CallOutcome::Conflict(_)));
        assert!(matches!(classify(500), CallOutcome::ServerError(_)));
        for status in [202, 204, 400, 401, 403, 422, 502, 503] {
            assert!(
                matches!(classify(status), CallOutcome::Fatal(_)),
                "{status} should be fatal"
            );
        }
    }

    #[tokio::test]
    async fn transient_then_success_uses_two_calls() {
        for transient in [409, 500] {
            let transport = Arc::new(MockTransport::new());
            transport.on_status(Method::POST, "/api/v1/namespaces", [transient, 201]);

            let outcome = executor(&transport)
                .execute(&ApiRequest::bare(Method::POST, "/api/v1/namespaces"))
                .await
                .unwrap();

            assert!(outcome.is_success());
            assert_eq!(transport.request_count(), 2);
        }
    }

    #[tokio::test]
    async fn two_transient_errors_stop_after_second_call() {
        let transport = Arc::new(MockTransport::new());
        transport.on_status(Method::PUT, "/v2/apps/shop/web", [500, 409, 200]);

        let outcome = executor(&transport)
            .execute(&ApiRequest::bare(Method::PUT, "/v2/apps/shop/web"))
            .await
            .unwrap();

        assert!(matches!(outcome, CallOutcome::Conflict(_)));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn retry_resends_identical_request() {
        let transport = Arc::new(MockTransport::new());
        transport.on_status(Method::POST, "/v2/apps", [500, 201]);
        let request = ApiRequest::with_body(
            Method::POST,
            "/v2/apps",
            r#"{"id":"/shop/web"}"#,
            crate::descriptor::ContentType::Json,
        );

        executor(&transport).execute(&request).await.unwrap();

        let sent = transport.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], request);
        assert_eq!(sent[1], request);
    }

    #[tokio::test]
    async fn fatal_and_not_found_are_not_retried() {
        let transport = Arc::new(MockTransport::new());
        transport.on_status(Method::GET, "/a", [422]);

        let outcome = executor(&transport)
            .execute(&ApiRequest::get("/a"))
            .await
            .unwrap();
        assert!(matches!(outcome, CallOutcome::Fatal(_)));

        let outcome = executor(&transport)
            .execute(&ApiRequest::get("/unscripted"))
            .await
            .unwrap();
        assert_eq!(outcome, CallOutcome::NotFound);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn connection_failure_is_not_retried() {
        let transport = Arc::new(MockTransport::new());
        transport.on(Method::GET, "/a", [MockReply::Disconnect]);

        let result = executor(&transport).execute(&ApiRequest::get("/a")).await;
        assert!(result.is_err());
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn retried_outcomes_become_transient_errors() {
        let outcome = CallOutcome::classify(ApiResponse::new(409, "object is being modified"));
        let err = outcome.into_error("Deployment 'web' in namespace 'prod'", "update");
        assert!(matches!(err, EngineError::Transient { status: 409, .. }));
        assert!(err.to_string().contains("object is being modified"));

        let outcome = CallOutcome::classify(ApiResponse::new(403, "forbidden"));
        let err = outcome.into_error("Pod 'p' in namespace 'prod'", "create");
        assert!(matches!(err, EngineError::Platform { status: 403, .. }));
    }
}
