//! Scriptable in-memory transport for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Method;

use super::{ApiRequest, ApiResponse, Transport, TransportError};

/// A scripted reply for one request.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Answer with a status and body.
    Respond(ApiResponse),
    /// Fail as if the connection dropped.
    Disconnect,
}

impl MockReply {
    /// Reply with a status and an empty body.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self::Respond(ApiResponse::new(status, ""))
    }

    /// Reply with a status and a body.
    #[must_use]
    pub fn body(status: u16, body: impl Into<String>) -> Self {
        Self::Respond(ApiResponse::new(status, body))
    }
}

type Route = (Method, String);

/// Mock transport for testing.
///
/// Replies are queued per `(method, path)`. The last reply queued for a
/// route repeats forever, so `on(GET, path, [404, 200])` models an object
/// that shows up on the second poll and stays. Unscripted routes answer 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<Route, VecDeque<MockReply>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    /// Create a transport with no scripted routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue replies for a route, appending to anything already queued.
    pub fn on(
        &self,
        method: Method,
        path: impl Into<String>,
        replies: impl IntoIterator<Item = MockReply>,
    ) -> &Self {
        let mut routes = self
            .routes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        routes
            .entry((method, path.into()))
            .or_default()
            .extend(replies);
        self
    }

    /// Queue bare status replies for a route.
    pub fn on_status(
        &self,
        method: Method,
        path: impl Into<String>,
        statuses: impl IntoIterator<Item = u16>,
    ) -> &Self {
        self.on(method, path, statuses.into_iter().map(MockReply::status))
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Number of requests received for one route.
    #[must_use]
    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .filter(|r| &r.method == method && r.path == path)
            .count()
    }

    /// Requests as `"METHOD path"` strings, for compact assertions.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests
            .lock()
            .map_err(|_| TransportError::Internal("lock poisoned".to_owned()))?
            .push(request.clone());

        let reply = {
            let mut routes = self
                .routes
                .lock()
                .map_err(|_| TransportError::Internal("lock poisoned".to_owned()))?;
            let key = (request.method.clone(), request.path.clone());
            match routes.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(MockReply::Respond(response)) => Ok(response),
            Some(MockReply::Disconnect) => Err(TransportError::Connection {
                path: request.path.clone(),
                message: "connection reset by peer".to_owned(),
            }),
            None => Ok(ApiResponse::new(404, "not found")),
        }
    }
}
