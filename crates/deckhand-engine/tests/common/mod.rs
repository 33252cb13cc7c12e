//! Common test utilities for engine integration tests.

#![allow(dead_code)]

pub mod fixtures;

use deckhand_engine::{DeploymentCoordinator, ExistencePoller, MockTransport, Platform};
use std::sync::Arc;
use std::time::Duration;

/// A scripted platform with a coordinator wired to it.
pub struct TestPlatform {
    pub transport: Arc<MockTransport>,
    pub coordinator: DeploymentCoordinator,
}

impl TestPlatform {
    /// Creates a Kubernetes-style test platform.
    pub fn kubernetes() -> Self {
        Self::new(Platform::Kubernetes)
    }

    /// Creates a Marathon-style test platform.
    pub fn marathon() -> Self {
        Self::new(Platform::Marathon)
    }

    /// Creates a test platform with a short poll budget (5s at 500ms).
    pub fn new(platform: Platform) -> Self {
        let transport = Arc::new(MockTransport::new());
        let coordinator = DeploymentCoordinator::with_transport(
            platform,
            transport.clone(),
            ExistencePoller::new(Duration::from_secs(5), Duration::from_millis(500)),
        );
        Self {
            transport,
            coordinator,
        }
    }

    /// Requests received so far as `"METHOD path"` strings.
    pub fn calls(&self) -> Vec<String> {
        self.transport.calls()
    }
}
