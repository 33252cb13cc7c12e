//! Core deployment orchestration logic.

use std::sync::Arc;

use tracing::info;

use crate::config::EngineConfig;
use crate::descriptor::ResourceDescriptor;
use crate::error::EngineResult;
use crate::factory::ResourceFactory;
use crate::kind::{KindRegistry, Platform};
use crate::poller::ExistencePoller;
use crate::report::DeploymentReport;
use crate::resource::Scope;
use crate::strategy::{Strategy, StrategyEngine};
use crate::transport::{HttpTransport, Transport};

/// Request to reconcile a batch of resources.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    /// Namespace or group name.
    pub scope: String,
    /// Strategy for this run.
    pub strategy: Strategy,
    /// Resources, in the order they should be applied.
    pub descriptors: Vec<ResourceDescriptor>,
}

impl DeploymentRequest {
    /// Create a request.
    #[must_use]
    pub fn new(
        scope: impl Into<String>,
        strategy: Strategy,
        descriptors: Vec<ResourceDescriptor>,
    ) -> Self {
        Self {
            scope: scope.into(),
            strategy,
            descriptors,
        }
    }
}

/// Orchestrates factory, handles and strategy against one platform.
#[derive(Debug, Clone)]
pub struct DeploymentCoordinator {
    platform: Platform,
    factory: ResourceFactory,
}

impl DeploymentCoordinator {
    /// Create a coordinator around an existing factory.
    #[must_use]
    pub const fn new(platform: Platform, factory: ResourceFactory) -> Self {
        Self { platform, factory }
    }

    /// Create a coordinator for a platform over any transport, using the
    /// platform's default kinds.
    pub fn with_transport(
        platform: Platform,
        transport: Arc<dyn Transport>,
        poller: ExistencePoller,
    ) -> Self {
        let factory = ResourceFactory::new(KindRegistry::for_platform(platform), transport, poller);
        Self::new(platform, factory)
    }

    /// Create a coordinator talking HTTP as described by `config`.
    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        let transport = HttpTransport::new(&config.platform)?;
        Ok(Self::with_transport(
            config.platform.kind,
            Arc::new(transport),
            ExistencePoller::from_config(&config.convergence),
        ))
    }

    /// Platform this coordinator targets.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Apply the batch to the scope.
    ///
    /// Every descriptor is turned into a handle before the first remote
    /// call, so descriptor errors never leave a partial deployment.
    pub async fn deploy(&self, request: DeploymentRequest) -> EngineResult<DeploymentReport> {
        let scope = Scope::new(self.platform, request.scope);
        let handles = self.factory.create_handles(request.descriptors, &scope)?;
        let scope_handle = self.factory.scope_handle(&scope)?;

        info!(
            scope = %scope,
            strategy = %request.strategy,
            resources = handles.len(),
            "starting deployment"
        );

        StrategyEngine::new(request.strategy)
            .deploy(&scope_handle, &handles)
            .await
    }

    /// Remove the batch from the scope.
    pub async fn delete(&self, request: DeploymentRequest) -> EngineResult<DeploymentReport> {
        let scope = Scope::new(self.platform, request.scope);
        let handles = self.factory.create_handles(request.descriptors, &scope)?;
        let scope_handle = self.factory.scope_handle(&scope)?;

        info!(
            scope = %scope,
            strategy = %request.strategy,
            resources = handles.len(),
            "starting deletion"
        );

        StrategyEngine::new(request.strategy)
            .delete(&scope_handle, &handles)
            .await
    }
}
