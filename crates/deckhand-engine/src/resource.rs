//! The per-resource CRUD contract and its platform implementation.
//!
//! [`Resource`] is the seam the strategies work against. [`ResourceHandle`]
//! implements it over a [`CallExecutor`] and an [`ExistencePoller`]:
//! `create` and `delete` only return once the platform reports the
//! requested state, so callers never see an object that was created but
//! does not exist yet.

use std::fmt;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::descriptor::ResourceDescriptor;
use crate::error::{EngineError, EngineResult};
use crate::executor::{CallExecutor, CallOutcome};
use crate::kind::{Platform, ResourceKind};
use crate::poller::{ExistencePoller, Presence};
use crate::transport::ApiRequest;

/// The namespace or group that owns a batch of resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    platform: Platform,
    name: String,
}

impl Scope {
    /// Create a scope on a platform.
    #[must_use]
    pub fn new(platform: Platform, name: impl Into<String>) -> Self {
        Self {
            platform,
            name: name.into(),
        }
    }

    /// A Kubernetes namespace.
    #[must_use]
    pub fn namespace(name: impl Into<String>) -> Self {
        Self::new(Platform::Kubernetes, name)
    }

    /// A Marathon group.
    #[must_use]
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(Platform::Marathon, name)
    }

    /// Scope name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Platform the scope lives on.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.platform.scope_noun(), self.name)
    }
}

/// CRUD operations on one remote object.
///
/// `create` and `delete` block until the platform has converged.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Resource name.
    fn id(&self) -> &str;

    /// Human-readable identity used in logs and errors.
    fn describe(&self) -> String;

    /// Whether `update` is available for this resource.
    fn supports_update(&self) -> bool;

    /// Check whether the object currently exists.
    async fn exists(&self) -> EngineResult<bool>;

    /// Create the object and wait until it exists.
    async fn create(&self) -> EngineResult<()>;

    /// Replace the object in place.
    async fn update(&self) -> EngineResult<()>;

    /// Delete the object and wait until it is gone.
    async fn delete(&self) -> EngineResult<()>;
}

/// A resource bound to a descriptor and a platform connection.
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    descriptor: ResourceDescriptor,
    kind: ResourceKind,
    scope: Scope,
    executor: CallExecutor,
    poller: ExistencePoller,
}

impl ResourceHandle {
    /// Create a handle. Use [`crate::ResourceFactory`] rather than calling
    /// this directly.
    #[must_use]
    pub fn new(
        descriptor: ResourceDescriptor,
        kind: ResourceKind,
        scope: Scope,
        executor: CallExecutor,
        poller: ExistencePoller,
    ) -> Self {
        Self {
            descriptor,
            kind,
            scope,
            executor,
            poller,
        }
    }

    /// The descriptor this handle was built from.
    #[must_use]
    pub const fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    /// Resolved kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Owning scope.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Poll budget used by `create` and `delete`.
    #[must_use]
    pub const fn poller(&self) -> &ExistencePoller {
        &self.poller
    }

    async fn call(
        &self,
        request: &ApiRequest,
        operation: &'static str,
    ) -> EngineResult<CallOutcome> {
        self.executor
            .execute(request)
            .await
            .map_err(|source| EngineError::Unreachable {
                resource: self.describe(),
                operation,
                source,
            })
    }

    fn expect_success(&self, outcome: CallOutcome, operation: &'static str) -> EngineResult<()> {
        if outcome.is_success() {
            Ok(())
        } else {
            Err(outcome.into_error(&self.describe(), operation))
        }
    }
}

#[async_trait]
impl Resource for ResourceHandle {
    fn id(&self) -> &str {
        self.descriptor.resource_id()
    }

    fn describe(&self) -> String {
        if self.kind.is_scope() {
            format!("{} '{}'", self.scope.platform().scope_noun(), self.id())
        } else {
            format!("{} '{}' in {}", self.kind, self.id(), self.scope)
        }
    }

    fn supports_update(&self) -> bool {
        self.kind.supports_update()
    }

    async fn exists(&self) -> EngineResult<bool> {
        let request = self.kind.exists_call(&self.descriptor, self.scope.name());
        match self.call(&request, "exists").await? {
            CallOutcome::Success(_) => Ok(true),
            CallOutcome::NotFound => Ok(false),
            other => Err(other.into_error(&self.describe(), "exists")),
        }
    }

    async fn create(&self) -> EngineResult<()> {
        let resource = self.describe();
        debug!(resource = %resource, "creating resource");

        let request = self.kind.create_call(&self.descriptor, self.scope.name())?;
        let outcome = self.call(&request, "create").await?;
        self.expect_success(outcome, "create")?;

        self.poller
            .block(
                Presence::Exists,
                || self.exists(),
                &format!("{resource} was created but never appeared"),
            )
            .await?;

        info!(resource = %resource, "resource created");
        Ok(())
    }

    async fn update(&self) -> EngineResult<()> {
        let resource = self.describe();
        if !self.supports_update() {
            return Err(EngineError::UnsupportedOperation { resource });
        }
        debug!(resource = %resource, "updating resource");

        let request = self.kind.update_call(&self.descriptor, self.scope.name())?;
        let outcome = self.call(&request, "update").await?;
        self.expect_success(outcome, "update")?;

        info!(resource = %resource, "resource updated");
        Ok(())
    }

    async fn delete(&self) -> EngineResult<()> {
        let resource = self.describe();
        debug!(resource = %resource, "deleting resource");

        let request = self.kind.delete_call(&self.descriptor, self.scope.name());
        let outcome = self.call(&request, "delete").await?;
        self.expect_success(outcome, "delete")?;

        self.poller
            .block(
                Presence::Absent,
                || self.exists(),
                &format!("{resource} was deleted but is still present"),
            )
            .await?;

        info!(resource = %resource, "resource deleted");
        Ok(())
    }
}
