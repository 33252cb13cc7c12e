//! Building resource handles from descriptors.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::descriptor::{ContentType, ResourceDescriptor};
use crate::error::{EngineError, EngineResult};
use crate::executor::CallExecutor;
use crate::kind::{KindRegistry, Platform, MARATHON_API_VERSION};
use crate::poller::ExistencePoller;
use crate::resource::{ResourceHandle, Scope};
use crate::transport::Transport;

/// Dispatches descriptors to handle implementations.
///
/// Every handle built by one factory shares the same transport and poll
/// budget.
#[derive(Debug, Clone)]
pub struct ResourceFactory {
    registry: KindRegistry,
    executor: CallExecutor,
    poller: ExistencePoller,
}

impl ResourceFactory {
    /// Create a factory.
    pub fn new(
        registry: KindRegistry,
        transport: Arc<dyn Transport>,
        poller: ExistencePoller,
    ) -> Self {
        Self {
            registry,
            executor: CallExecutor::new(transport),
            poller,
        }
    }

    /// The dispatch table in use.
    #[must_use]
    pub const fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    /// Build the handle for one descriptor.
    ///
    /// Fails without any remote call if the `(apiVersion, kind)` pair is
    /// not registered or the payload is empty.
    pub fn create_handle(
        &self,
        descriptor: ResourceDescriptor,
        scope: &Scope,
    ) -> EngineResult<ResourceHandle> {
        let kind = self
            .registry
            .resolve(descriptor.api_version(), descriptor.kind())
            .ok_or_else(|| EngineError::UnknownResourceType {
                api_version: descriptor.api_version().to_owned(),
                kind: descriptor.kind().to_owned(),
                id: descriptor.source_label().to_owned(),
            })?;

        if descriptor.payload().iter().all(u8::is_ascii_whitespace) {
            return Err(EngineError::EmptyDefinition {
                kind: descriptor.kind().to_owned(),
                id: descriptor.source_label().to_owned(),
            });
        }

        debug!(
            descriptor = %descriptor,
            kind = %kind,
            scope = %scope,
            "resolved resource handle"
        );

        Ok(ResourceHandle::new(
            descriptor,
            kind,
            scope.clone(),
            self.executor.clone(),
            self.poller,
        ))
    }

    /// Build handles for a batch, preserving order.
    ///
    /// The first failure aborts the batch.
    pub fn create_handles(
        &self,
        descriptors: impl IntoIterator<Item = ResourceDescriptor>,
        scope: &Scope,
    ) -> EngineResult<Vec<ResourceHandle>> {
        descriptors
            .into_iter()
            .map(|descriptor| self.create_handle(descriptor, scope))
            .collect()
    }

    /// Build the handle for the owning namespace or group itself.
    pub fn scope_handle(&self, scope: &Scope) -> EngineResult<ResourceHandle> {
        let descriptor = scope_descriptor(scope)?;
        let kind = scope.platform().scope_kind();
        Ok(ResourceHandle::new(
            descriptor,
            kind,
            scope.clone(),
            self.executor.clone(),
            self.poller,
        ))
    }
}

fn scope_descriptor(scope: &Scope) -> EngineResult<ResourceDescriptor> {
    let name = scope.name().trim_matches('/');
    let (api_version, kind, body) = match scope.platform() {
        Platform::Kubernetes => (
            "v1",
            "Namespace",
            json!({
                "apiVersion": "v1",
                "kind": "Namespace",
                "metadata": { "name": name },
            }),
        ),
        Platform::Marathon => (
            MARATHON_API_VERSION,
            "Group",
            json!({ "id": format!("/{name}") }),
        ),
    };
    let payload =
        serde_json::to_vec(&body).map_err(|e| EngineError::serialisation(e.to_string()))?;
    ResourceDescriptor::new(api_version, kind, name, payload, ContentType::Json)
        .map(|d| d.with_source(scope.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kind::ResourceKind;
    use crate::resource::Resource;
    use crate::transport::MockTransport;

    fn factory(transport: &Arc<MockTransport>) -> ResourceFactory {
        ResourceFactory::new(
            KindRegistry::kubernetes(),
            transport.clone(),
            ExistencePoller::default(),
        )
    }

    fn descriptor(api_version: &str, kind: &str, name: &str, payload: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(api_version, kind, name, payload.to_owned(), ContentType::Yaml)
            .unwrap()
    }

    #[test]
    fn dispatches_by_version_and_kind() {
        let transport = Arc::new(MockTransport::new());
        let handle = factory(&transport)
            .create_handle(
                descriptor("apps/v1", "Deployment", "web", "kind: Deployment"),
                &Scope::namespace("prod"),
            )
            .unwrap();
        assert_eq!(handle.kind(), ResourceKind::Deployment);
        assert_eq!(handle.scope().name(), "prod");
        assert!(handle.supports_update());
    }

    #[test]
    fn unknown_type_is_rejected_without_calls() {
        let transport = Arc::new(MockTransport::new());
        let err = factory(&transport)
            .create_handle(
                descriptor("v1", "Deployment", "web", "kind: Deployment"),
                &Scope::namespace("prod"),
            )
            .unwrap_err();

        assert!(matches!(err, EngineError::UnknownResourceType { .. }));
        assert!(err.to_string().contains("Deployment"));
        assert!(err.to_string().contains("v1"));
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn empty_payload_is_rejected() {
        let transport = Arc::new(MockTransport::new());
        let err = factory(&transport)
            .create_handle(
                descriptor("v1", "Service", "api", "  \n"),
                &Scope::namespace("prod"),
            )
            .unwrap_err();

        assert!(matches!(err, EngineError::EmptyDefinition { .. }));
        assert!(err.to_string().contains("api"));
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn batch_preserves_order_and_stops_at_first_error() {
        let transport = Arc::new(MockTransport::new());
        let factory = factory(&transport);
        let scope = Scope::namespace("prod");

        let handles = factory
            .create_handles(
                vec![
                    descriptor("v1", "Service", "b", "kind: Service"),
                    descriptor("v1", "ConfigMap", "a", "kind: ConfigMap"),
                ],
                &scope,
            )
            .unwrap();
        let ids: Vec<_> = handles.iter().map(Resource::id).collect();
        assert_eq!(ids, vec!["b", "a"]);

        let err = factory
            .create_handles(
                vec![
                    descriptor("v1", "Service", "b", "kind: Service"),
                    descriptor("v9", "Widget", "w", "kind: Widget"),
                    descriptor("v1", "Pod", "p", ""),
                ],
                &scope,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownResourceType { .. }));
    }

    #[test]
    fn scope_handles() {
        let transport = Arc::new(MockTransport::new());
        let namespace = factory(&transport)
            .scope_handle(&Scope::namespace("prod"))
            .unwrap();
        assert_eq!(namespace.kind(), ResourceKind::Namespace);
        assert_eq!(namespace.describe(), "namespace 'prod'");
        assert!(!namespace.supports_update());

        let marathon = ResourceFactory::new(
            KindRegistry::marathon(),
            transport,
            ExistencePoller::default(),
        );
        let group = marathon.scope_handle(&Scope::group("/shop")).unwrap();
        assert_eq!(group.kind(), ResourceKind::MarathonGroup);
        assert_eq!(group.id(), "shop");
        let body: serde_json::Value =
            serde_json::from_slice(group.descriptor().payload()).unwrap();
        assert_eq!(body["id"], "/shop");
    }
}
