//! Resource kinds, their capabilities, and the dispatch registry.
//!
//! Each [`ResourceKind`] knows whether it can be updated in place and how
//! to build the four calls (exists, create, update, delete) for a
//! descriptor in a scope. Kinds are resolved once, when the factory builds
//! a handle, through an explicit [`KindRegistry`] keyed by
//! `(apiVersion, kind)`.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::{ContentType, ResourceDescriptor};
use crate::error::{EngineError, EngineResult};
use crate::transport::ApiRequest;

/// Body sent with every Kubernetes deletion: remove immediately.
pub const DELETE_IMMEDIATELY: &str =
    r#"{"kind":"DeleteOptions","apiVersion":"v1","gracePeriodSeconds":0}"#;

/// API version used for Marathon documents.
pub const MARATHON_API_VERSION: &str = "marathon/v2";

/// Target orchestration platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Kubernetes-style API; resources live in namespaces.
    #[default]
    Kubernetes,
    /// Marathon-style API; apps live in groups.
    Marathon,
}

impl Platform {
    /// The platform name as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Kubernetes => "kubernetes",
            Self::Marathon => "marathon",
        }
    }

    /// What the owning scope is called on this platform.
    #[must_use]
    pub const fn scope_noun(&self) -> &'static str {
        match self {
            Self::Kubernetes => "namespace",
            Self::Marathon => "group",
        }
    }

    /// Kind used for the owning scope.
    #[must_use]
    pub const fn scope_kind(&self) -> ResourceKind {
        match self {
            Self::Kubernetes => ResourceKind::Namespace,
            Self::Marathon => ResourceKind::MarathonGroup,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A platform object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Kubernetes namespace (a scope).
    Namespace,
    /// Kubernetes pod.
    Pod,
    /// Kubernetes service.
    Service,
    /// Kubernetes replication controller.
    ReplicationController,
    /// Kubernetes secret.
    Secret,
    /// Kubernetes config map.
    ConfigMap,
    /// Kubernetes persistent volume claim.
    PersistentVolumeClaim,
    /// Kubernetes deployment.
    Deployment,
    /// Kubernetes daemon set.
    DaemonSet,
    /// Kubernetes replica set.
    ReplicaSet,
    /// Kubernetes stateful set.
    StatefulSet,
    /// Kubernetes job.
    Job,
    /// Marathon group (a scope).
    MarathonGroup,
    /// Marathon app.
    MarathonApp,
}

impl ResourceKind {
    /// Platform this kind belongs to.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        match self {
            Self::MarathonGroup | Self::MarathonApp => Platform::Marathon,
            _ => Platform::Kubernetes,
        }
    }

    /// Whether the platform supports replacing this object in place.
    ///
    /// Kinds without update must be deleted and recreated.
    #[must_use]
    pub const fn supports_update(&self) -> bool {
        !matches!(
            self,
            Self::Namespace
                | Self::Pod
                | Self::PersistentVolumeClaim
                | Self::Job
                | Self::MarathonGroup
        )
    }

    /// Whether this kind is an owning scope rather than a scoped object.
    #[must_use]
    pub const fn is_scope(&self) -> bool {
        matches!(self, Self::Namespace | Self::MarathonGroup)
    }

    /// REST collection name for Kubernetes kinds.
    const fn plural(&self) -> &'static str {
        match self {
            Self::Namespace => "namespaces",
            Self::Pod => "pods",
            Self::Service => "services",
            Self::ReplicationController => "replicationcontrollers",
            Self::Secret => "secrets",
            Self::ConfigMap => "configmaps",
            Self::PersistentVolumeClaim => "persistentvolumeclaims",
            Self::Deployment => "deployments",
            Self::DaemonSet => "daemonsets",
            Self::ReplicaSet => "replicasets",
            Self::StatefulSet => "statefulsets",
            Self::Job => "jobs",
            Self::MarathonGroup => "groups",
            Self::MarathonApp => "apps",
        }
    }

    fn collection_path(&self, descriptor: &ResourceDescriptor, scope: &str) -> String {
        match self {
            Self::Namespace => "/api/v1/namespaces".to_owned(),
            Self::MarathonGroup | Self::MarathonApp => format!("/v2/{}", self.plural()),
            _ => {
                let prefix = if descriptor.api_version() == "v1" {
                    "/api/v1".to_owned()
                } else {
                    format!("/apis/{}", descriptor.api_version())
                };
                format!("{prefix}/namespaces/{scope}/{}", self.plural())
            }
        }
    }

    fn item_path(&self, descriptor: &ResourceDescriptor, scope: &str) -> String {
        let collection = self.collection_path(descriptor, scope);
        match self {
            Self::MarathonGroup => format!("{collection}/{}", trim_group(descriptor.resource_id())),
            Self::MarathonApp => format!(
                "{collection}/{}/{}",
                trim_group(scope),
                descriptor.resource_id()
            ),
            _ => format!("{collection}/{}", descriptor.resource_id()),
        }
    }

    /// Request that checks whether the object exists.
    #[must_use]
    pub fn exists_call(&self, descriptor: &ResourceDescriptor, scope: &str) -> ApiRequest {
        ApiRequest::get(self.item_path(descriptor, scope))
    }

    /// Request that creates the object.
    pub fn create_call(
        &self,
        descriptor: &ResourceDescriptor,
        scope: &str,
    ) -> EngineResult<ApiRequest> {
        let (body, content_type) = self.body(descriptor, scope)?;
        Ok(ApiRequest::with_body(
            Method::POST,
            self.collection_path(descriptor, scope),
            body,
            content_type,
        ))
    }

    /// Request that replaces the object in place.
    pub fn update_call(
        &self,
        descriptor: &ResourceDescriptor,
        scope: &str,
    ) -> EngineResult<ApiRequest> {
        let (body, content_type) = self.body(descriptor, scope)?;
        let mut path = self.item_path(descriptor, scope);
        if self.platform() == Platform::Marathon {
            path.push_str("?force=true");
        }
        Ok(ApiRequest::with_body(Method::PUT, path, body, content_type))
    }

    /// Request that deletes the object immediately.
    #[must_use]
    pub fn delete_call(&self, descriptor: &ResourceDescriptor, scope: &str) -> ApiRequest {
        let path = self.item_path(descriptor, scope);
        match self.platform() {
            Platform::Kubernetes => ApiRequest::with_body(
                Method::DELETE,
                path,
                DELETE_IMMEDIATELY,
                ContentType::Json,
            ),
            Platform::Marathon => ApiRequest::bare(Method::DELETE, format!("{path}?force=true")),
        }
    }

    fn body(
        &self,
        descriptor: &ResourceDescriptor,
        scope: &str,
    ) -> EngineResult<(Bytes, ContentType)> {
        match self {
            Self::MarathonApp => {
                let payload = descriptor.json_payload()?;
                let mut value: Value = serde_json::from_slice(&payload)
                    .map_err(|e| EngineError::serialisation(e.to_string()))?;
                // Apps always land in the group they are polled in.
                if let Some(object) = value.as_object_mut() {
                    let id = format!("/{}/{}", trim_group(scope), descriptor.resource_id());
                    object.insert("id".to_owned(), Value::String(id));
                }
                let body = serde_json::to_vec(&value)
                    .map_err(|e| EngineError::serialisation(e.to_string()))?;
                Ok((Bytes::from(body), ContentType::Json))
            }
            Self::MarathonGroup => Ok((descriptor.json_payload()?, ContentType::Json)),
            _ => Ok((descriptor.payload().clone(), descriptor.content_type())),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MarathonGroup => "Group",
            Self::MarathonApp => "App",
            other => return write!(f, "{other:?}"),
        };
        f.write_str(name)
    }
}

fn trim_group(name: &str) -> &str {
    name.trim_matches('/')
}

/// Maps `(apiVersion, kind)` pairs to resource kinds.
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    kinds: HashMap<(String, String), ResourceKind>,
}

impl KindRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every Kubernetes kind the engine knows.
    #[must_use]
    pub fn kubernetes() -> Self {
        let mut registry = Self::new();
        for (kind, resource_kind) in [
            ("Namespace", ResourceKind::Namespace),
            ("Pod", ResourceKind::Pod),
            ("Service", ResourceKind::Service),
            ("ReplicationController", ResourceKind::ReplicationController),
            ("Secret", ResourceKind::Secret),
            ("ConfigMap", ResourceKind::ConfigMap),
            ("PersistentVolumeClaim", ResourceKind::PersistentVolumeClaim),
        ] {
            registry.register("v1", kind, resource_kind);
        }
        for api_version in ["apps/v1", "extensions/v1beta1"] {
            registry
                .register(api_version, "Deployment", ResourceKind::Deployment)
                .register(api_version, "DaemonSet", ResourceKind::DaemonSet)
                .register(api_version, "ReplicaSet", ResourceKind::ReplicaSet);
        }
        registry
            .register("apps/v1", "StatefulSet", ResourceKind::StatefulSet)
            .register("batch/v1", "Job", ResourceKind::Job);
        registry
    }

    /// Registry with the Marathon kinds.
    #[must_use]
    pub fn marathon() -> Self {
        let mut registry = Self::new();
        registry
            .register(MARATHON_API_VERSION, "Group", ResourceKind::MarathonGroup)
            .register(MARATHON_API_VERSION, "App", ResourceKind::MarathonApp);
        registry
    }

    /// Default registry for a platform.
    #[must_use]
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Kubernetes => Self::kubernetes(),
            Platform::Marathon => Self::marathon(),
        }
    }

    /// Register (or replace) a mapping.
    pub fn register(
        &mut self,
        api_version: impl Into<String>,
        kind: impl Into<String>,
        resource_kind: ResourceKind,
    ) -> &mut Self {
        self.kinds
            .insert((api_version.into(), kind.into()), resource_kind);
        self
    }

    /// Look up the kind for a pair.
    #[must_use]
    pub fn resolve(&self, api_version: &str, kind: &str) -> Option<ResourceKind> {
        self.kinds
            .get(&(api_version.to_owned(), kind.to_owned()))
            .copied()
    }

    /// Number of registered pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
