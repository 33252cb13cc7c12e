//! Descriptor fixtures for engine integration tests.

use deckhand_engine::{ContentType, ResourceDescriptor};

/// Builds a YAML descriptor through the same parser the CLI uses.
pub fn yaml(api_version: &str, kind: &str, name: &str) -> ResourceDescriptor {
    let body = format!(
        "apiVersion: {api_version}\nkind: {kind}\nmetadata:\n  name: {name}\n"
    );
    ResourceDescriptor::parse(&format!("{name}.yaml"), &body, ContentType::Yaml).unwrap()
}

pub fn service(name: &str) -> ResourceDescriptor {
    yaml("v1", "Service", name)
}

pub fn deployment(name: &str) -> ResourceDescriptor {
    yaml("apps/v1", "Deployment", name)
}

pub fn pod(name: &str) -> ResourceDescriptor {
    yaml("v1", "Pod", name)
}

pub fn config_map(name: &str) -> ResourceDescriptor {
    yaml("v1", "ConfigMap", name)
}

/// Builds a Marathon app descriptor with a JSON body.
pub fn marathon_app(group: &str, name: &str) -> ResourceDescriptor {
    let body = serde_json::json!({
        "apiVersion": "marathon/v2",
        "kind": "App",
        "id": format!("/{group}/{name}"),
        "cmd": "serve",
        "instances": 1,
    })
    .to_string();
    ResourceDescriptor::parse(&format!("{name}.json"), &body, ContentType::Json).unwrap()
}

pub const NAMESPACE: &str = "/api/v1/namespaces/prod";
pub const NAMESPACES: &str = "/api/v1/namespaces";

pub fn service_path(name: &str) -> String {
    format!("/api/v1/namespaces/prod/services/{name}")
}

pub const SERVICES: &str = "/api/v1/namespaces/prod/services";

pub fn deployment_path(name: &str) -> String {
    format!("/apis/apps/v1/namespaces/prod/deployments/{name}")
}

pub const DEPLOYMENTS: &str = "/apis/apps/v1/namespaces/prod/deployments";
