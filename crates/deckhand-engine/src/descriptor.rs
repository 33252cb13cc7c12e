//! Resource descriptors: the typed input to the engine.
//!
//! A [`ResourceDescriptor`] is one parsed resource definition. It carries
//! the identity triple (`apiVersion`, `kind`, resource id) next to the
//! opaque payload that is sent to the platform unchanged.

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EngineError, EngineResult};

/// Serialisation format of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// `application/json`.
    #[default]
    Json,
    /// `application/yaml`.
    Yaml,
}

impl ContentType {
    /// MIME type sent in the `Content-Type` header.
    #[must_use]
    pub const fn mime(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Yaml => "application/yaml",
        }
    }

    /// Guess the content type from a file extension.
    ///
    /// Returns `None` for anything other than `.json`, `.yaml` and `.yml`.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// One parsed resource definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    api_version: String,
    kind: String,
    resource_id: String,
    payload: Bytes,
    content_type: ContentType,
    source: String,
}

impl ResourceDescriptor {
    /// Create a descriptor, rejecting empty identity fields.
    ///
    /// The payload may be empty here; the factory refuses empty payloads
    /// when it builds a handle.
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        resource_id: impl Into<String>,
        payload: impl Into<Bytes>,
        content_type: ContentType,
    ) -> EngineResult<Self> {
        Self::build(
            String::new(),
            api_version.into(),
            kind.into(),
            resource_id.into(),
            payload.into(),
            content_type,
        )
    }

    fn build(
        source: String,
        api_version: String,
        kind: String,
        resource_id: String,
        payload: Bytes,
        content_type: ContentType,
    ) -> EngineResult<Self> {
        let descriptor = Self {
            api_version,
            kind,
            resource_id,
            payload,
            content_type,
            source,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Attach a label naming where this descriptor was read from.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    fn validate(&self) -> EngineResult<()> {
        let missing = |key| EngineError::MissingKey {
            source_name: self.source_label().to_owned(),
            key,
        };
        if self.api_version.trim().is_empty() {
            return Err(missing("apiVersion"));
        }
        if self.kind.trim().is_empty() {
            return Err(missing("kind"));
        }
        if self.resource_id.trim().is_empty() {
            return Err(missing("metadata.name"));
        }
        Ok(())
    }

    /// Parse a single document, keeping `body` verbatim as the payload.
    pub fn parse(source: &str, body: &str, content_type: ContentType) -> EngineResult<Self> {
        let value = parse_value(source, body, content_type)?;
        let (api_version, kind, resource_id) = identity(source, &value)?;
        Self::build(
            source.to_owned(),
            api_version,
            kind,
            resource_id,
            Bytes::copy_from_slice(body.as_bytes()),
            content_type,
        )
    }

    /// Build a descriptor from an already-parsed document.
    ///
    /// The payload is re-serialised in `content_type`.
    pub fn from_value(
        source: &str,
        value: &Value,
        content_type: ContentType,
    ) -> EngineResult<Self> {
        let (api_version, kind, resource_id) = identity(source, value)?;
        let payload = match content_type {
            ContentType::Json => {
                serde_json::to_vec(value).map_err(|e| EngineError::serialisation(e.to_string()))?
            }
            ContentType::Yaml => serde_yaml::to_string(value)
                .map_err(|e| EngineError::serialisation(e.to_string()))?
                .into_bytes(),
        };
        Self::build(
            source.to_owned(),
            api_version,
            kind,
            resource_id,
            Bytes::from(payload),
            content_type,
        )
    }

    /// Declared API version.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Declared kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Resource name, unique within its scope.
    #[must_use]
    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// Serialised body.
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Format of the payload.
    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Where the descriptor came from, or its kind and id if unknown.
    #[must_use]
    pub fn source_label(&self) -> &str {
        if self.source.is_empty() {
            &self.resource_id
        } else {
            &self.source
        }
    }

    /// The payload converted to JSON, for platforms that only accept JSON.
    pub fn json_payload(&self) -> EngineResult<Bytes> {
        match self.content_type {
            ContentType::Json => Ok(self.payload.clone()),
            ContentType::Yaml => {
                let value: Value = serde_yaml::from_slice(&self.payload)
                    .map_err(|e| EngineError::serialisation(e.to_string()))?;
                serde_json::to_vec(&value)
                    .map(Bytes::from)
                    .map_err(|e| EngineError::serialisation(e.to_string()))
            }
        }
    }
}

impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} '{}'", self.api_version, self.kind, self.resource_id)
    }
}

/// Parse every document in `text`.
///
/// YAML input may contain several `---` separated documents; empty
/// documents are skipped. JSON input is either one object or a top-level
/// array of objects. Document labels are `source#N`, counting from 1.
pub fn parse_documents(
    source: &str,
    text: &str,
    content_type: ContentType,
) -> EngineResult<Vec<ResourceDescriptor>> {
    let documents: Vec<Value> = match content_type {
        ContentType::Yaml => serde_yaml::Deserializer::from_str(text)
            .map(|document| {
                Value::deserialize(document).map_err(|e| EngineError::InvalidDescriptor {
                    source_name: source.to_owned(),
                    reason: e.to_string(),
                })
            })
            .collect::<EngineResult<Vec<_>>>()?,
        ContentType::Json => match parse_value(source, text, content_type)? {
            Value::Array(items) => items,
            other => vec![other],
        },
    };

    documents
        .iter()
        .filter(|value| !value.is_null())
        .enumerate()
        .map(|(index, value)| {
            let label = format!("{source}#{}", index + 1);
            ResourceDescriptor::from_value(&label, value, content_type)
        })
        .collect()
}

fn parse_value(source: &str, body: &str, content_type: ContentType) -> EngineResult<Value> {
    let parsed = match content_type {
        ContentType::Json => serde_json::from_str(body).map_err(|e| e.to_string()),
        ContentType::Yaml => serde_yaml::from_str(body).map_err(|e| e.to_string()),
    };
    parsed.map_err(|reason| EngineError::InvalidDescriptor {
        source_name: source.to_owned(),
        reason,
    })
}

/// Extract `(apiVersion, kind, name)` from a document.
///
/// The name is `metadata.name`, or for Marathon documents the last segment
/// of `id` (`/shop/web` names the app `web`).
fn identity(source: &str, value: &Value) -> EngineResult<(String, String, String)> {
    if !value.is_object() {
        return Err(EngineError::InvalidDescriptor {
            source_name: source.to_owned(),
            reason: "document is not a mapping".to_owned(),
        });
    }

    let string_at = |pointer: &str| {
        value
            .pointer(pointer)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
    };
    let missing = |key| EngineError::MissingKey {
        source_name: source.to_owned(),
        key,
    };

    let api_version = string_at("/apiVersion").ok_or_else(|| missing("apiVersion"))?;
    let kind = string_at("/kind").ok_or_else(|| missing("kind"))?;
    let name = string_at("/metadata/name")
        .or_else(|| {
            string_at("/id").and_then(|id| {
                id.rsplit('/')
                    .find(|segment| !segment.is_empty())
                    .map(ToOwned::to_owned)
            })
        })
        .ok_or_else(|| missing("metadata.name"))?;

    Ok((api_version, kind, name))
}
