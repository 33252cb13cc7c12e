//! Configuration for deckhand.

use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::kind::Platform;
use crate::strategy::Strategy;

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EngineConfig {
    /// Platform connection configuration.
    #[serde(default)]
    pub platform: PlatformConfig,

    /// Convergence polling configuration.
    #[serde(default)]
    pub convergence: ConvergenceConfig,

    /// Deployment behaviour configuration.
    #[serde(default)]
    pub deployment: DeploymentConfig,
}

impl EngineConfig {
    /// Load configuration from the default sources.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `deckhand.toml` in the current directory (if present)
    /// 3. Environment variables with `DECKHAND_` prefix
    pub fn load() -> EngineResult<Self> {
        Figment::new()
            .merge(Toml::file("deckhand.toml"))
            .merge(Env::prefixed("DECKHAND_").split("__"))
            .extract()
            .map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Load configuration from a specific TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> EngineResult<Self> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("DECKHAND_").split("__"))
            .extract()
            .map_err(|e| EngineError::Config(e.to_string()))
    }
}

/// Platform connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// Which API dialect the platform speaks.
    #[serde(default)]
    pub kind: Platform,

    /// Base URL of the platform API.
    #[serde(default = "default_platform_url")]
    pub url: String,

    /// Bearer token sent with every request.
    #[serde(default)]
    pub token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,

    /// Skip TLS certificate verification.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_platform_url() -> String {
    "http://localhost:8080".to_owned()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            kind: Platform::default(),
            url: default_platform_url(),
            token: None,
            timeout_secs: default_request_timeout_secs(),
            accept_invalid_certs: false,
        }
    }
}

/// How long to wait for creations and deletions to take effect.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvergenceConfig {
    /// Give up after this many seconds.
    #[serde(default = "default_convergence_timeout_secs")]
    pub timeout_secs: u64,

    /// Milliseconds between existence checks.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

const fn default_convergence_timeout_secs() -> u64 {
    300 // 5 minutes
}

const fn default_interval_ms() -> u64 {
    500
}

impl ConvergenceConfig {
    /// Timeout as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Poll interval as a duration.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_convergence_timeout_secs(),
            interval_ms: default_interval_ms(),
        }
    }
}

/// Deployment behaviour configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentConfig {
    /// Default strategy.
    #[serde(default)]
    pub strategy: Strategy,

    /// Namespace or group to deploy into.
    #[serde(default = "default_scope")]
    pub scope: String,
}

fn default_scope() -> String {
    "default".to_owned()
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            scope: default_scope(),
        }
    }
}
