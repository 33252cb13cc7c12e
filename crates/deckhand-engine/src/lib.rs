//! Deckhand reconciliation engine
//!
//! This crate converges declared resources (workloads, services, namespaces
//! and groups) onto a Kubernetes-style or Marathon-style platform over its
//! REST API.
//!
//! # Architecture
//!
//! Descriptors flow through the engine leaf-first:
//!
//! ```text
//! ResourceDescriptor ──▶ ResourceFactory ──▶ ResourceHandle ──▶ StrategyEngine
//!                                              │
//!                                              ├─ CallExecutor (one retry on 409/500)
//!                                              └─ ExistencePoller (wait for exists/absent)
//! ```
//!
//! - **Call execution**: every request is classified by status; 409 and 500
//!   are retried exactly once with a fresh copy of the request
//! - **Convergence**: `create` and `delete` poll until the platform reports
//!   the requested state, turning asynchronous platform work into a
//!   synchronous step
//! - **Strategies**: `replace`, `update` and `reset` decide which of
//!   create, update and delete to run for each resource
//!
//! Resources are processed one at a time in declaration order. The first
//! error aborts the run; nothing already applied is rolled back.
//!
//! # Example
//!
//! ```ignore
//! use deckhand_engine::{DeploymentCoordinator, DeploymentRequest, EngineConfig, Strategy};
//!
//! let config = EngineConfig::load()?;
//! let coordinator = DeploymentCoordinator::from_config(&config)?;
//! let descriptors = deckhand_engine::parse_documents("app.yaml", &text, ContentType::Yaml)?;
//!
//! let report = coordinator
//!     .deploy(DeploymentRequest::new("prod", Strategy::Replace, descriptors))
//!     .await?;
//! println!("{report}");
//! ```

#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

pub mod config;
pub mod deployment;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod factory;
pub mod kind;
pub mod poller;
pub mod report;
pub mod resource;
pub mod strategy;
pub mod transport;

// Re-export commonly used types at the crate root
pub use config::{ConvergenceConfig, DeploymentConfig, EngineConfig, PlatformConfig};
pub use deployment::{DeploymentCoordinator, DeploymentRequest};
pub use descriptor::{parse_documents, ContentType, ResourceDescriptor};
pub use error::{EngineError, EngineResult};
pub use executor::{CallExecutor, CallOutcome};
pub use factory::ResourceFactory;
pub use kind::{KindRegistry, Platform, ResourceKind};
pub use poller::{ExistencePoller, Presence};
pub use report::{Action, AppliedAction, DeploymentReport};
pub use resource::{Resource, ResourceHandle, Scope};
pub use strategy::{Strategy, StrategyEngine};
pub use transport::{
    ApiRequest, ApiResponse, HttpTransport, MockTransport, Transport, TransportError,
};
