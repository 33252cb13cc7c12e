//! Deployment orchestration.
//!
//! This module wires descriptors through the factory into handles and hands
//! them to the strategy engine for one named scope.

mod coordinator;

pub use coordinator::{DeploymentCoordinator, DeploymentRequest};
