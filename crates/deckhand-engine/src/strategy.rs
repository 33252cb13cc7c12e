//! Reconciliation strategies.
//!
//! This module defines the [`Strategy`] enum and the [`StrategyEngine`]
//! that applies it. Each strategy is a decision procedure over one
//! question per resource: does it exist right now?
//!
//! | Strategy  | Scope first               | Deploy: exists / absent  | Delete: exists / absent |
//! |-----------|---------------------------|--------------------------|-------------------------|
//! | `Replace` | create if absent          | delete + create / create | delete / nothing        |
//! | `Update`  | create if absent          | update / create          | delete / nothing        |
//! | `Reset`   | delete if present, create | create                   | delete the scope        |
//!
//! `Replace` and `Update` only touch the resources they are given. `Reset`
//! wipes and rebuilds the whole scope. Resources are processed one at a
//! time, in order, and the first error aborts the run without undoing
//! anything already applied.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{EngineError, EngineResult};
use crate::report::{Action, DeploymentReport};
use crate::resource::Resource;

/// Policy for reconciling a batch against the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Delete and recreate every existing resource.
    ///
    /// Works for every kind, at the cost of a short outage per resource.
    #[default]
    Replace,

    /// Update existing resources in place.
    ///
    /// Rejected up front if any resource in the batch has no in-place
    /// update.
    Update,

    /// Delete the whole scope and rebuild it from the batch.
    ///
    /// Anything in the scope that is not part of the batch is lost.
    Reset,
}

impl Strategy {
    /// All strategies, in declaration order.
    pub const ALL: [Self; 3] = [Self::Replace, Self::Update, Self::Reset];

    /// Get the strategy name as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Update => "update",
            Self::Reset => "reset",
        }
    }

    /// Check if this strategy rebuilds the owning scope.
    #[must_use]
    pub const fn resets_scope(&self) -> bool {
        matches!(self, Self::Reset)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                EngineError::config(format!(
                    "unknown strategy '{s}' (expected one of: replace, update, reset)"
                ))
            })
    }
}

/// Applies a [`Strategy`] to a scope and a batch of resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyEngine {
    strategy: Strategy,
}

impl StrategyEngine {
    /// Create an engine for one strategy.
    #[must_use]
    pub const fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    /// The strategy this engine applies.
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Bring the batch into existence in `scope`.
    pub async fn deploy<R: Resource>(
        &self,
        scope: &R,
        resources: &[R],
    ) -> EngineResult<DeploymentReport> {
        let mut report = DeploymentReport::new(self.strategy);

        if self.strategy == Strategy::Update {
            if let Some(unsupported) = resources.iter().find(|r| !r.supports_update()) {
                return Err(EngineError::UnsupportedOperation {
                    resource: unsupported.describe(),
                });
            }
        }

        info!(
            strategy = %self.strategy,
            scope = %scope.describe(),
            resources = resources.len(),
            "deploying resources"
        );

        let result = self.run_deploy(scope, resources, &mut report).await;
        self.finish(result, report)
    }

    /// Remove the batch from `scope`.
    pub async fn delete<R: Resource>(
        &self,
        scope: &R,
        resources: &[R],
    ) -> EngineResult<DeploymentReport> {
        let mut report = DeploymentReport::new(self.strategy);

        info!(
            strategy = %self.strategy,
            scope = %scope.describe(),
            resources = resources.len(),
            "deleting resources"
        );

        let result = self.run_delete(scope, resources, &mut report).await;
        self.finish(result, report)
    }

    async fn run_deploy<R: Resource>(
        &self,
        scope: &R,
        resources: &[R],
        report: &mut DeploymentReport,
    ) -> EngineResult<()> {
        match self.strategy {
            Strategy::Replace | Strategy::Update => {
                if !scope.exists().await? {
                    scope.create().await?;
                    report.record(Action::ScopeCreated, scope.describe());
                }
            }
            Strategy::Reset => {
                if scope.exists().await? {
                    scope.delete().await?;
                    report.record(Action::ScopeDeleted, scope.describe());
                }
                scope.create().await?;
                report.record(Action::ScopeCreated, scope.describe());
            }
        }

        for resource in resources {
            let action = self.deploy_one(resource).await?;
            report.record(action, resource.describe());
        }

        Ok(())
    }

    async fn deploy_one<R: Resource>(&self, resource: &R) -> EngineResult<Action> {
        match self.strategy {
            Strategy::Reset => {
                resource.create().await?;
                Ok(Action::Created)
            }
            Strategy::Replace => {
                if resource.exists().await? {
                    resource.delete().await?;
                    resource.create().await?;
                    Ok(Action::Replaced)
                } else {
                    resource.create().await?;
                    Ok(Action::Created)
                }
            }
            Strategy::Update => {
                if resource.exists().await? {
                    resource.update().await?;
                    Ok(Action::Updated)
                } else {
                    resource.create().await?;
                    Ok(Action::Created)
                }
            }
        }
    }

    async fn run_delete<R: Resource>(
        &self,
        scope: &R,
        resources: &[R],
        report: &mut DeploymentReport,
    ) -> EngineResult<()> {
        if self.strategy.resets_scope() {
            if scope.exists().await? {
                scope.delete().await?;
                report.record(Action::ScopeDeleted, scope.describe());
            }
            return Ok(());
        }

        for resource in resources {
            if resource.exists().await? {
                resource.delete().await?;
                report.record(Action::Deleted, resource.describe());
            } else {
                report.record(Action::Skipped, resource.describe());
            }
        }

        Ok(())
    }

    fn finish(
        &self,
        result: EngineResult<()>,
        report: DeploymentReport,
    ) -> EngineResult<DeploymentReport> {
        match result {
            Ok(()) => {
                info!(
                    strategy = %self.strategy,
                    actions = report.actions.len(),
                    "strategy completed"
                );
                Ok(report)
            }
            Err(e) => {
                error!(
                    strategy = %self.strategy,
                    applied = report.actions.len(),
                    error = %e,
                    "strategy aborted; applied changes are left in place"
                );
                Err(e)
            }
        }
    }
}
