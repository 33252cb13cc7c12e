//! Record of what a strategy run did.

use std::fmt;

use serde::Serialize;

use crate::strategy::Strategy;

/// One step taken against the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// The owning scope was created.
    ScopeCreated,
    /// The owning scope was deleted.
    ScopeDeleted,
    /// The resource did not exist and was created.
    Created,
    /// The resource existed and was deleted then recreated.
    Replaced,
    /// The resource existed and was updated in place.
    Updated,
    /// The resource existed and was deleted.
    Deleted,
    /// The resource did not exist; nothing to delete.
    Skipped,
}

impl Action {
    /// The action as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ScopeCreated => "scope created",
            Self::ScopeDeleted => "scope deleted",
            Self::Created => "created",
            Self::Replaced => "replaced",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action together with the resource it applied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedAction {
    /// What was done.
    pub action: Action,
    /// Which resource, as described by the handle.
    pub resource: String,
}

/// Actions performed by one strategy invocation, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentReport {
    /// Strategy that produced the report.
    pub strategy: Strategy,
    /// Actions in the order they were applied.
    pub actions: Vec<AppliedAction>,
}

impl DeploymentReport {
    /// Create an empty report.
    #[must_use]
    pub const fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            actions: Vec::new(),
        }
    }

    /// Append an action.
    pub fn record(&mut self, action: Action, resource: impl Into<String>) {
        self.actions.push(AppliedAction {
            action,
            resource: resource.into(),
        });
    }

    /// Number of actions of one type.
    #[must_use]
    pub fn count(&self, action: Action) -> usize {
        self.actions.iter().filter(|a| a.action == action).count()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl fmt::Display for DeploymentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "strategy: {}", self.strategy)?;
        for applied in &self.actions {
            writeln!(f, "  {:<14} {}", applied.action, applied.resource)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_display() {
        let mut report = DeploymentReport::new(Strategy::Replace);
        assert!(report.is_empty());
        report.record(Action::ScopeCreated, "namespace 'prod'");
        report.record(Action::Created, "Service 'api' in namespace 'prod'");
        report.record(Action::Replaced, "Deployment 'web' in namespace 'prod'");

        assert_eq!(report.count(Action::Created), 1);
        assert_eq!(report.count(Action::Deleted), 0);

        let text = report.to_string();
        assert!(text.starts_with("strategy: replace\n"));
        assert!(text.contains("replaced"));
        assert!(text.contains("Deployment 'web' in namespace 'prod'"));
    }
}
