//! Blocking until a resource reaches the requested existence state.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::config::ConvergenceConfig;
use crate::error::{EngineError, EngineResult};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Existence state to wait for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The platform reports the object.
    Exists,
    /// The platform no longer reports the object.
    Absent,
}

impl Presence {
    /// The state as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Exists => "exists",
            Self::Absent => "absent",
        }
    }

    /// The operation that waits for this state.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Exists => "create",
            Self::Absent => "delete",
        }
    }

    const fn matches(self, exists: bool) -> bool {
        match self {
            Self::Exists => exists,
            Self::Absent => !exists,
        }
    }
}

/// Polls an existence check at a fixed interval until it matches or the
/// timeout elapses.
///
/// Elapsed time is counted in whole intervals rather than read from a
/// clock, so the number of polls is `timeout / interval + 1` regardless of
/// how long each check takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistencePoller {
    timeout: Duration,
    interval: Duration,
}

impl ExistencePoller {
    /// Create a poller with the given budget.
    #[must_use]
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// Create a poller from configuration.
    #[must_use]
    pub fn from_config(config: &ConvergenceConfig) -> Self {
        Self::new(config.timeout(), config.interval())
    }

    /// Total time budget.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Spacing between checks.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until `check` reports `target`.
    ///
    /// Errors from `check` abort the wait immediately. When the budget is
    /// spent the wait fails with [`EngineError::ConvergenceTimeout`]
    /// carrying `on_timeout`.
    pub async fn block<F, Fut>(
        &self,
        target: Presence,
        mut check: F,
        on_timeout: &str,
    ) -> EngineResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = EngineResult<bool>>,
    {
        let mut elapsed = Duration::ZERO;

        loop {
            let exists = check().await?;
            if target.matches(exists) {
                debug!(target = target.as_str(), elapsed = ?elapsed, "resource converged");
                return Ok(());
            }

            if elapsed >= self.timeout {
                return Err(EngineError::ConvergenceTimeout {
                    message: on_timeout.to_owned(),
                    operation: target.operation(),
                    elapsed,
                });
            }

            debug!(target = target.as_str(), elapsed = ?elapsed, "waiting for resource");
            tokio::time::sleep(self.interval).await;
            elapsed += self.interval;
        }
    }
}

impl Default for ExistencePoller {
    fn default() -> Self {
        Self::from_config(&ConvergenceConfig::default())
    }
}
