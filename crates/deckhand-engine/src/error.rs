//! Error types for deckhand-engine.

use std::time::Duration;

/// Result type alias using [`EngineError`].
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while reconciling resources.
///
/// Resource-scoped variants carry a `resource` description of the form
/// `Deployment 'web' in namespace 'prod'` so a failure in the middle of a
/// batch can be traced to the exact object.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A descriptor is missing one of its identity keys.
    #[error("{source_name}: resource definition is missing required key '{key}'")]
    MissingKey {
        /// Where the descriptor came from (file name or label).
        source_name: String,
        /// The missing key.
        key: &'static str,
    },

    /// A descriptor could not be read or is structurally invalid.
    #[error("{source_name}: invalid resource definition: {reason}")]
    InvalidDescriptor {
        /// Where the descriptor came from.
        source_name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A descriptor has an empty payload.
    #[error("empty resource definition for {kind} '{id}'")]
    EmptyDefinition {
        /// Declared kind.
        kind: String,
        /// Declared resource id.
        id: String,
    },

    /// No handle implementation exists for the `(apiVersion, kind)` pair.
    #[error("unknown resource type {kind} for version {api_version} (resource '{id}')")]
    UnknownResourceType {
        /// Declared API version.
        api_version: String,
        /// Declared kind.
        kind: String,
        /// Declared resource id.
        id: String,
    },

    /// The resource kind has no in-place update.
    #[error("{resource}: kind does not support update")]
    UnsupportedOperation {
        /// Resource description.
        resource: String,
    },

    /// The platform answered 409/500 twice in a row.
    #[error("{resource}: {operation} failed after retry with status {status}: {reason}")]
    Transient {
        /// Resource description.
        resource: String,
        /// Operation being attempted.
        operation: &'static str,
        /// Status of the final attempt.
        status: u16,
        /// Reason text reported by the platform.
        reason: String,
    },

    /// The platform answered with a status the operation cannot accept.
    #[error("{resource}: {operation} failed with status {status}: {reason}")]
    Platform {
        /// Resource description.
        resource: String,
        /// Operation being attempted.
        operation: &'static str,
        /// Reported status code.
        status: u16,
        /// Reason text reported by the platform.
        reason: String,
    },

    /// A resource did not reach the requested state in time.
    #[error("{message} ({operation} did not converge after {elapsed:?})")]
    ConvergenceTimeout {
        /// Caller-supplied timeout message.
        message: String,
        /// Operation that did not converge.
        operation: &'static str,
        /// Time spent polling.
        elapsed: Duration,
    },

    /// The platform could not be reached while operating on a resource.
    #[error("{operation} failed for {resource}: {source}")]
    Unreachable {
        /// Human-readable resource identity.
        resource: String,
        /// Operation that was attempted.
        operation: &'static str,
        /// Underlying transport failure.
        #[source]
        source: crate::transport::TransportError,
    },

    /// Connection-level failure talking to the platform.
    #[error("transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialisation error.
    #[error("serialisation error: {0}")]
    Serialisation(String),
}

impl EngineError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a serialisation error.
    #[must_use]
    pub fn serialisation(msg: impl Into<String>) -> Self {
        Self::Serialisation(msg.into())
    }

    /// Returns true if the error was raised before any remote call was made.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(
            self,
            Self::MissingKey { .. }
                | Self::InvalidDescriptor { .. }
                | Self::EmptyDefinition { .. }
                | Self::UnknownResourceType { .. }
                | Self::Config(_)
        )
    }

    /// Returns true if the error is a convergence timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::ConvergenceTimeout { .. })
    }
}
