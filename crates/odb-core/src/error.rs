//! Error types for ODB Core
//!
//! Provides error handling for:
//! - Task lookup and follow-up submission in the lifecycle runner
//! - Campaign-level failures of a fleet upgrade
//! - Calls to the broker made on behalf of the upgrader

use odb_director::DirectorError;

/// Lifecycle runner errors
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// Director call failed, propagated unchanged
    #[error(transparent)]
    Director(#[from] DirectorError),

    /// Correlated operation without any task on the director
    #[error("no tasks found for context id: {0}")]
    NoTasksForContext(String),

    /// More tasks than a deployment and its single follow-up
    #[error("unexpected number of tasks for context id {context_id}: {count}")]
    TooManyTasksForContext {
        /// Context id shared by the tasks
        context_id: String,
        /// Number of tasks found
        count: usize,
    },
}

impl LifecycleError {
    /// Whether the director's task log broke the at-most-two-tasks rule
    #[inline]
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::NoTasksForContext(_) | Self::TooManyTasksForContext { .. }
        )
    }
}

/// Errors from broker calls made by the upgrader
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    /// The request did not complete
    #[error("error communicating with broker: {0}")]
    Request(String),

    /// The broker answered with something that could not be interpreted
    #[error("invalid broker response: {0}")]
    InvalidResponse(String),

    /// Error raised by another implementation
    #[error("{0}")]
    Other(String),
}

/// Campaign-level upgrade errors
///
/// Per-instance failures never surface here; they are recorded in the report.
#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    /// The fleet could not be listed
    #[error("error listing service instances: {0}")]
    ListInstances(#[source] BrokerError),
}
