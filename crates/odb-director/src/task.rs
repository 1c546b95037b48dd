//! Director tasks
//!
//! A task is one unit of asynchronous work on the director. Tasks are created
//! by submit calls, mutated only by the director, and only ever read here.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Task state as reported by the director
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Waiting for a worker
    Queued,
    /// Running
    Processing,
    /// Cancel requested, still running
    Cancelling,
    /// Finished successfully
    Done,
    /// Finished with an error
    Error,
    /// Cancelled before completion
    Cancelled,
    /// Timed out on the director
    Timeout,
}

impl TaskState {
    /// Terminal states never change again
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error | Self::Cancelled | Self::Timeout)
    }

    /// Wire name of the state
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Cancelling => "cancelling",
            Self::Done => "done",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A director task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task id
    pub id: u64,
    /// Current state
    pub state: TaskState,
    /// Human readable description, e.g. "create deployment"
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// Free text result
    #[serde(default, deserialize_with = "null_as_empty")]
    pub result: String,
    /// Correlation id, empty when the task was not submitted with one
    #[serde(default, deserialize_with = "null_as_empty")]
    pub context_id: String,
}

impl Task {
    /// Create a task with empty text fields
    #[inline]
    #[must_use]
    pub fn new(id: u64, state: TaskState) -> Self {
        Self {
            id,
            state,
            description: String::new(),
            result: String::new(),
            context_id: String::new(),
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With context id
    #[inline]
    #[must_use]
    pub fn with_context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = context_id.into();
        self
    }

    /// Finished successfully
    #[inline]
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == TaskState::Done
    }
}

/// Order tasks newest first, so index 0 is the latest task
#[must_use]
pub fn normalise(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(|a, b| b.id.cmp(&a.id));
    tasks
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
