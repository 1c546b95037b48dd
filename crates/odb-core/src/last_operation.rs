//! Broker facing view of an operation's current task

use crate::types::OperationType;
use odb_director::{Task, TaskState};
use serde::{Deserialize, Serialize};

/// Operation state as reported to the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationState {
    /// Still running
    #[serde(rename = "in progress")]
    InProgress,
    /// Finished successfully
    #[serde(rename = "succeeded")]
    Succeeded,
    /// Finished unsuccessfully
    #[serde(rename = "failed")]
    Failed,
}

impl OperationState {
    /// Whether the operation will not change state again
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl From<TaskState> for OperationState {
    fn from(state: TaskState) -> Self {
        match state {
            TaskState::Queued | TaskState::Processing | TaskState::Cancelling => Self::InProgress,
            TaskState::Done => Self::Succeeded,
            TaskState::Error | TaskState::Cancelled | TaskState::Timeout => Self::Failed,
        }
    }
}

/// Last-operation response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastOperation {
    /// State
    pub state: OperationState,
    /// Human readable description
    #[serde(default)]
    pub description: String,
}

impl LastOperation {
    /// Describe `task` as the current state of an operation of `operation_type`
    #[must_use]
    pub fn from_task(operation_type: OperationType, task: &Task) -> Self {
        let state = OperationState::from(task.state);
        let verb = match operation_type {
            OperationType::Create => "Instance provisioning",
            OperationType::Update => "Instance update",
            OperationType::Upgrade => "Instance upgrade",
            OperationType::Delete => "Instance deletion",
        };
        let description = match state {
            OperationState::InProgress => format!("{verb} in progress"),
            OperationState::Succeeded => format!("{verb} completed"),
            OperationState::Failed => format!("{verb} failed: bosh task id {}", task.id),
        };

        Self { state, description }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_states_map_to_operation_states() {
        for state in [TaskState::Queued, TaskState::Processing, TaskState::Cancelling] {
            assert_eq!(OperationState::from(state), OperationState::InProgress);
        }
        assert_eq!(OperationState::from(TaskState::Done), OperationState::Succeeded);
        for state in [TaskState::Error, TaskState::Cancelled, TaskState::Timeout] {
            assert_eq!(OperationState::from(state), OperationState::Failed);
        }
    }

    #[test]
    fn failed_description_names_task() {
        let op = LastOperation::from_task(OperationType::Upgrade, &Task::new(12, TaskState::Error));
        assert_eq!(op.state, OperationState::Failed);
        assert_eq!(op.description, "Instance upgrade failed: bosh task id 12");
    }

    #[test]
    fn serializes_broker_state_names() {
        let op = LastOperation::from_task(OperationType::Create, &Task::new(1, TaskState::Queued));
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            serde_json::json!({"state": "in progress", "description": "Instance provisioning in progress"})
        );
    }
}
