//! Lifecycle runner
//!
//! Resolves the current task of a deployment operation. Correlated operations
//! consist of at most two director tasks sharing a context id: the primary
//! deployment task and one follow-up (post-deploy errand, or the deployment
//! deletion after a pre-delete errand). The follow-up is submitted by the
//! first poll that sees the primary task done; later polls see two tasks and
//! never submit again.

use crate::error::LifecycleError;
use crate::last_operation::LastOperation;
use crate::types::{OperationData, OperationType, Plans};
use odb_director::{Director, Task};
use std::sync::Arc;

/// Tracks deployment operations and triggers their follow-up tasks
#[derive(Clone)]
pub struct LifeCycleRunner {
    director: Arc<dyn Director>,
    plans: Plans,
}

impl std::fmt::Debug for LifeCycleRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifeCycleRunner")
            .field("plans", &self.plans)
            .finish_non_exhaustive()
    }
}

impl LifeCycleRunner {
    /// Create a runner
    #[must_use]
    pub fn new(director: Arc<dyn Director>, plans: Plans) -> Self {
        Self { director, plans }
    }

    /// Current task of the operation, submitting its follow-up when due
    ///
    /// Called on every poll of the operation. Log lines are emitted within
    /// the caller's span.
    ///
    /// # Errors
    /// - `LifecycleError::Director` for any failed director call
    /// - `LifecycleError::NoTasksForContext` when the director knows no task
    ///   for the context id
    /// - `LifecycleError::TooManyTasksForContext` for more than two tasks
    pub async fn get_task(
        &self,
        deployment_name: &str,
        operation_data: &OperationData,
    ) -> Result<Task, LifecycleError> {
        let Some(context_id) = operation_data.context_id() else {
            return Ok(self.director.get_task(operation_data.bosh_task_id).await?);
        };

        let mut tasks = self
            .director
            .get_normalised_tasks_by_context(deployment_name, context_id)
            .await?;

        match tasks.len() {
            0 => Err(LifecycleError::NoTasksForContext(context_id.to_string())),
            1 => {
                let task = tasks.remove(0);
                if !task.is_done() {
                    return Ok(task);
                }
                self.start_follow_up(deployment_name, context_id, operation_data, task)
                    .await
            }
            2 => Ok(tasks.remove(0)),
            count => Err(LifecycleError::TooManyTasksForContext {
                context_id: context_id.to_string(),
                count,
            }),
        }
    }

    /// Broker facing state of the operation
    ///
    /// # Errors
    /// - Any error of [`LifeCycleRunner::get_task`]
    pub async fn last_operation(
        &self,
        deployment_name: &str,
        operation_data: &OperationData,
    ) -> Result<LastOperation, LifecycleError> {
        let task = self.get_task(deployment_name, operation_data).await?;
        Ok(LastOperation::from_task(operation_data.operation_type, &task))
    }

    async fn start_follow_up(
        &self,
        deployment_name: &str,
        context_id: &str,
        operation_data: &OperationData,
        done: Task,
    ) -> Result<Task, LifecycleError> {
        let task_id = match operation_data.operation_type {
            OperationType::Delete => {
                let task_id = self
                    .director
                    .delete_deployment(deployment_name, context_id)
                    .await?;
                tracing::info!(
                    deployment = deployment_name,
                    context_id,
                    task_id,
                    "pre-delete errand done, deleting deployment"
                );
                task_id
            }
            OperationType::Create | OperationType::Update | OperationType::Upgrade => {
                let Some(errand) = self.post_deploy_errand(operation_data) else {
                    return Ok(done);
                };
                let task_id = self
                    .director
                    .run_errand(deployment_name, errand, context_id)
                    .await?;
                tracing::info!(
                    deployment = deployment_name,
                    context_id,
                    errand,
                    task_id,
                    "deployment done, running post-deploy errand"
                );
                task_id
            }
        };

        Ok(self.director.get_task(task_id).await?)
    }

    fn post_deploy_errand(&self, operation_data: &OperationData) -> Option<&str> {
        let plan_id = operation_data.plan_id.as_deref()?;
        let plan = self.plans.find_by_id(plan_id);
        if plan.is_none() {
            tracing::warn!(plan_id, "plan not found, no post-deploy errand will run");
        }
        plan?.post_deploy_errand()
    }
}
