//! The director capability consumed by the lifecycle runner

use crate::error::DirectorError;
use crate::task::Task;

/// Operations the broker needs from a BOSH director
///
/// Submit calls return the id of the task the director created for the work.
#[async_trait::async_trait]
pub trait Director: Send + Sync {
    /// Fetch one task by id
    async fn get_task(&self, task_id: u64) -> Result<Task, DirectorError>;

    /// Fetch every task of `deployment_name` carrying `context_id`, latest first
    async fn get_normalised_tasks_by_context(
        &self,
        deployment_name: &str,
        context_id: &str,
    ) -> Result<Vec<Task>, DirectorError>;

    /// Submit a deployment manifest
    async fn deploy(&self, manifest: &[u8], context_id: Option<&str>) -> Result<u64, DirectorError>;

    /// Delete a deployment
    async fn delete_deployment(
        &self,
        deployment_name: &str,
        context_id: &str,
    ) -> Result<u64, DirectorError>;

    /// Run an errand against a deployment
    async fn run_errand(
        &self,
        deployment_name: &str,
        errand_name: &str,
        context_id: &str,
    ) -> Result<u64, DirectorError>;
}
