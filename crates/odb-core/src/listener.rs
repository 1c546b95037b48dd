//! Upgrade campaign observers
//!
//! The upgrader reports every step of a campaign through a [`Listener`]:
//! - `starting`, `instances_to_upgrade` once at the beginning
//! - `instance_upgrade_starting`, `instance_upgrade_start_result`,
//!   `waiting_for`, `instance_upgraded` per instance
//! - `progress` at the end of every pass, `finished` at the end

use crate::services::UpgradeOperationType;
use std::time::Duration;

/// Observer of an upgrade campaign
pub trait Listener: Send + Sync {
    /// Campaign started
    fn starting(&self);

    /// Fleet listed
    fn instances_to_upgrade(&self, instances: &[String]);

    /// About to request the upgrade of `instance`, `index` is zero based
    fn instance_upgrade_starting(&self, instance: &str, index: usize, total: usize);

    /// Broker answered the upgrade request
    fn instance_upgrade_start_result(&self, result: UpgradeOperationType);

    /// Polling the upgrade task of `instance`
    fn waiting_for(&self, instance: &str, task_id: u64);

    /// Upgrade of `instance` reached a terminal state, `result` is "succeeded" or "failed"
    fn instance_upgraded(&self, instance: &str, result: &str);

    /// Pass finished; `attempt_interval` is the pause before the next pass
    fn progress(
        &self,
        attempt_interval: Duration,
        orphaned: usize,
        upgraded: usize,
        to_retry: usize,
        deleted: usize,
    );

    /// Campaign finished
    fn finished(&self, orphaned: usize, upgraded: usize, deleted: usize);
}

/// `Listener` writing operator log lines
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingListener;

impl Listener for LoggingListener {
    fn starting(&self) {
        tracing::info!("STARTING UPGRADES");
    }

    fn instances_to_upgrade(&self, instances: &[String]) {
        tracing::info!("Service Instances: {}", instances.join(" "));
        tracing::info!("Total Service Instances found: {}", instances.len());
    }

    fn instance_upgrade_starting(&self, instance: &str, index: usize, total: usize) {
        tracing::info!(
            "Service instance: {instance}, upgrade attempt starting ({} of {total})",
            index + 1
        );
    }

    fn instance_upgrade_start_result(&self, result: UpgradeOperationType) {
        let message = match result {
            UpgradeOperationType::Accepted => "accepted upgrade",
            UpgradeOperationType::NotFound => {
                "orphan service instance detected - no corresponding bosh deployment"
            }
            UpgradeOperationType::InstanceDeleted => "already deleted",
            UpgradeOperationType::OperationInProgress => "operation in progress",
            UpgradeOperationType::Unexpected => "unexpected result",
        };
        tracing::info!("Result: {message}");
    }

    fn waiting_for(&self, instance: &str, task_id: u64) {
        tracing::info!("Waiting for upgrade to complete for {instance}: bosh task id {task_id}");
    }

    fn instance_upgraded(&self, instance: &str, result: &str) {
        tracing::info!("Result: Service Instance {instance} upgrade {result}");
    }

    fn progress(
        &self,
        attempt_interval: Duration,
        orphaned: usize,
        upgraded: usize,
        to_retry: usize,
        deleted: usize,
    ) {
        tracing::info!("Upgrade progress summary:");
        tracing::info!("Sleep interval until next attempt: {attempt_interval:?}");
        tracing::info!("Number of successful upgrades so far: {upgraded}");
        tracing::info!("Number of service instance orphans detected so far: {orphaned}");
        tracing::info!("Number of deleted instances before upgrade could occur: {deleted}");
        tracing::info!("Number of operations in progress (to retry) so far: {to_retry}");
    }

    fn finished(&self, orphaned: usize, upgraded: usize, deleted: usize) {
        tracing::info!("FINISHED UPGRADES");
        tracing::info!("Summary:");
        tracing::info!("Number of successful upgrades: {upgraded}");
        tracing::info!("Number of service instance orphans detected: {orphaned}");
        tracing::info!("Number of deleted instances before upgrade could occur: {deleted}");
    }
}
