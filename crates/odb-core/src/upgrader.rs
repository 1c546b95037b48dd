//! Fleet upgrade campaign
//!
//! Instances are upgraded one at a time, in lister order. Instances that are
//! busy with another operation are retried in later passes, keeping their
//! relative order, with `attempt_interval` between passes. Every wait can be
//! interrupted through a [`CancelHandle`]; operations already accepted by the
//! broker are never cancelled, the campaign only stops following them.

use crate::error::UpgradeError;
use crate::last_operation::OperationState;
use crate::listener::Listener;
use crate::services::{BrokerServices, InstanceLister, UpgradeOperationType};
use crate::types::{OperationData, UpgraderConfig};
use crate::BrokerError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// How a campaign ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CampaignOutcome {
    /// Every instance was processed
    #[default]
    Completed,
    /// Stopped at the first failure
    Halted,
    /// Stopped by a cancel request
    Cancelled,
}

/// Instance whose upgrade did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceFailure {
    /// Service instance id
    pub instance_id: String,
    /// What went wrong
    pub reason: String,
}

/// Campaign summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeReport {
    /// Instances upgraded successfully
    pub upgraded: usize,
    /// Instances without a backing deployment
    pub orphaned: usize,
    /// Instances deleted before their upgrade could run
    pub deleted: usize,
    /// Instances left busy when the campaign stopped
    pub to_retry: usize,
    /// Instances that failed
    pub failures: Vec<InstanceFailure>,
    /// How the campaign ended
    pub outcome: CampaignOutcome,
}

impl UpgradeReport {
    /// Completed without any failed instance
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == CampaignOutcome::Completed && self.failures.is_empty()
    }
}

/// Requests the cancellation of a running campaign
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Stop the running campaign, or the next one to start, at its next checkpoint
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether cancellation was requested
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

enum InstanceOutcome {
    Upgraded,
    Orphaned,
    Deleted,
    Busy,
    Failed(String),
    Interrupted,
}

enum Polled {
    Finished(OperationState),
    Interrupted,
}

/// Runs upgrade campaigns over the whole fleet
pub struct Upgrader {
    lister: Arc<dyn InstanceLister>,
    broker: Arc<dyn BrokerServices>,
    listener: Arc<dyn Listener>,
    config: UpgraderConfig,
    cancel: CancelHandle,
}

impl std::fmt::Debug for Upgrader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upgrader")
            .field("config", &self.config)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl Upgrader {
    /// Create an upgrader
    #[must_use]
    pub fn new(
        lister: Arc<dyn InstanceLister>,
        broker: Arc<dyn BrokerServices>,
        listener: Arc<dyn Listener>,
        config: UpgraderConfig,
    ) -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            lister,
            broker,
            listener,
            config,
            cancel: CancelHandle { tx: Arc::new(tx) },
        }
    }

    /// Handle for cancelling campaigns of this upgrader
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run one campaign
    ///
    /// # Errors
    /// - `UpgradeError::ListInstances` if the fleet cannot be listed; every
    ///   other failure is recorded per instance in the report
    pub async fn upgrade(&self) -> Result<UpgradeReport, UpgradeError> {
        self.listener.starting();

        let instances = self
            .lister
            .instances()
            .await
            .map_err(UpgradeError::ListInstances)?;
        self.listener.instances_to_upgrade(&instances);

        let mut report = UpgradeReport::default();
        let mut pending = instances;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let total = pending.len();
            let mut to_retry = Vec::new();
            tracing::info!(attempt, instances = total, "starting upgrade pass");

            for (index, instance) in pending.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    report.to_retry = to_retry.len() + total - index;
                    return Ok(self.cancelled(report));
                }

                match self.upgrade_instance(instance, index, total).await {
                    InstanceOutcome::Upgraded => report.upgraded += 1,
                    InstanceOutcome::Orphaned => report.orphaned += 1,
                    InstanceOutcome::Deleted => report.deleted += 1,
                    InstanceOutcome::Busy => to_retry.push(instance.clone()),
                    InstanceOutcome::Interrupted => {
                        report.to_retry = to_retry.len() + total - index;
                        return Ok(self.cancelled(report));
                    }
                    InstanceOutcome::Failed(reason) => {
                        tracing::warn!(instance_id = %instance, %reason, "service instance upgrade failed");
                        report.failures.push(InstanceFailure {
                            instance_id: instance.clone(),
                            reason,
                        });
                        if self.config.halt_on_failure {
                            report.to_retry = to_retry.len() + total - index - 1;
                            report.outcome = CampaignOutcome::Halted;
                            self.finish(&report);
                            return Ok(report);
                        }
                    }
                }
            }

            report.to_retry = to_retry.len();
            if self.cancel.is_cancelled() {
                return Ok(self.cancelled(report));
            }
            self.listener.progress(
                self.config.attempt_interval,
                report.orphaned,
                report.upgraded,
                report.to_retry,
                report.deleted,
            );

            if to_retry.is_empty() {
                break;
            }

            if self.config.attempt_limit.is_some_and(|limit| attempt >= limit) {
                for instance in to_retry {
                    report.failures.push(InstanceFailure {
                        instance_id: instance,
                        reason: format!("operation still in progress after {attempt} attempts"),
                    });
                }
                report.to_retry = 0;
                break;
            }

            if self.pause(self.config.attempt_interval).await {
                return Ok(self.cancelled(report));
            }

            pending = to_retry;
        }

        self.finish(&report);
        Ok(report)
    }

    async fn upgrade_instance(
        &self,
        instance: &str,
        index: usize,
        total: usize,
    ) -> InstanceOutcome {
        self.listener.instance_upgrade_starting(instance, index, total);

        let operation = match self.broker.upgrade_instance(instance).await {
            Ok(operation) => operation,
            Err(err) => {
                self.listener
                    .instance_upgrade_start_result(UpgradeOperationType::Unexpected);
                return InstanceOutcome::Failed(format!("upgrade request failed: {err}"));
            }
        };
        self.listener.instance_upgrade_start_result(operation.kind);

        match operation.kind {
            UpgradeOperationType::Accepted => {
                let Some(data) = operation.data else {
                    return InstanceOutcome::Failed(
                        "upgrade accepted without operation data".to_string(),
                    );
                };
                self.follow_upgrade(instance, &data).await
            }
            UpgradeOperationType::NotFound => InstanceOutcome::Orphaned,
            UpgradeOperationType::InstanceDeleted => InstanceOutcome::Deleted,
            UpgradeOperationType::OperationInProgress => InstanceOutcome::Busy,
            UpgradeOperationType::Unexpected => {
                InstanceOutcome::Failed("unexpected response to upgrade request".to_string())
            }
        }
    }

    async fn follow_upgrade(&self, instance: &str, data: &OperationData) -> InstanceOutcome {
        self.listener.waiting_for(instance, data.bosh_task_id);

        match self.poll_until_terminal(instance, data).await {
            Ok(Polled::Finished(OperationState::Succeeded)) => {
                self.listener.instance_upgraded(instance, "succeeded");
                InstanceOutcome::Upgraded
            }
            Ok(Polled::Finished(_)) => {
                self.listener.instance_upgraded(instance, "failed");
                InstanceOutcome::Failed(format!("upgrade failed: bosh task id {}", data.bosh_task_id))
            }
            Ok(Polled::Interrupted) => {
                tracing::info!(
                    instance_id = instance,
                    task_id = data.bosh_task_id,
                    "campaign cancelled while upgrade in progress, no longer polling"
                );
                InstanceOutcome::Interrupted
            }
            Err(err) => InstanceOutcome::Failed(format!("error polling upgrade: {err}")),
        }
    }

    async fn poll_until_terminal(
        &self,
        instance: &str,
        data: &OperationData,
    ) -> Result<Polled, BrokerError> {
        loop {
            let cancelled = self.pause(self.config.polling_interval).await;
            let last_operation = self.broker.last_operation(instance, data).await?;
            tracing::debug!(
                instance_id = instance,
                task_id = data.bosh_task_id,
                state = ?last_operation.state,
                "polled upgrade"
            );

            if last_operation.state.is_terminal() {
                return Ok(Polled::Finished(last_operation.state));
            }
            if cancelled {
                return Ok(Polled::Interrupted);
            }
        }
    }

    /// Sleep for `duration`; returns true if cancellation was requested
    async fn pause(&self, duration: Duration) -> bool {
        let mut rx = self.cancel.tx.subscribe();
        tokio::select! {
            () = tokio::time::sleep(duration) => self.cancel.is_cancelled(),
            result = rx.wait_for(|cancelled| *cancelled) => result.is_ok(),
        }
    }

    /// Consumes the cancel request so later campaigns run again
    fn cancelled(&self, mut report: UpgradeReport) -> UpgradeReport {
        self.cancel.tx.send_replace(false);
        tracing::warn!(
            upgraded = report.upgraded,
            to_retry = report.to_retry,
            "upgrade campaign cancelled"
        );
        report.outcome = CampaignOutcome::Cancelled;
        report
    }

    fn finish(&self, report: &UpgradeReport) {
        self.listener
            .finished(report.orphaned, report.upgraded, report.deleted);
    }
}
