//! Broker capabilities consumed by the upgrader

use crate::error::BrokerError;
use crate::last_operation::LastOperation;
use crate::types::OperationData;
use std::fmt;

/// How the broker answered an upgrade request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpgradeOperationType {
    /// Upgrade started, follow its task
    Accepted,
    /// No deployment backs the instance; counted as an orphan
    NotFound,
    /// The instance was deleted before its upgrade could run
    InstanceDeleted,
    /// Another operation is running on the deployment
    OperationInProgress,
    /// Any other answer
    Unexpected,
}

impl fmt::Display for UpgradeOperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Accepted => "accepted",
            Self::NotFound => "not found",
            Self::InstanceDeleted => "instance deleted",
            Self::OperationInProgress => "operation in progress",
            Self::Unexpected => "unexpected",
        })
    }
}

/// Classified upgrade response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeOperation {
    /// Classification
    pub kind: UpgradeOperationType,
    /// Operation to poll; only meaningful when accepted
    pub data: Option<OperationData>,
}

impl UpgradeOperation {
    /// Accepted upgrade following `data`
    #[inline]
    #[must_use]
    pub fn accepted(data: OperationData) -> Self {
        Self {
            kind: UpgradeOperationType::Accepted,
            data: Some(data),
        }
    }

    /// Response without an operation to follow
    #[inline]
    #[must_use]
    pub fn of_kind(kind: UpgradeOperationType) -> Self {
        Self { kind, data: None }
    }
}

/// Broker endpoints used during an upgrade
#[async_trait::async_trait]
pub trait BrokerServices: Send + Sync {
    /// Request an upgrade of one instance
    async fn upgrade_instance(&self, instance_id: &str) -> Result<UpgradeOperation, BrokerError>;

    /// Poll an operation previously returned by `upgrade_instance`
    async fn last_operation(
        &self,
        instance_id: &str,
        operation_data: &OperationData,
    ) -> Result<LastOperation, BrokerError>;
}

/// Source of the fleet to upgrade
#[async_trait::async_trait]
pub trait InstanceLister: Send + Sync {
    /// Ids of every service instance, in upgrade order
    async fn instances(&self) -> Result<Vec<String>, BrokerError>;
}
