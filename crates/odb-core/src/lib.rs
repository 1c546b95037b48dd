//! ODB Core - deployment lifecycle and fleet upgrades
//!
//! The broker's control plane:
//! - Resolves the current director task of a deployment operation and
//!   triggers its post-deploy errand or deployment deletion exactly once
//! - Maps tasks onto last-operation responses
//! - Runs upgrade campaigns over every service instance, reporting through
//!   a listener
//!
//! # Example
//!
//! ```rust,ignore
//! use odb_core::{LifeCycleRunner, OperationData, OperationType, Plans};
//!
//! # async fn example(director: std::sync::Arc<dyn odb_director::Director>) -> Result<(), odb_core::LifecycleError> {
//! let runner = LifeCycleRunner::new(director, Plans::default());
//! let data = OperationData::correlated(OperationType::Create, 42, "some-uuid", "plan-a");
//!
//! let task = runner.get_task("service-instance_1", &data).await?;
//! println!("task {} is {}", task.id, task.state);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod last_operation;
pub mod lifecycle;
pub mod listener;
pub mod services;
pub mod types;
pub mod upgrader;

pub use error::{BrokerError, LifecycleError, UpgradeError};
pub use last_operation::{LastOperation, OperationState};
pub use lifecycle::LifeCycleRunner;
pub use listener::{Listener, LoggingListener};
pub use services::{BrokerServices, InstanceLister, UpgradeOperation, UpgradeOperationType};
pub use types::{LifecycleErrands, OperationData, OperationType, Plan, Plans, UpgraderConfig};
pub use upgrader::{CampaignOutcome, CancelHandle, InstanceFailure, UpgradeReport, Upgrader};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
