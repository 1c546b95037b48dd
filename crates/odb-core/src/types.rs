//! Core types: operations, plans, upgrade configuration

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

/// Kind of deployment operation the broker started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Provision
    Create,
    /// Plan change or parameter update
    Update,
    /// Upgrade to the current release set
    Upgrade,
    /// Deprovision
    Delete,
}

impl OperationType {
    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Upgrade => "upgrade",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State the broker keeps for one in-flight operation
///
/// Serialized into the opaque operation string handed to the platform and
/// echoed back on every last-operation poll. With a context id the operation
/// is tracked through every task carrying that id; without one only
/// `bosh_task_id` is followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationData {
    /// What kind of operation this is
    #[serde(rename = "OperationType")]
    pub operation_type: OperationType,
    /// Task the operation started with
    #[serde(rename = "BoshTaskID")]
    pub bosh_task_id: u64,
    /// Correlation id shared by the operation's tasks
    #[serde(
        rename = "BoshContextID",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub bosh_context_id: Option<String>,
    /// Plan the instance was deployed with
    #[serde(rename = "PlanID", default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    /// Errand recorded for the operation when it started
    #[serde(
        rename = "PostDeployErrandName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub post_deploy_errand_name: Option<String>,
}

impl OperationData {
    /// Operation tracked by task id only
    #[inline]
    #[must_use]
    pub fn new(operation_type: OperationType, bosh_task_id: u64) -> Self {
        Self {
            operation_type,
            bosh_task_id,
            bosh_context_id: None,
            plan_id: None,
            post_deploy_errand_name: None,
        }
    }

    /// Operation tracked through its context id
    #[must_use]
    pub fn correlated(
        operation_type: OperationType,
        bosh_task_id: u64,
        context_id: impl Into<String>,
        plan_id: impl Into<String>,
    ) -> Self {
        let context_id = context_id.into();
        Self {
            bosh_context_id: (!context_id.is_empty()).then_some(context_id),
            plan_id: Some(plan_id.into()),
            ..Self::new(operation_type, bosh_task_id)
        }
    }

    /// With post-deploy errand name
    #[inline]
    #[must_use]
    pub fn with_post_deploy_errand(mut self, errand: impl Into<String>) -> Self {
        self.post_deploy_errand_name = Some(errand.into());
        self
    }

    /// Context id, if the operation is correlated
    #[inline]
    #[must_use]
    pub fn context_id(&self) -> Option<&str> {
        self.bosh_context_id.as_deref().filter(|id| !id.is_empty())
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

/// Errands run around a plan's deployment lifecycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleErrands {
    /// Run after create, update and upgrade deployments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_deploy: Option<String>,
    /// Run before the deployment is deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_delete: Option<String>,
}

/// Service plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Plan id
    pub id: String,
    /// Plan name
    pub name: String,
    /// Lifecycle errands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_errands: Option<LifecycleErrands>,
}

impl Plan {
    /// Plan without errands
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lifecycle_errands: None,
        }
    }

    /// With post-deploy errand
    #[must_use]
    pub fn with_post_deploy_errand(mut self, errand: impl Into<String>) -> Self {
        self.lifecycle_errands
            .get_or_insert_with(LifecycleErrands::default)
            .post_deploy = Some(errand.into());
        self
    }

    /// With pre-delete errand
    #[must_use]
    pub fn with_pre_delete_errand(mut self, errand: impl Into<String>) -> Self {
        self.lifecycle_errands
            .get_or_insert_with(LifecycleErrands::default)
            .pre_delete = Some(errand.into());
        self
    }

    /// Post-deploy errand name, if configured
    #[must_use]
    pub fn post_deploy_errand(&self) -> Option<&str> {
        self.lifecycle_errands
            .as_ref()
            .and_then(|e| e.post_deploy.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// Pre-delete errand name, if configured
    #[must_use]
    pub fn pre_delete_errand(&self) -> Option<&str> {
        self.lifecycle_errands
            .as_ref()
            .and_then(|e| e.pre_delete.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// Errand that follows or precedes an operation of this type
    ///
    /// Operations with an errand must be started in correlated mode.
    #[must_use]
    pub fn lifecycle_errand_for(&self, operation_type: OperationType) -> Option<&str> {
        match operation_type {
            OperationType::Delete => self.pre_delete_errand(),
            OperationType::Create | OperationType::Update | OperationType::Upgrade => {
                self.post_deploy_errand()
            }
        }
    }
}

/// Plan catalogue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plans(Vec<Plan>);

impl Plans {
    /// Create from plans
    #[inline]
    #[must_use]
    pub fn new(plans: Vec<Plan>) -> Self {
        Self(plans)
    }

    /// Plan with `id`
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&Plan> {
        self.0.iter().find(|plan| plan.id == id)
    }

    /// All plans
    pub fn iter(&self) -> impl Iterator<Item = &Plan> {
        self.0.iter()
    }
}

impl From<Vec<Plan>> for Plans {
    fn from(plans: Vec<Plan>) -> Self {
        Self(plans)
    }
}

/// Fleet upgrade configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgraderConfig {
    /// Pause between polls of an accepted upgrade
    pub polling_interval: Duration,
    /// Pause between passes over busy instances
    pub attempt_interval: Duration,
    /// Maximum number of passes, unlimited when `None`
    pub attempt_limit: Option<usize>,
    /// Stop the campaign at the first failed instance
    pub halt_on_failure: bool,
}

impl UpgraderConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With polling interval
    #[inline]
    #[must_use]
    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    /// With attempt interval
    #[inline]
    #[must_use]
    pub fn with_attempt_interval(mut self, interval: Duration) -> Self {
        self.attempt_interval = interval;
        self
    }

    /// With attempt limit
    #[inline]
    #[must_use]
    pub fn with_attempt_limit(mut self, limit: usize) -> Self {
        self.attempt_limit = Some(limit);
        self
    }

    /// With halt on failure
    #[inline]
    #[must_use]
    pub fn with_halt_on_failure(mut self, halt: bool) -> Self {
        self.halt_on_failure = halt;
        self
    }
}

impl Default for UpgraderConfig {
    fn default() -> Self {
        Self {
            polling_interval: Duration::from_secs(60),
            attempt_interval: Duration::from_secs(60),
            attempt_limit: None,
            halt_on_failure: false,
        }
    }
}
