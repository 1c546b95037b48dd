//! Testing utilities for ODB workspace
//!
//! Shared fakes, fixtures, and log capture.

#![allow(missing_docs)]

mod broker;
mod director;
mod listener;
mod logs;
mod runner;

pub use broker::{FakeBrokerServices, FakeInstanceLister};
pub use director::FakeDirector;
pub use listener::{ListenerEvent, RecordingListener};
pub use logs::CapturedLogs;
pub use runner::FakeCommandRunner;

use odb_core::{Plan, Plans};
use odb_director::{Task, TaskState};

pub const DEPLOYMENT_NAME: &str = "some-deployment";
pub const CONTEXT_ID: &str = "some-uuid";
pub const PLAN_ID: &str = "some-plan-id";
pub const ANOTHER_PLAN_ID: &str = "another-plan-id";
pub const PLAN_ID_WITHOUT_ERRANDS: &str = "without-errands-plan-id";
pub const ERRAND: &str = "some-errand";
pub const ANOTHER_ERRAND: &str = "another-errand";

/// Task belonging to `CONTEXT_ID`
pub fn context_task(id: u64, state: TaskState) -> Task {
    Task::new(id, state)
        .with_description("snapshot deployment")
        .with_context_id(CONTEXT_ID)
}

/// Plans with and without post-deploy errands
pub fn test_plans() -> Plans {
    Plans::new(vec![
        Plan::new(PLAN_ID, "some-plan").with_post_deploy_errand(ERRAND),
        Plan::new(ANOTHER_PLAN_ID, "another-plan").with_post_deploy_errand(ANOTHER_ERRAND),
        Plan::new(PLAN_ID_WITHOUT_ERRANDS, "plan-without-errands"),
    ])
}
