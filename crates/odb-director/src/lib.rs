//! ODB Director - BOSH director client
//!
//! Wraps the parts of the director API the broker depends on:
//! - Fetching a task by id, or every task sharing a context id
//! - Submitting deployments, deployment deletions and errand runs
//! - Per-request authorization headers
//!
//! # Example
//!
//! ```rust,ignore
//! use odb_director::{BasicAuthHeaderBuilder, Director, DirectorConfig, HttpDirector};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let auth = Arc::new(BasicAuthHeaderBuilder::new("admin", "secret"));
//! let director = HttpDirector::new(DirectorConfig::new("https://10.0.0.6:25555"), auth)?;
//!
//! let task = director.get_task(42).await?;
//! println!("task {} is {}", task.id, task.state);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod auth;
pub mod client;
pub mod director;
pub mod error;
pub mod task;

pub use auth::{AuthHeaderBuilder, BasicAuthHeaderBuilder, UaaClientCredentialsHeaderBuilder};
pub use client::{DirectorConfig, HttpDirector};
pub use director::Director;
pub use error::DirectorError;
pub use task::{normalise, Task, TaskState};

/// Header used to correlate follow-up tasks with the deployment that started them
pub const CONTEXT_ID_HEADER: &str = "X-Bosh-Context-Id";
