//! ODB Adapter - external service adapter invocation
//!
//! The service adapter is an executable supplied by the service author. The
//! broker talks to it through a fixed protocol:
//! - argv is `<adapter> <action> <args...>`, structured args as JSON
//! - stdout carries the result, stderr is for operators only
//! - the exit code selects a typed outcome
//!
//! # Example
//!
//! ```rust,ignore
//! use odb_adapter::{Adapter, ProcessRunner};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), odb_adapter::AdapterError> {
//! let adapter = Adapter::new("/var/vcap/packages/adapter/bin/adapter", Arc::new(ProcessRunner));
//! adapter
//!     .delete_binding("binding-id", &Default::default(), "name: deployment", &serde_json::json!({}))
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod adapter;
pub mod error;
pub mod outcome;
pub mod runner;
pub mod types;

pub use adapter::Adapter;
pub use error::AdapterError;
pub use outcome::AdapterOutcome;
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};
pub use types::{Binding, BoshVms, ServiceDeployment, ServiceRelease, Stemcell};
