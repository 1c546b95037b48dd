//! ODB Upgrader - upgrade every service instance of a broker
//!
//! Library half of the `upgrade-all-service-instances` errand:
//! - YAML configuration
//! - HTTP client for the broker's management API
//! - Log subscriber setup

#![warn(unreachable_pub)]

pub mod broker_client;
pub mod config;
pub mod logging;

pub use broker_client::{classify_upgrade_response, HttpBroker};
pub use config::{BasicAuth, BrokerApiConfig, ConfigError, UpgraderFileConfig};
pub use logging::{init_logging, LogFormat};
