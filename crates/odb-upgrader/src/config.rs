//! Upgrader configuration file
//!
//! ```yaml
//! broker_api:
//!   url: https://broker.example.com
//!   authentication:
//!     basic:
//!       username: admin
//!       password: secret
//! polling_interval: 60   # seconds between polls of an accepted upgrade
//! attempt_interval: 60   # seconds between passes over busy instances
//! attempt_limit: 5       # optional, unlimited when absent
//! request_timeout: 120   # seconds per broker request
//! halt_on_failure: false
//! ```

use odb_core::UpgraderConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("error reading config file {path}: {source}")]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration YAML
    #[error("error parsing config file {path}: {source}")]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_yaml::Error,
    },

    /// Values are out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Basic auth credentials
#[derive(Clone, Deserialize)]
pub struct BasicAuth {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Authentication {
    basic: BasicAuth,
}

/// Broker management API endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerApiConfig {
    /// Broker base URL
    pub url: String,
    #[serde(rename = "authentication")]
    auth: Authentication,
}

impl BrokerApiConfig {
    /// Create for `url` with basic auth
    #[must_use]
    pub fn new(url: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth: Authentication {
                basic: BasicAuth {
                    username: username.into(),
                    password: password.into(),
                },
            },
        }
    }

    /// Credentials for every request
    #[inline]
    #[must_use]
    pub fn basic_auth(&self) -> &BasicAuth {
        &self.auth.basic
    }
}

/// Contents of the upgrader config file
#[derive(Debug, Clone, Deserialize)]
pub struct UpgraderFileConfig {
    /// Broker to upgrade instances of
    pub broker_api: BrokerApiConfig,
    /// Seconds between polls of an accepted upgrade
    #[serde(default = "default_interval_secs")]
    pub polling_interval: u64,
    /// Seconds between passes over busy instances
    #[serde(default = "default_interval_secs")]
    pub attempt_interval: u64,
    /// Maximum number of passes
    #[serde(default)]
    pub attempt_limit: Option<usize>,
    /// Seconds per broker request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout: u64,
    /// Stop at the first failed instance
    #[serde(default)]
    pub halt_on_failure: bool,
}

fn default_interval_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl UpgraderFileConfig {
    /// Read and validate a config file
    ///
    /// # Errors
    /// - `ConfigError::Read` if the file cannot be read
    /// - `ConfigError::Parse` if it is not valid YAML for this structure
    /// - `ConfigError::Invalid` if a value is out of range
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.broker_api.url.trim().is_empty() {
            return Err(ConfigError::Invalid("broker_api.url must not be empty".to_string()));
        }
        if self.attempt_limit == Some(0) {
            return Err(ConfigError::Invalid("attempt_limit must be greater than zero".to_string()));
        }
        if self.request_timeout == 0 {
            return Err(ConfigError::Invalid("request_timeout must be greater than zero".to_string()));
        }
        Ok(())
    }

    /// Campaign settings
    #[must_use]
    pub fn upgrader_config(&self) -> UpgraderConfig {
        let config = UpgraderConfig::new()
            .with_polling_interval(Duration::from_secs(self.polling_interval))
            .with_attempt_interval(Duration::from_secs(self.attempt_interval))
            .with_halt_on_failure(self.halt_on_failure);
        match self.attempt_limit {
            Some(limit) => config.with_attempt_limit(limit),
            None => config,
        }
    }

    /// Timeout per broker request
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}
