//! Worker configuration.
//!
//! # Load order
//!
//! 1. Defaults (the values the worker has always used)
//! 2. TOML file, when a path is given
//! 3. Environment variables (`APPROVER_BROKER_ENDPOINT`, `APPROVER_HOSTNAME`,
//!    `APPROVER_LOG`)
//!
//! Each layer overrides the previous.
//!
//! ```toml
//! [broker]
//! endpoint = "gearman.internal:4730"
//!
//! [lock]
//! poll_interval_ms = 100
//! max_wait_ms = 4000
//!
//! [backoff]
//! initial_secs = 1
//! increment_secs = 2
//! ceiling_secs = 30
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::backoff::BackoffPolicy;
use crate::app::lock_guard::LockPolicy;
use crate::impls::gearman::DEFAULT_PORT;

pub const ENV_BROKER_ENDPOINT: &str = "APPROVER_BROKER_ENDPOINT";
pub const ENV_HOSTNAME: &str = "APPROVER_HOSTNAME";
pub const ENV_LOG: &str = "APPROVER_LOG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to look up host name: {0}")]
    Hostname(#[source] std::io::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub broker: BrokerConfig,
    pub identity: IdentityConfig,
    pub lock: LockConfig,
    pub backoff: BackoffConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Job server address, `host:port`.
    pub endpoint: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            endpoint: format!("127.0.0.1:{DEFAULT_PORT}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Overrides the system host name.
    pub hostname: Option<String>,
    pub suffix: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            suffix: "_MCPServer".to_string(),
        }
    }
}

impl IdentityConfig {
    /// `<hostname><suffix>`, stable for the life of the host.
    pub fn client_id(&self) -> Result<String, ConfigError> {
        let host = match &self.hostname {
            Some(host) => host.clone(),
            None => hostname::get()
                .map_err(ConfigError::Hostname)?
                .to_string_lossy()
                .into_owned(),
        };
        Ok(format!("{host}{}", self.suffix))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    pub poll_interval_ms: u64,
    pub max_wait_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            max_wait_ms: 4000,
        }
    }
}

impl LockConfig {
    pub fn policy(&self) -> LockPolicy {
        LockPolicy {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_wait: Duration::from_millis(self.max_wait_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub initial_secs: u64,
    pub increment_secs: u64,
    pub ceiling_secs: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_secs: 1,
            increment_secs: 2,
            ceiling_secs: 30,
        }
    }
}

impl BackoffConfig {
    pub fn policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            initial: Duration::from_secs(self.initial_secs),
            increment: Duration::from_secs(self.increment_secs),
            ceiling: Duration::from_secs(self.ceiling_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info,approver_core=debug`.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl WorkerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then the file (if any), then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                debug!(path = %path.display(), "loaded config file");
                toml::from_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the environment, in production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_BROKER_ENDPOINT) {
            self.broker.endpoint = endpoint;
        }
        if let Some(host) = lookup(ENV_HOSTNAME) {
            self.identity.hostname = Some(host);
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.logging.filter = filter;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("broker.endpoint must not be empty".to_string()));
        }
        if self.lock.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("lock.poll_interval_ms must be positive".to_string()));
        }
        if self.backoff.ceiling_secs < self.backoff.initial_secs {
            return Err(ConfigError::Invalid(
                "backoff.ceiling_secs must be at least backoff.initial_secs".to_string(),
            ));
        }
        Ok(())
    }
}
