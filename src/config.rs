//! # Dispatcher Configuration
//!
//! [`DispatcherConfig`] gathers the knobs a dispatcher reads at runtime. It can be
//! built in code, read from the environment, or loaded from a YAML file.
//!
//! ## Environment Variables
//!
//! - `BRRTMUX_MAX_BODY`: request body limit in bytes (default: 10 MiB)
//! - `BRRTMUX_POOL_MAX_IDLE`: idle contexts kept for reuse (default: 1024)
//! - `BRRTMUX_LOG`: `EnvFilter` directives; setting it turns logging on
//! - `BRRTMUX_LOG_FORMAT`: `json` or `pretty` (default: `json`)
//!
//! ## YAML
//!
//! ```yaml
//! max_request_body_size: 1048576
//! pool_max_idle: 64
//! health_path: /healthz
//! log:
//!   enabled: true
//!   format: pretty
//!   filter: brrtmux=debug
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;

use crate::logging::{init_logger, LogConfig, LogFormat, Logger};

/// Default request body limit: 10 MiB.
pub const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Default number of idle contexts kept in the pool.
pub const DEFAULT_POOL_MAX_IDLE: usize = 1024;

/// Runtime configuration for a [`Dispatcher`](crate::dispatcher::Dispatcher).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Largest request body `Context::body` accepts, in bytes
    pub max_request_body_size: usize,
    /// Idle contexts kept for reuse
    pub pool_max_idle: usize,
    /// Path answered by the `Health` middleware
    pub health_path: String,
    /// Logging settings
    pub log: LogConfig,
    /// Logger built from `log` (or supplied with [`DispatcherConfig::with_logger`])
    #[serde(skip)]
    pub logger: Logger,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_request_body_size: DEFAULT_MAX_REQUEST_BODY_SIZE,
            pool_max_idle: DEFAULT_POOL_MAX_IDLE,
            health_path: "/health".to_string(),
            log: LogConfig::default(),
            logger: Logger::default(),
        }
    }
}

impl DispatcherConfig {
    /// Replace the logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup, with the same keys as
    /// [`DispatcherConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let max_request_body_size = lookup("BRRTMUX_MAX_BODY")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_request_body_size);

        let pool_max_idle = lookup("BRRTMUX_POOL_MAX_IDLE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.pool_max_idle);

        let mut log = defaults.log.clone();
        if let Some(filter) = lookup("BRRTMUX_LOG") {
            log.enabled = true;
            log.filter = filter;
        }
        if let Some(format) = lookup("BRRTMUX_LOG_FORMAT") {
            log.format = LogFormat::parse(&format);
        }

        Self {
            max_request_body_size,
            pool_max_idle,
            log,
            ..defaults
        }
        .build_logger()
    }

    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.build_logger()
    }

    fn build_logger(mut self) -> Result<Self> {
        self.logger = init_logger(&self.log)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DispatcherConfig::default();
        assert_eq!(config.max_request_body_size, 10 * 1024 * 1024);
        assert_eq!(config.pool_max_idle, 1024);
        assert_eq!(config.health_path, "/health");
        assert!(!config.log.enabled);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("BRRTMUX_MAX_BODY", "2048"),
            ("BRRTMUX_POOL_MAX_IDLE", "not-a-number"),
            ("BRRTMUX_LOG", "brrtmux=debug"),
            ("BRRTMUX_LOG_FORMAT", "pretty"),
        ]
        .into_iter()
        .collect();
        let config =
            DispatcherConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_string())).unwrap();
        assert_eq!(config.max_request_body_size, 2048);
        assert_eq!(config.pool_max_idle, DEFAULT_POOL_MAX_IDLE);
        assert!(config.log.enabled);
        assert_eq!(config.log.filter, "brrtmux=debug");
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn test_load_yaml_with_partial_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pool_max_idle: 8\nhealth_path: /healthz\nlog:\n  format: pretty").unwrap();
        let config = DispatcherConfig::load(file.path()).unwrap();
        assert_eq!(config.pool_max_idle, 8);
        assert_eq!(config.health_path, "/healthz");
        assert_eq!(config.max_request_body_size, DEFAULT_MAX_REQUEST_BODY_SIZE);
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert!(!config.log.enabled);
    }

    #[test]
    fn test_load_missing_file() {
        let err = DispatcherConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
