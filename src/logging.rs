//! Logging System
//!
//! Structured logging built on the `tracing` crate: configurable level,
//! output format, color, and per-module overrides, with an environment
//! variable taking precedence over file-based configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Environment variable overriding the configured filter
pub const LOG_ENV_VAR: &str = "STRATA_LOG";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Enable colored output (text format only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Filter directive string: base level plus per-module overrides
    fn directives(&self) -> String {
        let mut directives = vec![self.level.clone()];
        for (module, level) in &self.modules {
            directives.push(format!("{}={}", module, level));
        }
        directives.join(",")
    }
}

fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, ConfigError> {
    if std::env::var(LOG_ENV_VAR).is_ok() {
        return EnvFilter::try_from_env(LOG_ENV_VAR)
            .map_err(|e| ConfigError::Logging(format!("invalid {}: {}", LOG_ENV_VAR, e)));
    }
    let directives = config
        .map(|c| c.directives())
        .unwrap_or_else(default_log_level);
    EnvFilter::try_new(&directives)
        .map_err(|e| ConfigError::Logging(format!("invalid filter {:?}: {}", directives, e)))
}

/// Initialize the logging system
///
/// Priority order (highest to lowest): `STRATA_LOG` environment variable,
/// the given configuration, defaults. Fails if a subscriber is already
/// installed.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ConfigError> {
    let filter = build_env_filter(config)?;
    let base = Registry::default().with(filter);

    let format = config.map(|c| c.format.as_str()).unwrap_or("text");
    let use_color = config.map(|c| c.color).unwrap_or(true);

    let result = if format == "json" {
        base.with(fmt::layer().json().with_target(true)).try_init()
    } else {
        base.with(fmt::layer().with_target(true).with_ansi(use_color))
            .try_init()
    };
    result.map_err(|e| ConfigError::Logging(e.to_string()))
}
