//! Core runtime configuration.
//!
//! # Responsibility
//! - Describe the settings host applications pass to core at startup.
//! - Validate them before any component is constructed.
//!
//! # Invariants
//! - Missing fields fall back to defaults; unknown fields are rejected.
//! - A validated config always yields a usable page size and log level.

use crate::logging::{default_log_level, normalize_level};
use crate::repo::notification_repo::MAX_WINDOW_LIMIT;
use crate::service::notification_service::DEFAULT_PAGE_SIZE;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Startup configuration for one console process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Bounded notification window per subject.
    pub notification_page_size: u32,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling logs; logging stays off when `None`.
    pub log_dir: Option<String>,
    /// SQLite file path; in-memory when `None`.
    pub db_path: Option<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            notification_page_size: DEFAULT_PAGE_SIZE,
            log_level: default_log_level().to_string(),
            log_dir: None,
            db_path: None,
        }
    }
}

impl ConsoleConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_WINDOW_LIMIT).contains(&self.notification_page_size) {
            return Err(ConfigError::InvalidPageSize(self.notification_page_size));
        }
        normalize_level(&self.log_level).map_err(ConfigError::InvalidLogLevel)?;
        if let Some(dir) = self.log_dir.as_deref() {
            if !Path::new(dir.trim()).is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir.to_string()));
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    InvalidPageSize(u32),
    InvalidLogLevel(String),
    RelativeLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
            Self::InvalidPageSize(value) => write!(
                f,
                "notification_page_size must be within 1..={MAX_WINDOW_LIMIT}, got {value}"
            ),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::RelativeLogDir(value) => {
                write!(f, "log_dir must be an absolute path, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ConsoleConfig};

    #[test]
    fn empty_document_uses_defaults() {
        let config = ConsoleConfig::from_json_str("{}").expect("defaults");
        assert_eq!(config, ConsoleConfig::default());
        assert_eq!(config.notification_page_size, 20);
    }

    #[test]
    fn rejects_out_of_range_page_size() {
        let err = ConsoleConfig::from_json_str(r#"{"notification_page_size": 0}"#)
            .expect_err("zero page size must fail");
        assert!(matches!(err, ConfigError::InvalidPageSize(0)));
    }

    #[test]
    fn rejects_unknown_fields_and_relative_log_dir() {
        let err = ConsoleConfig::from_json_str(r#"{"page": 5}"#).expect_err("unknown field");
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = ConsoleConfig::from_json_str(r#"{"log_dir": "logs"}"#)
            .expect_err("relative dir must fail");
        assert!(matches!(err, ConfigError::RelativeLogDir(_)));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let err = ConsoleConfig::from_json_str(r#"{"log_level": "loud"}"#)
            .expect_err("unknown level");
        assert!(err.to_string().contains("unsupported log level"));
    }
}
