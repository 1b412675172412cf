//! Transfer configuration.
//!
//! Stored as TOML; every field is optional and falls back to the remote
//! interface defaults:
//!
//! ```toml
//! part_size = 524288
//! window_size = 1048576
//! max_file_size = 2097152000
//! max_retries = 10
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tgbucket_protocol::constants::{DEFAULT_PART_SIZE, DEFAULT_WINDOW_SIZE, MAX_FILE_SIZE};

use crate::executor::RetryPolicy;
use crate::validation::{validate_part_size, validate_window_size};

/// Errors raised while loading or validating a [`TransferConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {field} {size}: {reason}")]
    InvalidSize {
        field: &'static str,
        size: usize,
        reason: String,
    },

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Sizes and limits shared by uploads and downloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Upload part size in bytes.
    #[serde(default = "default_part_size")]
    pub part_size: usize,

    /// Download window size in bytes.
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Largest payload accepted for upload.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Retry ceiling for recoverable errors; absent means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

fn default_part_size() -> usize {
    DEFAULT_PART_SIZE
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

fn default_max_file_size() -> u64 {
    MAX_FILE_SIZE
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            part_size: default_part_size(),
            window_size: default_window_size(),
            max_file_size: default_max_file_size(),
            max_retries: None,
        }
    }
}

impl TransferConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: TransferConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "transfer configuration loaded");
        Ok(config)
    }

    /// Checks part and window sizes against the remote interface limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_part_size(self.part_size)?;
        validate_window_size(self.window_size)?;
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TransferConfig::default();
        assert_eq!(config.part_size, 512 * 1024);
        assert_eq!(config.window_size, 512 * 1024);
        assert_eq!(config.max_file_size, 2000 * 1024 * 1024);
        assert_eq!(config.max_retries, None);
        assert!(config.validate().is_ok());
        assert_eq!(config.retry_policy(), RetryPolicy::unbounded());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config = TransferConfig::from_toml_str("window_size = 1048576").unwrap();
        assert_eq!(config.window_size, 1024 * 1024);
        assert_eq!(config.part_size, 512 * 1024);
        assert_eq!(config.max_retries, None);
    }

    #[test]
    fn max_retries_maps_to_policy() {
        let config = TransferConfig::from_toml_str("max_retries = 4").unwrap();
        assert_eq!(config.retry_policy(), RetryPolicy::bounded(4));
    }

    #[test]
    fn invalid_part_size_rejected() {
        let err = TransferConfig::from_toml_str("part_size = 1000").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSize {
                field: "part_size",
                ..
            }
        ));
    }

    #[test]
    fn malformed_toml_rejected() {
        let err = TransferConfig::from_toml_str("part_size = \"big\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_roundtrip() {
        let config = TransferConfig {
            part_size: 256 * 1024,
            window_size: 1024 * 1024,
            max_file_size: 10 * 1024 * 1024,
            max_retries: Some(3),
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = TransferConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transfer.toml");
        std::fs::write(&path, "part_size = 131072\nmax_retries = 8\n").unwrap();

        let config = TransferConfig::load(&path).unwrap();
        assert_eq!(config.part_size, 128 * 1024);
        assert_eq!(config.max_retries, Some(8));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TransferConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
