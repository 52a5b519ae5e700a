//! Configuration errors.

use super::error_code::{self, RevcycleErrorCode};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Config parse error in {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Config validation failed for {field}: {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Invalid config value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl RevcycleErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        error_code::CONFIG_ERROR
    }

    fn user_message(&self) -> String {
        match self {
            Self::FileNotFound { .. } => "configuration file not found".to_string(),
            Self::ParseError { .. } => "configuration file is not valid TOML".to_string(),
            Self::ValidationFailed { field, message } | Self::InvalidValue { field, message } => {
                format!("configuration '{field}' {message}")
            }
        }
    }
}
