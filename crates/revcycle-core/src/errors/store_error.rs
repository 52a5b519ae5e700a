//! Top-level errors of the entity API.

use super::error_code::{self, RevcycleErrorCode};
use super::{ConfigError, StorageError};

/// Errors surfaced by the entity API. Aggregates subsystem errors via `From`.
///
/// Schema drift and unreachable tiers are not represented here: the former is
/// repaired in place and the latter shows up as a degraded result.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("integrity conflict on {entity} ({key}): {reason}")]
    IntegrityConflict {
        entity: String,
        key: String,
        reason: String,
    },

    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    #[error("invalid input for {field}: {message}")]
    InvalidInput { field: String, message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

impl RevcycleErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Storage(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::IntegrityConflict { .. } => error_code::INTEGRITY_CONFLICT,
            Self::UnknownEntity(_) => error_code::UNKNOWN_ENTITY,
            Self::InvalidInput { .. } => error_code::INVALID_INPUT,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Storage(e) => e.user_message(),
            Self::Config(e) => e.user_message(),
            Self::IntegrityConflict { key, reason, .. } => format!("'{key}': {reason}"),
            Self::UnknownEntity(name) => format!("'{name}' is not a known data set"),
            Self::InvalidInput { field, message } => format!("{field}: {message}"),
        }
    }
}
