//! Storage tier errors.

use super::error_code::{self, RevcycleErrorCode};

/// Errors raised by a single storage tier.
///
/// `Unreachable` and `Corrupt` drive different recovery paths: the former
/// falls through to the next tier, the latter triggers regeneration.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("tier {tier} unreachable: {message}")]
    Unreachable { tier: String, message: String },

    #[error("object {object} in tier {tier} is corrupt: {message}")]
    Corrupt {
        tier: String,
        object: String,
        message: String,
    },

    #[error("SQLite error: {message}")]
    Sqlite { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("lock poisoned: {what}")]
    LockPoisoned { what: String },
}

impl StorageError {
    /// True when the tier itself could not be contacted.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }

    /// True when the tier answered but the object could not be parsed.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

impl RevcycleErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => error_code::STORAGE_UNREACHABLE,
            Self::Corrupt { .. } => error_code::STORAGE_CORRUPT,
            _ => error_code::STORAGE_ERROR,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Unreachable { tier, .. } => format!("storage '{tier}' is not reachable"),
            Self::Corrupt { tier, object, .. } => {
                format!("data '{object}' in storage '{tier}' could not be read")
            }
            Self::Sqlite { .. } | Self::Io { .. } => "storage operation failed".to_string(),
            Self::LockPoisoned { .. } => "storage is temporarily unavailable".to_string(),
        }
    }
}
