//! Tests for the revcycle error handling system.

use revcycle_core::errors::error_code::{self, RevcycleErrorCode};
use revcycle_core::errors::*;

#[test]
fn test_all_errors_have_error_code() {
    let storage = StorageError::Unreachable {
        tier: "relational".into(),
        message: "disk gone".into(),
    };
    assert_eq!(storage.error_code(), error_code::STORAGE_UNREACHABLE);

    let corrupt = StorageError::Corrupt {
        tier: "flat_file".into(),
        object: "users".into(),
        message: "bad quote".into(),
    };
    assert_eq!(corrupt.error_code(), error_code::STORAGE_CORRUPT);

    let config = ConfigError::FileNotFound { path: "/tmp".into() };
    assert_eq!(config.error_code(), error_code::CONFIG_ERROR);

    let conflict = StoreError::IntegrityConflict {
        entity: "users".into(),
        key: "ana".into(),
        reason: "already exists".into(),
    };
    assert_eq!(conflict.error_code(), error_code::INTEGRITY_CONFLICT);
}

#[test]
fn test_from_conversions_keep_inner_code() {
    let inner = StorageError::Sqlite {
        message: "no such table".into(),
    };
    let store: StoreError = inner.into();
    assert!(matches!(store, StoreError::Storage(StorageError::Sqlite { .. })));
    assert_eq!(store.error_code(), error_code::STORAGE_ERROR);

    let cfg: StoreError = ConfigError::InvalidValue {
        field: "storage.tiers".into(),
        message: "unknown".into(),
    }
    .into();
    assert_eq!(cfg.error_code(), error_code::CONFIG_ERROR);
}

#[test]
fn test_user_message_hides_internals() {
    let err = StoreError::Storage(StorageError::Sqlite {
        message: "SELECT * FROM \"users\" failed at /var/lib/secret.db".into(),
    });
    let msg = err.user_message();
    assert!(!msg.contains("secret.db"));
    assert!(!msg.contains("SELECT"));
    assert!(err.coded_message().starts_with("[STORAGE_ERROR]"));
}

#[test]
fn test_unreachable_and_corrupt_predicates() {
    let u = StorageError::Unreachable {
        tier: "document".into(),
        message: "x".into(),
    };
    assert!(u.is_unreachable());
    assert!(!u.is_corrupt());
    let io = StorageError::Io { message: "x".into() };
    assert!(!io.is_unreachable() && !io.is_corrupt());
}
