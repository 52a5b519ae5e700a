//! Error handling for revcycle.
//! One error enum per subsystem, `thiserror` only.

pub mod config_error;
pub mod error_code;
pub mod storage_error;
pub mod store_error;

pub use config_error::ConfigError;
pub use error_code::RevcycleErrorCode;
pub use storage_error::StorageError;
pub use store_error::{StoreError, StoreResult};
