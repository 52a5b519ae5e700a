//! RevcycleErrorCode trait for surfacing errors to the UI layer.

/// Every error enum implements this to provide a stable code string and a
/// short, human-readable reason that never leaks internal state.
pub trait RevcycleErrorCode {
    /// Returns the stable error code (e.g., "STORAGE_UNREACHABLE").
    fn error_code(&self) -> &'static str;

    /// Short reason string safe to show to an end user.
    fn user_message(&self) -> String;

    /// Returns the formatted string: `[ERROR_CODE] reason`.
    fn coded_message(&self) -> String {
        format!("[{}] {}", self.error_code(), self.user_message())
    }
}

pub const STORAGE_UNREACHABLE: &str = "STORAGE_UNREACHABLE";
pub const STORAGE_CORRUPT: &str = "STORAGE_CORRUPT";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const INTEGRITY_CONFLICT: &str = "INTEGRITY_CONFLICT";
pub const UNKNOWN_ENTITY: &str = "UNKNOWN_ENTITY";
pub const INVALID_INPUT: &str = "INVALID_INPUT";
