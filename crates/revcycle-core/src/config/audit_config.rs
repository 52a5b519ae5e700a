//! Audit trail configuration.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_AUDIT_LIMIT;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuditConfig {
    /// Entries returned when the caller gives no limit. Default: 50.
    pub default_limit: Option<usize>,
}

impl AuditConfig {
    pub fn effective_default_limit(&self) -> usize {
        self.default_limit.unwrap_or(DEFAULT_AUDIT_LIMIT)
    }
}
