//! Administrator bootstrap configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ADMIN_IDENTITY, DEFAULT_ADMIN_SECRET};

/// Credentials used only when no administrator record exists.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BootstrapConfig {
    pub admin_identity: Option<String>,
    pub admin_secret: Option<String>,
}

impl BootstrapConfig {
    pub fn effective_admin_identity(&self) -> &str {
        self.admin_identity.as_deref().unwrap_or(DEFAULT_ADMIN_IDENTITY)
    }

    pub fn effective_admin_secret(&self) -> &str {
        self.admin_secret.as_deref().unwrap_or(DEFAULT_ADMIN_SECRET)
    }
}
