//! Top-level revcycle configuration with layered resolution.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{AuditConfig, BootstrapConfig, PeriodsConfig, StorageConfig};
use crate::errors::ConfigError;
use crate::normalize::normalize;
use crate::types::TierKind;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`REVCYCLE_*`)
/// 3. Project config (`revcycle.toml` in the project root)
/// 4. User config (`~/.revcycle/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RevcycleConfig {
    pub storage: StorageConfig,
    pub bootstrap: BootstrapConfig,
    pub periods: PeriodsConfig,
    pub audit: AuditConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub data_dir: Option<String>,
    pub tiers: Option<Vec<String>>,
    pub replicate_on_load: Option<bool>,
}

impl RevcycleConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Lowest priority: user config. Unreadable files are skipped,
        // malformed ones are reported.
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(path = %user_config_path.display(), error = %e, "skipping user config");
                    }
                }
            }
        }

        let project_config_path = root.join("revcycle.toml");
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config);

        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &RevcycleConfig) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for tier in &config.storage.tiers {
            let kind = TierKind::parse(tier).ok_or_else(|| ConfigError::InvalidValue {
                field: "storage.tiers".to_string(),
                message: format!("unknown tier '{tier}'"),
            })?;
            if !seen.insert(kind) {
                return Err(ConfigError::ValidationFailed {
                    field: "storage.tiers".to_string(),
                    message: format!("tier '{tier}' listed twice"),
                });
            }
        }

        let mut labels = HashSet::new();
        for label in &config.periods.labels {
            let key = normalize(label);
            if key.is_empty() || !labels.insert(key) {
                return Err(ConfigError::ValidationFailed {
                    field: "periods.labels".to_string(),
                    message: format!("label '{label}' is blank or duplicated"),
                });
            }
        }

        if config.audit.default_limit == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "audit.default_limit".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if config.bootstrap.effective_admin_identity().trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "bootstrap.admin_identity".to_string(),
                message: "must not be blank".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the user config path: `~/.revcycle/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".revcycle").join("config.toml"))
    }

    fn merge_toml_file(config: &mut RevcycleConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let file_config: RevcycleConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins wherever it sets a value.
    fn merge(base: &mut RevcycleConfig, other: &RevcycleConfig) {
        if other.storage.data_dir.is_some() {
            base.storage.data_dir = other.storage.data_dir.clone();
        }
        if !other.storage.tiers.is_empty() {
            base.storage.tiers = other.storage.tiers.clone();
        }
        if other.storage.replicate_on_load.is_some() {
            base.storage.replicate_on_load = other.storage.replicate_on_load;
        }
        if other.storage.sqlite_path.is_some() {
            base.storage.sqlite_path = other.storage.sqlite_path.clone();
        }
        if other.storage.document_dir.is_some() {
            base.storage.document_dir = other.storage.document_dir.clone();
        }
        if other.storage.flat_file_dir.is_some() {
            base.storage.flat_file_dir = other.storage.flat_file_dir.clone();
        }

        if other.bootstrap.admin_identity.is_some() {
            base.bootstrap.admin_identity = other.bootstrap.admin_identity.clone();
        }
        if other.bootstrap.admin_secret.is_some() {
            base.bootstrap.admin_secret = other.bootstrap.admin_secret.clone();
        }

        if !other.periods.labels.is_empty() {
            base.periods.labels = other.periods.labels.clone();
        }

        if other.audit.default_limit.is_some() {
            base.audit.default_limit = other.audit.default_limit;
        }
    }

    /// Pattern: `REVCYCLE_DATA_DIR`, `REVCYCLE_TIERS=relational,flat_file`, etc.
    fn apply_env_overrides(config: &mut RevcycleConfig) {
        if let Ok(val) = std::env::var("REVCYCLE_DATA_DIR") {
            config.storage.data_dir = Some(val);
        }
        if let Ok(val) = std::env::var("REVCYCLE_TIERS") {
            let tiers: Vec<String> = val
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
            if !tiers.is_empty() {
                config.storage.tiers = tiers;
            }
        }
        if let Ok(val) = std::env::var("REVCYCLE_REPLICATE_ON_LOAD") {
            if let Ok(v) = val.parse::<bool>() {
                config.storage.replicate_on_load = Some(v);
            }
        }
        if let Ok(val) = std::env::var("REVCYCLE_ADMIN_IDENTITY") {
            config.bootstrap.admin_identity = Some(val);
        }
        if let Ok(val) = std::env::var("REVCYCLE_ADMIN_SECRET") {
            config.bootstrap.admin_secret = Some(val);
        }
        if let Ok(val) = std::env::var("REVCYCLE_AUDIT_LIMIT") {
            if let Ok(v) = val.parse::<usize>() {
                config.audit.default_limit = Some(v);
            }
        }
    }

    fn apply_cli_overrides(config: &mut RevcycleConfig, cli: &CliOverrides) {
        if let Some(ref v) = cli.data_dir {
            config.storage.data_dir = Some(v.clone());
        }
        if let Some(ref v) = cli.tiers {
            config.storage.tiers = v.clone();
        }
        if let Some(v) = cli.replicate_on_load {
            config.storage.replicate_on_load = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
