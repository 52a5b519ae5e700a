//! Storage tier configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DATA_DIR, DEFAULT_TIER_ORDER, DOCUMENT_DIR_NAME, FLAT_FILE_DIR_NAME, SQLITE_FILE_NAME,
};
use crate::types::TierKind;

/// Configuration for the tier chain.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory for on-disk tiers. Default: `data`.
    pub data_dir: Option<String>,
    /// Tier order, highest priority first. Default: `["relational", "flat_file"]`.
    pub tiers: Vec<String>,
    /// Copy the winning read into the other tiers (empty higher-priority
    /// ones included). Default: true.
    pub replicate_on_load: Option<bool>,
    /// Override for the SQLite file path.
    pub sqlite_path: Option<String>,
    /// Override for the document-store directory.
    pub document_dir: Option<String>,
    /// Override for the flat-file directory.
    pub flat_file_dir: Option<String>,
}

impl StorageConfig {
    /// Data directory resolved against `root`.
    pub fn effective_data_dir(&self, root: &Path) -> PathBuf {
        root.join(self.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR))
    }

    /// Tier order; unknown names are dropped (validation reports them).
    pub fn effective_tiers(&self) -> Vec<TierKind> {
        if self.tiers.is_empty() {
            return DEFAULT_TIER_ORDER
                .iter()
                .filter_map(|t| TierKind::parse(t))
                .collect();
        }
        self.tiers.iter().filter_map(|t| TierKind::parse(t)).collect()
    }

    pub fn effective_replicate_on_load(&self) -> bool {
        self.replicate_on_load.unwrap_or(true)
    }

    pub fn effective_sqlite_path(&self, root: &Path) -> PathBuf {
        match &self.sqlite_path {
            Some(p) => root.join(p),
            None => self.effective_data_dir(root).join(SQLITE_FILE_NAME),
        }
    }

    pub fn effective_document_dir(&self, root: &Path) -> PathBuf {
        match &self.document_dir {
            Some(p) => root.join(p),
            None => self.effective_data_dir(root).join(DOCUMENT_DIR_NAME),
        }
    }

    pub fn effective_flat_file_dir(&self, root: &Path) -> PathBuf {
        match &self.flat_file_dir {
            Some(p) => root.join(p),
            None => self.effective_data_dir(root).join(FLAT_FILE_DIR_NAME),
        }
    }
}
