//! Storage tiers: interchangeable backends exposing the same tabular
//! capability set. The façade holds them as an ordered list of trait objects
//! and never branches on which concrete backend it is talking to.

pub mod csv_file;
pub mod document;
pub mod memory;
pub mod sqlite;

use std::path::Path;

use revcycle_core::config::StorageConfig;
use revcycle_core::errors::StorageError;
use revcycle_core::types::{Table, TierKind, Value, WriteMode};

pub use csv_file::CsvTier;
pub use document::DocumentTier;
pub use memory::MemoryTier;
pub use sqlite::SqliteTier;

/// One storage backend.
///
/// Reading an object that does not exist yields an empty table. Writing
/// creates the object on demand and widens its columns to the union of the
/// stored and written ones.
pub trait StorageTier: Send + Sync {
    fn kind(&self) -> TierKind;

    /// Human-readable label used in warnings and audit details.
    fn name(&self) -> &str;

    /// Live object names (tables, collections, files without extension).
    fn list_objects(&self) -> Result<Vec<String>, StorageError>;

    fn read(&self, object: &str) -> Result<Table, StorageError>;

    fn write(&self, object: &str, table: &Table, mode: &WriteMode) -> Result<(), StorageError>;

    /// Column names of `object`; empty when the object is absent.
    fn columns(&self, object: &str) -> Result<Vec<String>, StorageError>;

    /// Add `column` filled with `default`. No-op when it already exists.
    fn add_column(&self, object: &str, column: &str, default: &Value) -> Result<(), StorageError>;

    fn rename_column(&self, object: &str, from: &str, to: &str) -> Result<(), StorageError>;

    /// Move a corrupt object aside. Returns the name it was moved to, or
    /// `None` for tiers that have nowhere to move it.
    fn quarantine(&self, object: &str) -> Result<Option<String>, StorageError>;
}

/// Build the configured tier chain, highest priority first.
pub fn open_configured(config: &StorageConfig, root: &Path) -> Vec<Box<dyn StorageTier>> {
    config
        .effective_tiers()
        .into_iter()
        .filter_map(|kind| -> Option<Box<dyn StorageTier>> {
            match kind {
                TierKind::Relational => {
                    Some(Box::new(SqliteTier::new(config.effective_sqlite_path(root))))
                }
                TierKind::Document => {
                    Some(Box::new(DocumentTier::new(config.effective_document_dir(root))))
                }
                TierKind::FlatFile => {
                    Some(Box::new(CsvTier::new(config.effective_flat_file_dir(root))))
                }
                TierKind::Memory => Some(Box::new(MemoryTier::new())),
                TierKind::Builtin => None,
            }
        })
        .collect()
}

/// Shared read-modify-write helpers for the file-backed tiers.
pub(crate) mod file_ops {
    use std::fs;
    use std::path::{Path, PathBuf};

    use revcycle_core::errors::StorageError;

    /// Create `dir` if needed. Failure means the tier is unreachable.
    pub fn ensure_dir(tier: &str, dir: &Path) -> Result<(), StorageError> {
        fs::create_dir_all(dir).map_err(|e| StorageError::Unreachable {
            tier: tier.to_string(),
            message: format!("{}: {e}", dir.display()),
        })
    }

    /// File stems in `dir` carrying `extension`, sorted.
    pub fn list_stems(tier: &str, dir: &Path, extension: &str) -> Result<Vec<String>, StorageError> {
        ensure_dir(tier, dir)?;
        let entries = fs::read_dir(dir).map_err(|e| StorageError::Unreachable {
            tier: tier.to_string(),
            message: e.to_string(),
        })?;
        let mut names = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Write through a sibling temp file and rename, so readers never see a
    /// half-written object.
    pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(|e| StorageError::Io {
            message: format!("{}: {e}", tmp.display()),
        })?;
        fs::rename(&tmp, path).map_err(|e| StorageError::Io {
            message: format!("{}: {e}", path.display()),
        })
    }

    /// Rename `path` to `<file name>.corrupt-<unix ts>`, adding a counter
    /// when that name is taken.
    pub fn quarantine_file(path: &Path) -> Result<Option<String>, StorageError> {
        if !path.exists() {
            return Ok(None);
        }
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("object")
            .to_string();
        let ts = chrono::Utc::now().timestamp();
        let mut target: PathBuf = path.with_file_name(format!("{file_name}.corrupt-{ts}"));
        let mut n = 1;
        while target.exists() {
            target = path.with_file_name(format!("{file_name}.corrupt-{ts}-{n}"));
            n += 1;
        }
        fs::rename(path, &target).map_err(|e| StorageError::Io {
            message: format!("quarantine {}: {e}", path.display()),
        })?;
        Ok(target
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string))
    }
}
