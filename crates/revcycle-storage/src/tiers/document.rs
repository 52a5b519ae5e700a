//! Document tier: one JSON document per collection in a directory.
//!
//! Each document wraps the table with a format version and the time of the
//! last write, so replicas can be inspected by hand.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use revcycle_core::errors::StorageError;
use revcycle_core::types::{Row, Table, TierKind, Value, WriteMode};

use super::file_ops;
use super::StorageTier;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    updated_at: DateTime<Utc>,
    #[serde(flatten)]
    table: Table,
}

/// Accepted on read: the wrapped form, or a bare array of records as older
/// exports wrote it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredDocument {
    Wrapped(Document),
    Records(Vec<Row>),
}

pub struct DocumentTier {
    dir: PathBuf,
    label: String,
}

impl DocumentTier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let label = format!("document:{}", dir.display());
        Self { dir, label }
    }

    fn path_for(&self, object: &str) -> PathBuf {
        self.dir.join(format!("{object}.json"))
    }

    fn load(&self, object: &str) -> Result<Table, StorageError> {
        file_ops::ensure_dir(&self.label, &self.dir)?;
        let path = self.path_for(object);
        if !path.exists() {
            return Ok(Table::default());
        }
        let text = fs::read_to_string(&path).map_err(|e| StorageError::Corrupt {
            tier: self.label.clone(),
            object: object.to_string(),
            message: e.to_string(),
        })?;
        let doc: StoredDocument =
            serde_json::from_str(&text).map_err(|e| StorageError::Corrupt {
                tier: self.label.clone(),
                object: object.to_string(),
                message: e.to_string(),
            })?;
        Ok(match doc {
            StoredDocument::Wrapped(doc) => doc.table,
            StoredDocument::Records(rows) => Table::from_rows::<&str>(&[], rows),
        })
    }

    fn store(&self, object: &str, table: Table) -> Result<(), StorageError> {
        file_ops::ensure_dir(&self.label, &self.dir)?;
        let doc = Document {
            version: FORMAT_VERSION,
            updated_at: Utc::now(),
            table,
        };
        let bytes = serde_json::to_vec_pretty(&doc).map_err(|e| StorageError::Io {
            message: e.to_string(),
        })?;
        file_ops::write_atomic(&self.path_for(object), &bytes)
    }
}

impl StorageTier for DocumentTier {
    fn kind(&self) -> TierKind {
        TierKind::Document
    }

    fn name(&self) -> &str {
        &self.label
    }

    fn list_objects(&self) -> Result<Vec<String>, StorageError> {
        file_ops::list_stems(&self.label, &self.dir, "json")
    }

    fn read(&self, object: &str) -> Result<Table, StorageError> {
        self.load(object)
    }

    fn write(&self, object: &str, table: &Table, mode: &WriteMode) -> Result<(), StorageError> {
        let mut current = self.load(object)?;
        current.apply(table.clone(), mode);
        self.store(object, current)
    }

    fn columns(&self, object: &str) -> Result<Vec<String>, StorageError> {
        Ok(self.load(object)?.columns)
    }

    fn add_column(&self, object: &str, column: &str, default: &Value) -> Result<(), StorageError> {
        let mut current = self.load(object)?;
        if current.ensure_column(column, default) {
            self.store(object, current)?;
        }
        Ok(())
    }

    fn rename_column(&self, object: &str, from: &str, to: &str) -> Result<(), StorageError> {
        let mut current = self.load(object)?;
        if current.rename_column(from, to) {
            self.store(object, current)?;
        }
        Ok(())
    }

    fn quarantine(&self, object: &str) -> Result<Option<String>, StorageError> {
        file_ops::quarantine_file(&self.path_for(object))
    }
}
