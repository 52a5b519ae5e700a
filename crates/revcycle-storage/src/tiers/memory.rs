//! In-process tier. Used as a volatile cache tier and in tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use revcycle_core::errors::StorageError;
use revcycle_core::types::{Table, TierKind, Value, WriteMode};

use super::StorageTier;

#[derive(Default)]
pub struct MemoryTier {
    objects: Mutex<BTreeMap<String, Table>>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_objects<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, Table>) -> T,
    {
        let mut guard = self.objects.lock().map_err(|_| StorageError::LockPoisoned {
            what: "memory tier".to_string(),
        })?;
        Ok(f(&mut guard))
    }
}

impl StorageTier for MemoryTier {
    fn kind(&self) -> TierKind {
        TierKind::Memory
    }

    fn name(&self) -> &str {
        "memory"
    }

    fn list_objects(&self) -> Result<Vec<String>, StorageError> {
        self.with_objects(|objects| objects.keys().cloned().collect())
    }

    fn read(&self, object: &str) -> Result<Table, StorageError> {
        self.with_objects(|objects| objects.get(object).cloned().unwrap_or_default())
    }

    fn write(&self, object: &str, table: &Table, mode: &WriteMode) -> Result<(), StorageError> {
        self.with_objects(|objects| {
            objects
                .entry(object.to_string())
                .or_default()
                .apply(table.clone(), mode);
        })
    }

    fn columns(&self, object: &str) -> Result<Vec<String>, StorageError> {
        self.with_objects(|objects| {
            objects
                .get(object)
                .map(|t| t.columns.clone())
                .unwrap_or_default()
        })
    }

    fn add_column(&self, object: &str, column: &str, default: &Value) -> Result<(), StorageError> {
        self.with_objects(|objects| {
            if let Some(table) = objects.get_mut(object) {
                table.ensure_column(column, default);
            }
        })
    }

    fn rename_column(&self, object: &str, from: &str, to: &str) -> Result<(), StorageError> {
        self.with_objects(|objects| {
            if let Some(table) = objects.get_mut(object) {
                table.rename_column(from, to);
            }
        })
    }

    fn quarantine(&self, _object: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }
}
