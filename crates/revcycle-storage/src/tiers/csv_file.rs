//! Flat-file tier: one CSV file per object. The header row defines the
//! columns; numeric cells become numbers and blank cells become nulls.

use std::fs;
use std::path::PathBuf;

use revcycle_core::errors::StorageError;
use revcycle_core::types::{Row, Table, TierKind, Value, WriteMode};

use super::file_ops;
use super::StorageTier;

pub struct CsvTier {
    dir: PathBuf,
    label: String,
}

impl CsvTier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let label = format!("flat_file:{}", dir.display());
        Self { dir, label }
    }

    fn path_for(&self, object: &str) -> PathBuf {
        self.dir.join(format!("{object}.csv"))
    }

    fn corrupt(&self, object: &str, err: impl std::fmt::Display) -> StorageError {
        StorageError::Corrupt {
            tier: self.label.clone(),
            object: object.to_string(),
            message: err.to_string(),
        }
    }

    fn load(&self, object: &str) -> Result<Table, StorageError> {
        file_ops::ensure_dir(&self.label, &self.dir)?;
        let path = self.path_for(object);
        if !path.exists() {
            return Ok(Table::default());
        }
        let bytes = fs::read(&path).map_err(|e| StorageError::Io {
            message: format!("{}: {e}", path.display()),
        })?;
        parse_csv(&bytes).map_err(|e| self.corrupt(object, e))
    }

    fn store(&self, object: &str, table: &Table) -> Result<(), StorageError> {
        file_ops::ensure_dir(&self.label, &self.dir)?;
        let bytes = render_csv(table).map_err(|e| StorageError::Io {
            message: e.to_string(),
        })?;
        file_ops::write_atomic(&self.path_for(object), &bytes)
    }
}

/// Parse CSV bytes into a table. Ragged rows and invalid UTF-8 are errors.
pub fn parse_csv(bytes: &[u8]) -> Result<Table, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);
    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let mut table = Table::with_columns(&columns);
    for record in reader.records() {
        let record = record?;
        let row: Row = columns
            .iter()
            .zip(record.iter())
            .map(|(column, cell)| (column.clone(), Value::from_cell(cell)))
            .collect();
        table.rows.push(row);
    }
    Ok(table)
}

/// Render a table as CSV with a header row. Nulls are written as blanks.
pub fn render_csv(table: &Table) -> Result<Vec<u8>, csv::Error> {
    if table.columns.is_empty() {
        return Ok(Vec::new());
    }
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(
            table
                .columns
                .iter()
                .map(|c| row.get(c).map(ToString::to_string).unwrap_or_default()),
        )?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

impl StorageTier for CsvTier {
    fn kind(&self) -> TierKind {
        TierKind::FlatFile
    }

    fn name(&self) -> &str {
        &self.label
    }

    fn list_objects(&self) -> Result<Vec<String>, StorageError> {
        file_ops::list_stems(&self.label, &self.dir, "csv")
    }

    fn read(&self, object: &str) -> Result<Table, StorageError> {
        self.load(object)
    }

    fn write(&self, object: &str, table: &Table, mode: &WriteMode) -> Result<(), StorageError> {
        let mut current = self.load(object)?;
        current.apply(table.clone(), mode);
        self.store(object, &current)?;
        tracing::debug!(tier = %self.label, object, rows = current.len(), "csv write");
        Ok(())
    }

    fn columns(&self, object: &str) -> Result<Vec<String>, StorageError> {
        Ok(self.load(object)?.columns)
    }

    fn add_column(&self, object: &str, column: &str, default: &Value) -> Result<(), StorageError> {
        let mut current = self.load(object)?;
        if current.ensure_column(column, default) {
            self.store(object, &current)?;
        }
        Ok(())
    }

    fn rename_column(&self, object: &str, from: &str, to: &str) -> Result<(), StorageError> {
        let mut current = self.load(object)?;
        if current.rename_column(from, to) {
            self.store(object, &current)?;
        }
        Ok(())
    }

    fn quarantine(&self, object: &str) -> Result<Option<String>, StorageError> {
        file_ops::quarantine_file(&self.path_for(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_identifiers_and_blanks() {
        let table = parse_csv(b"identity,code,value\nana,00123,0.5\nluis,,\n").unwrap();
        assert_eq!(table.columns, vec!["identity", "code", "value"]);
        assert_eq!(table.cell(0, "code"), &Value::Text("00123".into()));
        assert_eq!(table.cell(0, "value"), &Value::Number(0.5));
        assert_eq!(table.cell(1, "value"), &Value::Null);
    }

    #[test]
    fn ragged_rows_are_errors() {
        assert!(parse_csv(b"a,b\n1,2,3\n").is_err());
    }

    #[test]
    fn render_writes_blanks_for_nulls() {
        let mut table = Table::with_columns(&["a", "b"]);
        let mut row = Row::new();
        row.insert("a".into(), Value::Number(2026.0));
        table.push_row(row);
        let text = String::from_utf8(render_csv(&table).unwrap()).unwrap();
        assert_eq!(text, "a,b\n2026,\n");
    }
}
