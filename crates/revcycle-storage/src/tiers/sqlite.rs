//! Relational tier backed by a single SQLite file.
//!
//! One connection per operation: opened, configured with pragmas, used and
//! dropped before the call returns. Writes run inside `BEGIN IMMEDIATE`.
//! Every identifier is double-quoted; values are always bound parameters.

use std::path::{Path, PathBuf};

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, Transaction, TransactionBehavior};

use revcycle_core::errors::StorageError;
use revcycle_core::types::{Row, Table, TierKind, Value, WriteMode};

use super::StorageTier;

pub struct SqliteTier {
    path: PathBuf,
    label: String,
}

impl SqliteTier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = format!("relational:{}", path.display());
        Self { path, label }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unreachable(&self, message: String) -> StorageError {
        StorageError::Unreachable {
            tier: self.label.clone(),
            message,
        }
    }

    /// Open a fresh connection with pragmas applied. Any failure here means
    /// the tier cannot be contacted.
    fn connect(&self) -> Result<Connection, StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| self.unreachable(format!("{}: {e}", parent.display())))?;
            }
        }
        let conn = Connection::open(&self.path).map_err(|e| self.unreachable(e.to_string()))?;
        apply_pragmas(&conn).map_err(|e| self.unreachable(e.to_string()))?;
        Ok(conn)
    }
}

/// Pragmas applied to every connection.
fn apply_pragmas(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        PRAGMA temp_store = MEMORY;
        ",
    )
    .map_err(|e| StorageError::Sqlite {
        message: format!("failed to apply pragmas: {e}"),
    })
}

/// Run `f` inside a `BEGIN IMMEDIATE` transaction; rolled back on error.
fn with_immediate_transaction<F, T>(conn: &Connection, f: F) -> Result<T, StorageError>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, StorageError>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|e| sql_err(format!("failed to begin immediate transaction: {e}")))?;
    let result = f(&tx)?;
    tx.commit()
        .map_err(|e| sql_err(format!("failed to commit: {e}")))?;
    Ok(result)
}

fn sql_err(message: String) -> StorageError {
    StorageError::Sqlite { message }
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Number(n) => SqlValue::Real(*n),
        Value::Text(s) => SqlValue::Text(s.clone()),
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::Number(f),
        ValueRef::Text(t) | ValueRef::Blob(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
    }
}

fn table_exists(conn: &Connection, object: &str) -> Result<bool, StorageError> {
    conn.prepare_cached("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")
        .and_then(|mut stmt| stmt.query_row([object], |row| row.get::<_, i64>(0)))
        .map(|c| c > 0)
        .map_err(|e| sql_err(e.to_string()))
}

fn table_columns(conn: &Connection, object: &str) -> Result<Vec<String>, StorageError> {
    let mut stmt = conn
        .prepare_cached("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
        .map_err(|e| sql_err(e.to_string()))?;
    let rows = stmt
        .query_map([object], |row| row.get::<_, String>(0))
        .map_err(|e| sql_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| sql_err(e.to_string()))
}

fn select_all(conn: &Connection, object: &str, columns: &[String]) -> Result<Table, StorageError> {
    if columns.is_empty() {
        return Ok(Table::default());
    }
    let select = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("SELECT {select} FROM {} ORDER BY rowid", quote_ident(object));
    let mut stmt = conn.prepare(&sql).map_err(|e| sql_err(e.to_string()))?;
    let mut rows = stmt.query([]).map_err(|e| sql_err(e.to_string()))?;
    let mut table = Table::with_columns(columns);
    while let Some(row) = rows.next().map_err(|e| sql_err(e.to_string()))? {
        let mut record = Row::new();
        for (idx, column) in columns.iter().enumerate() {
            let value = row.get_ref(idx).map_err(|e| sql_err(e.to_string()))?;
            record.insert(column.clone(), from_sql(value));
        }
        table.rows.push(record);
    }
    Ok(table)
}

/// Create `object` if absent and add any of `columns` it lacks.
fn ensure_table(conn: &Connection, object: &str, columns: &[String]) -> Result<(), StorageError> {
    if !table_exists(conn, object)? {
        if columns.is_empty() {
            return Ok(());
        }
        let defs = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        conn.execute_batch(&format!("CREATE TABLE {} ({defs});", quote_ident(object)))
            .map_err(|e| sql_err(e.to_string()))?;
        return Ok(());
    }
    let existing = table_columns(conn, object)?;
    for column in columns {
        if !existing.iter().any(|c| c == column) {
            conn.execute_batch(&format!(
                "ALTER TABLE {} ADD COLUMN {};",
                quote_ident(object),
                quote_ident(column)
            ))
            .map_err(|e| sql_err(e.to_string()))?;
        }
    }
    Ok(())
}

fn insert_rows(conn: &Connection, object: &str, table: &Table) -> Result<(), StorageError> {
    if table.columns.is_empty() {
        return Ok(());
    }
    let names = table
        .columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=table.columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({names}) VALUES ({placeholders})",
        quote_ident(object)
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(|e| sql_err(e.to_string()))?;
    for row in &table.rows {
        let values = table
            .columns
            .iter()
            .map(|c| row.get(c).map(to_sql).unwrap_or(SqlValue::Null));
        stmt.execute(params_from_iter(values))
            .map_err(|e| sql_err(e.to_string()))?;
    }
    Ok(())
}

impl StorageTier for SqliteTier {
    fn kind(&self) -> TierKind {
        TierKind::Relational
    }

    fn name(&self) -> &str {
        &self.label
    }

    fn list_objects(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare_cached(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )
            .map_err(|e| sql_err(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| sql_err(e.to_string()))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| sql_err(e.to_string()))
    }

    fn read(&self, object: &str) -> Result<Table, StorageError> {
        let conn = self.connect()?;
        if !table_exists(&conn, object)? {
            return Ok(Table::default());
        }
        let columns = table_columns(&conn, object)?;
        select_all(&conn, object, &columns)
    }

    fn write(&self, object: &str, table: &Table, mode: &WriteMode) -> Result<(), StorageError> {
        let conn = self.connect()?;
        with_immediate_transaction(&conn, |tx| {
            ensure_table(tx, object, &table.columns)?;
            if !table_exists(tx, object)? {
                return Ok(());
            }
            match mode {
                WriteMode::Append => insert_rows(tx, object, table),
                WriteMode::ReplaceAll | WriteMode::UpsertByKey(_) => {
                    let columns = table_columns(tx, object)?;
                    let mut merged = select_all(tx, object, &columns)?;
                    merged.apply(table.clone(), mode);
                    tx.execute_batch(&format!("DELETE FROM {};", quote_ident(object)))
                        .map_err(|e| sql_err(e.to_string()))?;
                    insert_rows(tx, object, &merged)
                }
            }
        })?;
        tracing::debug!(tier = %self.label, object, rows = table.len(), "sqlite write");
        Ok(())
    }

    fn columns(&self, object: &str) -> Result<Vec<String>, StorageError> {
        let conn = self.connect()?;
        table_columns(&conn, object)
    }

    fn add_column(&self, object: &str, column: &str, default: &Value) -> Result<(), StorageError> {
        let conn = self.connect()?;
        with_immediate_transaction(&conn, |tx| {
            if table_columns(tx, object)?.iter().any(|c| c == column) {
                return Ok(());
            }
            tx.execute_batch(&format!(
                "ALTER TABLE {} ADD COLUMN {};",
                quote_ident(object),
                quote_ident(column)
            ))
            .map_err(|e| sql_err(e.to_string()))?;
            if !default.is_null() {
                tx.execute(
                    &format!("UPDATE {} SET {} = ?1", quote_ident(object), quote_ident(column)),
                    [to_sql(default)],
                )
                .map_err(|e| sql_err(e.to_string()))?;
            }
            Ok(())
        })
    }

    fn rename_column(&self, object: &str, from: &str, to: &str) -> Result<(), StorageError> {
        let conn = self.connect()?;
        with_immediate_transaction(&conn, |tx| {
            tx.execute_batch(&format!(
                "ALTER TABLE {} RENAME COLUMN {} TO {};",
                quote_ident(object),
                quote_ident(from),
                quote_ident(to)
            ))
            .map_err(|e| sql_err(e.to_string()))
        })
    }

    fn quarantine(&self, _object: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_ident_doubles_embedded_quotes() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("a\"; DROP TABLE x; --"), "\"a\"\"; DROP TABLE x; --\"");
    }
}
