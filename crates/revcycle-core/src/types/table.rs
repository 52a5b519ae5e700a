//! Schema-less tables: an ordered column list plus rows keyed by column.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::value::Value;
use crate::normalize::normalize;

/// One record. Columns absent from the map read as `Value::Null`.
pub type Row = BTreeMap<String, Value>;

/// How a write combines incoming rows with what a tier already holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteMode {
    /// Drop every existing row, keep the incoming ones.
    ReplaceAll,
    /// Keep existing rows, add the incoming ones.
    Append,
    /// Replace existing rows whose key columns match an incoming row
    /// (compared on normalized text), append the rest.
    UpsertByKey(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Empty table with the given columns.
    pub fn with_columns<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from rows; columns are the declared ones followed by any
    /// extra keys found in the rows, in first-seen order.
    pub fn from_rows<S: AsRef<str>>(columns: &[S], rows: Vec<Row>) -> Self {
        let mut table = Self::with_columns(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Append a row, widening the column list with any unseen keys.
    pub fn push_row(&mut self, row: Row) {
        for key in row.keys() {
            if !self.has_column(key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    /// Cell accessor; missing cells read as `Null`.
    pub fn cell<'a>(&'a self, row: usize, column: &str) -> &'a Value {
        static NULL: Value = Value::Null;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&NULL)
    }

    /// Add `column` if absent, filling every row with `default`.
    /// Returns false when the column already existed.
    pub fn ensure_column(&mut self, column: &str, default: &Value) -> bool {
        if self.has_column(column) {
            return false;
        }
        self.columns.push(column.to_string());
        for row in &mut self.rows {
            row.entry(column.to_string()).or_insert_with(|| default.clone());
        }
        true
    }

    /// Rename `from` to `to` in the header and every row.
    /// Returns false when `from` does not exist or `to` already does.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        if !self.has_column(from) || self.has_column(to) {
            return false;
        }
        for c in &mut self.columns {
            if c == from {
                *c = to.to_string();
            }
        }
        for row in &mut self.rows {
            if let Some(v) = row.remove(from) {
                row.insert(to.to_string(), v);
            }
        }
        true
    }

    /// Rows matching `pred`, same columns.
    pub fn filter<F>(&self, mut pred: F) -> Self
    where
        F: FnMut(&Row) -> bool,
    {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| pred(r)).cloned().collect(),
        }
    }

    /// Merge `incoming` into `self` according to `mode`. The column list is
    /// widened to the union, existing order first.
    pub fn apply(&mut self, incoming: Table, mode: &WriteMode) {
        for column in &incoming.columns {
            if !self.has_column(column) {
                self.columns.push(column.clone());
            }
        }
        match mode {
            WriteMode::ReplaceAll => {
                self.rows.clear();
            }
            WriteMode::Append => {}
            WriteMode::UpsertByKey(keys) => {
                let incoming_keys: HashSet<Vec<String>> =
                    incoming.rows.iter().map(|r| row_key(r, keys)).collect();
                self.rows
                    .retain(|r| !incoming_keys.contains(&row_key(r, keys)));
            }
        }
        for row in incoming.rows {
            self.push_row(row);
        }
    }
}

/// Normalized key tuple of `row` over `keys`.
pub fn row_key(row: &Row, keys: &[String]) -> Vec<String> {
    keys.iter()
        .map(|k| normalize(&row.get(k).map(ToString::to_string).unwrap_or_default()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn upsert_replaces_matching_keys_only() {
        let mut t = Table::from_rows(
            &["metric", "period", "value"],
            vec![
                row(&[("metric", "A".into()), ("period", "ENE-26".into()), ("value", 0.1.into())]),
                row(&[("metric", "B".into()), ("period", "ENE-26".into()), ("value", 0.2.into())]),
            ],
        );
        let incoming = Table::from_rows(
            &["metric", "period", "value"],
            vec![row(&[("metric", "a".into()), ("period", "ENE-26".into()), ("value", 0.9.into())])],
        );
        t.apply(incoming, &WriteMode::UpsertByKey(vec!["metric".into(), "period".into()]));
        assert_eq!(t.len(), 2);
        assert_eq!(t.cell(1, "value"), &Value::Number(0.9));
    }

    #[test]
    fn rename_refuses_to_clobber() {
        let mut t = Table::with_columns(&["a", "b"]);
        assert!(!t.rename_column("a", "b"));
        assert!(t.rename_column("a", "c"));
        assert_eq!(t.columns, vec!["c".to_string(), "b".to_string()]);
    }
}
