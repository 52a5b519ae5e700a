//! Audit trail entries. Append-only: nothing mutates or deletes them.

use serde::{Deserialize, Serialize};

use super::table::Row;
use super::value::Value;

/// Actor recorded when no session is active.
pub const SYSTEM_ACTOR: &str = "system";

pub const ACTION_CREATE_OBJECT: &str = "CREATE_OBJECT";
pub const ACTION_ADD_COLUMN: &str = "ADD_COLUMN";
pub const ACTION_RENAME_COLUMN: &str = "RENAME_COLUMN";
pub const ACTION_SEED_ROW: &str = "SEED_ROW";
pub const ACTION_REGENERATE: &str = "REGENERATE";
pub const ACTION_PERIOD_BACKFILL: &str = "PERIOD_BACKFILL";
pub const ACTION_CREATE_USER: &str = "CREATE_USER";
pub const ACTION_ADD_METRIC: &str = "ADD_METRIC";
pub const ACTION_IMPORT_BACKUP: &str = "IMPORT_BACKUP";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub actor: String,
    pub action: String,
    pub detail: String,
}

impl AuditEntry {
    pub const COLUMNS: [&'static str; 4] = ["timestamp", "actor", "action", "detail"];

    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("timestamp".into(), Value::from(self.timestamp.as_str()));
        row.insert("actor".into(), Value::from(self.actor.as_str()));
        row.insert("action".into(), Value::from(self.action.as_str()));
        row.insert("detail".into(), Value::from(self.detail.as_str()));
        row
    }

    pub fn from_row(row: &Row) -> Option<Self> {
        let text = |col: &str| row.get(col).and_then(Value::as_text);
        Some(Self {
            timestamp: text("timestamp")?,
            actor: text("actor").unwrap_or_else(|| SYSTEM_ACTOR.to_string()),
            action: text("action")?,
            detail: text("detail").unwrap_or_default(),
        })
    }
}
