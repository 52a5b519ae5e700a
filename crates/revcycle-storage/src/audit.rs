//! Append-only audit trail. Entries are written to every reachable tier;
//! when none accepts them they are kept in process so nothing is lost
//! silently.

use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};

use revcycle_core::errors::StorageError;
use revcycle_core::types::{AuditEntry, Table};

#[derive(Debug, Default)]
pub struct AuditTrail {
    stashed: Mutex<Vec<AuditEntry>>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// New entry stamped with the current UTC time.
    pub fn entry(actor: &str, action: &str, detail: impl Into<String>) -> AuditEntry {
        AuditEntry {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            actor: actor.to_string(),
            action: action.to_string(),
            detail: detail.into(),
        }
    }

    pub fn to_table(entries: &[AuditEntry]) -> Table {
        let mut table = Table::with_columns(&AuditEntry::COLUMNS);
        for entry in entries {
            table.push_row(entry.to_row());
        }
        table
    }

    /// Keep entries no tier accepted.
    pub fn stash(&self, entries: Vec<AuditEntry>) -> Result<(), StorageError> {
        let mut guard = self.stashed.lock().map_err(|_| StorageError::LockPoisoned {
            what: "audit stash".to_string(),
        })?;
        guard.extend(entries);
        Ok(())
    }

    pub fn stashed(&self) -> Result<Vec<AuditEntry>, StorageError> {
        let guard = self.stashed.lock().map_err(|_| StorageError::LockPoisoned {
            what: "audit stash".to_string(),
        })?;
        Ok(guard.clone())
    }

    /// Most recent first, at most `limit`. Entries with equal timestamps keep
    /// reverse insertion order; unparseable timestamps sort as oldest.
    pub fn recent(stored: &Table, stashed: Vec<AuditEntry>, limit: usize) -> Vec<AuditEntry> {
        let mut entries: Vec<(usize, Option<DateTime<Utc>>, AuditEntry)> = stored
            .rows
            .iter()
            .filter_map(AuditEntry::from_row)
            .chain(stashed)
            .enumerate()
            .map(|(idx, entry)| {
                let ts = DateTime::parse_from_rfc3339(&entry.timestamp)
                    .ok()
                    .map(|t| t.with_timezone(&Utc));
                (idx, ts, entry)
            })
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));
        entries
            .into_iter()
            .take(limit)
            .map(|(_, _, entry)| entry)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ts: &str, action: &str) -> AuditEntry {
        AuditEntry {
            timestamp: ts.to_string(),
            actor: "system".into(),
            action: action.into(),
            detail: String::new(),
        }
    }

    #[test]
    fn recent_orders_newest_first_and_limits() {
        let stored = AuditTrail::to_table(&[
            at("2026-01-01T00:00:00Z", "A"),
            at("2026-03-01T00:00:00Z", "C"),
            at("not a time", "X"),
        ]);
        let stashed = vec![at("2026-02-01T00:00:00Z", "B")];
        let actions: Vec<String> = AuditTrail::recent(&stored, stashed, 3)
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, vec!["C", "B", "A"]);
    }

    #[test]
    fn ties_keep_reverse_insertion_order() {
        let stored = AuditTrail::to_table(&[
            at("2026-01-01T00:00:00Z", "first"),
            at("2026-01-01T00:00:00Z", "second"),
        ]);
        let recent = AuditTrail::recent(&stored, Vec::new(), 10);
        assert_eq!(recent[0].action, "second");
    }
}
