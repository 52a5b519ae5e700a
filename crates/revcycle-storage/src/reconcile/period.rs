//! Period-scoped replacement of operational rows.

use chrono::{DateTime, SecondsFormat, Utc};

use revcycle_core::errors::{StoreError, StoreResult};
use revcycle_core::types::period::{month_field, year_field};
use revcycle_core::types::{PeriodField, PeriodKey, Row, Table, Value};

pub const YEAR_COLUMN: &str = "year";
pub const MONTH_COLUMN: &str = "month";
pub const LOAD_TIMESTAMP_COLUMN: &str = "load_timestamp";

/// Result of merging an edited period into the stored rows.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodUpsert {
    /// Full table to persist: untouched periods plus the edited rows.
    pub table: Table,
    /// Stored rows of the selected period that were dropped.
    pub removed: usize,
    pub inserted: usize,
    /// Year or month fields filled in from the selection.
    pub backfilled: usize,
}

/// The resolved period of a stored row, when both fields are present.
pub fn row_period(row: &Row) -> Option<PeriodKey> {
    let year = year_field(row.get(YEAR_COLUMN)).present()?;
    let month = month_field(row.get(MONTH_COLUMN)).present()?;
    Some(PeriodKey::new(year, month))
}

/// Rows of `table` belonging to `period`.
pub fn filter_period(table: &Table, period: PeriodKey) -> Table {
    table.filter(|row| row_period(row) == Some(period))
}

/// Replace the selected period's rows with `edited`.
///
/// Edited rows with a missing year or month take the selection's value and
/// are counted in `backfilled`. An edited row that names a different period
/// is a conflict and nothing is produced. Every edited row is stamped with
/// `loaded_at`. An empty `edited` clears the period.
pub fn upsert_period(
    existing: &Table,
    edited: &Table,
    selection: PeriodKey,
    loaded_at: DateTime<Utc>,
) -> StoreResult<PeriodUpsert> {
    let stamp = loaded_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut backfilled = 0;
    let mut stamped = Vec::with_capacity(edited.rows.len());

    for (idx, source) in edited.rows.iter().enumerate() {
        let mut row = source.clone();

        match year_field(row.get(YEAR_COLUMN)) {
            PeriodField::Missing => backfilled += 1,
            PeriodField::Present(year) if year == selection.year => {}
            PeriodField::Present(year) => {
                return Err(StoreError::IntegrityConflict {
                    entity: "operational".to_string(),
                    key: format!("row {}", idx + 1),
                    reason: format!("year {year} differs from selected period {selection}"),
                });
            }
            PeriodField::Invalid(text) => {
                return Err(StoreError::InvalidInput {
                    field: YEAR_COLUMN.to_string(),
                    message: format!("row {}: '{text}' is not a year", idx + 1),
                });
            }
        }

        match month_field(row.get(MONTH_COLUMN)) {
            PeriodField::Missing => backfilled += 1,
            PeriodField::Present(month) if month == selection.month => {}
            PeriodField::Present(month) => {
                return Err(StoreError::IntegrityConflict {
                    entity: "operational".to_string(),
                    key: format!("row {}", idx + 1),
                    reason: format!("month {month} differs from selected period {selection}"),
                });
            }
            PeriodField::Invalid(text) => {
                return Err(StoreError::InvalidInput {
                    field: MONTH_COLUMN.to_string(),
                    message: format!("row {}: '{text}' is not a month", idx + 1),
                });
            }
        }

        row.insert(YEAR_COLUMN.to_string(), Value::from(selection.year));
        row.insert(
            MONTH_COLUMN.to_string(),
            Value::from(selection.month.spanish_name()),
        );
        row.insert(LOAD_TIMESTAMP_COLUMN.to_string(), Value::from(stamp.as_str()));
        stamped.push(row);
    }

    if backfilled > 0 {
        tracing::warn!(
            backfilled,
            period = %selection,
            "edited rows were missing year/month; filled from the selected period"
        );
    }

    let mut table = Table::with_columns(&existing.columns);
    let mut removed = 0;
    for row in &existing.rows {
        if row_period(row) == Some(selection) {
            removed += 1;
        } else {
            table.rows.push(row.clone());
        }
    }
    for column in [YEAR_COLUMN, MONTH_COLUMN, LOAD_TIMESTAMP_COLUMN] {
        table.ensure_column(column, &Value::Null);
    }
    let inserted = stamped.len();
    for row in stamped {
        table.push_row(row);
    }

    Ok(PeriodUpsert {
        table,
        removed,
        inserted,
        backfilled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use revcycle_core::types::Month;

    fn op_row(year: Value, month: Value, amount: f64) -> Row {
        let mut row = Row::new();
        row.insert(YEAR_COLUMN.into(), year);
        row.insert(MONTH_COLUMN.into(), month);
        row.insert("amount".into(), Value::Number(amount));
        row
    }

    #[test]
    fn zero_year_is_backfilled() {
        let edited = Table::from_rows(&["amount"], vec![op_row(Value::Number(0.0), Value::from("0"), 1.0)]);
        let sel = PeriodKey::new(2026, Month::March);
        let out = upsert_period(&Table::default(), &edited, sel, Utc::now()).unwrap();
        assert_eq!(out.backfilled, 2);
        assert_eq!(out.table.cell(0, YEAR_COLUMN), &Value::Number(2026.0));
        assert_eq!(out.table.cell(0, MONTH_COLUMN), &Value::from("Marzo"));
    }

    #[test]
    fn empty_edit_clears_period() {
        let sel = PeriodKey::new(2026, Month::January);
        let existing = Table::from_rows(
            &["amount"],
            vec![
                op_row(Value::from(2026), Value::from("Enero"), 1.0),
                op_row(Value::from(2026), Value::from("Febrero"), 2.0),
            ],
        );
        let out = upsert_period(&existing, &Table::default(), sel, Utc::now()).unwrap();
        assert_eq!(out.removed, 1);
        assert_eq!(out.table.len(), 1);
    }
}
