//! Split a wide catalog (metadata columns plus one column per period label)
//! into definitions and observations. Backup files and old flat-file
//! installations use this layout.

use revcycle_core::entities::{EntityKind, EntitySpec};
use revcycle_core::locator::resolve_column;
use revcycle_core::types::{MetricDefinition, MetricObservation, PeriodCalendar, Row, Table, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideSplit {
    pub definitions: Vec<MetricDefinition>,
    pub observations: Vec<MetricObservation>,
    /// Rows without a usable metric name.
    pub skipped_rows: usize,
}

pub fn split_wide(table: &Table, calendar: &PeriodCalendar) -> WideSplit {
    let period_columns: Vec<(String, String)> = table
        .columns
        .iter()
        .filter_map(|c| calendar.canonical(c).map(|label| (c.clone(), label.to_string())))
        .collect();

    let mut candidates: Vec<&str> = table
        .columns
        .iter()
        .map(String::as_str)
        .filter(|c| !period_columns.iter().any(|(p, _)| p == c))
        .collect();

    // Each metadata column is claimed at most once.
    let spec = EntitySpec::for_kind(EntityKind::MetricCatalog);
    let mut mapping: Vec<(&'static str, String)> = Vec::new();
    for required in &spec.required {
        if let Some(column) = resolve_column(required.name, required.legacy, &candidates) {
            candidates.retain(|c| *c != column);
            mapping.push((required.name, column));
        }
    }

    let mut split = WideSplit::default();
    for row in &table.rows {
        let canonical: Row = mapping
            .iter()
            .filter_map(|(name, column)| row.get(column).map(|v| ((*name).to_string(), v.clone())))
            .collect();
        let Some(definition) = MetricDefinition::from_row(&canonical) else {
            split.skipped_rows += 1;
            continue;
        };
        for (column, label) in &period_columns {
            if let Some(value) = row.get(column).and_then(Value::as_f64) {
                split
                    .observations
                    .push(MetricObservation::new(&definition.name, label, value));
            }
        }
        split.definitions.push(definition);
    }
    split
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_headers_and_period_columns() {
        let mut table = Table::with_columns(&[
            "ÁREA", "RESPONSABLE", "INDICADOR", "META_VALOR", "LOGICA", "META_TEXTO", "NOV-25", "DIC-25",
        ]);
        let mut row = Row::new();
        row.insert("ÁREA".into(), Value::from("CARTERA"));
        row.insert("RESPONSABLE".into(), Value::from("Jefe Cartera"));
        row.insert("INDICADOR".into(), Value::from("Recuperación de Glosa"));
        row.insert("META_VALOR".into(), Value::Number(0.85));
        row.insert("LOGICA".into(), Value::from("MIN"));
        row.insert("META_TEXTO".into(), Value::from("> 85%"));
        row.insert("NOV-25".into(), Value::Number(0.9));
        table.push_row(row);

        let split = split_wide(&table, &PeriodCalendar::default());
        assert_eq!(split.definitions.len(), 1);
        assert_eq!(split.definitions[0].partition, "CARTERA");
        assert_eq!(split.definitions[0].target_value, 0.85);
        assert_eq!(split.observations, vec![MetricObservation::new("Recuperación de Glosa", "NOV-25", 0.9)]);
    }
}
