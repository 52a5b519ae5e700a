//! Pivot KPI observations into a definition × period grid.

use std::collections::HashMap;

use revcycle_core::normalize::normalize;
use revcycle_core::types::{
    MetricDefinition, MetricObservation, PeriodCalendar, Row, Table, Value,
};

/// One grid cell. A period without an observation is `NoData`, never zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Value(f64),
    NoData,
}

impl Cell {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::NoData => None,
        }
    }

    pub fn is_no_data(self) -> bool {
        matches!(self, Self::NoData)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub definition: MetricDefinition,
    /// One cell per calendar label, in calendar order.
    pub cells: Vec<Cell>,
}

impl MetricRow {
    /// Target evaluation for the cell at `idx`; `None` when there is no data.
    pub fn status(&self, idx: usize) -> Option<bool> {
        self.cells
            .get(idx)
            .and_then(|c| c.value())
            .map(|v| meets_target(&self.definition, v))
    }
}

/// One metric's standing in a single period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodEntry {
    pub definition: MetricDefinition,
    pub value: Cell,
    pub meets_target: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricView {
    pub labels: Vec<String>,
    pub rows: Vec<MetricRow>,
    /// Observations whose metric or period label matched nothing.
    pub orphans: usize,
}

impl MetricView {
    /// Most recent period with data for the row at `row`.
    pub fn latest(&self, row: usize) -> Option<(&str, f64)> {
        let metric = self.rows.get(row)?;
        metric
            .cells
            .iter()
            .enumerate()
            .rev()
            .find_map(|(idx, cell)| cell.value().map(|v| (self.labels[idx].as_str(), v)))
    }

    /// Every metric's value in `label`; `None` for a label outside the view.
    pub fn period(&self, label: &str) -> Option<Vec<PeriodEntry>> {
        let key = normalize(label);
        let idx = self.labels.iter().position(|l| normalize(l) == key)?;
        Some(
            self.rows
                .iter()
                .map(|row| PeriodEntry {
                    definition: row.definition.clone(),
                    value: row.cells[idx],
                    meets_target: row.status(idx),
                })
                .collect(),
        )
    }

    /// Rows whose partition matches `partition` (accent/case-insensitive).
    pub fn for_partition(&self, partition: &str) -> MetricView {
        let key = normalize(partition);
        MetricView {
            labels: self.labels.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| normalize(&r.definition.partition) == key)
                .cloned()
                .collect(),
            orphans: self.orphans,
        }
    }

    /// Wide layout: catalog columns followed by one column per label.
    /// `NoData` cells are written as blanks.
    pub fn to_table(&self) -> Table {
        let mut columns: Vec<String> = MetricDefinition::COLUMNS
            .iter()
            .map(|c| (*c).to_string())
            .collect();
        columns.extend(self.labels.iter().cloned());
        let mut table = Table::with_columns(&columns);
        for metric in &self.rows {
            let mut row: Row = metric.definition.to_row();
            for (label, cell) in self.labels.iter().zip(&metric.cells) {
                let value = cell.value().map(Value::Number).unwrap_or(Value::Null);
                row.insert(label.clone(), value);
            }
            table.push_row(row);
        }
        table
    }
}

/// AT_LEAST: value ≥ target; AT_MOST: value ≤ target.
pub fn meets_target(definition: &MetricDefinition, value: f64) -> bool {
    definition.meets_target(value)
}

/// Left-join observations onto definitions, one cell per calendar label.
/// Joins on the normalized metric name; a later observation for the same
/// (metric, period) replaces an earlier one.
pub fn pivot(
    definitions: &[MetricDefinition],
    observations: &[MetricObservation],
    calendar: &PeriodCalendar,
) -> MetricView {
    let labels: Vec<String> = calendar.labels().to_vec();
    let mut rows: Vec<MetricRow> = definitions
        .iter()
        .map(|d| MetricRow {
            definition: d.clone(),
            cells: vec![Cell::NoData; labels.len()],
        })
        .collect();

    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, d) in definitions.iter().enumerate() {
        index.entry(normalize(&d.name)).or_default().push(idx);
    }

    let mut orphans = 0;
    for obs in observations {
        let targets = index.get(&normalize(&obs.metric));
        let column = calendar.position(&obs.period);
        match (targets, column) {
            (Some(targets), Some(column)) => {
                for &row in targets {
                    rows[row].cells[column] = Cell::Value(obs.value);
                }
            }
            _ => orphans += 1,
        }
    }
    if orphans > 0 {
        tracing::debug!(orphans, "observations without a matching metric or period");
    }

    MetricView {
        labels,
        rows,
        orphans,
    }
}
