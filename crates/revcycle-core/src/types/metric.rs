//! KPI catalog rows and their time-series observations.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::table::Row;
use super::value::Value;
use crate::normalize::normalize;

/// Which side of the target is good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    AtLeast,
    AtMost,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AtLeast => "AT_LEAST",
            Self::AtMost => "AT_MOST",
        }
    }

    /// Accepts the legacy `MAX`/`MIN` tags (higher/lower is better).
    pub fn parse(text: &str) -> Option<Self> {
        match normalize(text).as_str() {
            "AT_LEAST" | "AT LEAST" | "MAX" | ">=" | ">" => Some(Self::AtLeast),
            "AT_MOST" | "AT MOST" | "MIN" | "<=" | "<" => Some(Self::AtMost),
            _ => None,
        }
    }

    pub fn meets(self, value: f64, target: f64) -> bool {
        match self {
            Self::AtLeast => value >= target,
            Self::AtMost => value <= target,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub partition: String,
    pub owner: String,
    pub name: String,
    pub target_value: f64,
    pub direction: Direction,
    pub target_text: String,
}

impl MetricDefinition {
    pub const COLUMNS: [&'static str; 6] = [
        "partition",
        "owner",
        "name",
        "target_value",
        "target_direction",
        "target_text",
    ];

    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("partition".into(), Value::from(self.partition.as_str()));
        row.insert("owner".into(), Value::from(self.owner.as_str()));
        row.insert("name".into(), Value::from(self.name.as_str()));
        row.insert("target_value".into(), Value::Number(self.target_value));
        row.insert("target_direction".into(), Value::from(self.direction.as_str()));
        row.insert("target_text".into(), Value::from(self.target_text.as_str()));
        row
    }

    /// `None` when the row has no name. A missing or unreadable target
    /// becomes 0.0 / `AT_LEAST`, matching what the catalog editor shows.
    pub fn from_row(row: &Row) -> Option<Self> {
        let name = row.get("name").and_then(Value::as_text)?;
        if name.trim().is_empty() {
            return None;
        }
        let text = |col: &str| row.get(col).and_then(Value::as_text).unwrap_or_default();
        Some(Self {
            partition: text("partition"),
            owner: text("owner"),
            name,
            target_value: row.get("target_value").and_then(Value::as_f64).unwrap_or(0.0),
            direction: Direction::parse(&text("target_direction")).unwrap_or(Direction::AtLeast),
            target_text: text("target_text"),
        })
    }

    pub fn meets_target(&self, value: f64) -> bool {
        self.direction.meets(value, self.target_value)
    }
}

/// One value for one metric in one period. At most one per (metric, period).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricObservation {
    pub metric: String,
    pub period: String,
    pub value: f64,
}

impl MetricObservation {
    pub const COLUMNS: [&'static str; 3] = ["metric", "period", "value"];
    pub const KEY: [&'static str; 2] = ["metric", "period"];

    pub fn new(metric: &str, period: &str, value: f64) -> Self {
        Self {
            metric: metric.to_string(),
            period: period.to_string(),
            value,
        }
    }

    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("metric".into(), Value::from(self.metric.as_str()));
        row.insert("period".into(), Value::from(self.period.as_str()));
        row.insert("value".into(), Value::Number(self.value));
        row
    }

    /// `None` when any of the three fields is missing or the value is not numeric.
    pub fn from_row(row: &Row) -> Option<Self> {
        let metric = row.get("metric").and_then(Value::as_text)?;
        let period = row.get("period").and_then(Value::as_text)?;
        let value = row.get("value").and_then(Value::as_f64)?;
        if metric.trim().is_empty() || period.trim().is_empty() {
            return None;
        }
        Some(Self { metric, period, value })
    }
}
