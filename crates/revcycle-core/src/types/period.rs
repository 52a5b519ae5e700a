//! Period keys: calendar months for operational data and the fixed label
//! sequence used for KPI observations.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::value::Value;
use crate::constants::DEFAULT_PERIOD_LABELS;
use crate::normalize::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Month {
    January = 1,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

const SPANISH: [&str; 12] = [
    "Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio", "Julio", "Agosto", "Septiembre",
    "Octubre", "Noviembre", "Diciembre",
];

const ENGLISH: [&str; 12] = [
    "JANUARY", "FEBRUARY", "MARCH", "APRIL", "MAY", "JUNE", "JULY", "AUGUST", "SEPTEMBER",
    "OCTOBER", "NOVEMBER", "DECEMBER",
];

impl Month {
    pub fn from_number(n: u32) -> Option<Self> {
        MONTHS.get((n as usize).checked_sub(1)?).copied()
    }

    pub fn number(self) -> u32 {
        self as u32
    }

    /// Display name as stored in operational tables.
    pub fn spanish_name(self) -> &'static str {
        SPANISH[self as usize - 1]
    }

    /// Parse a month name (Spanish or English, full or 3-letter prefix,
    /// accent/case-insensitive, `SETIEMBRE` accepted) or a number 1–12.
    pub fn parse(text: &str) -> Option<Self> {
        let key = normalize(text);
        if key.is_empty() {
            return None;
        }
        if let Ok(n) = key.parse::<f64>() {
            if n.fract() == 0.0 && (1.0..=12.0).contains(&n) {
                return Self::from_number(n as u32);
            }
            return None;
        }
        if key == "SETIEMBRE" {
            return Some(Self::September);
        }
        for (idx, month) in MONTHS.iter().enumerate() {
            let es = normalize(SPANISH[idx]);
            let en = ENGLISH[idx];
            if key == es || key == en {
                return Some(*month);
            }
        }
        if key.chars().count() == 3 {
            for (idx, month) in MONTHS.iter().enumerate() {
                let es = normalize(SPANISH[idx]);
                if es.starts_with(&key) || ENGLISH[idx].starts_with(&key) {
                    return Some(*month);
                }
            }
        }
        None
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spanish_name())
    }
}

/// A (year, month) reporting interval for operational record sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: i32,
    pub month: Month,
}

impl PeriodKey {
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month, self.year)
    }
}

/// Classification of a stored year or month cell.
///
/// A field is `Missing` when the column is absent, the value is null, blank
/// text, numeric zero, or text that parses to zero. Missing fields are
/// back-filled from the selection context; `Invalid` ones are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodField<T> {
    Missing,
    Present(T),
    Invalid(String),
}

impl<T> PeriodField<T> {
    pub fn present(self) -> Option<T> {
        match self {
            Self::Present(v) => Some(v),
            _ => None,
        }
    }
}

fn is_zero(value: &Value) -> bool {
    value.as_f64().is_some_and(|n| n == 0.0)
}

/// Classify a year cell.
pub fn year_field(value: Option<&Value>) -> PeriodField<i32> {
    let Some(value) = value else {
        return PeriodField::Missing;
    };
    if value.is_blank() || is_zero(value) {
        return PeriodField::Missing;
    }
    match value.as_f64() {
        Some(n) if n.fract() == 0.0 && (1.0..=9999.0).contains(&n) => PeriodField::Present(n as i32),
        _ => PeriodField::Invalid(value.to_string()),
    }
}

/// Classify a month cell.
pub fn month_field(value: Option<&Value>) -> PeriodField<Month> {
    let Some(value) = value else {
        return PeriodField::Missing;
    };
    if value.is_blank() || is_zero(value) {
        return PeriodField::Missing;
    }
    match Month::parse(&value.to_string()) {
        Some(m) => PeriodField::Present(m),
        None => PeriodField::Invalid(value.to_string()),
    }
}

/// The fixed, ordered label sequence KPI observations are keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCalendar {
    labels: Vec<String>,
}

impl PeriodCalendar {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Canonical label for `label` (accent/case-insensitive), if in the calendar.
    pub fn canonical(&self, label: &str) -> Option<&str> {
        let key = normalize(label);
        self.labels
            .iter()
            .find(|l| normalize(l) == key)
            .map(String::as_str)
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        let key = normalize(label);
        self.labels.iter().position(|l| normalize(l) == key)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.position(label).is_some()
    }
}

impl Default for PeriodCalendar {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD_LABELS.iter().map(|s| (*s).to_string()).collect())
    }
}
