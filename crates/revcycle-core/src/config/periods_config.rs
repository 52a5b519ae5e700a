//! KPI reporting calendar configuration.

use serde::{Deserialize, Serialize};

use crate::types::PeriodCalendar;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PeriodsConfig {
    /// Ordered period labels. Empty means the built-in calendar.
    pub labels: Vec<String>,
}

impl PeriodsConfig {
    pub fn calendar(&self) -> PeriodCalendar {
        if self.labels.is_empty() {
            PeriodCalendar::default()
        } else {
            PeriodCalendar::new(self.labels.clone())
        }
    }
}
