//! Entity reconciliation: assemble pivoted KPI views, merge period-scoped
//! operational edits, and split legacy wide catalogs.

pub mod period;
pub mod pivot;
pub mod wide;

pub use period::{filter_period, upsert_period, PeriodUpsert};
pub use pivot::{meets_target, pivot, Cell, MetricRow, MetricView, PeriodEntry};
pub use wide::{split_wide, WideSplit};
