//! Domain and tabular types shared by every tier.

pub mod audit;
pub mod credential;
pub mod metric;
pub mod operational;
pub mod period;
pub mod table;
pub mod tier;
pub mod value;

pub use audit::AuditEntry;
pub use credential::{CredentialRecord, Role, Scope};
pub use metric::{Direction, MetricDefinition, MetricObservation};
pub use operational::DatasetKind;
pub use period::{Month, PeriodCalendar, PeriodField, PeriodKey};
pub use table::{Row, Table, WriteMode};
pub use tier::TierKind;
pub use value::Value;
