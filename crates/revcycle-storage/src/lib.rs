//! revcycle-storage: the storage tiers, self-healing migrator, audit trail,
//! hybrid persistence façade and entity reconciler behind the revenue-cycle
//! dashboard.

pub mod audit;
pub mod bootstrap;
pub mod facade;
pub mod migrator;
pub mod reconcile;
pub mod store;
pub mod tiers;

pub use audit::AuditTrail;
pub use bootstrap::{AdminCheck, BootstrapPolicy};
pub use facade::{HybridStore, SaveOutcome, TabularResult};
pub use migrator::{HealReport, RepairAction, SchemaHealer};
pub use store::{ImportSummary, RevenueCycleStore};
pub use tiers::{CsvTier, DocumentTier, MemoryTier, SqliteTier, StorageTier};
