//! Configuration system for revcycle.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod audit_config;
pub mod bootstrap_config;
pub mod periods_config;
pub mod revcycle_config;
pub mod storage_config;

pub use audit_config::AuditConfig;
pub use bootstrap_config::BootstrapConfig;
pub use periods_config::PeriodsConfig;
pub use revcycle_config::{CliOverrides, RevcycleConfig};
pub use storage_config::StorageConfig;
