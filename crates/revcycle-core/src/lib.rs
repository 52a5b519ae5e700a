//! revcycle-core: shared types, errors, config, tracing and the schema
//! registry for the revenue-cycle persistence layer.

pub mod config;
pub mod constants;
pub mod entities;
pub mod errors;
pub mod locator;
pub mod normalize;
pub mod tracing;
pub mod types;

pub use config::RevcycleConfig;
pub use entities::{EntityKind, EntityRegistry, EntitySpec};
pub use errors::{StorageError, StoreError, StoreResult};
pub use types::{Row, Table, TierKind, Value, WriteMode};
