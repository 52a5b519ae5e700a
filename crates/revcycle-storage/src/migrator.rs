//! Self-healing migrator: brings one entity's object in one tier up to the
//! required schema.
//!
//! Missing objects are created (seeded with built-in defaults where the
//! entity has them); missing required columns are renamed from a legacy
//! header when one matches by name (case and accents ignored), otherwise
//! added with their default; the users
//! object always keeps an administrator. Corrupt objects are quarantined and
//! regenerated. Per-step failures become warnings; only an unreachable tier
//! stops a run.

use std::fmt;

use revcycle_core::entities::{EntityKind, EntitySpec};
use revcycle_core::errors::StorageError;
use revcycle_core::locator::{locate, MatchKind};
use revcycle_core::types::audit::{
    ACTION_ADD_COLUMN, ACTION_CREATE_OBJECT, ACTION_REGENERATE, ACTION_RENAME_COLUMN,
    ACTION_SEED_ROW,
};
use revcycle_core::types::{PeriodCalendar, Table, WriteMode};

use crate::bootstrap::{AdminCheck, BootstrapPolicy};
use crate::reconcile::split_wide;
use crate::tiers::StorageTier;

/// One structural change made by the migrator.
#[derive(Debug, Clone, PartialEq)]
pub enum RepairAction {
    CreatedObject {
        tier: String,
        object: String,
    },
    AddedColumn {
        tier: String,
        object: String,
        column: String,
    },
    RenamedColumn {
        tier: String,
        object: String,
        from: String,
        to: String,
    },
    SeededRow {
        tier: String,
        object: String,
        rows: usize,
        reason: String,
    },
    Regenerated {
        tier: String,
        object: String,
        quarantined_as: Option<String>,
    },
}

impl RepairAction {
    /// Audit action tag.
    pub fn audit_action(&self) -> &'static str {
        match self {
            Self::CreatedObject { .. } => ACTION_CREATE_OBJECT,
            Self::AddedColumn { .. } => ACTION_ADD_COLUMN,
            Self::RenamedColumn { .. } => ACTION_RENAME_COLUMN,
            Self::SeededRow { .. } => ACTION_SEED_ROW,
            Self::Regenerated { .. } => ACTION_REGENERATE,
        }
    }

    pub fn tier(&self) -> &str {
        match self {
            Self::CreatedObject { tier, .. }
            | Self::AddedColumn { tier, .. }
            | Self::RenamedColumn { tier, .. }
            | Self::SeededRow { tier, .. }
            | Self::Regenerated { tier, .. } => tier,
        }
    }
}

impl fmt::Display for RepairAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreatedObject { tier, object } => write!(f, "created {object} in {tier}"),
            Self::AddedColumn {
                tier,
                object,
                column,
            } => write!(f, "added column {column} to {object} in {tier}"),
            Self::RenamedColumn {
                tier,
                object,
                from,
                to,
            } => write!(f, "renamed column {from} to {to} in {object} ({tier})"),
            Self::SeededRow {
                tier,
                object,
                rows,
                reason,
            } => write!(f, "seeded {rows} row(s) into {object} in {tier}: {reason}"),
            Self::Regenerated {
                tier,
                object,
                quarantined_as,
            } => match quarantined_as {
                Some(moved) => write!(f, "regenerated {object} in {tier}; corrupt copy kept as {moved}"),
                None => write!(f, "regenerated {object} in {tier}"),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealReport {
    pub actions: Vec<RepairAction>,
    pub warnings: Vec<String>,
}

impl HealReport {
    pub fn is_clean(&self) -> bool {
        self.actions.is_empty() && self.warnings.is_empty()
    }

    /// True when an object was regenerated during this run.
    pub fn regenerated(&self) -> bool {
        self.actions
            .iter()
            .any(|a| matches!(a, RepairAction::Regenerated { .. }))
    }

    pub fn merge(&mut self, other: HealReport) {
        self.actions.extend(other.actions);
        self.warnings.extend(other.warnings);
    }
}

pub struct SchemaHealer {
    bootstrap: BootstrapPolicy,
    calendar: PeriodCalendar,
}

impl SchemaHealer {
    pub fn new(bootstrap: BootstrapPolicy, calendar: PeriodCalendar) -> Self {
        Self {
            bootstrap,
            calendar,
        }
    }

    pub fn bootstrap(&self) -> &BootstrapPolicy {
        &self.bootstrap
    }

    pub fn calendar(&self) -> &PeriodCalendar {
        &self.calendar
    }

    /// Verify and repair `spec` in `tier`. Idempotent: a second run over a
    /// healed tier returns an empty report.
    pub fn heal(&self, tier: &dyn StorageTier, spec: &EntitySpec) -> Result<HealReport, StorageError> {
        let objects = tier.list_objects()?;
        let Some(object) = spec.resolve_object(&objects) else {
            return self.create(tier, spec, &objects);
        };

        let mut report = HealReport::default();
        let mut columns = match tier.columns(&object) {
            Ok(columns) => columns,
            Err(e) if e.is_corrupt() => return Ok(self.regenerate(tier, spec, &object, &e)),
            Err(e) => return Err(e),
        };

        let required = spec.required_names();
        for column in &spec.required {
            if columns.iter().any(|c| c == column.name) {
                continue;
            }
            let candidates: Vec<&str> = columns
                .iter()
                .map(String::as_str)
                .filter(|c| !required.iter().any(|r| r == c))
                .collect();

            // Renames are irreversible: only a whole-name legacy match counts.
            // A substring hit ("No" inside "ANO") is a payload column.
            let legacy = locate(column.name, column.legacy, &candidates)
                .filter(|hit| matches!(hit.kind, MatchKind::Exact | MatchKind::Normalized))
                .map(|hit| hit.name);
            if let Some(from) = legacy {
                match tier.rename_column(&object, &from, column.name) {
                    Ok(()) => {
                        tracing::info!(tier = tier.name(), object = %object, from = %from, to = column.name, "renamed legacy column");
                        for c in columns.iter_mut() {
                            if *c == from {
                                *c = column.name.to_string();
                            }
                        }
                        report.actions.push(RepairAction::RenamedColumn {
                            tier: tier.name().to_string(),
                            object: object.clone(),
                            from,
                            to: column.name.to_string(),
                        });
                    }
                    Err(e) => report.warnings.push(format!(
                        "could not rename {from} to {} in {object} ({}): {e}",
                        column.name,
                        tier.name()
                    )),
                }
            } else {
                match tier.add_column(&object, column.name, &column.default.to_value()) {
                    Ok(()) => {
                        tracing::info!(tier = tier.name(), object = %object, column = column.name, "added missing column");
                        columns.push(column.name.to_string());
                        report.actions.push(RepairAction::AddedColumn {
                            tier: tier.name().to_string(),
                            object: object.clone(),
                            column: column.name.to_string(),
                        });
                    }
                    Err(e) => report.warnings.push(format!(
                        "could not add {} to {object} ({}): {e}",
                        column.name,
                        tier.name()
                    )),
                }
            }
        }

        if spec.kind == EntityKind::Users {
            let admin = self.ensure_admin(tier, spec, &object);
            report.merge(admin);
        }
        Ok(report)
    }

    /// Quarantine a corrupt object and rewrite it from the entity's default.
    pub fn regenerate(
        &self,
        tier: &dyn StorageTier,
        spec: &EntitySpec,
        object: &str,
        cause: &StorageError,
    ) -> HealReport {
        let mut report = HealReport::default();
        tracing::warn!(tier = tier.name(), object, error = %cause, "corrupt object; regenerating from defaults");

        let quarantined_as = match tier.quarantine(object) {
            Ok(moved) => moved,
            Err(e) => {
                report
                    .warnings
                    .push(format!("could not quarantine {object} in {}: {e}", tier.name()));
                None
            }
        };

        match tier.write(object, &self.bootstrap.default_table(spec), &WriteMode::ReplaceAll) {
            Ok(()) => {
                report.warnings.push(format!(
                    "{object} in {} could not be read and was regenerated from defaults",
                    tier.name()
                ));
                report.actions.push(RepairAction::Regenerated {
                    tier: tier.name().to_string(),
                    object: object.to_string(),
                    quarantined_as,
                });
            }
            Err(e) => report.warnings.push(format!(
                "{object} in {} could not be read or regenerated: {e}",
                tier.name()
            )),
        }
        report
    }

    fn create(
        &self,
        tier: &dyn StorageTier,
        spec: &EntitySpec,
        objects: &[String],
    ) -> Result<HealReport, StorageError> {
        let (seed, reason) = match spec.kind {
            EntityKind::MetricObservations => (
                self.observations_from_wide_catalog(tier, objects)
                    .unwrap_or_else(|| spec.empty_table()),
                "migrated from wide catalog",
            ),
            EntityKind::Users => (self.bootstrap.default_table(spec), "bootstrap administrator"),
            EntityKind::MetricCatalog => (self.bootstrap.default_table(spec), "built-in KPI catalog"),
            _ => (spec.empty_table(), ""),
        };

        tier.write(&spec.name, &seed, &WriteMode::ReplaceAll)?;
        tracing::info!(tier = tier.name(), object = %spec.name, rows = seed.len(), "created missing object");

        let mut report = HealReport::default();
        report.actions.push(RepairAction::CreatedObject {
            tier: tier.name().to_string(),
            object: spec.name.clone(),
        });
        if !seed.is_empty() {
            report.actions.push(RepairAction::SeededRow {
                tier: tier.name().to_string(),
                object: spec.name.clone(),
                rows: seed.len(),
                reason: reason.to_string(),
            });
        }
        Ok(report)
    }

    /// Observations carried in a legacy wide catalog in the same tier.
    fn observations_from_wide_catalog(
        &self,
        tier: &dyn StorageTier,
        objects: &[String],
    ) -> Option<Table> {
        let catalog = EntitySpec::for_kind(EntityKind::MetricCatalog);
        let object = catalog.resolve_object(objects)?;
        let table = match tier.read(&object) {
            Ok(table) => table,
            Err(e) => {
                tracing::debug!(tier = tier.name(), object = %object, error = %e, "wide catalog unreadable");
                return None;
            }
        };
        let split = split_wide(&table, &self.calendar);
        if split.observations.is_empty() {
            return None;
        }
        let spec = EntitySpec::for_kind(EntityKind::MetricObservations);
        let mut seed = spec.empty_table();
        for obs in &split.observations {
            seed.push_row(obs.to_row());
        }
        Some(seed)
    }

    fn ensure_admin(&self, tier: &dyn StorageTier, spec: &EntitySpec, object: &str) -> HealReport {
        let mut report = HealReport::default();
        let users = match tier.read(object) {
            Ok(users) => users,
            Err(e) if e.is_corrupt() => return self.regenerate(tier, spec, object, &e),
            Err(e) => {
                report
                    .warnings
                    .push(format!("could not verify administrator in {}: {e}", tier.name()));
                return report;
            }
        };

        match self.bootstrap.check_admin(&users) {
            AdminCheck::Present => {}
            AdminCheck::Seed(record) => {
                let row = Table::from_rows(&spec.required_names(), vec![record.to_row()]);
                match tier.write(object, &row, &WriteMode::Append) {
                    Ok(()) => {
                        tracing::info!(tier = tier.name(), identity = %record.identity, "seeded bootstrap administrator");
                        report.actions.push(RepairAction::SeededRow {
                            tier: tier.name().to_string(),
                            object: object.to_string(),
                            rows: 1,
                            reason: "bootstrap administrator".to_string(),
                        });
                    }
                    Err(e) => report
                        .warnings
                        .push(format!("could not seed administrator in {}: {e}", tier.name())),
                }
            }
            AdminCheck::Blocked { identity } => report.warnings.push(format!(
                "no administrator in {} and '{identity}' exists without the admin role; left unchanged",
                tier.name()
            )),
        }
        report
    }
}
