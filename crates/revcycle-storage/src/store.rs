//! The entity API consumed by the dashboard: named loads and saves,
//! authentication, the audit query, KPI catalog and observation operations,
//! period-scoped operational saves, and CSV backup export/import.

use std::path::Path;

use chrono::Utc;

use revcycle_core::config::RevcycleConfig;
use revcycle_core::entities::{EntityKind, EntityRegistry, EntitySpec};
use revcycle_core::errors::{StorageError, StoreError, StoreResult};
use revcycle_core::normalize::normalize;
use revcycle_core::types::audit::{
    ACTION_ADD_METRIC, ACTION_CREATE_USER, ACTION_IMPORT_BACKUP, ACTION_PERIOD_BACKFILL,
};
use revcycle_core::types::{
    AuditEntry, CredentialRecord, DatasetKind, MetricDefinition, MetricObservation,
    PeriodCalendar, PeriodKey, Table, WriteMode,
};

use crate::audit::AuditTrail;
use crate::bootstrap::BootstrapPolicy;
use crate::facade::{HybridStore, SaveOutcome, TabularResult};
use crate::migrator::{HealReport, SchemaHealer};
use crate::reconcile::{filter_period, pivot, split_wide, upsert_period, MetricView, PeriodEntry, PeriodUpsert};
use crate::tiers::{self, csv_file, StorageTier};

/// Counts from a backup import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub definitions: usize,
    pub observations: usize,
    pub skipped_rows: usize,
    pub outcome: SaveOutcome,
}

pub struct RevenueCycleStore {
    hybrid: HybridStore,
    calendar: PeriodCalendar,
    default_audit_limit: usize,
}

impl RevenueCycleStore {
    /// Open the tier chain described by `config`, with on-disk tiers rooted
    /// at `root`.
    pub fn open(root: &Path, config: &RevcycleConfig) -> StoreResult<Self> {
        RevcycleConfig::validate(config)?;
        let tiers = tiers::open_configured(&config.storage, root);
        tracing::info!(
            tiers = ?tiers.iter().map(|t| t.name().to_string()).collect::<Vec<_>>(),
            "opening revcycle store"
        );
        Ok(Self::with_tiers(tiers, config))
    }

    /// Build over an explicit tier chain, highest priority first.
    pub fn with_tiers(tiers: Vec<Box<dyn StorageTier>>, config: &RevcycleConfig) -> Self {
        let calendar = config.periods.calendar();
        let healer = SchemaHealer::new(
            BootstrapPolicy::from_config(&config.bootstrap),
            calendar.clone(),
        );
        Self {
            hybrid: HybridStore::new(
                tiers,
                EntityRegistry::standard(),
                healer,
                config.storage.effective_replicate_on_load(),
            ),
            calendar,
            default_audit_limit: config.audit.effective_default_limit(),
        }
    }

    pub fn calendar(&self) -> &PeriodCalendar {
        &self.calendar
    }

    fn entity(&self, name: &str) -> StoreResult<EntitySpec> {
        self.hybrid
            .registry()
            .find(name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownEntity(name.to_string()))
    }

    fn audit(&self, action: &str, detail: String) {
        let entry = AuditTrail::entry(&self.hybrid.actor(), action, detail);
        self.hybrid.append_audit(vec![entry]);
    }

    // --- Generic entity access ---

    /// Load an entity by logical name (aliases and spelling variants accepted).
    pub fn load(&self, entity: &str) -> StoreResult<TabularResult> {
        let spec = self.entity(entity)?;
        Ok(self.hybrid.load(spec.kind)?)
    }

    pub fn save(&self, entity: &str, table: &Table, mode: &WriteMode) -> StoreResult<SaveOutcome> {
        let spec = self.entity(entity)?;
        Ok(self.hybrid.save(spec.kind, table, mode)?)
    }

    /// Re-run the schema check for an entity on every tier.
    pub fn heal(&self, entity: &str) -> StoreResult<HealReport> {
        let spec = self.entity(entity)?;
        Ok(self.hybrid.heal(spec.kind))
    }

    /// Most recent first. `None` uses the configured default limit.
    pub fn list_audit(&self, limit: Option<usize>) -> StoreResult<Vec<AuditEntry>> {
        let limit = limit.unwrap_or(self.default_audit_limit);
        Ok(self.hybrid.list_audit(limit)?)
    }

    // --- Credentials ---

    pub fn users(&self) -> StoreResult<Vec<CredentialRecord>> {
        let result = self.hybrid.load(EntityKind::Users)?;
        Ok(result
            .table
            .rows
            .iter()
            .filter_map(CredentialRecord::from_row)
            .collect())
    }

    /// Check credentials. `None` covers both unknown identity and wrong
    /// secret. On success the identity becomes the session actor.
    pub fn authenticate(&self, identity: &str, secret: &str) -> Option<CredentialRecord> {
        let users = match self.users() {
            Ok(users) => users,
            Err(e) => {
                tracing::warn!(error = %e, "credential lookup failed");
                return None;
            }
        };
        // A blank stored secret (e.g. a column added by the migrator) never
        // authenticates.
        let candidate = users
            .into_iter()
            .find(|u| u.identity == identity)
            .filter(|u| !u.secret.trim().is_empty());
        let expected = candidate.as_ref().map(|u| u.secret.as_str()).unwrap_or("");
        let matches = secrets_match(expected, secret) && candidate.is_some();
        if !matches {
            tracing::info!("authentication failed");
            return None;
        }
        if let Err(e) = self.hybrid.set_session(Some(identity.to_string())) {
            tracing::warn!(error = %e, "session not recorded");
        }
        tracing::info!(identity, "authenticated");
        candidate
    }

    pub fn logout(&self) {
        if let Err(e) = self.hybrid.set_session(None) {
            tracing::warn!(error = %e, "session not cleared");
        }
    }

    pub fn session(&self) -> StoreResult<Option<String>> {
        Ok(self.hybrid.session()?)
    }

    /// Add a user. Duplicate identities are rejected and nothing is written.
    pub fn create_user(&self, record: &CredentialRecord) -> StoreResult<SaveOutcome> {
        if record.identity.trim().is_empty() {
            return Err(StoreError::InvalidInput {
                field: "identity".to_string(),
                message: "must not be blank".to_string(),
            });
        }
        if self.users()?.iter().any(|u| u.identity == record.identity) {
            return Err(StoreError::IntegrityConflict {
                entity: "users".to_string(),
                key: record.identity.clone(),
                reason: "identity already exists".to_string(),
            });
        }
        // Identities are case-sensitive: append, never a normalized-key upsert.
        let table = Table::from_rows(&CredentialRecord::COLUMNS, vec![record.to_row()]);
        let outcome = self.hybrid.save(EntityKind::Users, &table, &WriteMode::Append)?;
        if outcome.ok {
            self.audit(
                ACTION_CREATE_USER,
                format!("{} ({}, scope {})", record.identity, record.role, record.scope),
            );
        }
        Ok(outcome)
    }

    // --- KPI catalog and observations ---

    pub fn catalog(&self) -> StoreResult<Vec<MetricDefinition>> {
        let result = self.hybrid.load(EntityKind::MetricCatalog)?;
        Ok(result
            .table
            .rows
            .iter()
            .filter_map(MetricDefinition::from_row)
            .collect())
    }

    /// Add a KPI definition. Names are unique (accent/case-insensitive).
    pub fn add_metric(&self, definition: &MetricDefinition) -> StoreResult<SaveOutcome> {
        if definition.name.trim().is_empty() {
            return Err(StoreError::InvalidInput {
                field: "name".to_string(),
                message: "must not be blank".to_string(),
            });
        }
        let key = normalize(&definition.name);
        if self.catalog()?.iter().any(|d| normalize(&d.name) == key) {
            return Err(StoreError::IntegrityConflict {
                entity: "metric_catalog".to_string(),
                key: definition.name.clone(),
                reason: "a metric with this name already exists".to_string(),
            });
        }
        let table = Table::from_rows(&MetricDefinition::COLUMNS, vec![definition.to_row()]);
        let outcome = self.hybrid.save(
            EntityKind::MetricCatalog,
            &table,
            &WriteMode::UpsertByKey(vec!["name".to_string()]),
        )?;
        if outcome.ok {
            self.audit(
                ACTION_ADD_METRIC,
                format!("{} [{}]", definition.name, definition.partition),
            );
        }
        Ok(outcome)
    }

    fn observations(&self) -> StoreResult<Vec<MetricObservation>> {
        let result = self.hybrid.load(EntityKind::MetricObservations)?;
        Ok(result
            .table
            .rows
            .iter()
            .filter_map(MetricObservation::from_row)
            .collect())
    }

    /// Upsert observations by (metric, period). Period labels must belong to
    /// the calendar and metrics to the catalog.
    pub fn record_observations(&self, observations: &[MetricObservation]) -> StoreResult<SaveOutcome> {
        let catalog = self.catalog()?;
        let mut table = Table::with_columns(&MetricObservation::COLUMNS);
        for obs in observations {
            let label = self.calendar.canonical(&obs.period).ok_or_else(|| StoreError::InvalidInput {
                field: "period".to_string(),
                message: format!("'{}' is not a reporting period", obs.period),
            })?;
            let key = normalize(&obs.metric);
            let definition = catalog
                .iter()
                .find(|d| normalize(&d.name) == key)
                .ok_or_else(|| StoreError::InvalidInput {
                    field: "metric".to_string(),
                    message: format!("'{}' is not in the catalog", obs.metric),
                })?;
            table.push_row(MetricObservation::new(&definition.name, label, obs.value).to_row());
        }
        Ok(self.hybrid.save(
            EntityKind::MetricObservations,
            &table,
            &WriteMode::UpsertByKey(MetricObservation::KEY.iter().map(|k| (*k).to_string()).collect()),
        )?)
    }

    /// Definitions × calendar grid, optionally restricted to one partition.
    pub fn metric_view(&self, partition: Option<&str>) -> StoreResult<MetricView> {
        let view = pivot(&self.catalog()?, &self.observations()?, &self.calendar);
        Ok(match partition {
            Some(p) => view.for_partition(p),
            None => view,
        })
    }

    /// Every metric's value and target status in one period.
    pub fn period_view(&self, label: &str) -> StoreResult<Vec<PeriodEntry>> {
        self.metric_view(None)?
            .period(label)
            .ok_or_else(|| StoreError::InvalidInput {
                field: "period".to_string(),
                message: format!("'{label}' is not a reporting period"),
            })
    }

    // --- Operational datasets ---

    /// Load a dataset, optionally only the rows of one period.
    pub fn load_operational(
        &self,
        kind: DatasetKind,
        period: Option<PeriodKey>,
    ) -> StoreResult<TabularResult> {
        let mut result = self.hybrid.load(EntityKind::Operational(kind))?;
        if let Some(period) = period {
            result.table = filter_period(&result.table, period);
        }
        Ok(result)
    }

    /// Replace one period of a dataset with `rows`. Conflicting explicit
    /// periods abort before anything is written.
    pub fn save_operational_period(
        &self,
        kind: DatasetKind,
        selection: PeriodKey,
        rows: &Table,
    ) -> StoreResult<(PeriodUpsert, SaveOutcome)> {
        let entity = EntityKind::Operational(kind);
        let existing = self.hybrid.load(entity)?;
        let upsert = upsert_period(&existing.table, rows, selection, Utc::now()).map_err(|e| match e {
            StoreError::IntegrityConflict { key, reason, .. } => StoreError::IntegrityConflict {
                entity: kind.object_name(),
                key,
                reason,
            },
            other => other,
        })?;

        let outcome = self
            .hybrid
            .save(entity, &upsert.table, &WriteMode::ReplaceAll)?;
        if upsert.backfilled > 0 {
            self.audit(
                ACTION_PERIOD_BACKFILL,
                format!(
                    "{}: {} year/month field(s) filled with {selection}",
                    kind.object_name(),
                    upsert.backfilled
                ),
            );
        }
        tracing::info!(
            dataset = kind.slug(),
            period = %selection,
            removed = upsert.removed,
            inserted = upsert.inserted,
            "operational period saved"
        );
        Ok((upsert, outcome))
    }

    // --- Backup ---

    /// Wide CSV of the catalog with one column per period label.
    pub fn export_backup_csv(&self) -> StoreResult<String> {
        let table = self.metric_view(None)?.to_table();
        let bytes = csv_file::render_csv(&table).map_err(|e| StorageError::Io {
            message: e.to_string(),
        })?;
        String::from_utf8(bytes).map_err(|e| {
            StoreError::Storage(StorageError::Io {
                message: e.to_string(),
            })
        })
    }

    /// Restore a wide CSV backup: definitions and observations are upserted.
    pub fn import_backup_csv(&self, text: &str) -> StoreResult<ImportSummary> {
        let table = csv_file::parse_csv(text.as_bytes()).map_err(|e| StoreError::InvalidInput {
            field: "backup".to_string(),
            message: e.to_string(),
        })?;
        let split = split_wide(&table, &self.calendar);
        if split.definitions.is_empty() {
            return Err(StoreError::InvalidInput {
                field: "backup".to_string(),
                message: "no metric definitions found".to_string(),
            });
        }

        let mut catalog = Table::with_columns(&MetricDefinition::COLUMNS);
        for definition in &split.definitions {
            catalog.push_row(definition.to_row());
        }
        let mut observations = Table::with_columns(&MetricObservation::COLUMNS);
        for obs in &split.observations {
            observations.push_row(obs.to_row());
        }

        let mut outcome = self.hybrid.save(
            EntityKind::MetricCatalog,
            &catalog,
            &WriteMode::UpsertByKey(vec!["name".to_string()]),
        )?;
        let obs_outcome = self.hybrid.save(
            EntityKind::MetricObservations,
            &observations,
            &WriteMode::UpsertByKey(MetricObservation::KEY.iter().map(|k| (*k).to_string()).collect()),
        )?;
        outcome.ok &= obs_outcome.ok;
        outcome.errors.extend(obs_outcome.errors);
        outcome.warnings.extend(obs_outcome.warnings);

        self.audit(
            ACTION_IMPORT_BACKUP,
            format!(
                "{} definitions, {} observations, {} rows skipped",
                split.definitions.len(),
                split.observations.len(),
                split.skipped_rows
            ),
        );
        Ok(ImportSummary {
            definitions: split.definitions.len(),
            observations: split.observations.len(),
            skipped_rows: split.skipped_rows,
            outcome,
        })
    }
}

/// Compare secrets without stopping at the first differing byte.
fn secrets_match(expected: &str, given: &str) -> bool {
    let a = expected.as_bytes();
    let b = given.as_bytes();
    let mut diff = a.len() ^ b.len();
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= usize::from(x ^ y);
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::secrets_match;

    #[test]
    fn secret_comparison() {
        assert!(secrets_match("admin123", "admin123"));
        assert!(!secrets_match("admin123", "admin12"));
        assert!(!secrets_match("admin123", "admin124"));
        assert!(secrets_match("", ""));
    }
}
