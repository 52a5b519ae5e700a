//! Hybrid persistence façade over an ordered chain of storage tiers.
//!
//! Reads walk the chain and take the first non-empty, schema-valid table;
//! writes go to every tier. The first tier is the primary: only its failure
//! makes a save fail. Each (tier, entity) pair is healed once per process
//! before it is first used.

use std::collections::HashSet;
use std::sync::Mutex;

use revcycle_core::entities::{EntityKind, EntityRegistry, EntitySpec};
use revcycle_core::errors::StorageError;
use revcycle_core::types::audit::SYSTEM_ACTOR;
use revcycle_core::types::{AuditEntry, Table, TierKind, WriteMode};

use crate::audit::AuditTrail;
use crate::migrator::{HealReport, SchemaHealer};
use crate::tiers::StorageTier;

/// Outcome of a read.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularResult {
    pub table: Table,
    pub schema_valid: bool,
    pub source_tier: TierKind,
    /// The data did not come from the primary tier.
    pub degraded: bool,
    pub warnings: Vec<String>,
}

/// Outcome of a write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveOutcome {
    pub ok: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// A read answer that did not win outright, kept as a fallback.
struct Candidate {
    idx: usize,
    table: Table,
}

pub struct HybridStore {
    tiers: Vec<Box<dyn StorageTier>>,
    registry: EntityRegistry,
    healer: SchemaHealer,
    audit: AuditTrail,
    healed: Mutex<HashSet<(usize, EntityKind)>>,
    session: Mutex<Option<String>>,
    replicate_on_load: bool,
}

impl HybridStore {
    pub fn new(
        tiers: Vec<Box<dyn StorageTier>>,
        registry: EntityRegistry,
        healer: SchemaHealer,
        replicate_on_load: bool,
    ) -> Self {
        Self {
            tiers,
            registry,
            healer,
            audit: AuditTrail::new(),
            healed: Mutex::new(HashSet::new()),
            session: Mutex::new(None),
            replicate_on_load,
        }
    }

    pub fn tiers(&self) -> &[Box<dyn StorageTier>] {
        &self.tiers
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn healer(&self) -> &SchemaHealer {
        &self.healer
    }

    // --- Session ---

    pub fn set_session(&self, identity: Option<String>) -> Result<(), StorageError> {
        let mut guard = self.session.lock().map_err(|_| StorageError::LockPoisoned {
            what: "session".to_string(),
        })?;
        *guard = identity;
        Ok(())
    }

    pub fn session(&self) -> Result<Option<String>, StorageError> {
        let guard = self.session.lock().map_err(|_| StorageError::LockPoisoned {
            what: "session".to_string(),
        })?;
        Ok(guard.clone())
    }

    /// Identity recorded in audit entries.
    pub fn actor(&self) -> String {
        match self.session() {
            Ok(Some(identity)) => identity,
            Ok(None) => SYSTEM_ACTOR.to_string(),
            Err(e) => {
                tracing::error!(error = %e, actor = SYSTEM_ACTOR, "session unreadable; auditing as fallback actor");
                SYSTEM_ACTOR.to_string()
            }
        }
    }

    // --- Healing ---

    /// Heal `(idx, kind)` unless it already was this process. The pair is
    /// marked before healing so audit writes issued by the heal itself do
    /// not re-enter it; a run stopped by an unreachable tier is unmarked so
    /// the next access retries.
    fn ensure_healed(&self, idx: usize, spec: &EntitySpec) -> Option<HealReport> {
        {
            let mut memo = self.healed.lock().ok()?;
            if !memo.insert((idx, spec.kind)) {
                return None;
            }
        }
        Some(self.heal_tier(idx, spec))
    }

    fn heal_tier(&self, idx: usize, spec: &EntitySpec) -> HealReport {
        let tier = &self.tiers[idx];
        let report = match self.healer.heal(tier.as_ref(), spec) {
            Ok(report) => report,
            Err(e) => {
                if let Ok(mut memo) = self.healed.lock() {
                    memo.remove(&(idx, spec.kind));
                }
                tracing::warn!(tier = tier.name(), entity = %spec.name, error = %e, "schema check skipped");
                HealReport {
                    actions: Vec::new(),
                    warnings: vec![format!("{} not checked in {}: {e}", spec.name, tier.name())],
                }
            }
        };
        self.record_actions(&report);
        report
    }

    /// Re-run the migrator for `kind` on every tier.
    pub fn heal(&self, kind: EntityKind) -> HealReport {
        let spec = self.spec(kind);
        let mut report = HealReport::default();
        for idx in 0..self.tiers.len() {
            if let Ok(mut memo) = self.healed.lock() {
                memo.insert((idx, kind));
            }
            report.merge(self.heal_tier(idx, &spec));
        }
        report
    }

    fn record_actions(&self, report: &HealReport) {
        if report.actions.is_empty() {
            return;
        }
        let actor = self.actor();
        let entries = report
            .actions
            .iter()
            .map(|action| AuditTrail::entry(&actor, action.audit_action(), action.to_string()))
            .collect();
        self.append_audit(entries);
    }

    fn spec(&self, kind: EntityKind) -> EntitySpec {
        self.registry
            .get(kind)
            .cloned()
            .unwrap_or_else(|| EntitySpec::for_kind(kind))
    }

    /// Real object name for `spec` in the tier at `idx`, if present.
    fn resolve_in(&self, idx: usize, spec: &EntitySpec) -> Result<Option<String>, StorageError> {
        let objects = self.tiers[idx].list_objects()?;
        Ok(spec.resolve_object(&objects))
    }

    // --- Audit ---

    /// Append entries to every tier that accepts them; keep them in process
    /// when none does.
    pub fn append_audit(&self, entries: Vec<AuditEntry>) {
        if entries.is_empty() {
            return;
        }
        let spec = self.spec(EntityKind::AuditLog);
        let table = AuditTrail::to_table(&entries);
        let mut accepted = 0;
        for idx in 0..self.tiers.len() {
            if let Some(report) = self.ensure_healed(idx, &spec) {
                for warning in report.warnings {
                    tracing::warn!(%warning, "audit log check");
                }
            }
            let tier = &self.tiers[idx];
            let object = match self.resolve_in(idx, &spec) {
                Ok(object) => object.unwrap_or_else(|| spec.name.clone()),
                Err(e) => {
                    tracing::warn!(tier = tier.name(), error = %e, "audit append skipped");
                    continue;
                }
            };
            match tier.write(&object, &table, &WriteMode::Append) {
                Ok(()) => accepted += 1,
                Err(e) => tracing::warn!(tier = tier.name(), error = %e, "audit append failed"),
            }
        }
        if accepted == 0 {
            tracing::warn!(entries = entries.len(), "no tier accepted audit entries; keeping them in process");
            if let Err(e) = self.audit.stash(entries) {
                tracing::error!(error = %e, "audit entries lost");
            }
        }
    }

    /// Most recent audit entries first, at most `limit`.
    pub fn list_audit(&self, limit: usize) -> Result<Vec<AuditEntry>, StorageError> {
        let stored = self.load(EntityKind::AuditLog)?;
        let stashed = self.audit.stashed()?;
        Ok(AuditTrail::recent(&stored.table, stashed, limit))
    }

    // --- Load / save ---

    pub fn load(&self, kind: EntityKind) -> Result<TabularResult, StorageError> {
        let spec = self.spec(kind);
        let mut warnings = Vec::new();
        let mut first_empty: Option<Candidate> = None;
        let mut first_invalid: Option<Candidate> = None;

        for idx in 0..self.tiers.len() {
            let tier = &self.tiers[idx];
            if let Some(report) = self.ensure_healed(idx, &spec) {
                let regenerated = report.regenerated();
                warnings.extend(report.warnings);
                if regenerated {
                    continue;
                }
            }

            let object = match self.resolve_in(idx, &spec) {
                Ok(object) => object,
                Err(e) => {
                    tracing::warn!(tier = tier.name(), entity = %spec.name, error = %e, "tier unavailable; falling through");
                    warnings.push(format!("{} unavailable: {e}", tier.name()));
                    continue;
                }
            };
            let Some(object) = object else {
                first_empty.get_or_insert(Candidate {
                    idx,
                    table: spec.empty_table(),
                });
                continue;
            };

            match tier.read(&object) {
                Ok(table) if table.is_empty() => {
                    first_empty.get_or_insert(Candidate { idx, table });
                }
                Ok(table) if spec.is_schema_valid(&table) => {
                    let degraded = idx != 0;
                    if degraded {
                        tracing::info!(entity = %spec.name, tier = tier.name(), "served from fallback tier");
                    }
                    // The audit log is append-only in every tier; never overwrite it.
                    if self.replicate_on_load && spec.kind != EntityKind::AuditLog {
                        self.refresh_replicas(&spec, idx, &table, &mut warnings);
                    }
                    return Ok(TabularResult {
                        table,
                        schema_valid: true,
                        source_tier: tier.kind(),
                        degraded,
                        warnings,
                    });
                }
                Ok(table) => {
                    warnings.push(format!(
                        "{object} in {} is missing required columns",
                        tier.name()
                    ));
                    first_invalid.get_or_insert(Candidate { idx, table });
                }
                Err(e) if e.is_corrupt() => {
                    let report = self.healer.regenerate(tier.as_ref(), &spec, &object, &e);
                    self.record_actions(&report);
                    warnings.extend(report.warnings);
                }
                Err(e) => {
                    tracing::warn!(tier = tier.name(), entity = %spec.name, error = %e, "read failed; falling through");
                    warnings.push(format!("{} unavailable: {e}", tier.name()));
                }
            }
        }

        if let Some(Candidate { idx, table }) = first_invalid {
            return Ok(TabularResult {
                table,
                schema_valid: false,
                source_tier: self.tiers[idx].kind(),
                degraded: true,
                warnings,
            });
        }
        if let Some(Candidate { idx, table }) = first_empty {
            return Ok(TabularResult {
                schema_valid: spec.is_schema_valid(&table),
                table,
                source_tier: self.tiers[idx].kind(),
                degraded: idx != 0,
                warnings,
            });
        }

        tracing::warn!(entity = %spec.name, "no tier answered; serving built-in default");
        warnings.push(format!("{}: every storage tier failed; showing defaults", spec.name));
        Ok(TabularResult {
            table: self.healer.bootstrap().default_table(&spec),
            schema_valid: true,
            source_tier: TierKind::Builtin,
            degraded: true,
            warnings,
        })
    }

    /// Best-effort copy of a winning table into the other tiers: lower
    /// priority ones whose copy is empty or differs, and higher priority ones
    /// whose copy is empty (a fresh primary in front of a legacy replica).
    /// A copy carrying columns the winner lacks is never overwritten.
    fn refresh_replicas(&self, spec: &EntitySpec, winner: usize, table: &Table, warnings: &mut Vec<String>) {
        for idx in (0..self.tiers.len()).filter(|&idx| idx != winner) {
            let tier = &self.tiers[idx];
            if let Some(report) = self.ensure_healed(idx, spec) {
                warnings.extend(report.warnings);
            }
            let object = match self.resolve_in(idx, spec) {
                Ok(object) => object.unwrap_or_else(|| spec.name.clone()),
                Err(e) => {
                    tracing::debug!(tier = tier.name(), entity = %spec.name, error = %e, "replica unavailable");
                    continue;
                }
            };
            match tier.read(&object) {
                Ok(current) if current == *table => continue,
                Ok(current) if idx < winner && !current.is_empty() => continue,
                Ok(current) if !current.is_empty() && current.columns.iter().any(|c| !table.has_column(c)) => {
                    tracing::debug!(tier = tier.name(), entity = %spec.name, "replica has columns the winner lacks; left as is");
                    continue;
                }
                Ok(_) => {}
                Err(e) if e.is_corrupt() => {
                    let report = self.healer.regenerate(tier.as_ref(), spec, &object, &e);
                    self.record_actions(&report);
                    warnings.extend(report.warnings);
                }
                Err(e) => {
                    tracing::debug!(tier = tier.name(), entity = %spec.name, error = %e, "replica unavailable");
                    continue;
                }
            }
            match tier.write(&object, table, &WriteMode::ReplaceAll) {
                Ok(()) if idx < winner => {
                    tracing::info!(tier = tier.name(), entity = %spec.name, rows = table.len(), "back-filled empty tier from fallback")
                }
                Ok(()) => tracing::debug!(tier = tier.name(), entity = %spec.name, rows = table.len(), "replica refreshed"),
                Err(e) => {
                    tracing::warn!(tier = tier.name(), entity = %spec.name, error = %e, "replica refresh failed");
                    warnings.push(format!("could not refresh {} in {}: {e}", spec.name, tier.name()));
                }
            }
        }
    }

    pub fn save(&self, kind: EntityKind, table: &Table, mode: &WriteMode) -> Result<SaveOutcome, StorageError> {
        let spec = self.spec(kind);
        let mut outcome = SaveOutcome {
            ok: true,
            ..SaveOutcome::default()
        };
        if self.tiers.is_empty() {
            outcome.ok = false;
            outcome.errors.push("no storage tier configured".to_string());
            return Ok(outcome);
        }

        // A merging write into an empty primary must not bury rows that so
        // far only exist in a lower tier: read first so they are back-filled.
        let merging = !matches!(mode, WriteMode::ReplaceAll);
        if merging && self.replicate_on_load && kind != EntityKind::AuditLog {
            match self.load(kind) {
                Ok(current) => outcome.warnings.extend(current.warnings),
                Err(e) => tracing::debug!(entity = %spec.name, error = %e, "pre-write read failed"),
            }
        }

        for idx in 0..self.tiers.len() {
            let tier = &self.tiers[idx];
            if let Some(report) = self.ensure_healed(idx, &spec) {
                outcome.warnings.extend(report.warnings);
            }
            let result = self
                .resolve_in(idx, &spec)
                .map(|object| object.unwrap_or_else(|| spec.name.clone()))
                .and_then(|object| tier.write(&object, table, mode));
            match result {
                Ok(()) => {}
                Err(e) if idx == 0 => {
                    tracing::error!(tier = tier.name(), entity = %spec.name, error = %e, "primary write failed");
                    outcome.ok = false;
                    outcome.errors.push(format!("{}: {e}", tier.name()));
                }
                Err(e) => {
                    tracing::warn!(tier = tier.name(), entity = %spec.name, error = %e, "replica write failed");
                    outcome.warnings.push(format!("{}: {e}", tier.name()));
                }
            }
        }
        tracing::info!(entity = %spec.name, rows = table.len(), ok = outcome.ok, "save");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::BootstrapPolicy;
    use revcycle_core::types::PeriodCalendar;

    #[test]
    fn poisoned_session_lock_is_reported() {
        let facade = HybridStore::new(
            Vec::new(),
            EntityRegistry::standard(),
            SchemaHealer::new(BootstrapPolicy::new("admin", "admin123"), PeriodCalendar::default()),
            true,
        );
        facade.set_session(Some("ana".to_string())).unwrap();
        let _ = std::thread::scope(|s| {
            s.spawn(|| {
                let _guard = facade.session.lock().unwrap();
                panic!("poison the session lock");
            })
            .join()
        });

        assert!(matches!(facade.session(), Err(StorageError::LockPoisoned { .. })));
        assert!(facade.set_session(None).is_err());
        assert_eq!(facade.actor(), SYSTEM_ACTOR);
    }
}
