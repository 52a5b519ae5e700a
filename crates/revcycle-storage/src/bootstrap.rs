//! Bootstrap policy: the built-in defaults each entity falls back to and the
//! rule that keeps at least one administrator on record.

use revcycle_core::config::BootstrapConfig;
use revcycle_core::constants::BUILTIN_METRICS;
use revcycle_core::entities::{EntityKind, EntitySpec};
use revcycle_core::types::{
    CredentialRecord, Direction, MetricDefinition, Role, Scope, Table,
};

/// Outcome of checking a users table for an administrator.
#[derive(Debug, Clone, PartialEq)]
pub enum AdminCheck {
    /// Some record already holds the admin role.
    Present,
    /// No administrator and the bootstrap identity is free: seed this record.
    Seed(CredentialRecord),
    /// The bootstrap identity exists without the admin role. Existing
    /// records are never modified, so nothing is seeded.
    Blocked { identity: String },
}

#[derive(Debug, Clone)]
pub struct BootstrapPolicy {
    admin_identity: String,
    admin_secret: String,
}

impl BootstrapPolicy {
    pub fn new(admin_identity: &str, admin_secret: &str) -> Self {
        Self {
            admin_identity: admin_identity.to_string(),
            admin_secret: admin_secret.to_string(),
        }
    }

    pub fn from_config(config: &BootstrapConfig) -> Self {
        Self::new(
            config.effective_admin_identity(),
            config.effective_admin_secret(),
        )
    }

    pub fn admin_identity(&self) -> &str {
        &self.admin_identity
    }

    pub fn admin_record(&self) -> CredentialRecord {
        CredentialRecord::new(&self.admin_identity, &self.admin_secret, Role::Admin, Scope::All)
    }

    pub fn check_admin(&self, users: &Table) -> AdminCheck {
        let records: Vec<CredentialRecord> =
            users.rows.iter().filter_map(CredentialRecord::from_row).collect();
        if records.iter().any(CredentialRecord::is_admin) {
            return AdminCheck::Present;
        }
        if records.iter().any(|r| r.identity == self.admin_identity) {
            return AdminCheck::Blocked {
                identity: self.admin_identity.clone(),
            };
        }
        AdminCheck::Seed(self.admin_record())
    }

    /// Table an entity is created or regenerated with.
    pub fn default_table(&self, spec: &EntitySpec) -> Table {
        let mut table = spec.empty_table();
        match spec.kind {
            EntityKind::Users => table.push_row(self.admin_record().to_row()),
            EntityKind::MetricCatalog => {
                for definition in builtin_catalog() {
                    table.push_row(definition.to_row());
                }
            }
            EntityKind::MetricObservations | EntityKind::Operational(_) | EntityKind::AuditLog => {}
        }
        table
    }
}

impl Default for BootstrapPolicy {
    fn default() -> Self {
        Self::from_config(&BootstrapConfig::default())
    }
}

/// The official KPI catalog.
pub fn builtin_catalog() -> Vec<MetricDefinition> {
    BUILTIN_METRICS
        .iter()
        .map(
            |(partition, owner, name, target, direction, text)| MetricDefinition {
                partition: (*partition).to_string(),
                owner: (*owner).to_string(),
                name: (*name).to_string(),
                target_value: *target,
                direction: Direction::parse(direction).unwrap_or(Direction::AtLeast),
                target_text: (*text).to_string(),
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use revcycle_core::types::Value;

    #[test]
    fn seeds_only_when_no_admin_and_identity_free() {
        let policy = BootstrapPolicy::new("admin", "admin123");
        let spec = EntitySpec::for_kind(EntityKind::Users);

        assert!(matches!(policy.check_admin(&spec.empty_table()), AdminCheck::Seed(_)));

        let mut demoted = spec.empty_table();
        let mut row = policy.admin_record().to_row();
        row.insert("role".into(), Value::from("viewer"));
        demoted.push_row(row);
        assert!(matches!(policy.check_admin(&demoted), AdminCheck::Blocked { .. }));

        assert_eq!(policy.check_admin(&policy.default_table(&spec)), AdminCheck::Present);
    }

    #[test]
    fn builtin_catalog_has_every_kpi() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.len(), 27);
        assert!(catalog.iter().any(|d| d.direction == Direction::AtMost));
    }
}
