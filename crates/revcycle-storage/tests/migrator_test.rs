//! Self-healing migrator tests: object creation, legacy column renames,
//! administrator protection, corrupt-object regeneration and idempotency.

use std::path::Path;

use revcycle_core::entities::{EntityKind, EntitySpec};
use revcycle_core::types::{PeriodCalendar, Value};
use revcycle_core::RevcycleConfig;
use revcycle_storage::bootstrap::BootstrapPolicy;
use revcycle_storage::reconcile::Cell;
use revcycle_storage::tiers::{CsvTier, MemoryTier, SqliteTier, StorageTier};
use revcycle_storage::{RepairAction, RevenueCycleStore, SchemaHealer};
use tempfile::tempdir;

fn csv_store(dir: &Path) -> RevenueCycleStore {
    RevenueCycleStore::with_tiers(
        vec![Box::new(CsvTier::new(dir))],
        &RevcycleConfig::default(),
    )
}

fn healer() -> SchemaHealer {
    SchemaHealer::new(BootstrapPolicy::new("admin", "admin123"), PeriodCalendar::default())
}

// ═══════════════════════════════════════════════════════════════════════════
// CREATION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn missing_users_object_is_created_with_admin() {
    let tier = MemoryTier::new();
    let spec = EntitySpec::for_kind(EntityKind::Users);
    let report = healer().heal(&tier, &spec).unwrap();

    assert!(matches!(&report.actions[0], RepairAction::CreatedObject { object, .. } if object == "users"));
    assert!(matches!(&report.actions[1], RepairAction::SeededRow { rows: 1, .. }));
    let users = tier.read("users").unwrap();
    assert_eq!(users.cell(0, "identity"), &Value::from("admin"));
    assert_eq!(users.cell(0, "role"), &Value::from("admin"));
}

#[test]
fn missing_catalog_is_seeded_with_builtin_kpis() {
    let tier = MemoryTier::new();
    let spec = EntitySpec::for_kind(EntityKind::MetricCatalog);
    healer().heal(&tier, &spec).unwrap();
    assert_eq!(tier.read("metric_catalog").unwrap().len(), 27);
}

#[test]
fn operational_object_is_created_empty_with_required_columns() {
    let tier = MemoryTier::new();
    let spec = EntitySpec::for_kind(EntityKind::Operational(
        revcycle_core::types::DatasetKind::Billing,
    ));
    let report = healer().heal(&tier, &spec).unwrap();
    assert_eq!(report.actions.len(), 1);
    assert_eq!(
        tier.columns("ope_billing").unwrap(),
        vec!["year", "month", "load_timestamp"]
    );
}

#[test]
fn unreachable_tier_is_an_error_not_a_report() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"file").unwrap();
    let tier = CsvTier::new(blocker.join("flat"));
    let err = healer()
        .heal(&tier, &EntitySpec::for_kind(EntityKind::Users))
        .unwrap_err();
    assert!(err.is_unreachable());
}

// ═══════════════════════════════════════════════════════════════════════════
// LEGACY SCHEMAS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn legacy_user_headers_are_renamed_in_place() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("usuarios.csv"),
        "usuario,password,rol\nana,s3cret,admin\n",
    )
    .unwrap();
    let store = csv_store(dir.path());

    let users = store.users().unwrap();
    assert_eq!(users.len(), 1, "an existing admin means nothing is seeded");
    assert_eq!(users[0].identity, "ana");
    assert_eq!(users[0].secret, "s3cret");

    let header = std::fs::read_to_string(dir.path().join("usuarios.csv")).unwrap();
    let header = header.lines().next().unwrap();
    assert_eq!(header, "identity,secret,role,scope");
    assert!(store.authenticate("ana", "s3cret").is_some());
}

#[test]
fn legacy_operational_headers_are_renamed_in_sqlite() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("revcycle.db");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE facturacion (\"Año\" INTEGER, \"MES\" TEXT, invoice TEXT);
             INSERT INTO facturacion VALUES (2026, 'Enero', 'F-1');",
        )
        .unwrap();
    }
    let tier = SqliteTier::new(&path);
    let spec = EntitySpec::for_kind(EntityKind::Operational(
        revcycle_core::types::DatasetKind::Billing,
    ));
    let report = healer().heal(&tier, &spec).unwrap();

    let renamed: Vec<(&str, &str)> = report
        .actions
        .iter()
        .filter_map(|a| match a {
            RepairAction::RenamedColumn { from, to, .. } => Some((from.as_str(), to.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(renamed, vec![("Año", "year"), ("MES", "month")]);
    assert!(report
        .actions
        .iter()
        .any(|a| matches!(a, RepairAction::AddedColumn { column, .. } if column == "load_timestamp")));

    let table = tier.read("facturacion").unwrap();
    assert_eq!(table.cell(0, "year"), &Value::Number(2026.0));
    assert_eq!(table.cell(0, "month"), &Value::from("Enero"));
    assert_eq!(table.cell(0, "invoice"), &Value::from("F-1"));
}

#[test]
fn wide_catalog_is_migrated_to_observations() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("datos_indicadores_historico.csv"),
        "ÁREA,RESPONSABLE,INDICADOR,META_VALOR,LOGICA,META_TEXTO,NOV-25,DIC-25\n\
         CARTERA,Jefe Cartera,Recuperación de Glosa,0.85,MAX,> 85%,0.9,\n",
    )
    .unwrap();
    let store = csv_store(dir.path());

    let view = store.metric_view(None).unwrap();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].definition.name, "Recuperación de Glosa");
    assert_eq!(view.rows[0].cells[0], Cell::Value(0.9));
    assert_eq!(view.rows[0].cells[1], Cell::NoData);
    assert_eq!(view.rows[0].status(0), Some(true));
    assert!(dir.path().join("metric_observations.csv").exists());
}

#[test]
fn payload_columns_resembling_legacy_names_are_not_renamed() {
    let tier = MemoryTier::new();
    let mut row = revcycle_core::types::Row::new();
    row.insert("No".into(), Value::Number(1.0));
    row.insert("Meses Mora".into(), Value::Number(3.0));
    row.insert("Valor".into(), Value::Number(1000.0));
    tier.write(
        "ope_collections",
        &revcycle_core::types::Table::from_rows(&["No", "Meses Mora", "Valor"], vec![row]),
        &revcycle_core::types::WriteMode::ReplaceAll,
    )
    .unwrap();
    let spec = EntitySpec::for_kind(EntityKind::Operational(
        revcycle_core::types::DatasetKind::Collections,
    ));
    let report = healer().heal(&tier, &spec).unwrap();

    assert!(!report
        .actions
        .iter()
        .any(|a| matches!(a, RepairAction::RenamedColumn { .. })));
    assert_eq!(report.actions.len(), 3, "year, month and load_timestamp are added");

    let table = tier.read("ope_collections").unwrap();
    assert_eq!(table.cell(0, "No"), &Value::Number(1.0));
    assert_eq!(table.cell(0, "Meses Mora"), &Value::Number(3.0));
    assert_eq!(table.cell(0, "year"), &Value::Null);
    assert_eq!(table.cell(0, "month"), &Value::Null);
}

// ═══════════════════════════════════════════════════════════════════════════
// ADMINISTRATOR
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn existing_admin_secret_is_never_overwritten() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("users.csv"),
        "identity,secret,role,scope\nadmin,custom-pass,admin,all\n",
    )
    .unwrap();
    let store = csv_store(dir.path());

    store.heal("users").unwrap();
    store.heal("users").unwrap();
    assert!(store.authenticate("admin", "admin123").is_none());
    assert!(store.authenticate("admin", "custom-pass").is_some());
    assert_eq!(store.users().unwrap().len(), 1);
}

#[test]
fn demoted_bootstrap_identity_blocks_seeding() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("users.csv"),
        "identity,secret,role,scope\nadmin,x,viewer,all\n",
    )
    .unwrap();
    let store = csv_store(dir.path());

    let report = store.heal("users").unwrap();
    assert!(report.actions.is_empty());
    assert!(report.warnings.iter().any(|w| w.contains("left unchanged")));

    let users = store.users().unwrap();
    assert_eq!(users.len(), 1);
    assert!(!users[0].is_admin());
}

// ═══════════════════════════════════════════════════════════════════════════
// CORRUPTION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn corrupt_csv_is_quarantined_and_regenerated() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("users.csv"),
        "identity,secret,role,scope\nadmin,x,admin,all,extra\n",
    )
    .unwrap();
    let tier = CsvTier::new(dir.path());
    let report = healer()
        .heal(&tier, &EntitySpec::for_kind(EntityKind::Users))
        .unwrap();

    assert!(report.regenerated());
    assert!(!report.warnings.is_empty());
    let quarantined: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok()?.file_name().into_string().ok())
        .filter(|n| n.starts_with("users.csv.corrupt-"))
        .collect();
    assert_eq!(quarantined.len(), 1);

    let users = tier.read("users").unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users.cell(0, "identity"), &Value::from("admin"));
}

// ═══════════════════════════════════════════════════════════════════════════
// IDEMPOTENCY
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn second_heal_is_clean_and_audits_nothing() {
    let dir = tempdir().unwrap();
    let store = RevenueCycleStore::with_tiers(
        vec![
            Box::new(SqliteTier::new(dir.path().join("revcycle.db"))),
            Box::new(CsvTier::new(dir.path().join("flat"))),
        ],
        &RevcycleConfig::default(),
    );

    for entity in ["users", "metric_catalog", "metric_observations", "billing", "audit_log"] {
        store.heal(entity).unwrap();
    }
    let before = store.list_audit(Some(10_000)).unwrap().len();
    assert!(before > 0, "first heal records its repairs");

    for entity in ["users", "metric_catalog", "metric_observations", "billing", "audit_log"] {
        let report = store.heal(entity).unwrap();
        assert!(report.is_clean(), "{entity}: {report:?}");
    }
    assert_eq!(store.list_audit(Some(10_000)).unwrap().len(), before);
}

#[test]
fn healer_run_twice_on_same_tier_is_idempotent() {
    let tier = MemoryTier::new();
    let healer = healer();
    for kind in [EntityKind::Users, EntityKind::MetricCatalog, EntityKind::AuditLog] {
        let spec = EntitySpec::for_kind(kind);
        assert!(!healer.heal(&tier, &spec).unwrap().is_clean());
        assert!(healer.heal(&tier, &spec).unwrap().is_clean());
    }
}
