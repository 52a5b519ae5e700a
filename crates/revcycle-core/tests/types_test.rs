//! Typed records over dynamic rows.

use revcycle_core::types::{
    CredentialRecord, DatasetKind, Direction, MetricDefinition, MetricObservation, PeriodCalendar,
    Role, Scope, Table, TierKind, Value,
};

#[test]
fn test_flat_file_cells_keep_identifiers() {
    assert_eq!(Value::from_cell("00123"), Value::Text("00123".into()));
    assert_eq!(Value::from_cell("2026"), Value::Number(2026.0));
    assert_eq!(Value::from_cell("0.95"), Value::Number(0.95));
    assert_eq!(Value::from_cell("   "), Value::Null);
    assert_eq!(Value::Text("0,5".into()).as_f64(), Some(0.5));
}

#[test]
fn test_credential_row_parsing_is_lenient() {
    let mut row = CredentialRecord::new("ana", "s3cret", Role::Editor, Scope::Partition("CARTERA".into()))
        .to_row();
    let back = CredentialRecord::from_row(&row).unwrap();
    assert_eq!(back.role, Role::Editor);
    assert!(back.scope.covers("cartera"));
    assert!(!back.scope.covers("ADMISIONES"));

    row.insert("role".into(), Value::from("Administrador"));
    row.insert("scope".into(), Value::from("TODAS"));
    let admin = CredentialRecord::from_row(&row).unwrap();
    assert!(admin.is_admin());
    assert_eq!(admin.scope, Scope::All);

    row.insert("identity".into(), Value::from("  "));
    assert!(CredentialRecord::from_row(&row).is_none());
}

#[test]
fn test_target_evaluation_by_direction() {
    let mut def = MetricDefinition {
        partition: "CARTERA".into(),
        owner: "Jefatura".into(),
        name: "% de cartera >360 días".into(),
        target_value: 0.36,
        direction: Direction::AtMost,
        target_text: "< 36%".into(),
    };
    assert!(def.meets_target(0.30));
    assert!(def.meets_target(0.36));
    assert!(!def.meets_target(0.40));
    def.direction = Direction::parse("MAX").unwrap();
    assert!(def.meets_target(0.40));
}

#[test]
fn test_observation_requires_numeric_value() {
    let mut row = MetricObservation::new("X", "ENE-26", 0.5).to_row();
    assert!(MetricObservation::from_row(&row).is_some());
    row.insert("value".into(), Value::from("n/a"));
    assert!(MetricObservation::from_row(&row).is_none());
}

#[test]
fn test_calendar_lookup_is_accent_insensitive() {
    let cal = PeriodCalendar::default();
    assert_eq!(cal.labels().first().map(String::as_str), Some("NOV-25"));
    assert_eq!(cal.canonical("dic-26"), Some("DIC-26"));
    assert_eq!(cal.position("ENE-26"), Some(2));
    assert!(!cal.contains("ENE-27"));
}

#[test]
fn test_table_from_rows_widens_columns() {
    let t = Table::from_rows(
        &["year"],
        vec![MetricObservation::new("A", "ENE-26", 1.0).to_row()],
    );
    assert!(t.has_column("year"));
    assert!(t.has_column("metric"));
    assert_eq!(t.cell(0, "year"), &Value::Null);
}

#[test]
fn test_tier_and_dataset_names() {
    assert_eq!(TierKind::parse("SQLite"), Some(TierKind::Relational));
    assert_eq!(TierKind::parse("builtin"), None);
    assert_eq!(DatasetKind::MedicalAccounts.object_name(), "ope_medical_accounts");
}
