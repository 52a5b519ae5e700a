//! Backend tests: each tier honours the same tabular contract, quotes
//! identifiers safely and reports corrupt objects as such.

use revcycle_core::types::{Row, Table, TierKind, Value, WriteMode};
use revcycle_storage::tiers::{CsvTier, DocumentTier, MemoryTier, SqliteTier, StorageTier};
use tempfile::tempdir;

fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn people() -> Table {
    Table::from_rows(
        &["identity", "score"],
        vec![
            row(&[("identity", Value::from("ana")), ("score", Value::Number(1.0))]),
            row(&[("identity", Value::from("luis")), ("score", Value::Number(2.0))]),
        ],
    )
}

/// Shared contract run against every backend.
fn exercise_contract(tier: &dyn StorageTier) {
    assert!(tier.list_objects().unwrap().is_empty());
    assert!(tier.read("people").unwrap().is_empty());

    tier.write("people", &people(), &WriteMode::ReplaceAll).unwrap();
    assert_eq!(tier.list_objects().unwrap(), vec!["people".to_string()]);
    assert_eq!(tier.read("people").unwrap().len(), 2);

    let update = Table::from_rows(
        &["identity", "score", "team"],
        vec![row(&[
            ("identity", Value::from("ANA")),
            ("score", Value::Number(5.0)),
            ("team", Value::from("cartera")),
        ])],
    );
    tier.write("people", &update, &WriteMode::UpsertByKey(vec!["identity".into()]))
        .unwrap();
    let table = tier.read("people").unwrap();
    assert_eq!(table.len(), 2, "upsert matches keys on normalized text");
    assert!(table.has_column("team"), "writes widen the stored columns");

    tier.write("people", &people(), &WriteMode::Append).unwrap();
    assert_eq!(tier.read("people").unwrap().len(), 4);

    tier.add_column("people", "scope", &Value::from("all")).unwrap();
    let table = tier.read("people").unwrap();
    assert!(table.rows.iter().all(|r| r.get("scope") == Some(&Value::from("all"))));

    tier.rename_column("people", "score", "value").unwrap();
    let columns = tier.columns("people").unwrap();
    assert!(columns.iter().any(|c| c == "value"));
    assert!(!columns.iter().any(|c| c == "score"));

    tier.write("people", &Table::with_columns(&["identity"]), &WriteMode::ReplaceAll)
        .unwrap();
    assert!(tier.read("people").unwrap().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// CONTRACT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn memory_tier_contract() {
    exercise_contract(&MemoryTier::new());
}

#[test]
fn sqlite_tier_contract() {
    let dir = tempdir().unwrap();
    let tier = SqliteTier::new(dir.path().join("nested").join("revcycle.db"));
    exercise_contract(&tier);
    assert_eq!(tier.kind(), TierKind::Relational);
}

#[test]
fn csv_tier_contract() {
    let dir = tempdir().unwrap();
    exercise_contract(&CsvTier::new(dir.path().join("flat")));
}

#[test]
fn document_tier_contract() {
    let dir = tempdir().unwrap();
    exercise_contract(&DocumentTier::new(dir.path().join("documents")));
}

// ═══════════════════════════════════════════════════════════════════════════
// RELATIONAL
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn sqlite_identifiers_with_quotes_are_inert() {
    let dir = tempdir().unwrap();
    let tier = SqliteTier::new(dir.path().join("revcycle.db"));
    tier.write("users", &people(), &WriteMode::ReplaceAll).unwrap();

    let hostile_object = "x\"; DROP TABLE users; --";
    let hostile_column = "col\" TEXT); DROP TABLE users; --";
    let table = Table::from_rows(
        &[hostile_column],
        vec![row(&[(hostile_column, Value::from("'; DELETE FROM users; --"))])],
    );
    tier.write(hostile_object, &table, &WriteMode::ReplaceAll).unwrap();

    let objects = tier.list_objects().unwrap();
    assert!(objects.iter().any(|o| o == "users"));
    assert!(objects.iter().any(|o| o == hostile_object));
    assert_eq!(tier.read("users").unwrap().len(), 2);

    let back = tier.read(hostile_object).unwrap();
    assert_eq!(back.columns, vec![hostile_column.to_string()]);
    assert_eq!(back.cell(0, hostile_column), &Value::from("'; DELETE FROM users; --"));
}

#[test]
fn sqlite_data_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("revcycle.db");
    SqliteTier::new(&path)
        .write("people", &people(), &WriteMode::ReplaceAll)
        .unwrap();

    let reopened = SqliteTier::new(&path);
    let table = reopened.read("people").unwrap();
    assert_eq!(table.cell(1, "identity"), &Value::from("luis"));
    assert_eq!(table.cell(1, "score"), &Value::Number(2.0));
}

#[test]
fn sqlite_unopenable_path_is_unreachable() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();
    let tier = SqliteTier::new(blocker.join("revcycle.db"));
    let err = tier.list_objects().unwrap_err();
    assert!(err.is_unreachable(), "got {err:?}");
}

// ═══════════════════════════════════════════════════════════════════════════
// FILE TIERS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn ragged_csv_is_corrupt_and_quarantine_moves_it() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("users.csv"), "identity,secret\nadmin,x,extra\n").unwrap();
    let tier = CsvTier::new(dir.path());

    let err = tier.read("users").unwrap_err();
    assert!(err.is_corrupt(), "got {err:?}");

    let moved = tier.quarantine("users").unwrap().unwrap();
    assert!(moved.starts_with("users.csv.corrupt-"));
    assert!(dir.path().join(&moved).exists());
    assert!(!dir.path().join("users.csv").exists());
    assert!(tier.list_objects().unwrap().is_empty());
}

#[test]
fn csv_keeps_leading_zero_identifiers() {
    let dir = tempdir().unwrap();
    let tier = CsvTier::new(dir.path());
    let table = Table::from_rows(
        &["code"],
        vec![row(&[("code", Value::from("00123"))])],
    );
    tier.write("codes", &table, &WriteMode::ReplaceAll).unwrap();
    assert_eq!(tier.read("codes").unwrap().cell(0, "code"), &Value::from("00123"));
}

#[test]
fn document_tier_reads_bare_record_arrays() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("users.json"),
        r#"[{"usuario": "ana", "password": "s3cret"}]"#,
    )
    .unwrap();
    let tier = DocumentTier::new(dir.path());
    let table = tier.read("users").unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.cell(0, "usuario"), &Value::from("ana"));
    assert!(table.has_column("password"));
}

#[test]
fn invalid_json_is_corrupt() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("users.json"), "{not json").unwrap();
    let tier = DocumentTier::new(dir.path());
    assert!(tier.read("users").unwrap_err().is_corrupt());
    assert!(tier.columns("users").unwrap_err().is_corrupt());
}

#[test]
fn quarantine_of_missing_file_is_a_no_op() {
    let dir = tempdir().unwrap();
    assert_eq!(CsvTier::new(dir.path()).quarantine("absent").unwrap(), None);
    assert_eq!(MemoryTier::new().quarantine("absent").unwrap(), None);
}
