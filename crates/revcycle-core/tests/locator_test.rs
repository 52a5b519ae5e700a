//! Normalizer and schema-locator behavior, including property tests.

use proptest::prelude::*;

use revcycle_core::locator::{locate, resolve, resolve_column, MatchKind};
use revcycle_core::normalize::{normalize, same_identifier};

const NO_ALIASES: [&str; 0] = [];

#[test]
fn test_exact_match_wins_over_normalized() {
    let existing = ["USERS", "users"];
    let hit = locate("users", &NO_ALIASES, &existing).unwrap();
    assert_eq!(hit.name, "users");
    assert_eq!(hit.kind, MatchKind::Exact);
}

#[test]
fn test_accent_and_case_variance_resolves() {
    let columns = ["Año", "MES", "Valor Facturado"];
    assert_eq!(
        resolve_column("year", &["año", "anio"], &columns).as_deref(),
        Some("Año")
    );
    assert_eq!(resolve_column("month", &["mes"], &columns).as_deref(), Some("MES"));
}

#[test]
fn test_substring_fallback_for_versioned_objects() {
    let hit = locate("ope_billing", &["billing"], &["OPE_BILLING_V2"]).unwrap();
    assert_eq!(hit.name, "OPE_BILLING_V2");
    assert_eq!(hit.kind, MatchKind::Substring);
}

#[test]
fn test_aliases_tried_in_declaration_order() {
    let existing = ["kpi_values", "resultados"];
    let found = resolve("metric_observations", &["resultados", "kpi_values"], &existing);
    assert_eq!(found.as_deref(), Some("resultados"));
}

#[test]
fn test_absent_is_none_not_error() {
    let existing: [&str; 0] = [];
    assert_eq!(resolve("users", &["usuarios"], &existing), None);
    assert_eq!(resolve("users", &["usuarios"], &["audit_log"]), None);
}

#[test]
fn test_blank_aliases_never_match() {
    assert_eq!(resolve("zzz", &["", "   "], &["anything", ""]), None);
}

proptest! {
    #[test]
    fn prop_normalize_idempotent(s in "[a-zA-ZáéíóúñÁÉÍÓÚÑü _\\-0-9]{0,40}") {
        let once = normalize(&s);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn prop_normalize_has_no_edge_or_double_spaces(s in "[ a-zñáé\\t]{0,40}") {
        let n = normalize(&s);
        prop_assert!(!n.starts_with(' ') && !n.ends_with(' '));
        prop_assert!(!n.contains("  "));
    }

    #[test]
    fn prop_case_and_accent_insensitive(s in "[a-z]{1,12}") {
        let upper = s.to_uppercase();
        prop_assert!(same_identifier(&s, &upper));
        let accented = s.replace('a', "á").replace('e', "é");
        prop_assert!(same_identifier(&accented, &upper));
    }

    #[test]
    fn prop_present_target_always_resolves(
        names in proptest::collection::vec("[a-z_]{1,10}", 1..6),
        pick in 0usize..6,
    ) {
        let target = names[pick % names.len()].clone();
        let hit = locate(&target, &NO_ALIASES, &names).unwrap();
        prop_assert_eq!(hit.kind, MatchKind::Exact);
        prop_assert_eq!(hit.name, target);
    }
}
