//! Identifier normalization: the canonical comparison key for free-text
//! labels (table names, column headers, metric names, month names).
//!
//! NFD-decompose, drop combining marks, uppercase, trim, and collapse
//! whitespace runs. "Área", "AREA" and "area " all map to `AREA`.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical comparison key for `input`. Total: never fails, never panics.
pub fn normalize(input: &str) -> String {
    let stripped: String = input.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let upper = stripped.to_uppercase();
    let mut out = String::with_capacity(upper.len());
    for (i, word) in upper.split_whitespace().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// True when `a` and `b` denote the same logical label.
pub fn same_identifier(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_accents_and_folds_case() {
        assert_eq!(normalize("Área"), "AREA");
        assert_eq!(normalize("area "), "AREA");
        assert_eq!(normalize("FACTURACIÓN"), "FACTURACION");
        assert_eq!(normalize("  cuentas   médicas "), "CUENTAS MEDICAS");
    }

    #[test]
    fn keeps_non_letter_symbols() {
        assert_eq!(normalize("ope_billing"), "OPE_BILLING");
        assert_eq!(normalize("NOV-25"), "NOV-25");
        assert_eq!(normalize("Año"), "ANO");
    }

    #[test]
    fn empty_and_blank_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t\n"), "");
    }
}
