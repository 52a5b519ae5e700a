//! Shared constants for the revcycle persistence layer.

/// revcycle version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default KPI reporting calendar (Nov-2025 through Dec-2026).
pub const DEFAULT_PERIOD_LABELS: [&str; 14] = [
    "NOV-25", "DIC-25", "ENE-26", "FEB-26", "MAR-26", "ABR-26", "MAY-26", "JUN-26", "JUL-26",
    "AGO-26", "SEP-26", "OCT-26", "NOV-26", "DIC-26",
];

/// Default bootstrap administrator identity.
pub const DEFAULT_ADMIN_IDENTITY: &str = "admin";

/// Default bootstrap administrator secret. Only ever written when no
/// administrator exists.
pub const DEFAULT_ADMIN_SECRET: &str = "admin123";

/// Default number of audit entries returned by `list_audit`.
pub const DEFAULT_AUDIT_LIMIT: usize = 50;

/// Default data directory (relative to the project root).
pub const DEFAULT_DATA_DIR: &str = "data";

/// SQLite file name inside the data directory.
pub const SQLITE_FILE_NAME: &str = "revcycle.db";

/// Document-store directory inside the data directory.
pub const DOCUMENT_DIR_NAME: &str = "documents";

/// Flat-file directory inside the data directory.
pub const FLAT_FILE_DIR_NAME: &str = "flat";

/// Default tier order, highest priority first.
pub const DEFAULT_TIER_ORDER: [&str; 2] = ["relational", "flat_file"];

/// The official revenue-cycle KPI catalog:
/// (partition, owner, name, target value, direction, target text).
pub const BUILTIN_METRICS: [(&str, &str, &str, f64, &str, &str); 27] = [
    ("FACTURACIÓN", "Dir. Facturación", "Facturación oportuna (≤72h egreso)", 0.95, "AT_LEAST", ">95%"),
    ("FACTURACIÓN", "Dir. Facturación", "Radicación oportuna (≤22 días)", 0.98, "AT_LEAST", ">98%"),
    ("FACTURACIÓN", "Dir. Facturación", "Cierre de cargos abiertos (≤30 días)", 0.90, "AT_LEAST", ">90%"),
    ("FACTURACIÓN", "Dir. Facturación", "Depuración de vigencias anteriores", 0.02, "AT_MOST", "<2%"),
    ("CUENTAS MÉDICAS", "Jefatura Cuentas Médicas", "% de glosas aceptadas en el mes", 0.02, "AT_MOST", "<2%"),
    ("CUENTAS MÉDICAS", "Jefatura Cuentas Médicas", "% de glosas respondidas en ≤7 días hábiles", 0.50, "AT_LEAST", ">50%"),
    ("CUENTAS MÉDICAS", "Jefatura Cuentas Médicas", "% de devoluciones de facturas respondidas oportunamente", 0.30, "AT_LEAST", ">30%"),
    ("CUENTAS MÉDICAS", "Jefatura Cuentas Médicas", "% de cumplimiento del cronograma de conciliaciones con entidades", 1.00, "AT_LEAST", "100%"),
    ("CUENTAS MÉDICAS", "Jefatura Cuentas Médicas", "% efectividad en conciliación", 0.75, "AT_LEAST", ">75%"),
    ("ADMISIONES", "Coordinación Admisiones", "% de facturas anuladas por falta de autorización", 0.01, "AT_MOST", "≤ 1%"),
    ("ADMISIONES", "Coordinación Admisiones", "% de facturas anuladas por error en datos de identificación", 0.005, "AT_MOST", "≤ 0.5%"),
    ("ADMISIONES", "Coordinación Admisiones", "% de facturas anuladas por error en escogencia del tipo de usuario", 0.005, "AT_MOST", "≤ 0.5%"),
    ("ADMISIONES", "Coordinación Admisiones", "% de facturas anuladas por error en selección de asegurador", 0.005, "AT_MOST", "≤ 0.5%"),
    ("ADMISIONES", "Coordinación Admisiones", "% de quejas por actitud de servicio en admisión", 0.02, "AT_MOST", "≤ 2%"),
    ("AUTORIZACIONES", "Coord. Autorizaciones", "% de autorizaciones de urgencias y hospitalización generadas en ≤7 horas", 1.00, "AT_LEAST", "100%"),
    ("AUTORIZACIONES", "Coord. Autorizaciones", "% de autorizaciones de urgencias y hospitalización generadas en ≤9 horas", 0.60, "AT_MOST", "< 60%"),
    ("AUTORIZACIONES", "Coord. Autorizaciones", "% de solicitudes de tecnologias no convenidas gestionadas integralmente", 0.70, "AT_LEAST", "≥ 70%"),
    ("AUTORIZACIONES", "Coord. Autorizaciones", "% de solicitudes de tecnologías no cubiertas de planes voluntarios gestionadas", 1.00, "AT_LEAST", "100%"),
    ("AUTORIZACIONES", "Coord. Autorizaciones", "% de glosa por falta de autorización o error aceptada", 1.00, "AT_LEAST", "100%"),
    ("CARTERA", "Jefatura de Cartera", "% De cumplimiento de la meta de días de rotación de cartera (DSO)", 1.00, "AT_LEAST", "100%"),
    ("CARTERA", "Jefatura de Cartera", "% de cartera vencida >60 días", 0.60, "AT_MOST", "< 60%"),
    ("CARTERA", "Jefatura de Cartera", "% de recaudo sobre facturación del periodo", 0.70, "AT_LEAST", "≥ 70%"),
    ("CARTERA", "Jefe Cartera", "Recuperación de Glosa", 0.85, "AT_LEAST", "> 85%"),
    ("CARTERA", "Jefatura de Cartera", "% de conciliaciones realizadas en el mes", 1.00, "AT_LEAST", "100%"),
    ("CARTERA", "Jefatura de Cartera", "% de reuniones efectivas con actores clave de clientes pagadores", 1.00, "AT_LEAST", "100%"),
    ("CARTERA", "Jefatura de Cartera", "% de cumplimiento del comité de cartera mensual", 1.00, "AT_LEAST", "100%"),
    ("CARTERA", "Jefatura de Cartera", "% de cartera >360 días", 0.36, "AT_MOST", "< 36%"),
];
