//! Operational dataset kinds (one table per revenue-cycle process).

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Billing,
    Collections,
    Authorizations,
    Admissions,
    MedicalAccounts,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 5] = [
        Self::Billing,
        Self::Collections,
        Self::Authorizations,
        Self::Admissions,
        Self::MedicalAccounts,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Self::Billing => "billing",
            Self::Collections => "collections",
            Self::Authorizations => "authorizations",
            Self::Admissions => "admissions",
            Self::MedicalAccounts => "medical_accounts",
        }
    }

    /// Canonical object name in every tier.
    pub fn object_name(self) -> String {
        format!("ope_{}", self.slug())
    }

    /// Names older installations used for the same table, in preference order.
    pub fn legacy_names(self) -> &'static [&'static str] {
        match self {
            Self::Billing => &["billing", "ope_facturacion", "facturacion"],
            Self::Collections => &["collections", "ope_cartera", "cartera", "recaudo"],
            Self::Authorizations => &["authorizations", "ope_autorizaciones", "autorizaciones"],
            Self::Admissions => &["admissions", "ope_admisiones", "admisiones"],
            Self::MedicalAccounts => &[
                "medical_accounts",
                "ope_cuentas_medicas",
                "cuentas_medicas",
                "glosas",
            ],
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
