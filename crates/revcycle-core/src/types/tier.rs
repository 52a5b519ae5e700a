//! Storage tier identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of storage tier a result came from. `Builtin` marks the hard-coded
/// default used when every configured tier failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    Document,
    Relational,
    FlatFile,
    Memory,
    Builtin,
}

impl TierKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Relational => "relational",
            Self::FlatFile => "flat_file",
            Self::Memory => "memory",
            Self::Builtin => "builtin",
        }
    }

    /// Parse a tier kind from config text (`"sqlite"` and `"csv"` accepted).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" | "documents" | "json" => Some(Self::Document),
            "relational" | "sqlite" => Some(Self::Relational),
            "flat_file" | "flatfile" | "csv" => Some(Self::FlatFile),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
