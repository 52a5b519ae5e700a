//! Credential records. Roles are data; nothing here enforces them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::table::Row;
use super::value::Value;
use crate::normalize::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    /// Lenient parse; unknown tags fall back to `Viewer`.
    pub fn parse(text: &str) -> Self {
        match normalize(text).as_str() {
            "ADMIN" | "ADMINISTRADOR" | "ADMINISTRATOR" | "SUPERADMIN" => Self::Admin,
            "EDITOR" | "LIDER" | "LEADER" | "CAPTURISTA" => Self::Editor,
            _ => Self::Viewer,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Either every partition or a single one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    All,
    Partition(String),
}

impl Scope {
    pub fn parse(text: &str) -> Self {
        match normalize(text).as_str() {
            "" | "ALL" | "TODAS" | "TODOS" | "*" => Self::All,
            _ => Self::Partition(text.trim().to_string()),
        }
    }

    /// Whether this scope covers `partition` (accent/case-insensitive).
    pub fn covers(&self, partition: &str) -> bool {
        match self {
            Self::All => true,
            Self::Partition(p) => normalize(p) == normalize(partition),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Partition(p) => f.write_str(p),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub identity: String,
    pub secret: String,
    pub role: Role,
    pub scope: Scope,
}

impl CredentialRecord {
    pub const COLUMNS: [&'static str; 4] = ["identity", "secret", "role", "scope"];

    pub fn new(identity: &str, secret: &str, role: Role, scope: Scope) -> Self {
        Self {
            identity: identity.to_string(),
            secret: secret.to_string(),
            role,
            scope,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("identity".into(), Value::from(self.identity.as_str()));
        row.insert("secret".into(), Value::from(self.secret.as_str()));
        row.insert("role".into(), Value::from(self.role.as_str()));
        row.insert("scope".into(), Value::from(self.scope.to_string()));
        row
    }

    /// `None` when the row has no usable identity.
    pub fn from_row(row: &Row) -> Option<Self> {
        let identity = row.get("identity").and_then(Value::as_text)?;
        if identity.trim().is_empty() {
            return None;
        }
        Some(Self {
            identity,
            secret: row.get("secret").and_then(Value::as_text).unwrap_or_default(),
            role: Role::parse(&row.get("role").map(ToString::to_string).unwrap_or_default()),
            scope: Scope::parse(&row.get("scope").map(ToString::to_string).unwrap_or_default()),
        })
    }
}
