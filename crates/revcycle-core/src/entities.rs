//! Registry of logical entities: canonical object names, the aliases older
//! installations used, the minimal required schema and the upsert key.

use crate::locator;
use crate::types::{
    AuditEntry, CredentialRecord, DatasetKind, MetricDefinition, MetricObservation, Table, Value,
    WriteMode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Users,
    MetricCatalog,
    MetricObservations,
    Operational(DatasetKind),
    AuditLog,
}

/// Default for a column added by the migrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Null,
    Number(f64),
    Text(&'static str),
}

impl DefaultValue {
    pub fn to_value(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Number(n) => Value::Number(n),
            Self::Text(s) => Value::from(s),
        }
    }
}

/// A column every copy of the entity must have, plus the legacy headers it
/// may still be stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct RequiredColumn {
    pub name: &'static str,
    pub legacy: &'static [&'static str],
    pub default: DefaultValue,
}

const fn required(
    name: &'static str,
    legacy: &'static [&'static str],
    default: DefaultValue,
) -> RequiredColumn {
    RequiredColumn {
        name,
        legacy,
        default,
    }
}

const USER_COLUMNS: [RequiredColumn; 4] = [
    required("identity", &["usuario", "username", "user", "login"], DefaultValue::Text("")),
    required("secret", &["password", "contrasena", "clave", "pass"], DefaultValue::Text("")),
    required("role", &["rol", "perfil"], DefaultValue::Text("viewer")),
    required("scope", &["alcance", "area", "acceso"], DefaultValue::Text("all")),
];

const CATALOG_COLUMNS: [RequiredColumn; 6] = [
    required("partition", &["area", "proceso", "departamento"], DefaultValue::Text("")),
    required("owner", &["responsable", "lider"], DefaultValue::Text("")),
    required("name", &["indicador", "kpi", "metric"], DefaultValue::Text("")),
    required("target_value", &["meta_valor", "valor_meta"], DefaultValue::Number(0.0)),
    required("target_direction", &["logica", "sentido"], DefaultValue::Text("AT_LEAST")),
    required("target_text", &["meta_texto", "texto_meta"], DefaultValue::Text("")),
];

const OBSERVATION_COLUMNS: [RequiredColumn; 3] = [
    required("metric", &["indicador", "kpi", "metrica"], DefaultValue::Text("")),
    required("period", &["mes", "periodo", "month"], DefaultValue::Text("")),
    required("value", &["valor", "resultado", "result"], DefaultValue::Null),
];

const OPERATIONAL_COLUMNS: [RequiredColumn; 3] = [
    required("year", &["año", "anio", "vigencia"], DefaultValue::Null),
    required("month", &["mes", "periodo"], DefaultValue::Null),
    required("load_timestamp", &["fecha_carga", "loaded_at", "fecha_cargue"], DefaultValue::Null),
];

const AUDIT_COLUMNS: [RequiredColumn; 4] = [
    required("timestamp", &["fecha", "fecha_hora"], DefaultValue::Text("")),
    required("actor", &["usuario", "user"], DefaultValue::Text("system")),
    required("action", &["accion"], DefaultValue::Text("")),
    required("detail", &["detalle", "descripcion"], DefaultValue::Text("")),
];

#[derive(Debug, Clone, PartialEq)]
pub struct EntitySpec {
    pub kind: EntityKind,
    /// Canonical object name, used when creating the object.
    pub name: String,
    /// Accepted alternative object names, in preference order.
    pub aliases: Vec<String>,
    pub required: Vec<RequiredColumn>,
    /// Upsert key; empty for append-only or period-scoped entities.
    pub key: Vec<String>,
}

impl EntitySpec {
    pub fn for_kind(kind: EntityKind) -> Self {
        let strings = |xs: &[&str]| xs.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();
        match kind {
            EntityKind::Users => Self {
                kind,
                name: "users".into(),
                aliases: strings(&["usuarios", "credentials", "credenciales"]),
                required: USER_COLUMNS.to_vec(),
                key: strings(&["identity"]),
            },
            EntityKind::MetricCatalog => Self {
                kind,
                name: "metric_catalog".into(),
                aliases: strings(&[
                    "kpi_catalog",
                    "indicadores",
                    "catalogo_indicadores",
                    "datos_indicadores_historico",
                ]),
                required: CATALOG_COLUMNS.to_vec(),
                key: strings(&["name"]),
            },
            EntityKind::MetricObservations => Self {
                kind,
                name: "metric_observations".into(),
                aliases: strings(&["kpi_values", "resultados_indicadores", "resultados"]),
                required: OBSERVATION_COLUMNS.to_vec(),
                key: strings(&MetricObservation::KEY),
            },
            EntityKind::Operational(dataset) => Self {
                kind,
                name: dataset.object_name(),
                aliases: strings(dataset.legacy_names()),
                required: OPERATIONAL_COLUMNS.to_vec(),
                key: Vec::new(),
            },
            EntityKind::AuditLog => Self {
                kind,
                name: "audit_log".into(),
                aliases: strings(&["auditoria", "audit"]),
                required: AUDIT_COLUMNS.to_vec(),
                key: Vec::new(),
            },
        }
    }

    pub fn required_names(&self) -> Vec<&'static str> {
        self.required.iter().map(|c| c.name).collect()
    }

    /// Table with the required columns and no rows.
    pub fn empty_table(&self) -> Table {
        Table::with_columns(&self.required_names())
    }

    /// Required columns not present (exact name) in `columns`.
    pub fn missing_columns<S: AsRef<str>>(&self, columns: &[S]) -> Vec<&RequiredColumn> {
        self.required
            .iter()
            .filter(|r| !columns.iter().any(|c| c.as_ref() == r.name))
            .collect()
    }

    /// Every required column is present under its canonical name.
    pub fn is_schema_valid(&self, table: &Table) -> bool {
        self.missing_columns(&table.columns).is_empty()
    }

    /// Resolve this entity's object among a tier's live object names.
    pub fn resolve_object<S: AsRef<str>>(&self, existing: &[S]) -> Option<String> {
        locator::resolve(&self.name, &self.aliases, existing)
    }

    /// Write mode used for whole-entity saves.
    pub fn default_write_mode(&self) -> WriteMode {
        if self.key.is_empty() {
            WriteMode::ReplaceAll
        } else {
            WriteMode::UpsertByKey(self.key.clone())
        }
    }
}

/// All logical entities the layer knows about.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    specs: Vec<EntitySpec>,
}

impl EntityRegistry {
    pub fn standard() -> Self {
        let mut specs = vec![
            EntitySpec::for_kind(EntityKind::Users),
            EntitySpec::for_kind(EntityKind::MetricCatalog),
            EntitySpec::for_kind(EntityKind::MetricObservations),
        ];
        specs.extend(
            DatasetKind::ALL
                .iter()
                .map(|d| EntitySpec::for_kind(EntityKind::Operational(*d))),
        );
        specs.push(EntitySpec::for_kind(EntityKind::AuditLog));
        Self { specs }
    }

    pub fn specs(&self) -> &[EntitySpec] {
        &self.specs
    }

    pub fn get(&self, kind: EntityKind) -> Option<&EntitySpec> {
        self.specs.iter().find(|s| s.kind == kind)
    }

    /// Resolve a caller-supplied entity name against canonical names and
    /// aliases with the schema locator.
    pub fn find(&self, name: &str) -> Option<&EntitySpec> {
        let labels: Vec<(usize, &str)> = self
            .specs
            .iter()
            .enumerate()
            .flat_map(|(idx, spec)| {
                std::iter::once((idx, spec.name.as_str()))
                    .chain(spec.aliases.iter().map(move |a| (idx, a.as_str())))
            })
            .collect();
        let names: Vec<&str> = labels.iter().map(|(_, l)| *l).collect();
        let hit = locator::resolve::<&str, &str>(name, &[], &names)?;
        labels
            .iter()
            .find(|(_, l)| *l == hit)
            .map(|(idx, _)| &self.specs[*idx])
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

// Keep the canonical column sets of the typed records aligned with the
// registry's required columns.
const _: () = {
    assert!(CredentialRecord::COLUMNS.len() == USER_COLUMNS.len());
    assert!(MetricDefinition::COLUMNS.len() == CATALOG_COLUMNS.len());
    assert!(MetricObservation::COLUMNS.len() == OBSERVATION_COLUMNS.len());
    assert!(AuditEntry::COLUMNS.len() == AUDIT_COLUMNS.len());
};
