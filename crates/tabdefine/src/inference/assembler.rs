//! Assembles a [`SchemaDocument`] from all columns of a table.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::{CanonicalType, TypeCatalog, TypeKind};
use crate::error::{ConfigError, SchemaError, UnmatchedColumn};
use crate::input::DataTable;
use crate::schema::{ColumnDefinition, IDENTITY_COLUMN, SchemaDocument};

use super::classifier::{Classification, Column, ColumnClassifier, NoMatchReason, Rejection};

/// What to do with a column no type accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Leave the column out and report it.
    #[default]
    DropAndWarn,
    /// Abort with [`SchemaError::UnmatchedColumns`].
    FailFast,
    /// Emit the column as `text` and report it.
    FallbackToText,
}

impl FromStr for UnmatchedPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "drop" | "drop-and-warn" | "drop_and_warn" => Ok(UnmatchedPolicy::DropAndWarn),
            "fail" | "fail-fast" | "fail_fast" => Ok(UnmatchedPolicy::FailFast),
            "text" | "fallback" | "fallback-to-text" | "fallback_to_text" => {
                Ok(UnmatchedPolicy::FallbackToText)
            }
            _ => Err(ConfigError::Invalid(format!(
                "unknown policy '{}'. Use drop, fail or text.",
                s
            ))),
        }
    }
}

impl fmt::Display for UnmatchedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedPolicy::DropAndWarn => write!(f, "drop"),
            UnmatchedPolicy::FailFast => write!(f, "fail"),
            UnmatchedPolicy::FallbackToText => write!(f, "text"),
        }
    }
}

/// Why a column is not in the document with an inferred type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DropReason {
    /// Only missing values.
    Empty,
    /// The name does not match `[A-Za-z_]`.
    InvalidName { message: String },
    /// Another column already has this name (ignoring case).
    DuplicateName,
    /// The name collides with the identity column.
    ReservedName,
    /// Every type rejected some value.
    NoMatchingType { rejections: Vec<Rejection> },
}

impl DropReason {
    /// One-line description.
    pub fn describe(&self) -> String {
        match self {
            DropReason::Empty => "no values".to_string(),
            DropReason::InvalidName { message } => message.clone(),
            DropReason::DuplicateName => "duplicate column name".to_string(),
            DropReason::ReservedName => {
                format!("'{}' is reserved for the identity column", IDENTITY_COLUMN)
            }
            DropReason::NoMatchingType { rejections } => match rejections.last() {
                Some(r) => format!(
                    "no type accepts all values ({}: row {} '{}': {})",
                    r.type_kind, r.row, r.value, r.reason
                ),
                None => "no type accepts all values".to_string(),
            },
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Per-column result of an assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ColumnStatus {
    Typed { type_kind: TypeKind, data_type: String },
    Fallback { data_type: String, cause: DropReason },
    Dropped { cause: DropReason },
}

/// Outcome for one source column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnOutcome {
    /// Header as found in the source.
    pub source_name: String,
    /// Lower-case name used in the document.
    pub name: String,
    /// Zero-based source position.
    pub position: usize,
    /// Number of missing cells.
    pub missing: usize,
    #[serde(flatten)]
    pub status: ColumnStatus,
}

/// What happened to every source column, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyReport {
    pub columns: Vec<ColumnOutcome>,
}

impl AssemblyReport {
    /// Columns that received an inferred type.
    pub fn typed(&self) -> impl Iterator<Item = &ColumnOutcome> {
        self.columns
            .iter()
            .filter(|c| matches!(c.status, ColumnStatus::Typed { .. }))
    }

    /// Columns emitted as `text` because nothing matched.
    pub fn fallbacks(&self) -> impl Iterator<Item = &ColumnOutcome> {
        self.columns
            .iter()
            .filter(|c| matches!(c.status, ColumnStatus::Fallback { .. }))
    }

    /// Columns left out of the document.
    pub fn dropped(&self) -> impl Iterator<Item = &ColumnOutcome> {
        self.columns
            .iter()
            .filter(|c| matches!(c.status, ColumnStatus::Dropped { .. }))
    }

    pub fn has_dropped(&self) -> bool {
        self.dropped().next().is_some()
    }
}

/// A schema document with its report.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub document: SchemaDocument,
    pub report: AssemblyReport,
}

/// Classifies every column of a table and builds the schema document.
#[derive(Debug, Clone, Default)]
pub struct SchemaAssembler {
    catalog: TypeCatalog,
    policy: UnmatchedPolicy,
}

impl SchemaAssembler {
    /// Create an assembler with the drop-and-warn policy.
    pub fn new(catalog: TypeCatalog) -> Self {
        Self {
            catalog,
            policy: UnmatchedPolicy::default(),
        }
    }

    /// Set the policy for unmatched columns.
    pub fn with_policy(mut self, policy: UnmatchedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> UnmatchedPolicy {
        self.policy
    }

    /// Assemble the document for a table.
    pub fn assemble(&self, table: &DataTable) -> Result<Assembly, SchemaError> {
        self.assemble_columns(table.columns())
    }

    /// Assemble the document for columns given in source order.
    pub fn assemble_columns<'a>(
        &self,
        columns: impl IntoIterator<Item = Column<'a>>,
    ) -> Result<Assembly, SchemaError> {
        let classifier = ColumnClassifier::new(&self.catalog);
        let mut seen: HashSet<String> = HashSet::new();
        let mut definitions = Vec::new();
        let mut outcomes = Vec::new();

        for (position, column) in columns.into_iter().enumerate() {
            let name = column.name.to_lowercase();
            let missing = column
                .values
                .iter()
                .filter(|v| self.catalog.is_missing(v))
                .count();

            let status = if name == IDENTITY_COLUMN {
                ColumnStatus::Dropped {
                    cause: DropReason::ReservedName,
                }
            } else if seen.contains(&name) {
                ColumnStatus::Dropped {
                    cause: DropReason::DuplicateName,
                }
            } else {
                match classifier.classify(&column) {
                    Classification::Matched(descriptor) => {
                        let canonical = descriptor.canonical_type();
                        definitions.push(ColumnDefinition::new(&name, canonical));
                        ColumnStatus::Typed {
                            type_kind: descriptor.kind(),
                            data_type: canonical.data_type(),
                        }
                    }
                    Classification::NoMatch(NoMatchReason::InvalidName(e)) => {
                        ColumnStatus::Dropped {
                            cause: DropReason::InvalidName {
                                message: e.to_string(),
                            },
                        }
                    }
                    Classification::NoMatch(NoMatchReason::Empty) => {
                        self.unmatched(&name, DropReason::Empty, &mut definitions)
                    }
                    Classification::NoMatch(NoMatchReason::Rejected(rejections)) => self
                        .unmatched(
                            &name,
                            DropReason::NoMatchingType { rejections },
                            &mut definitions,
                        ),
                }
            };

            // The first column with a name owns it, whatever its outcome.
            seen.insert(name.clone());

            match &status {
                ColumnStatus::Dropped { cause } => {
                    warn!("Column '{}' dropped: {}", column.name, cause);
                }
                ColumnStatus::Fallback { cause, .. } => {
                    warn!("Column '{}' typed as text: {}", column.name, cause);
                }
                ColumnStatus::Typed { .. } => {}
            }

            outcomes.push(ColumnOutcome {
                source_name: column.name.to_string(),
                name,
                position,
                missing,
                status,
            });
        }

        let report = AssemblyReport { columns: outcomes };

        if self.policy == UnmatchedPolicy::FailFast && report.has_dropped() {
            let unmatched = report
                .dropped()
                .map(|c| UnmatchedColumn {
                    name: c.source_name.clone(),
                    reason: match &c.status {
                        ColumnStatus::Dropped { cause } => cause.describe(),
                        _ => String::new(),
                    },
                })
                .collect();
            return Err(SchemaError::UnmatchedColumns(unmatched));
        }

        info!(
            "Assembled definition: {} typed, {} fallback, {} dropped",
            report.typed().count(),
            report.fallbacks().count(),
            report.dropped().count()
        );

        Ok(Assembly {
            document: SchemaDocument::new(definitions),
            report,
        })
    }

    fn unmatched(
        &self,
        name: &str,
        cause: DropReason,
        definitions: &mut Vec<ColumnDefinition>,
    ) -> ColumnStatus {
        match self.policy {
            UnmatchedPolicy::FallbackToText => {
                let text = CanonicalType::Text;
                definitions.push(ColumnDefinition::new(name, &text));
                ColumnStatus::Fallback {
                    data_type: text.data_type(),
                    cause,
                }
            }
            UnmatchedPolicy::DropAndWarn | UnmatchedPolicy::FailFast => {
                ColumnStatus::Dropped { cause }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PRIMARY_KEY, SchemaWriter};

    fn table(headers: &[&str], rows: &[&[&str]]) -> DataTable {
        DataTable::new(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn sample_table() -> DataTable {
        table(
            &["Ort", "Teilnehmer", "Anteil", "Aktiv", "Notiz"],
            &[
                &["Berlin", "120", "1.5", "yes", "yes"],
                &["Hamburg", "85", "2.75", "no", "vertagt"],
            ],
        )
    }

    #[test]
    fn test_assemble_types_and_order() {
        let assembly = SchemaAssembler::default().assemble(&sample_table()).unwrap();
        let doc = &assembly.document;

        assert_eq!(
            doc.column_names(),
            vec!["ort", "teilnehmer", "anteil", "aktiv", "id"]
        );
        assert_eq!(doc.get_column("ort").unwrap().data_type, "varchar");
        assert_eq!(
            doc.get_column("ort").unwrap().character_maximum_length,
            Some(50)
        );
        assert_eq!(doc.get_column("teilnehmer").unwrap().data_type, "integer");
        assert_eq!(doc.get_column("anteil").unwrap().data_type, "double precision");
        assert_eq!(doc.get_column("aktiv").unwrap().data_type, "boolean");
    }

    #[test]
    fn test_unmatched_column_is_reported() {
        let assembly = SchemaAssembler::default().assemble(&sample_table()).unwrap();
        let dropped: Vec<&ColumnOutcome> = assembly.report.dropped().collect();

        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].source_name, "Notiz");
        assert_eq!(dropped[0].position, 4);
        assert!(matches!(
            dropped[0].status,
            ColumnStatus::Dropped {
                cause: DropReason::NoMatchingType { .. }
            }
        ));
        assert!(assembly.document.get_column("notiz").is_none());
    }

    #[test]
    fn test_fail_fast_policy() {
        let assembler = SchemaAssembler::default().with_policy(UnmatchedPolicy::FailFast);
        match assembler.assemble(&sample_table()) {
            Err(SchemaError::UnmatchedColumns(columns)) => {
                assert_eq!(columns.len(), 1);
                assert_eq!(columns[0].name, "Notiz");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_fallback_policy() {
        let assembler = SchemaAssembler::default().with_policy(UnmatchedPolicy::FallbackToText);
        let assembly = assembler.assemble(&sample_table()).unwrap();

        assert_eq!(assembly.document.get_column("notiz").unwrap().data_type, "text");
        assert_eq!(assembly.report.fallbacks().count(), 1);
        assert!(!assembly.report.has_dropped());
    }

    #[test]
    fn test_duplicate_and_reserved_names() {
        let t = table(&["Name", "NAME", "ID"], &[&["a", "b", "1"]]);
        let assembly = SchemaAssembler::default().assemble(&t).unwrap();

        assert_eq!(assembly.document.column_names(), vec!["name", "id"]);
        let causes: Vec<String> = assembly
            .report
            .dropped()
            .map(|c| match &c.status {
                ColumnStatus::Dropped { cause } => cause.describe(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(causes[0], "duplicate column name");
        assert!(causes[1].contains("reserved"));
    }

    #[test]
    fn test_duplicate_of_unmatched_column_is_dropped() {
        let t = table(&["Name", "NAME"], &[&["yes", "10"], &["maybe", "20"]]);
        let assembly = SchemaAssembler::default().assemble(&t).unwrap();

        assert_eq!(assembly.document.column_names(), vec!["id"]);
        let causes: Vec<&ColumnStatus> =
            assembly.report.dropped().map(|c| &c.status).collect();
        assert!(matches!(
            causes[0],
            ColumnStatus::Dropped {
                cause: DropReason::NoMatchingType { .. }
            }
        ));
        assert_eq!(
            causes[1],
            &ColumnStatus::Dropped {
                cause: DropReason::DuplicateName
            }
        );
    }

    #[test]
    fn test_fallback_never_applies_to_invalid_names() {
        let t = table(&["Jahr 2015"], &[&["x"]]);
        let assembler = SchemaAssembler::default().with_policy(UnmatchedPolicy::FallbackToText);
        let assembly = assembler.assemble(&t).unwrap();
        assert_eq!(assembly.document.column_names(), vec!["id"]);
        assert_eq!(assembly.report.dropped().count(), 1);
    }

    #[test]
    fn test_empty_column_dropped() {
        let t = table(&["a", "b"], &[&["1", ""], &["2", ""]]);
        let assembly = SchemaAssembler::default().assemble(&t).unwrap();
        let dropped: Vec<&ColumnOutcome> = assembly.report.dropped().collect();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].missing, 2);
        assert_eq!(
            dropped[0].status,
            ColumnStatus::Dropped {
                cause: DropReason::Empty
            }
        );
    }

    #[test]
    fn test_identity_and_primary_key_always_present() {
        let t = table(&["Jahr 2015"], &[&["x"]]);
        for assembly in [
            SchemaAssembler::default().assemble(&t).unwrap(),
            SchemaAssembler::default().assemble(&sample_table()).unwrap(),
        ] {
            let doc = assembly.document;
            let ids: Vec<&ColumnDefinition> =
                doc.columns().iter().filter(|c| c.name == "id").collect();
            assert_eq!(ids.len(), 1);
            assert_eq!(ids[0].data_type, "serial");
            assert_eq!(ids[0].is_nullable.as_deref(), Some("NO"));
            assert_eq!(doc.columns().last(), Some(ids[0]));
            assert_eq!(doc.constraints().len(), 1);
            assert_eq!(doc.constraints()[0].constraint_type, PRIMARY_KEY);
            assert_eq!(doc.constraints()[0].constraint_parameter, "id");
        }
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let assembler = SchemaAssembler::default();
        let table = sample_table();
        let first = SchemaWriter::to_json_string(&assembler.assemble(&table).unwrap().document);
        let second = SchemaWriter::to_json_string(&assembler.assemble(&table).unwrap().document);
        let (first, second) = (first.unwrap(), second.unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn test_report_serializes_flat() {
        let assembly = SchemaAssembler::default().assemble(&sample_table()).unwrap();
        let value = serde_json::to_value(&assembly.report).unwrap();
        assert_eq!(value["columns"][0]["status"], "typed");
        assert_eq!(value["columns"][0]["type_kind"], "varchar");
        assert_eq!(value["columns"][4]["status"], "dropped");
        assert_eq!(value["columns"][4]["cause"]["reason"], "no_matching_type");
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("drop".parse::<UnmatchedPolicy>().unwrap(), UnmatchedPolicy::DropAndWarn);
        assert_eq!("FAIL".parse::<UnmatchedPolicy>().unwrap(), UnmatchedPolicy::FailFast);
        assert_eq!(
            "text".parse::<UnmatchedPolicy>().unwrap(),
            UnmatchedPolicy::FallbackToText
        );
        assert!("ignore".parse::<UnmatchedPolicy>().is_err());
    }
}
