//! The table definition document sent to the table-creation endpoint.

use serde::{Deserialize, Serialize};

use crate::catalog::CanonicalType;

/// Name of the synthetic identity column.
pub const IDENTITY_COLUMN: &str = "id";

/// Constraint type of the identity constraint.
pub const PRIMARY_KEY: &str = "PRIMARY KEY";

/// A column of the table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Lower-case column name.
    pub name: String,
    /// Target type, e.g. `integer` or `geometry(multipolygon)`.
    pub data_type: String,
    /// Length limit for `varchar` columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_maximum_length: Option<usize>,
    /// `"NO"` for mandatory columns; omitted for nullable ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_nullable: Option<String>,
}

impl ColumnDefinition {
    /// Create a nullable column of the given type.
    pub fn new(name: impl Into<String>, data_type: &CanonicalType) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.data_type(),
            character_maximum_length: data_type.character_maximum_length(),
            is_nullable: None,
        }
    }

    /// The auto-incrementing, non-null identity column.
    pub fn identity() -> Self {
        Self {
            is_nullable: Some("NO".to_string()),
            ..Self::new(IDENTITY_COLUMN, &CanonicalType::Serial)
        }
    }

    pub fn is_identity(&self) -> bool {
        self.name == IDENTITY_COLUMN
    }
}

/// A table-level constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConstraint {
    pub constraint_type: String,
    pub constraint_parameter: String,
}

impl TableConstraint {
    /// Primary key over a single column.
    pub fn primary_key(column: impl Into<String>) -> Self {
        Self {
            constraint_type: PRIMARY_KEY.to_string(),
            constraint_parameter: column.into(),
        }
    }
}

/// Columns and constraints of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub columns: Vec<ColumnDefinition>,
    pub constraints: Vec<TableConstraint>,
}

/// The complete document: `{"query": {"columns": [...], "constraints": [...]}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub query: TableDefinition,
}

impl SchemaDocument {
    /// Build a document from typed columns, appending the identity column
    /// and its primary key.
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        let mut columns = columns;
        columns.push(ColumnDefinition::identity());

        Self {
            query: TableDefinition {
                columns,
                constraints: vec![TableConstraint::primary_key(IDENTITY_COLUMN)],
            },
        }
    }

    /// All columns, identity column last.
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.query.columns
    }

    /// Columns derived from the data, without the identity column.
    pub fn data_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.query.columns.iter().filter(|c| !c.is_identity())
    }

    pub fn constraints(&self) -> &[TableConstraint] {
        &self.query.constraints
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.query.columns.iter().find(|c| c.name == name)
    }

    /// Get all column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.query.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_appended() {
        let doc = SchemaDocument::new(vec![ColumnDefinition::new(
            "name",
            &CanonicalType::Varchar { max_length: 50 },
        )]);

        assert_eq!(doc.column_names(), vec!["name", "id"]);
        assert_eq!(doc.data_columns().count(), 1);
        assert_eq!(doc.constraints(), &[TableConstraint::primary_key("id")]);
    }

    #[test]
    fn test_document_shape() {
        let doc = SchemaDocument::new(vec![
            ColumnDefinition::new("name", &CanonicalType::Varchar { max_length: 50 }),
            ColumnDefinition::new("count", &CanonicalType::Integer),
        ]);

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({
                "query": {
                    "columns": [
                        {"name": "name", "data_type": "varchar", "character_maximum_length": 50},
                        {"name": "count", "data_type": "integer"},
                        {"name": "id", "data_type": "serial", "is_nullable": "NO"}
                    ],
                    "constraints": [
                        {"constraint_type": "PRIMARY KEY", "constraint_parameter": "id"}
                    ]
                }
            })
        );
    }

    #[test]
    fn test_deserialize_roundtrip_shape() {
        let text = r#"{"query": {
            "columns": [{"name": "id", "data_type": "serial", "is_nullable": "NO"}],
            "constraints": [{"constraint_type": "PRIMARY KEY", "constraint_parameter": "id"}]
        }}"#;
        let doc: SchemaDocument = serde_json::from_str(text).unwrap();
        assert_eq!(doc, SchemaDocument::new(Vec::new()));
    }
}
