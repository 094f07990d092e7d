//! Main TableDefiner struct and public API.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogConfig, TypeCatalog};
use crate::error::Result;
use crate::inference::{Assembly, AssemblyReport, ColumnStatus, SchemaAssembler, UnmatchedPolicy};
use crate::input::{CsvReader, DataTable, ReaderConfig, SourceMetadata};
use crate::schema::SchemaDocument;

/// Configuration for defining a table.
#[derive(Debug, Clone, Default)]
pub struct TabdefConfig {
    /// Reader configuration.
    pub reader: ReaderConfig,
    /// Catalog configuration.
    pub catalog: CatalogConfig,
    /// Handling of columns no type accepts.
    pub policy: UnmatchedPolicy,
}

impl TabdefConfig {
    pub fn with_reader(mut self, reader: ReaderConfig) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_catalog(mut self, catalog: CatalogConfig) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_policy(mut self, policy: UnmatchedPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Result of defining a table from a data file.
#[derive(Debug, Clone)]
pub struct DefinitionResult {
    /// Metadata about the source file.
    pub source: SourceMetadata,
    /// The data that was read.
    pub data: DataTable,
    /// The table definition.
    pub document: SchemaDocument,
    /// What happened to each source column.
    pub report: AssemblyReport,
    /// Summary counts.
    pub summary: DefinitionSummary,
}

/// Summary of a definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionSummary {
    /// Columns in the source.
    pub total_columns: usize,
    pub typed: usize,
    pub fallbacks: usize,
    pub dropped: usize,
    /// Typed columns per data type.
    pub columns_by_type: BTreeMap<String, usize>,
}

impl DefinitionSummary {
    /// Summarize an assembly report.
    pub fn from_report(report: &AssemblyReport) -> Self {
        let mut columns_by_type = BTreeMap::new();
        for outcome in &report.columns {
            let data_type = match &outcome.status {
                ColumnStatus::Typed { data_type, .. } => data_type,
                ColumnStatus::Fallback { data_type, .. } => data_type,
                ColumnStatus::Dropped { .. } => continue,
            };
            *columns_by_type.entry(data_type.clone()).or_insert(0) += 1;
        }

        Self {
            total_columns: report.columns.len(),
            typed: report.typed().count(),
            fallbacks: report.fallbacks().count(),
            dropped: report.dropped().count(),
            columns_by_type,
        }
    }
}

/// Reads a data file and derives its table definition.
pub struct TableDefiner {
    reader: CsvReader,
    assembler: SchemaAssembler,
}

impl TableDefiner {
    /// Create a definer with default configuration.
    pub fn new() -> Self {
        Self {
            reader: CsvReader::new(),
            assembler: SchemaAssembler::default(),
        }
    }

    /// Create a definer with custom configuration.
    pub fn with_config(config: TabdefConfig) -> Result<Self> {
        let catalog = TypeCatalog::new(config.catalog)?;

        Ok(Self {
            reader: CsvReader::with_config(config.reader),
            assembler: SchemaAssembler::new(catalog).with_policy(config.policy),
        })
    }

    pub fn assembler(&self) -> &SchemaAssembler {
        &self.assembler
    }

    /// Read a data file and derive its table definition.
    pub fn define(&self, path: impl AsRef<Path>) -> Result<DefinitionResult> {
        let (data, source) = self.reader.read_file(path)?;
        let Assembly { document, report } = self.define_table(&data)?;
        let summary = DefinitionSummary::from_report(&report);

        Ok(DefinitionResult {
            source,
            data,
            document,
            report,
            summary,
        })
    }

    /// Derive the table definition of data already in memory.
    pub fn define_table(&self, data: &DataTable) -> Result<Assembly> {
        Ok(self.assembler.assemble(data)?)
    }
}

impl Default for TableDefiner {
    fn default() -> Self {
        Self::new()
    }
}
