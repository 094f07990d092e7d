//! tabdefine: derive database table definitions from delimited data files.
//!
//! Every column of a CSV file is matched against an ordered catalog of
//! candidate types. The first type that accepts all non-missing values of a
//! column wins, and the result is a table definition document ready for the
//! table-creation endpoint of the Open Energy Platform.
//!
//! # Example
//!
//! ```no_run
//! use tabdefine::{SchemaWriter, TableDefiner};
//!
//! let result = TableDefiner::new().define("protests.csv").unwrap();
//! for column in result.report.dropped() {
//!     println!("dropped: {}", column.source_name);
//! }
//! SchemaWriter::save(&result.document, "protests.json").unwrap();
//! ```

pub mod api;
pub mod catalog;
pub mod error;
pub mod inference;
pub mod input;
pub mod schema;

mod tabdefine;

pub use crate::tabdefine::{DefinitionResult, DefinitionSummary, TabdefConfig, TableDefiner};
pub use catalog::{CanonicalType, CatalogConfig, TypeCatalog, TypeDescriptor, TypeKind, Verdict};
pub use error::{Result, TabdefError};
pub use inference::{
    Assembly, AssemblyReport, Classification, Column, ColumnClassifier, SchemaAssembler,
    UnmatchedPolicy,
};
pub use input::{CsvReader, DataTable, ReaderConfig, SourceMetadata};
pub use schema::{ColumnDefinition, SchemaDocument, SchemaWriter};
