//! Schema document model and its JSON rendering.

mod document;
mod writer;

pub use document::{
    ColumnDefinition, IDENTITY_COLUMN, PRIMARY_KEY, SchemaDocument, TableConstraint,
    TableDefinition,
};
pub use writer::SchemaWriter;
