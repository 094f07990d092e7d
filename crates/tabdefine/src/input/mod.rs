//! Input reading and data source handling.

mod reader;
mod source;

pub use reader::{CsvReader, ReaderConfig};
pub use source::{DataTable, SourceMetadata};
