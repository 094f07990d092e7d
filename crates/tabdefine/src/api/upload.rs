//! Create a remote table from a definition and populate it.

use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{BooleanTokens, CanonicalType};
use crate::error::{ApiError, Result};
use crate::input::DataTable;
use crate::schema::SchemaDocument;

use super::client::{Row, TableApi};

/// Upload settings.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Delete an existing table instead of failing.
    pub replace: bool,
    /// Pause between two row inserts.
    pub insert_delay: Duration,
    /// Abort on the first failed insert.
    pub stop_on_error: bool,
    /// Cells sent as `null`.
    pub null_tokens: Vec<String>,
    /// Tokens rewritten to `true`/`false` in boolean columns.
    pub boolean_tokens: BooleanTokens,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            replace: false,
            insert_delay: Duration::ZERO,
            stop_on_error: false,
            null_tokens: vec![String::new()],
            boolean_tokens: BooleanTokens::default(),
        }
    }
}

impl UploadConfig {
    pub fn with_replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn with_insert_delay(mut self, delay: Duration) -> Self {
        self.insert_delay = delay;
        self
    }

    pub fn with_stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    pub fn with_null_tokens<T: Into<String>>(
        mut self,
        tokens: impl IntoIterator<Item = T>,
    ) -> Self {
        self.null_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_boolean_tokens(mut self, tokens: BooleanTokens) -> Self {
        self.boolean_tokens = tokens;
        self
    }
}

/// A row the server refused.
#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    /// Zero-based data row.
    pub row: usize,
    pub error: String,
}

/// Outcome of an upload.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
    pub schema: String,
    pub table: String,
    /// An existing table was deleted first.
    pub replaced: bool,
    pub inserted: usize,
    pub failures: Vec<RowFailure>,
}

impl UploadReport {
    /// Every row was inserted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Creates the table and inserts every row of a data table.
pub struct Uploader<'a> {
    api: &'a dyn TableApi,
    config: UploadConfig,
}

impl<'a> Uploader<'a> {
    pub fn new(api: &'a dyn TableApi) -> Self {
        Self::with_config(api, UploadConfig::default())
    }

    pub fn with_config(api: &'a dyn TableApi, config: UploadConfig) -> Self {
        Self { api, config }
    }

    /// Create the table described by `document` and insert the rows of `data`.
    ///
    /// Failed inserts are collected in the report, unless `stop_on_error`
    /// is set.
    pub fn upload(&self, document: &SchemaDocument, data: &DataTable) -> Result<UploadReport> {
        let mut report = UploadReport {
            schema: self.api.schema().to_string(),
            table: self.api.table().to_string(),
            ..Default::default()
        };

        if self.api.table_exists()? {
            if !self.config.replace {
                return Err(ApiError::TableExists {
                    schema: report.schema,
                    table: report.table,
                }
                .into());
            }
            info!("Deleting existing table {}.{}", report.schema, report.table);
            self.api.delete_table()?;
            report.replaced = true;
        }

        self.api.create_table(document)?;
        info!("Created table {}.{}", report.schema, report.table);

        let mapping = column_mapping(document, data);
        for (index, cells) in data.rows.iter().enumerate() {
            if index > 0 && !self.config.insert_delay.is_zero() {
                thread::sleep(self.config.insert_delay);
            }

            let row = self.build_row(&mapping, cells);
            match self.api.insert_row(index, &row) {
                Ok(()) => report.inserted += 1,
                Err(e) if self.config.stop_on_error => return Err(e.into()),
                Err(e) => {
                    warn!("Row {} was not inserted: {}", index + 1, e);
                    report.failures.push(RowFailure {
                        row: index,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Inserted {} of {} row(s) into {}.{}",
            report.inserted,
            data.row_count(),
            report.schema,
            report.table
        );

        Ok(report)
    }

    fn build_row(&self, mapping: &[MappedColumn], cells: &[String]) -> Row {
        mapping
            .iter()
            .map(|column| {
                let value = cells
                    .get(column.index)
                    .filter(|v| !self.config.null_tokens.iter().any(|t| t == *v))
                    .map(|v| {
                        let flag = column
                            .boolean
                            .then(|| self.config.boolean_tokens.interpret(v))
                            .flatten();
                        flag.map_or_else(|| v.clone(), |f| f.to_string())
                    });
                (column.name.clone(), value)
            })
            .collect()
    }
}

/// A document column and the source position feeding it.
#[derive(Debug)]
struct MappedColumn {
    index: usize,
    name: String,
    boolean: bool,
}

/// Source positions of the columns present in the document.
///
/// The first header with a given lowercase name owns it. Later duplicates are
/// never uploaded, even when the first one was not typed.
fn column_mapping(document: &SchemaDocument, data: &DataTable) -> Vec<MappedColumn> {
    let mut claimed: Vec<String> = Vec::new();
    let mut mapping = Vec::new();
    for (index, header) in data.headers.iter().enumerate() {
        let name = header.to_lowercase();
        if claimed.contains(&name) {
            continue;
        }
        if let Some(column) = document.data_columns().find(|c| c.name == name) {
            mapping.push(MappedColumn {
                index,
                name: name.clone(),
                boolean: column.data_type == CanonicalType::Boolean.data_type(),
            });
        }
        claimed.push(name);
    }
    mapping
}
