//! Writing and reading definition files.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::info;

use crate::error::{Result, TabdefError};

use super::document::SchemaDocument;

/// Renders [`SchemaDocument`]s as JSON with sorted keys and four-space
/// indentation, so equal documents always produce equal bytes.
pub struct SchemaWriter;

impl SchemaWriter {
    /// Render a document.
    pub fn to_json_string(document: &SchemaDocument) -> Result<String> {
        // `serde_json::Value` keeps object keys in a BTreeMap, which sorts them.
        let value = serde_json::to_value(document)?;

        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        value.serialize(&mut serializer)?;

        String::from_utf8(buffer)
            .map_err(|e| TabdefError::Persistence(format!("definition is not UTF-8: {}", e)))
    }

    /// Write a document to `path`, creating parent directories.
    pub fn save(document: &SchemaDocument, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    TabdefError::Persistence(format!(
                        "Failed to create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let json = Self::to_json_string(document)?;
        fs::write(path, json).map_err(|e| {
            TabdefError::Persistence(format!(
                "Failed to write file '{}': {}",
                path.display(),
                e
            ))
        })?;

        info!(
            "Saved definition with {} column(s) to {}",
            document.columns().len(),
            path.display()
        );
        Ok(())
    }

    /// Load a document from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<SchemaDocument> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| {
            TabdefError::Persistence(format!(
                "Failed to open file '{}': {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            TabdefError::Persistence(format!(
                "Failed to parse definition '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// `<stem>.json` in the working directory, where the stem is the file
    /// name up to its first dot.
    pub fn default_output_path(data_path: impl AsRef<Path>) -> PathBuf {
        let file_name = data_path
            .as_ref()
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = file_name.split('.').next().unwrap_or_default();
        let stem = if stem.is_empty() { "table" } else { stem };
        PathBuf::from(format!("{}.json", stem))
    }
}
