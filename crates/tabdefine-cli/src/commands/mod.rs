//! CLI command implementations.

pub mod define;
pub mod infer;
pub mod upload;

use colored::Colorize;
use tabdefine::inference::{AssemblyReport, ColumnStatus};
use tabdefine::{CatalogConfig, ReaderConfig, TabdefConfig};

use crate::cli::InferenceOptions;

/// Build the library configuration from the shared options.
pub fn build_config(
    options: &InferenceOptions,
) -> Result<TabdefConfig, Box<dyn std::error::Error>> {
    let mut catalog = match &options.config {
        Some(path) => CatalogConfig::from_file(path)?,
        None => CatalogConfig::default(),
    };
    if let Some(kind) = options.geom_type {
        catalog = catalog.with_geometry_kind(kind);
    }
    if let Some(srid) = options.srid {
        catalog = catalog.with_srid(srid);
    }
    if let Some(length) = options.max_length {
        catalog = catalog.with_max_varchar_length(length);
    }

    if !options.sep.is_ascii() {
        return Err(format!(
            "Delimiter must be a single ASCII character, got '{}'",
            options.sep
        )
        .into());
    }
    let mut reader = ReaderConfig::default().with_delimiter(options.sep as u8);
    if let Some(max_rows) = options.max_rows {
        reader = reader.with_max_rows(max_rows);
    }

    Ok(TabdefConfig::default()
        .with_reader(reader)
        .with_catalog(catalog)
        .with_policy(options.on_unmatched))
}

/// Print the columns that did not make it into the definition as typed.
pub fn print_unmatched(report: &AssemblyReport) {
    let dropped: Vec<_> = report.dropped().collect();
    let fallbacks: Vec<_> = report.fallbacks().collect();

    if !dropped.is_empty() {
        println!();
        println!("{}", "Dropped columns:".yellow().bold());
        for column in dropped {
            if let ColumnStatus::Dropped { cause } = &column.status {
                println!("  {} {}", column.source_name.red(), cause.to_string().dimmed());
            }
        }
    }

    if !fallbacks.is_empty() {
        println!();
        println!("{}", "Columns typed as text:".yellow().bold());
        for column in fallbacks {
            if let ColumnStatus::Fallback { cause, .. } = &column.status {
                println!("  {} {}", column.source_name.yellow(), cause.to_string().dimmed());
            }
        }
    }
}
