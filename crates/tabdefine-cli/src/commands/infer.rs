//! Infer command - show the type of every column.

use std::path::PathBuf;

use colored::Colorize;
use tabdefine::TableDefiner;
use tabdefine::inference::ColumnStatus;

use crate::cli::InferenceOptions;

pub fn run(
    data: PathBuf,
    options: InferenceOptions,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let definer = TableDefiner::with_config(super::build_config(&options)?)?;
    let result = definer.define(&data)?;

    if json_output {
        let output = serde_json::json!({
            "file": result.source.file,
            "hash": result.source.hash,
            "rows": result.source.row_count,
            "summary": result.summary,
            "columns": result.report.columns,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Column types for".cyan().bold(),
        result.source.file.white()
    );
    println!();

    let width = result
        .report
        .columns
        .iter()
        .map(|c| c.source_name.chars().count())
        .max()
        .unwrap_or(0);

    for column in &result.report.columns {
        let name = format!("{:<width$}", column.source_name, width = width);
        match &column.status {
            ColumnStatus::Typed { data_type, .. } => {
                println!("  {}  {}", name, data_type.green());
            }
            ColumnStatus::Fallback { data_type, cause } => {
                println!(
                    "  {}  {} {}",
                    name,
                    data_type.yellow(),
                    format!("({})", cause).dimmed()
                );
            }
            ColumnStatus::Dropped { cause } => {
                println!(
                    "  {}  {} {}",
                    name,
                    "dropped".red(),
                    format!("({})", cause).dimmed()
                );
            }
        }
        if column.missing > 0 {
            println!("  {:<width$}  {} missing", "", column.missing, width = width);
        }
    }

    Ok(())
}
