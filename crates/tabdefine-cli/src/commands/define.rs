//! Define command - write the table definition of a data file.

use std::path::PathBuf;

use colored::Colorize;
use tabdefine::{SchemaWriter, TableDefiner};

use crate::cli::InferenceOptions;

pub fn run(
    data: PathBuf,
    output: Option<PathBuf>,
    options: InferenceOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let definer = TableDefiner::with_config(super::build_config(&options)?)?;

    println!(
        "{} {}",
        "Defining table for".cyan().bold(),
        data.display().to_string().white()
    );

    let result = definer.define(&data)?;
    let output = output.unwrap_or_else(|| SchemaWriter::default_output_path(&data));
    SchemaWriter::save(&result.document, &output)?;

    println!(
        "  {} row(s), {} column(s)",
        result.source.row_count, result.source.column_count
    );
    println!(
        "  {} typed, {} as text, {} dropped",
        result.summary.typed.to_string().green(),
        result.summary.fallbacks.to_string().yellow(),
        result.summary.dropped.to_string().red()
    );
    for (data_type, count) in &result.summary.columns_by_type {
        println!("    {:<28} {}", data_type, count);
    }

    super::print_unmatched(&result.report);

    println!();
    println!(
        "{} {}",
        "Definition written to".green().bold(),
        output.display()
    );

    Ok(())
}
