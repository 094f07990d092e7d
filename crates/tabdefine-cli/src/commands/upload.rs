//! Upload command - create the table and insert all rows.

use std::path::PathBuf;
use std::time::Duration;

use colored::Colorize;
use tabdefine::api::{ClientConfig, OepClient, UploadConfig, Uploader};
use tabdefine::{CsvReader, SchemaWriter, TableDefiner};
use tracing::warn;

use crate::cli::InferenceOptions;

/// Arguments of the upload command.
pub struct UploadArgs {
    pub data: PathBuf,
    pub definition: Option<PathBuf>,
    pub table: String,
    pub schema: String,
    pub token: Option<String>,
    pub api_url: String,
    pub replace: bool,
    pub delay_ms: u64,
    pub stop_on_error: bool,
}

pub fn run(args: UploadArgs, options: InferenceOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::build_config(&options)?;
    let null_tokens = config.catalog.null_tokens.clone();
    let boolean_tokens = config.catalog.boolean_tokens.clone();

    let (document, data) = match &args.definition {
        Some(path) => {
            let document = SchemaWriter::load(path)?;
            let (data, _) = CsvReader::with_config(config.reader.clone()).read_file(&args.data)?;
            (document, data)
        }
        None => {
            let result = TableDefiner::with_config(config)?.define(&args.data)?;
            super::print_unmatched(&result.report);
            (result.document, result.data)
        }
    };

    let mut client_config = ClientConfig::new(&args.table)
        .with_schema(&args.schema)
        .with_api_url(&args.api_url);
    match &args.token {
        Some(token) => client_config = client_config.with_token(token),
        None => warn!("No API token given, the server will likely refuse the upload"),
    }
    let client = OepClient::new(client_config)?;

    let upload_config = UploadConfig::default()
        .with_replace(args.replace)
        .with_insert_delay(Duration::from_millis(args.delay_ms))
        .with_stop_on_error(args.stop_on_error)
        .with_null_tokens(null_tokens)
        .with_boolean_tokens(boolean_tokens);

    println!(
        "{} {}.{}",
        "Uploading to".cyan().bold(),
        args.schema,
        args.table.white()
    );

    let report = Uploader::with_config(&client, upload_config).upload(&document, &data)?;

    if report.replaced {
        println!("  {}", "Existing table replaced".yellow());
    }
    println!(
        "  {} of {} row(s) inserted",
        report.inserted.to_string().green(),
        data.row_count()
    );

    if !report.is_complete() {
        println!();
        println!("{}", "Failed rows:".red().bold());
        for failure in &report.failures {
            println!("  row {}: {}", failure.row + 1, failure.error.dimmed());
        }
        return Err(format!("{} row(s) were not inserted", report.failures.len()).into());
    }

    Ok(())
}
