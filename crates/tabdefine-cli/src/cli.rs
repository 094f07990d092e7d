//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tabdefine::UnmatchedPolicy;
use tabdefine::api::{DEFAULT_API_URL, DEFAULT_SCHEMA, TOKEN_ENV};
use tabdefine::catalog::GeometryKind;

/// tabdefine: derive table definitions from CSV files
#[derive(Parser)]
#[command(name = "tabdefine")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level filter (e.g. "debug", "tabdefine=trace"). Defaults to RUST_LOG or "info".
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the table definition of a data file
    Define {
        /// Path to the data file
        #[arg(value_name = "DATA")]
        data: PathBuf,

        /// Output path (default: <stem>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: InferenceOptions,
    },

    /// Show the inferred type of every column without writing anything
    Infer {
        /// Path to the data file
        #[arg(value_name = "DATA")]
        data: PathBuf,

        #[command(flatten)]
        options: InferenceOptions,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create the table on the platform and insert all rows
    Upload {
        /// Path to the data file
        #[arg(value_name = "DATA")]
        data: PathBuf,

        /// Existing definition file (inferred from DATA when omitted)
        #[arg(long, value_name = "FILE")]
        definition: Option<PathBuf>,

        /// Target table name
        #[arg(long)]
        table: String,

        /// Target schema
        #[arg(long, default_value = DEFAULT_SCHEMA)]
        schema: String,

        /// API token
        #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
        token: Option<String>,

        /// API base URL
        #[arg(long, default_value = DEFAULT_API_URL)]
        api_url: String,

        /// Delete the table first if it exists
        #[arg(long)]
        replace: bool,

        /// Pause between row inserts in milliseconds
        #[arg(long, default_value = "0", value_name = "MS")]
        delay_ms: u64,

        /// Abort on the first failed insert
        #[arg(long)]
        stop_on_error: bool,

        #[command(flatten)]
        options: InferenceOptions,
    },
}

/// Options shared by every command that reads and classifies a data file.
#[derive(Args, Debug, Clone)]
pub struct InferenceOptions {
    /// Field delimiter
    #[arg(long, default_value = ",", value_name = "C")]
    pub sep: char,

    /// Geometry kind of geometry columns (point, multipolygon, ...)
    #[arg(long, value_name = "KIND")]
    pub geom_type: Option<GeometryKind>,

    /// SRID of geometry columns
    #[arg(long, value_name = "N")]
    pub srid: Option<u32>,

    /// Values shorter than this are varchar, longer ones text
    #[arg(long, value_name = "N")]
    pub max_length: Option<usize>,

    /// What to do with columns no type accepts: drop, fail or text
    #[arg(long, default_value = "drop", value_name = "POLICY")]
    pub on_unmatched: UnmatchedPolicy,

    /// Catalog configuration file (JSON); flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Read at most this many data rows
    #[arg(long, value_name = "N")]
    pub max_rows: Option<usize>,
}
