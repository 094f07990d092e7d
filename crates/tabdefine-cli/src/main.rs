//! tabdefine CLI - derive table definitions from CSV files.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let result = match cli.command {
        Commands::Define {
            data,
            output,
            options,
        } => commands::define::run(data, output, options),

        Commands::Infer {
            data,
            options,
            json,
        } => commands::infer::run(data, options, json),

        Commands::Upload {
            data,
            definition,
            table,
            schema,
            token,
            api_url,
            replace,
            delay_ms,
            stop_on_error,
            options,
        } => commands::upload::run(
            commands::upload::UploadArgs {
                data,
                definition,
                table,
                schema,
                token,
                api_url,
                replace,
                delay_ms,
                stop_on_error,
            },
            options,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
