//! `filmcat` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration and logging from `FILMCAT_*` variables.
//! - Run one catalog command and print its JSON result on stdout.
//! - Map failures to exit codes: 2 bad request, 3 missing resource, 1 internal.

use clap::Parser;
use filmcat_core::{init_logging, Catalog, CatalogConfig};
use log::{error, warn};
use std::process::ExitCode;

mod cli;
mod commands;

use commands::CliError;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    let config = match CatalogConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("filmcat: {err}");
            return ExitCode::from(1);
        }
    };
    if let Err(err) = init_logging(&config.logging()) {
        eprintln!("filmcat: logging disabled: {err}");
    }

    let catalog = match Catalog::open(&config) {
        Ok(catalog) => catalog,
        Err(err) => {
            error!("event=cli_start module=cli status=error error={err}");
            eprintln!("filmcat: failed to open catalog: {err}");
            return ExitCode::from(1);
        }
    };

    match commands::run_command(cli.command, &catalog).and_then(|value| render(&value, cli.compact)) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            warn!(
                "event=cli_command module=cli status=error error_code={} error={err}",
                err.code()
            );
            eprintln!("filmcat: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn render(value: &serde_json::Value, compact: bool) -> Result<String, CliError> {
    let output = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(output)
}
