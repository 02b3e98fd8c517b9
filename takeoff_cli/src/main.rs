//! # Takeoff CLI
//!
//! Edit a takeoff session file, recompute components and print the project
//! summary or the detailed cost report.

mod cli;
mod commands;
mod config;
mod logging;
mod output;

use clap::Parser;
use cli::{Cli, OutputFormat};
use config::Config;
use takeoff_core::CalcError;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = Config::load().unwrap_or_default();
    let json_errors = commands::resolve_format(cli.format, &config) == OutputFormat::Json;

    if let Err(e) = commands::execute(cli) {
        eprintln!("Error: {e:#}");
        if json_errors {
            if let Some(calc) = e.downcast_ref::<CalcError>() {
                if let Ok(body) = serde_json::to_string_pretty(&serde_json::json!({
                    "code": calc.error_code(),
                    "error": calc,
                })) {
                    eprintln!("{body}");
                }
            }
        }
        std::process::exit(1);
    }
}
