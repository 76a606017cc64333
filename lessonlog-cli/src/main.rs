//! `lessonlog` - run progression commands against a JSON snapshot.

mod args;
mod run;
mod telemetry;

use args::Cli;
use clap::Parser;
use lessonlog_core::EngineConfig;
use std::process::ExitCode;
use telemetry::{init_tracing, TelemetryConfig};

fn main() -> ExitCode {
    // Usage and validation errors exit with 2, help and version with 0.
    let cli = Cli::parse();

    init_tracing(&TelemetryConfig::from_env());

    let config = EngineConfig::from_env();
    tracing::debug!(?config, snapshot = %cli.snapshot.display(), "Starting");

    match run::run(&cli, config) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(run::exit_code(e.kind()))
        }
    }
}
