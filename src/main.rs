//! Capstan: deployment script runner with layered variables and live
//! output-variable capture.
//!
//! This is the main entry point for the `capstan` CLI. It parses arguments,
//! dispatches to the appropriate command handler, and handles errors with
//! proper exit codes. A script that runs to completion has its exit code
//! passed through verbatim.

mod cli;
mod commands;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod journal;
pub mod output;
pub mod script;
pub mod variables;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match commands::dispatch(cli.command) {
        // Exit statuses are a single byte; a signal-terminated script's -1
        // wraps to 255, same as a shell would report it.
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
