//! CLI argument parsing for capstan.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Capstan: deployment script runner with layered variables and live
/// output-variable capture.
///
/// A run builds a variable context from plain, sensitive, and environment
/// layers, hands it to the script as process environment, and watches the
/// script's output for directives that publish variables back to the
/// pipeline while the script is still running.
#[derive(Parser, Debug)]
#[command(name = "capstan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for capstan.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a deployment script.
    ///
    /// Loads the variable layers, executes the script through the
    /// interpreter registered for its extension, captures output variables
    /// emitted as directives, and exits with the script's own exit code.
    RunScript(RunScriptArgs),

    /// Encrypt a plain variables file for use with --sensitive-variables.
    ///
    /// Reads a flat JSON variables file and writes the password-protected
    /// container format that run-script can decrypt.
    EncryptVariables(EncryptVariablesArgs),
}

/// Arguments for the `run-script` command.
#[derive(Parser, Debug)]
pub struct RunScriptArgs {
    /// Path to the script to run.
    #[arg(long)]
    pub script: PathBuf,

    /// JSON variables file loaded into the base layer.
    #[arg(long)]
    pub variables: Option<PathBuf>,

    /// Encrypted sensitive variables file.
    #[arg(long)]
    pub sensitive_variables: Option<PathBuf>,

    /// Password for the sensitive variables file.
    #[arg(long)]
    pub sensitive_variables_password: Option<String>,

    /// Where captured output variables are saved as JSON. If the file
    /// already exists, its values seed the store before the run.
    #[arg(long)]
    pub output_variables: Option<PathBuf>,

    /// Config file with interpreter overrides and runner settings.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Append a run record to this NDJSON journal (overrides config).
    #[arg(long)]
    pub journal: Option<PathBuf>,

    /// Print the resolved variable context before running. Sensitive and
    /// credential-looking values are masked.
    #[arg(long)]
    pub print_variables: bool,
}

/// Arguments for the `encrypt-variables` command.
#[derive(Parser, Debug)]
pub struct EncryptVariablesArgs {
    /// Plain JSON variables file to encrypt.
    #[arg(long)]
    pub variables: PathBuf,

    /// Where to write the encrypted file.
    #[arg(long)]
    pub output: PathBuf,

    /// Password protecting the file.
    #[arg(long)]
    pub password: String,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
