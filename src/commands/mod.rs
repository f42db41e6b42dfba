//! Command implementations for capstan.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod encrypt;
mod run_script;

use crate::cli::Command;
use crate::error::Result;

/// Dispatch a command to its implementation.
///
/// Returns the process exit code on success. `run-script` propagates the
/// script's own exit code, so a non-zero value here means the script
/// failed, not capstan.
pub fn dispatch(command: Command) -> Result<i32> {
    match command {
        Command::RunScript(args) => run_script::cmd_run_script(args),
        Command::EncryptVariables(args) => encrypt::cmd_encrypt_variables(args),
    }
}
