//! Error types for the capstan CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.
//! Every fatal failure class carries its own exit code so a pipeline can tell
//! a capstan failure apart from a failing script (see `exit_codes`).

use crate::exit_codes;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for capstan operations.
///
/// Only fatal conditions appear here. Malformed directive lines inside script
/// output are deliberately not an error variant: they are reported as warnings
/// by the message sinks and must never abort a running script.
#[derive(Error, Debug)]
pub enum CapstanError {
    /// Invalid flag combination or invocation.
    #[error("{0}")]
    Usage(String),

    /// No interpreter is registered for the script's file extension.
    #[error(
        "no interpreter registered for script '{}' (extension: {})",
        .script.display(),
        .extension.as_deref().unwrap_or("none")
    )]
    UnsupportedScriptType {
        /// The script path that could not be matched to an interpreter.
        script: PathBuf,
        /// The lowercased extension, if the script had one.
        extension: Option<String>,
    },

    /// A variables file was supplied but could not be read or parsed.
    #[error("variables file '{}': {detail}", .path.display())]
    VariablesFile {
        /// Path of the offending file.
        path: PathBuf,
        /// What went wrong (read failure, parse failure, non-string value).
        detail: String,
    },

    /// The script file does not exist. Checked before any subprocess is created.
    #[error("could not find script file '{}'", .0.display())]
    ScriptNotFound(PathBuf),

    /// The resolved interpreter could not be started.
    #[error("failed to start interpreter '{interpreter}' for '{}': {detail}", .script.display())]
    EngineSpawn {
        /// The interpreter program that failed to launch.
        interpreter: String,
        /// The script that was being run.
        script: PathBuf,
        /// Underlying OS error text.
        detail: String,
    },

    /// The output-variables file could not be written after the script completed.
    #[error("failed to save output variables to '{}': {detail}", .path.display())]
    SaveFailure {
        /// Target path of the output-variables file.
        path: PathBuf,
        /// Underlying I/O error text.
        detail: String,
    },

    /// The sensitive-variables file could not be decrypted.
    #[error("sensitive variables: {0}")]
    Decryption(String),

    /// The config file is missing, unparseable, or failed validation.
    #[error("config: {0}")]
    Config(String),

    /// The run journal could not be appended. Call sites downgrade this to
    /// a warning; a failed journal write never changes the run's outcome.
    #[error("run journal: {0}")]
    Journal(String),
}

impl CapstanError {
    /// Returns the exit code for this error (always in the 64-78 sysexits band).
    pub fn exit_code(&self) -> i32 {
        match self {
            CapstanError::Usage(_) => exit_codes::USAGE,
            CapstanError::UnsupportedScriptType { .. } => exit_codes::USAGE,
            CapstanError::VariablesFile { .. } => exit_codes::VARIABLES_FILE,
            CapstanError::ScriptNotFound(_) => exit_codes::SCRIPT_NOT_FOUND,
            CapstanError::EngineSpawn { .. } => exit_codes::ENGINE_SPAWN,
            CapstanError::SaveFailure { .. } => exit_codes::SAVE_FAILURE,
            CapstanError::Decryption(_) => exit_codes::DECRYPTION,
            CapstanError::Config(_) => exit_codes::CONFIG,
            CapstanError::Journal(_) => exit_codes::SAVE_FAILURE,
        }
    }
}

/// Result type alias for capstan operations.
pub type Result<T> = std::result::Result<T, CapstanError>;
