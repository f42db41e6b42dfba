//! Script engine: interpreter selection and subprocess execution.
//!
//! The engine never interprets script content itself. It maps the script's
//! file extension to an interpreter command line through an
//! [`InterpreterRegistry`], launches that interpreter as a subprocess, and
//! streams its output to the registered sinks.

pub mod engine;

pub use engine::{ExecutionResult, ScriptEngine};

use crate::config::Config;
use crate::error::{CapstanError, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Placeholder in interpreter command templates replaced by the script path.
pub const SCRIPT_PLACEHOLDER: &str = "{script}";

/// Built-in interpreter command lines keyed by script extension.
const BUILTIN_INTERPRETERS: &[(&str, &str)] = &[
    ("sh", "sh {script}"),
    ("bash", "bash {script}"),
    ("ps1", "pwsh -NoProfile -File {script}"),
    ("py", "python3 {script}"),
];

/// Maps script extensions to interpreter command lines.
///
/// Extensions compare case-insensitively and carry no leading dot. Command
/// templates are split shell-style first; the `{script}` placeholder is then
/// substituted into each argument, so script paths containing spaces stay a
/// single argument. A template without the placeholder gets the script path
/// appended as its final argument.
#[derive(Debug, Clone)]
pub struct InterpreterRegistry {
    templates: BTreeMap<String, String>,
}

impl InterpreterRegistry {
    /// The built-in interpreter table, with no config applied.
    pub fn builtin() -> Self {
        let templates = BUILTIN_INTERPRETERS
            .iter()
            .map(|(ext, command)| (ext.to_string(), command.to_string()))
            .collect();
        Self { templates }
    }

    /// The built-in table with config entries layered on top.
    ///
    /// Config entries win over built-ins for the same extension. Templates
    /// are checked for shell-style quoting here so a bad config fails at
    /// load, not mid-deployment.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::builtin();
        for (extension, command) in &config.interpreters {
            shell_words::split(command).map_err(|e| {
                CapstanError::Config(format!(
                    "invalid interpreter command for '{}': {}",
                    extension, e
                ))
            })?;
            registry
                .templates
                .insert(extension.to_lowercase(), command.clone());
        }
        Ok(registry)
    }

    /// True if the registry knows the extension (no leading dot).
    pub fn supports(&self, extension: &str) -> bool {
        self.templates.contains_key(&extension.to_lowercase())
    }

    /// Registered extensions, in sorted order.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Build the argv for running `script`, program first.
    ///
    /// Fails with [`CapstanError::UnsupportedScriptType`] when no interpreter
    /// is registered for the script's extension.
    pub fn resolve(&self, script: &Path) -> Result<Vec<String>> {
        let extension = script
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        let template = extension
            .as_deref()
            .and_then(|ext| self.templates.get(ext))
            .ok_or_else(|| CapstanError::UnsupportedScriptType {
                script: script.to_path_buf(),
                extension: extension.clone(),
            })?;

        let args = shell_words::split(template).map_err(|e| {
            CapstanError::Config(format!(
                "invalid interpreter command '{}': {}",
                template, e
            ))
        })?;
        if args.is_empty() {
            return Err(CapstanError::Config(format!(
                "interpreter command for '{}' is empty",
                extension.as_deref().unwrap_or("none")
            )));
        }

        let script_arg = script.to_string_lossy();
        let mut argv = Vec::with_capacity(args.len() + 1);
        let mut substituted = false;
        for arg in &args {
            if arg.contains(SCRIPT_PLACEHOLDER) {
                argv.push(arg.replace(SCRIPT_PLACEHOLDER, &script_arg));
                substituted = true;
            } else {
                argv.push(arg.clone());
            }
        }
        if !substituted {
            argv.push(script_arg.into_owned());
        }
        Ok(argv)
    }
}

impl Default for InterpreterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
