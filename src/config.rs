//! Runner configuration.
//!
//! Configuration is a small YAML file, typically shipped alongside the
//! deployment tooling rather than per project. It can extend or override the
//! built-in interpreter table and point the run journal somewhere permanent.
//! Unknown fields in the YAML are ignored for forward compatibility.
//!
//! ```yaml
//! interpreters:
//!   rb: "ruby {script}"
//!   ps1: "powershell -NoProfile -File {script}"
//! journal: /var/log/capstan/runs.ndjson
//! ```

use crate::error::{CapstanError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Contents of a capstan config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interpreter command templates keyed by script extension (no leading
    /// dots). Entries override the built-in table for the same extension.
    pub interpreters: BTreeMap<String, String>,

    /// Where to append run journal records. The command line takes
    /// precedence when both name a path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<PathBuf>,
}

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            CapstanError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| CapstanError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| CapstanError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values.
    ///
    /// Validation rules:
    /// - interpreter extensions must be non-empty and carry no leading dot
    /// - interpreter command templates must be non-empty
    pub fn validate(&self) -> Result<()> {
        for (extension, command) in &self.interpreters {
            if extension.is_empty() {
                return Err(CapstanError::Config(
                    "config validation failed: interpreter extensions must be non-empty"
                        .to_string(),
                ));
            }
            if extension.starts_with('.') {
                return Err(CapstanError::Config(format!(
                    "config validation failed: interpreter extensions must not have leading dots (found '{}'). Use '{}' instead.",
                    extension,
                    extension.trim_start_matches('.')
                )));
            }
            if command.trim().is_empty() {
                return Err(CapstanError::Config(format!(
                    "config validation failed: interpreter command for '{}' is empty",
                    extension
                )));
            }
        }

        Ok(())
    }
}
