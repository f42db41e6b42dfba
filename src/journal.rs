//! Run journal for capstan.
//!
//! Completed runs are appended to an NDJSON journal (one JSON object per
//! line) when the caller names a journal path. Each record carries enough to
//! audit a deployment after the fact: when the script ran, who ran it, the
//! exit code, and how many output variables it published.
//!
//! Journaling is best-effort at the call site. A run whose journal append
//! fails still reports the script's own exit code; the failure is surfaced
//! as a warning only.

use crate::error::{CapstanError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// One journal line describing a completed script run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// RFC3339 timestamp taken when the run finished.
    pub ts: DateTime<Utc>,

    /// Who ran the script (`user@host`).
    pub actor: String,

    /// The script path as given on the command line.
    pub script: String,

    /// Exit code the run reported.
    pub exit_code: i32,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,

    /// Number of output variables captured by the run.
    pub output_variables: usize,
}

impl RunRecord {
    /// Build a record for a run that just finished.
    pub fn new(
        script: impl Into<String>,
        exit_code: i32,
        duration: Duration,
        output_variables: usize,
    ) -> Self {
        Self {
            ts: Utc::now(),
            actor: actor_string(),
            script: script.into(),
            exit_code,
            duration_ms: duration.as_millis() as u64,
            output_variables,
        }
    }

    /// Serialize the record to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| CapstanError::Journal(format!("failed to serialize record: {}", e)))
    }
}

/// The `user@host` string recorded with each run.
fn actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append a record to the journal at `path`, creating it if needed.
///
/// Each append writes one JSON line with a trailing newline and syncs the
/// file, so concurrent runners on the same journal interleave whole lines.
pub fn append_record(path: &Path, record: &RunRecord) -> Result<()> {
    let json_line = record.to_ndjson_line()?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            CapstanError::Journal(format!(
                "failed to create journal directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            CapstanError::Journal(format!(
                "failed to open journal '{}': {}",
                path.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        CapstanError::Journal(format!(
            "failed to write journal '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        CapstanError::Journal(format!(
            "failed to sync journal '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(())
}
