//! Output variables captured during a script run.
//!
//! An [`OutputVariableStore`] collects the variables a script publishes via
//! output directives and persists them to the path the caller named on the
//! command line. When that file already exists its contents seed the store,
//! so values from an earlier step act as defaults until the script overwrites
//! them. With no backing path the store still collects values (sinks keep
//! working) but [`OutputVariableStore::save`] is a no-op.
//!
//! Saves are atomic: content goes to a temporary file in the target
//! directory, is synced, then renamed over the destination. A crash mid-save
//! never leaves a truncated variables file for the next pipeline step to
//! choke on.

use crate::error::{CapstanError, Result};
use crate::variables::{VariableStore, load_variables_file};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Output store shared between the dispatch loop and the orchestrator.
pub type SharedOutputVariables = Arc<Mutex<OutputVariableStore>>;

/// Ordered store of output variables, optionally backed by a JSON file.
#[derive(Debug, Clone, Default)]
pub struct OutputVariableStore {
    path: Option<PathBuf>,
    store: VariableStore,
}

impl OutputVariableStore {
    /// A store with no backing file. Collects values, never persists.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Open the store for `path`, seeding from the file if it exists.
    ///
    /// A missing file is not an error: the store starts empty and the file
    /// is created on save. `None` yields a detached store.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::detached());
        };
        let store = if path.exists() {
            load_variables_file(path)?
        } else {
            VariableStore::new()
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            store,
        })
    }

    /// Record an output variable, overwriting any existing value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.store.set(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.store.get(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// The collected variables, for merging into a run's variable context.
    pub fn as_store(&self) -> &VariableStore {
        &self.store
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Persist the collected variables to the backing file, atomically.
    ///
    /// Detached stores return `Ok` without touching the filesystem.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        write_atomic(path, self.store.to_json_string().as_bytes()).map_err(|detail| {
            CapstanError::SaveFailure {
                path: path.clone(),
                detail,
            }
        })
    }
}

/// Write `content` to `path` through a synced temporary file and rename.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> std::result::Result<(), String> {
    let parent = path.parent().unwrap_or(Path::new("."));
    if !parent.as_os_str().is_empty() && !parent.exists() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("failed to create directory '{}': {}", parent.display(), e))?;
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| "invalid target path".to_string())?;
    let temp_path = parent.join(format!(".{}.tmp", file_name));

    let mut file = File::create(&temp_path)
        .map_err(|e| format!("failed to create temporary file: {}", e))?;
    let written = file.write_all(content).and_then(|_| file.sync_all());
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(format!("failed to write temporary file: {}", e));
    }
    drop(file);

    // On Windows rename will not replace an existing destination.
    #[cfg(windows)]
    if path.exists() {
        let _ = fs::remove_file(path);
    }
    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        format!("failed to replace '{}': {}", path.display(), e)
    })?;

    // Persist the directory entry as well.
    if let Ok(dir) = File::open(parent) {
        let _ = dir.sync_all();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn detached_store_collects_but_never_persists() {
        let mut store = OutputVariableStore::detached();
        store.set("Result", "42");
        assert_eq!(store.get("Result"), Some("42"));
        assert!(store.path().is_none());
        store.save().unwrap();
    }

    #[test]
    fn load_with_missing_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("output.json");

        let store = OutputVariableStore::load(Some(&path)).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.path(), Some(path.as_path()));
    }

    #[test]
    fn load_seeds_from_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("output.json");
        fs::write(&path, r#"{"PriorStep.Artifact": "build-17.tar.gz"}"#).unwrap();

        let store = OutputVariableStore::load(Some(&path)).unwrap();
        assert_eq!(store.get("PriorStep.Artifact"), Some("build-17.tar.gz"));
    }

    #[test]
    fn load_rejects_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("output.json");
        fs::write(&path, "{ not json").unwrap();

        let result = OutputVariableStore::load(Some(&path));
        assert!(matches!(result, Err(CapstanError::VariablesFile { .. })));
    }

    #[test]
    fn save_round_trips_through_the_backing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("output.json");

        let mut store = OutputVariableStore::load(Some(&path)).unwrap();
        store.set("Deployment.Url", "https://web-01.internal");
        store.set("Deployment.Healthy", "true");
        store.save().unwrap();

        let reloaded = OutputVariableStore::load(Some(&path)).unwrap();
        assert_eq!(reloaded.get("Deployment.Url"), Some("https://web-01.internal"));
        assert_eq!(reloaded.get("Deployment.Healthy"), Some("true"));
    }

    #[test]
    fn save_replaces_existing_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("output.json");
        fs::write(&path, r#"{"Stale": "value"}"#).unwrap();

        let mut store = OutputVariableStore {
            path: Some(path.clone()),
            store: VariableStore::new(),
        };
        store.set("Fresh", "value");
        store.save().unwrap();

        let reloaded = load_variables_file(&path).unwrap();
        assert!(reloaded.get("Stale").is_none());
        assert_eq!(reloaded.get("Fresh"), Some("value"));
    }

    #[test]
    fn save_leaves_no_temporary_file_behind() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("output.json");

        let mut store = OutputVariableStore::load(Some(&path)).unwrap();
        store.set("Key", "value");
        store.save().unwrap();

        assert!(!temp_dir.path().join(".output.json.tmp").exists());
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("output.json");

        let mut store = OutputVariableStore::load(Some(&path)).unwrap();
        store.set("Key", "value");
        store.save().unwrap();

        assert!(path.exists());
    }

    #[test]
    fn unwritable_target_maps_to_save_failure() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the parent directory should be.
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "file, not dir").unwrap();

        let mut store = OutputVariableStore::load(Some(&blocker.join("output.json"))).unwrap();
        store.set("Key", "value");
        let result = store.save();
        assert!(matches!(result, Err(CapstanError::SaveFailure { .. })));
    }

    #[test]
    fn prior_values_survive_until_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("output.json");
        fs::write(&path, r#"{"Kept": "old", "Replaced": "old"}"#).unwrap();

        let mut store = OutputVariableStore::load(Some(&path)).unwrap();
        store.set("Replaced", "new");
        store.save().unwrap();

        let reloaded = load_variables_file(&path).unwrap();
        assert_eq!(reloaded.get("Kept"), Some("old"));
        assert_eq!(reloaded.get("Replaced"), Some("new"));
    }
}
