//! Variable storage for capstan.
//!
//! A [`VariableStore`] is the ordered key/value mapping every other layer is
//! built from: base variables loaded from a file, decrypted sensitive
//! variables, live updates emitted by a running script, and the output
//! variables handed back to the pipeline. Keys compare case-insensitively
//! and iteration follows insertion order so exports and variable listings
//! are deterministic.
//!
//! Variable files on disk are flat JSON objects of string keys to string
//! values. Key order in the file is preserved on load (serde_json's
//! `preserve_order` feature) so a save/load round trip keeps the store's
//! iteration order intact.

pub mod context;
pub mod masking;
pub mod output;
pub mod sensitive;

use crate::error::{CapstanError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// One stored variable. The key keeps the casing it was first written with.
#[derive(Debug, Clone)]
struct Entry {
    key: String,
    value: String,
}

/// Ordered, case-insensitive string map with last-write-wins semantics.
///
/// Setting an existing key (under any casing) replaces its value in place:
/// the original casing and insertion position are retained. Lookups are
/// case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl VariableStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a variable, case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(&key.to_lowercase())
            .map(|&i| self.entries[i].value.as_str())
    }

    /// Returns true if the key is present under any casing.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(&key.to_lowercase())
    }

    /// Set a variable, overwriting any existing value for the same key.
    ///
    /// An overwrite keeps the first-written casing of the key and its
    /// position in iteration order; only the value changes.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let folded = key.to_lowercase();
        match self.index.get(&folded) {
            Some(&i) => self.entries[i].value = value,
            None => {
                self.index.insert(folded, self.entries.len());
                self.entries.push(Entry { key, value });
            }
        }
    }

    /// Apply every variable of `other` onto `self`, overwriting existing keys.
    pub fn merge_with(&mut self, other: &VariableStore) {
        for (key, value) in other.iter() {
            self.set(key, value);
        }
    }

    /// Number of variables in the store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store holds no variables.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|e| (e.key.as_str(), e.value.as_str()))
    }

    /// Serialize the store to a pretty-printed JSON object, keys in
    /// insertion order.
    pub fn to_json_string(&self) -> String {
        let mut map = serde_json::Map::new();
        for (key, value) in self.iter() {
            map.insert(key.to_string(), Value::String(value.to_string()));
        }
        // A map of strings cannot fail to serialize.
        serde_json::to_string_pretty(&Value::Object(map)).unwrap_or_default()
    }
}

/// Load a variables file (flat JSON object of strings) into a store.
///
/// Fails when the file cannot be read, is not a JSON object, or holds a
/// non-string value. Duplicate keys in the document resolve last-write-wins,
/// matching store semantics.
pub fn load_variables_file(path: &Path) -> Result<VariableStore> {
    let content = std::fs::read_to_string(path).map_err(|e| CapstanError::VariablesFile {
        path: path.to_path_buf(),
        detail: format!("failed to read: {}", e),
    })?;
    parse_variables_json(&content).map_err(|detail| CapstanError::VariablesFile {
        path: path.to_path_buf(),
        detail,
    })
}

/// Parse the flat JSON object format into a store.
pub(crate) fn parse_variables_json(content: &str) -> std::result::Result<VariableStore, String> {
    let map: serde_json::Map<String, Value> =
        serde_json::from_str(content).map_err(|e| format!("not a JSON object: {}", e))?;

    let mut store = VariableStore::new();
    for (key, value) in map {
        match value {
            Value::String(s) => store.set(key, s),
            other => {
                return Err(format!(
                    "variable '{}' must be a string, found {}",
                    key,
                    json_type_name(&other)
                ));
            }
        }
    }
    Ok(store)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
