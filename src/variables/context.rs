//! Layered variable context handed to a script run.
//!
//! Two layers back the context: a base layer (variables file, seeded output
//! variables, process environment) and a sensitive layer (decrypted from the
//! encrypted variables file). Reads consult the sensitive layer first so a
//! sensitive value always wins over a plain one under the same key. Writes
//! land in the base layer; the process environment only ever fills gaps.

use crate::variables::VariableStore;
use std::sync::{Arc, Mutex};

/// Context shared between the dispatch loop and the message sinks.
pub type SharedContext = Arc<Mutex<VariableContext>>;

/// Case-insensitive variable lookup across a base and a sensitive layer.
#[derive(Debug, Clone, Default)]
pub struct VariableContext {
    base: VariableStore,
    sensitive: VariableStore,
}

impl VariableContext {
    /// Build a context from an already-populated base layer.
    pub fn new(base: VariableStore) -> Self {
        Self {
            base,
            sensitive: VariableStore::new(),
        }
    }

    /// Attach the decrypted sensitive layer.
    pub fn with_sensitive(mut self, sensitive: VariableStore) -> Self {
        self.sensitive = sensitive;
        self
    }

    /// Look up a variable. Sensitive values shadow base values.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.sensitive.get(key).or_else(|| self.base.get(key))
    }

    /// Returns true if either layer holds the key.
    pub fn contains(&self, key: &str) -> bool {
        self.sensitive.contains(key) || self.base.contains(key)
    }

    /// Set a variable in the base layer.
    ///
    /// If a sensitive variable shares the key, reads keep returning the
    /// sensitive value; the write is still recorded.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.base.set(key, value);
    }

    /// Merge a store into the base layer, overwriting existing base keys.
    pub fn merge_with(&mut self, other: &VariableStore) {
        self.base.merge_with(other);
    }

    /// Add the process environment to the base layer, skipping any key
    /// already present in either layer. Explicit variables always beat
    /// inherited environment.
    pub fn enrich_with_environment(&mut self) {
        self.enrich_from(std::env::vars());
    }

    pub(crate) fn enrich_from(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            if !self.contains(&key) {
                self.base.set(key, value);
            }
        }
    }

    /// Flatten both layers into one store, sensitive values winning.
    ///
    /// Used to materialize the child process environment. Base keys keep
    /// their positions; sensitive-only keys follow.
    pub fn merged_view(&self) -> VariableStore {
        let mut merged = self.base.clone();
        merged.merge_with(&self.sensitive);
        merged
    }

    /// True if the key lives in the sensitive layer.
    pub fn is_sensitive(&self, key: &str) -> bool {
        self.sensitive.contains(key)
    }
}
