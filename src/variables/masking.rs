//! Masking of sensitive values in variable listings.
//!
//! Two signals mark a variable as maskable: it lives in the sensitive layer,
//! or its name looks like a credential (`*password*`, `*secret*`, `*token*`
//! and friends). Either one replaces the value with a fixed placeholder in
//! any printed listing. Matching is case-insensitive on the variable name.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::sync::LazyLock;

/// Placeholder printed instead of a masked value.
pub const MASK: &str = "********";

/// Name patterns that mark a variable as credential-like.
const SENSITIVE_NAME_PATTERNS: &[&str] =
    &["*password*", "*secret*", "*apikey*", "*api_key*", "*token*"];

static SENSITIVE_NAME_GLOBS: LazyLock<GlobSet> = LazyLock::new(|| {
    let mut builder = GlobSetBuilder::new();
    for pattern in SENSITIVE_NAME_PATTERNS {
        builder.add(Glob::new(pattern).expect("Invalid sensitive name pattern"));
    }
    builder.build().expect("Failed to compile sensitive name patterns")
});

/// True if the variable name alone warrants masking.
pub fn is_sensitive_name(key: &str) -> bool {
    SENSITIVE_NAME_GLOBS.is_match(key.to_lowercase())
}

/// The value to print for `key`: the real value, or [`MASK`].
pub fn display_value<'a>(key: &str, value: &'a str, from_sensitive_layer: bool) -> &'a str {
    if from_sensitive_layer || is_sensitive_name(key) {
        MASK
    } else {
        value
    }
}
