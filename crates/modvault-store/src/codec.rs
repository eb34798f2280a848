//! Module path to storage key mapping.
//!
//! Module paths are hierarchical (`example.com/team/widget`). On disk every
//! module lives in a single directory directly under the base path, so the
//! separator is replaced with `_`:
//!
//! ```text
//! example.com/team/widget  ->  example.com_team_widget
//! ```
//!
//! There is no decode; the store only ever encodes.

use std::fmt;

use crate::error::{RegistryError, Result};

/// Separator used in module paths.
const PATH_SEPARATOR: char = '/';

/// Character substituted for the separator in storage keys.
const KEY_SEPARATOR: &str = "_";

/// Directory name reserved for staging workspaces under the base path.
pub const STAGING_DIR: &str = "tmp";

/// A filesystem-safe key derived from a module path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<std::path::Path> for StorageKey {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

/// Encode a module path as a storage key.
pub fn encode(module: &str) -> StorageKey {
    StorageKey(module.replace(PATH_SEPARATOR, KEY_SEPARATOR))
}

/// Check that a module path is usable as a registry identity.
///
/// Rejects anything whose encoding could escape the base path, land on the
/// staging directory, or be shared with another module path.
pub fn validate_module_path(module: &str) -> Result<()> {
    let invalid = |detail: &str| RegistryError::InvalidModulePath {
        module: module.to_string(),
        detail: detail.to_string(),
    };

    if module.is_empty() {
        return Err(invalid("path is empty"));
    }
    if module.starts_with(PATH_SEPARATOR) || module.ends_with(PATH_SEPARATOR) {
        return Err(invalid("leading or trailing '/'"));
    }
    if module.contains('\\') {
        return Err(invalid("backslash is not allowed"));
    }
    if module.contains(KEY_SEPARATOR) {
        return Err(invalid("'_' is not allowed"));
    }
    if module.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(invalid("whitespace and control characters are not allowed"));
    }
    for segment in module.split(PATH_SEPARATOR) {
        match segment {
            "" => return Err(invalid("empty path element")),
            "." | ".." => return Err(invalid("relative path element")),
            _ => {}
        }
    }
    if encode(module).as_str() == STAGING_DIR {
        return Err(invalid("name is reserved"));
    }
    Ok(())
}
