//! Module identity extraction from `go.mod` manifests.
//!
//! Only the `module` directive matters to the registry. The manifest is
//! scanned line by line and the first directive wins; anything after it is
//! never looked at.

use crate::error::{RegistryError, Result};

/// Canonical file name of the dependency manifest.
pub const MANIFEST_FILE_NAME: &str = "go.mod";

/// Keyword that opens the module identity directive.
const MODULE_DIRECTIVE: &str = "module";

/// The module identity declared by a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleIdentity(String);

impl ModuleIdentity {
    /// Get the declared module path.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identity, returning the module path.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the declared module identity from manifest bytes.
pub fn extract_identity(manifest: &[u8]) -> Result<ModuleIdentity> {
    let text = String::from_utf8_lossy(manifest);
    text.lines()
        .find_map(parse_module_line)
        .map(ModuleIdentity)
        .ok_or_else(|| RegistryError::ManifestMalformed {
            detail: "no module declaration found".to_string(),
        })
}

/// Parse a single `module <path>` line, returning the path if it is one.
fn parse_module_line(line: &str) -> Option<String> {
    let rest = line.trim_start().strip_prefix(MODULE_DIRECTIVE)?;
    // `modules` or `module_x` are not the directive
    if !rest.starts_with(|c: char| c.is_whitespace()) {
        return None;
    }

    let rest = match rest.find("//") {
        Some(idx) => &rest[..idx],
        None => rest,
    };
    let token = rest.trim();
    let token = token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token);

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
