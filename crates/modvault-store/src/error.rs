//! Registry error types.

use std::path::PathBuf;

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No directory exists for the module.
    #[error("module {module} does not exist")]
    ModuleNotFound { module: String },

    /// The module exists but the requested version was never published.
    #[error("version {version} not found for module {module}")]
    VersionNotFound { module: String, version: String },

    /// A version directory already exists for this module and version.
    #[error("version {version} of module {module} already exists")]
    VersionAlreadyExists { module: String, version: String },

    /// The uploaded archive has no manifest entry at the expected path.
    #[error("{entry} not found in uploaded archive")]
    ManifestMissing { entry: String },

    /// The manifest has no `module` declaration.
    #[error("malformed manifest: {detail}")]
    ManifestMalformed { detail: String },

    /// The manifest declares a different module than the one being published.
    #[error("module in go.mod must match module name given: expected {expected}, found {declared}")]
    IdentityMismatch { expected: String, declared: String },

    /// A persisted `version.info` record could not be parsed.
    #[error("metadata for {module}@{version} is corrupt: {source}")]
    MetadataCorrupt {
        module: String,
        version: String,
        #[source]
        source: serde_json::Error,
    },

    /// The uploaded bytes are not a readable zip archive.
    #[error("uploaded archive is not a valid zip: {source}")]
    ArchiveCorrupt {
        #[source]
        source: zip::result::ZipError,
    },

    /// The module path cannot be used as a storage identity.
    #[error("invalid module path '{module}': {detail}")]
    InvalidModulePath { module: String, detail: String },

    /// The version string is not a valid semantic version tag.
    #[error("invalid version '{version}': {detail}")]
    InvalidVersion { version: String, detail: String },

    /// An unexpected filesystem fault.
    #[error("{context} ({}): {source}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RegistryError {
    /// Wrap an I/O error with the step and path that produced it.
    pub fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RegistryError::Io {
            context,
            path: path.into(),
            source,
        }
    }

    /// Whether the error means the requested module or version is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::ModuleNotFound { .. } | RegistryError::VersionNotFound { .. }
        )
    }

    /// Whether the error is a publish conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, RegistryError::VersionAlreadyExists { .. })
    }

    /// Whether the error was caused by a malformed request or upload.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RegistryError::ManifestMissing { .. }
                | RegistryError::ManifestMalformed { .. }
                | RegistryError::IdentityMismatch { .. }
                | RegistryError::ArchiveCorrupt { .. }
                | RegistryError::InvalidModulePath { .. }
                | RegistryError::InvalidVersion { .. }
        )
    }
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
