//! Upload error types.

use std::path::PathBuf;

use modvault_store::RegistryError;

/// Errors that can occur while publishing a module checkout.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The module directory has no readable `go.mod`.
    #[error("error finding go.mod file at {}: {source}", path.display())]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The `go.mod` has no usable module declaration.
    #[error("failed getting module name: {0}")]
    Manifest(#[source] RegistryError),

    /// Producing the source archive failed.
    #[error("error archiving module location: {message}")]
    Archive { message: String },

    /// The produced archive could not be read back.
    #[error("failed opening {}: {source}", path.display())]
    ArchiveUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The request never produced a response.
    #[error("failed posting module to {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The registry answered with something other than 201 Created.
    #[error("expected status code 201 but got {status} for url {url}: {body}")]
    Rejected { status: u16, url: String, body: String },
}

/// Result type alias for upload operations.
pub type Result<T> = std::result::Result<T, UploadError>;
