//! Publish workflow: archive a module checkout and send it to a registry.

use std::fs;
use std::path::{Path, PathBuf};

use modvault_store::{extract_identity, MANIFEST_FILE_NAME};
use semver::Version;
use tracing::{debug, info, warn};

use crate::archive::{entry_prefix, Archiver, GitArchiver};
use crate::error::{Result, UploadError};
use crate::transport::{HttpTransport, Transport};

/// File name of the temporary archive written into the module directory.
pub const ARCHIVE_FILE_NAME: &str = "source.zip";

/// Status the registry answers a successful publish with.
const CREATED: u16 = 201;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Module path declared in the checkout's `go.mod`.
    pub module: String,
    /// Version that was published.
    pub version: Version,
    /// Publish URL the archive was sent to.
    pub url: String,
    /// Size of the uploaded archive in bytes.
    pub archive_size: usize,
}

/// Removes the temporary archive when dropped.
struct TempArchive {
    path: PathBuf,
}

impl Drop for TempArchive {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove temporary archive");
            }
        }
    }
}

/// Publish URL for a module version on `registry`.
pub fn publish_url(registry: &str, module: &str, version: &Version) -> String {
    format!(
        "{}/_modules/{module}/@v/v{version}",
        registry.trim_end_matches('/')
    )
}

/// Publishes module checkouts to a registry.
pub struct Uploader<A = GitArchiver, T = HttpTransport> {
    registry: String,
    archiver: A,
    transport: T,
}

impl Uploader {
    /// Uploader using `git archive` and HTTP.
    pub fn new(registry: impl Into<String>) -> Self {
        Uploader::with_parts(registry, GitArchiver, HttpTransport)
    }
}

impl<A: Archiver, T: Transport> Uploader<A, T> {
    /// Uploader with explicit archive and transport implementations.
    pub fn with_parts(registry: impl Into<String>, archiver: A, transport: T) -> Self {
        Uploader {
            registry: registry.into(),
            archiver,
            transport,
        }
    }

    /// Archive the module in `module_dir` and publish it as `version`.
    ///
    /// The temporary `source.zip` is removed whether or not the upload
    /// succeeds.
    pub fn upload(&self, module_dir: &Path, version: &Version) -> Result<UploadOutcome> {
        let manifest_path = module_dir.join(MANIFEST_FILE_NAME);
        let manifest = fs::read(&manifest_path).map_err(|source| UploadError::ManifestUnreadable {
            path: manifest_path.clone(),
            source,
        })?;
        let module = extract_identity(&manifest)
            .map_err(UploadError::Manifest)?
            .into_string();
        debug!(%module, %version, "resolved module identity");

        let archive = TempArchive {
            path: module_dir.join(ARCHIVE_FILE_NAME),
        };
        self.archiver
            .archive(module_dir, &entry_prefix(&module, version), &archive.path)?;
        let bytes = fs::read(&archive.path).map_err(|source| UploadError::ArchiveUnreadable {
            path: archive.path.clone(),
            source,
        })?;

        let url = publish_url(&self.registry, &module, version);
        let response = self.transport.post_archive(&url, &bytes)?;
        if response.status != CREATED {
            return Err(UploadError::Rejected {
                status: response.status,
                url,
                body: response.body,
            });
        }
        info!(%module, %version, %url, size = bytes.len(), "uploaded module");

        Ok(UploadOutcome {
            module,
            version: version.clone(),
            url,
            archive_size: bytes.len(),
        })
    }
}
