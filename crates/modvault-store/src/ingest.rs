//! Validation steps shared by every backend's publish path.
//!
//! An upload moves through these stages in order; a failure at any point
//! aborts the attempt with no visible side effect:
//!
//! ```text
//! NotStarted -> Staged -> ArchiveWritten -> ManifestExtracted -> Validated -> Published
//! ```

use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{RegistryError, Result};
use crate::manifest::{self, MANIFEST_FILE_NAME};
use crate::version::VersionTag;

/// Progress of a single publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    /// Workspace allocated.
    Staged,
    /// Upload fully persisted inside the workspace.
    ArchiveWritten,
    /// Manifest located and copied out of the archive.
    ManifestExtracted,
    /// Declared identity matches the requested module.
    Validated,
    /// Version visible to readers.
    Published,
}

impl IngestStage {
    fn label(self) -> &'static str {
        match self {
            IngestStage::Staged => "staged",
            IngestStage::ArchiveWritten => "archive-written",
            IngestStage::ManifestExtracted => "manifest-extracted",
            IngestStage::Validated => "validated",
            IngestStage::Published => "published",
        }
    }
}

/// Record that a publish attempt reached `stage`.
pub fn advance(module: &str, version: &VersionTag, stage: IngestStage) {
    debug!(%module, %version, stage = stage.label(), "publish progressed");
}

/// Path of the manifest entry inside an uploaded archive.
pub fn manifest_entry_name(module: &str, version: &VersionTag) -> String {
    format!("{module}@{version}/{MANIFEST_FILE_NAME}")
}

/// Largest manifest accepted from an upload, after decompression.
pub const MAX_MANIFEST_BYTES: u64 = 16 * 1024 * 1024;

/// Locate the manifest entry in a zip archive and return its bytes.
pub fn extract_manifest<R: Read + Seek>(
    archive: R,
    module: &str,
    version: &VersionTag,
) -> Result<Vec<u8>> {
    extract_manifest_limited(archive, module, version, MAX_MANIFEST_BYTES)
}

fn extract_manifest_limited<R: Read + Seek>(
    archive: R,
    module: &str,
    version: &VersionTag,
    limit: u64,
) -> Result<Vec<u8>> {
    let mut zip =
        zip::ZipArchive::new(archive).map_err(|source| RegistryError::ArchiveCorrupt { source })?;

    let entry_name = manifest_entry_name(module, version);
    let mut entry = match zip.by_name(&entry_name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(RegistryError::ManifestMissing { entry: entry_name })
        }
        Err(source) => return Err(RegistryError::ArchiveCorrupt { source }),
    };

    let too_large = || RegistryError::ManifestMalformed {
        detail: format!("{entry_name} exceeds {limit} bytes"),
    };
    if entry.size() > limit {
        return Err(too_large());
    }

    // The declared size is not trusted; the read itself is bounded too.
    let mut bytes = Vec::new();
    entry
        .by_ref()
        .take(limit + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| RegistryError::ArchiveCorrupt {
            source: zip::result::ZipError::Io(e),
        })?;
    if bytes.len() as u64 > limit {
        return Err(too_large());
    }
    Ok(bytes)
}

/// Check that a manifest declares the module being published.
pub fn verify_identity(module: &str, manifest_bytes: &[u8]) -> Result<()> {
    let declared = manifest::extract_identity(manifest_bytes)?;
    if declared.as_str() != module {
        return Err(RegistryError::IdentityMismatch {
            expected: module.to_string(),
            declared: declared.into_string(),
        });
    }
    Ok(())
}

/// A uniquely named scratch directory owned by one publish attempt.
///
/// The directory and anything left in it are removed when the workspace is
/// dropped.
#[derive(Debug)]
pub struct StagingWorkspace {
    path: PathBuf,
}

impl StagingWorkspace {
    /// Create a fresh workspace under `staging_root`, creating the root if
    /// needed.
    pub fn create(staging_root: &Path) -> Result<Self> {
        fs::create_dir_all(staging_root)
            .map_err(|e| RegistryError::io("creating tmp directory", staging_root, e))?;

        let path = staging_root.join(Uuid::new_v4().to_string());
        fs::create_dir(&path)
            .map_err(|e| RegistryError::io("creating working directory", &path, e))?;

        Ok(StagingWorkspace { path })
    }

    /// Root of the workspace.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for StagingWorkspace {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove staging workspace");
            }
        }
    }
}
