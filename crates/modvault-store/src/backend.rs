//! Registry backend trait.
//!
//! `RegistryBackend` is the storage capability the protocol services are
//! written against. `FileRegistry` is the durable implementation;
//! `MemoryRegistry` backs tests and throwaway instances.

use std::fmt;
use std::io::{Read, Seek};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::integrity::ContentHash;
use crate::metadata::VersionMetadata;
use crate::version::VersionTag;

/// A readable, seekable byte stream handed out by a backend.
pub trait ArtifactReader: Read + Seek + Send {}

impl<T: Read + Seek + Send> ArtifactReader for T {}

/// A stored file (manifest or archive) opened for reading.
///
/// The underlying handle is released when the artifact is dropped.
pub struct Artifact {
    /// Stream over the stored bytes.
    pub reader: Box<dyn ArtifactReader>,
    /// When the stored file was last modified.
    pub modified: DateTime<Utc>,
}

impl Artifact {
    /// Wrap a reader and its modification time.
    pub fn new(reader: impl ArtifactReader + 'static, modified: DateTime<Utc>) -> Self {
        Artifact {
            reader: Box::new(reader),
            modified,
        }
    }

    /// Read the whole artifact into memory, releasing the handle.
    #[cfg(test)]
    pub(crate) fn into_bytes(mut self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}

/// Summary of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Module path the version was published under.
    pub module: String,
    /// Published version.
    pub version: VersionTag,
    /// Size of the stored archive in bytes.
    pub archive_size: u64,
    /// SHA-256 of the stored archive.
    pub archive_hash: ContentHash,
}

/// Abstract registry backend.
///
/// Reads never observe a partially published version. `publish` either makes
/// all three files of a version visible or leaves no trace.
pub trait RegistryBackend: Send + Sync {
    /// Whether any version of the module has ever been published.
    fn has_module(&self, module: &str) -> bool;

    /// All published versions of a module, in no particular order.
    fn list_versions(&self, module: &str) -> Result<Vec<VersionTag>>;

    /// The metadata record of a published version.
    fn version_info(&self, module: &str, version: &VersionTag) -> Result<VersionMetadata>;

    /// The `go.mod` of a published version.
    fn manifest(&self, module: &str, version: &VersionTag) -> Result<Artifact>;

    /// The source archive of a published version.
    fn archive(&self, module: &str, version: &VersionTag) -> Result<Artifact>;

    /// Validate an uploaded archive and publish it as a new version.
    fn publish(
        &self,
        module: &str,
        version: &VersionTag,
        archive: &mut dyn Read,
    ) -> Result<PublishReceipt>;
}
