//! In-memory registry backend.
//!
//! Runs the same validation as the filesystem backend but keeps everything
//! in a map. Useful for tests and for short-lived registries.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::backend::{Artifact, PublishReceipt, RegistryBackend};
use crate::codec;
use crate::error::{RegistryError, Result};
use crate::ingest::{self, IngestStage};
use crate::integrity::HashingWriter;
use crate::metadata::VersionMetadata;
use crate::version::VersionTag;

/// A published version held in memory.
#[derive(Debug, Clone)]
struct StoredVersion {
    metadata: VersionMetadata,
    manifest: Arc<[u8]>,
    archive: Arc<[u8]>,
    published_at: DateTime<Utc>,
}

/// Shared byte buffer that can be handed out as a seekable reader.
#[derive(Debug, Clone)]
struct SharedBytes(Arc<[u8]>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

type ModuleMap = HashMap<String, HashMap<VersionTag, StoredVersion>>;

/// A registry that lives entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    modules: RwLock<ModuleMap>,
}

impl MemoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // Every mutation is a single insert, so a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, ModuleMap> {
        self.modules.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ModuleMap> {
        self.modules.write().unwrap_or_else(|e| e.into_inner())
    }

    fn stored(&self, module: &str, version: &VersionTag) -> Result<StoredVersion> {
        codec::validate_module_path(module)?;
        let modules = self.read();
        let versions = modules
            .get(module)
            .ok_or_else(|| RegistryError::ModuleNotFound {
                module: module.to_string(),
            })?;
        versions
            .get(version)
            .cloned()
            .ok_or_else(|| RegistryError::VersionNotFound {
                module: module.to_string(),
                version: version.to_string(),
            })
    }

    fn conflict(module: &str, version: &VersionTag) -> RegistryError {
        RegistryError::VersionAlreadyExists {
            module: module.to_string(),
            version: version.to_string(),
        }
    }
}

impl RegistryBackend for MemoryRegistry {
    fn has_module(&self, module: &str) -> bool {
        self.read().contains_key(module)
    }

    fn list_versions(&self, module: &str) -> Result<Vec<VersionTag>> {
        codec::validate_module_path(module)?;
        self.read()
            .get(module)
            .map(|versions| versions.keys().cloned().collect())
            .ok_or_else(|| RegistryError::ModuleNotFound {
                module: module.to_string(),
            })
    }

    fn version_info(&self, module: &str, version: &VersionTag) -> Result<VersionMetadata> {
        self.stored(module, version).map(|stored| stored.metadata)
    }

    fn manifest(&self, module: &str, version: &VersionTag) -> Result<Artifact> {
        let stored = self.stored(module, version)?;
        Ok(Artifact::new(
            Cursor::new(SharedBytes(stored.manifest)),
            stored.published_at,
        ))
    }

    fn archive(&self, module: &str, version: &VersionTag) -> Result<Artifact> {
        let stored = self.stored(module, version)?;
        Ok(Artifact::new(
            Cursor::new(SharedBytes(stored.archive)),
            stored.published_at,
        ))
    }

    fn publish(
        &self,
        module: &str,
        version: &VersionTag,
        archive: &mut dyn Read,
    ) -> Result<PublishReceipt> {
        codec::validate_module_path(module)?;

        if self
            .read()
            .get(module)
            .is_some_and(|versions| versions.contains_key(version))
        {
            return Err(Self::conflict(module, version));
        }
        ingest::advance(module, version, IngestStage::Staged);

        let mut writer = HashingWriter::new(Vec::new());
        io::copy(archive, &mut writer)
            .map_err(|e| RegistryError::io("copying upload into memory", "<memory>", e))?;
        let (bytes, archive_hash, archive_size) = writer.finish();
        ingest::advance(module, version, IngestStage::ArchiveWritten);

        let manifest = ingest::extract_manifest(Cursor::new(bytes.as_slice()), module, version)?;
        ingest::advance(module, version, IngestStage::ManifestExtracted);

        ingest::verify_identity(module, &manifest)?;
        ingest::advance(module, version, IngestStage::Validated);

        let metadata = VersionMetadata::published_now(version);
        let stored = StoredVersion {
            published_at: metadata.time,
            metadata,
            manifest: manifest.into(),
            archive: bytes.into(),
        };

        // The write lock plus the vacant-entry check is the commit point.
        match self
            .write()
            .entry(module.to_string())
            .or_default()
            .entry(version.clone())
        {
            Entry::Occupied(_) => return Err(Self::conflict(module, version)),
            Entry::Vacant(slot) => {
                slot.insert(stored);
            }
        }
        ingest::advance(module, version, IngestStage::Published);
        info!(%module, %version, size = archive_size, sha256 = %archive_hash, "published module version");

        Ok(PublishReceipt {
            module: module.to_string(),
            version: version.clone(),
            archive_size,
            archive_hash,
        })
    }
}
