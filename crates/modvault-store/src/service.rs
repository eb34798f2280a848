//! Protocol-level operations over a registry backend.
//!
//! `DownloadService` implements the proxy read operations (list, info, mod,
//! zip) and `UploadService` the publish operation. Both dispatch over a
//! shared `RegistryBackend` and know nothing about HTTP.

use std::io::Read;
use std::sync::Arc;

use tracing::warn;

use crate::backend::{Artifact, PublishReceipt, RegistryBackend};
use crate::error::{RegistryError, Result};
use crate::metadata::VersionMetadata;
use crate::version::VersionTag;

/// Render a version listing as the proxy protocol expects: one tag per line.
pub fn format_version_list(versions: &[VersionTag]) -> String {
    versions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read-side protocol operations.
#[derive(Clone)]
pub struct DownloadService {
    backend: Arc<dyn RegistryBackend>,
}

impl DownloadService {
    /// Create a service over the given backend.
    pub fn new(backend: Arc<dyn RegistryBackend>) -> Self {
        DownloadService { backend }
    }

    fn ensure_module(&self, module: &str) -> Result<()> {
        if self.backend.has_module(module) {
            Ok(())
        } else {
            Err(RegistryError::ModuleNotFound {
                module: module.to_string(),
            })
        }
    }

    /// Every published version of a module.
    pub fn list_versions(&self, module: &str) -> Result<Vec<VersionTag>> {
        self.ensure_module(module)?;
        self.backend.list_versions(module)
    }

    /// The metadata record of a version.
    pub fn version_info(&self, module: &str, version: &VersionTag) -> Result<VersionMetadata> {
        self.ensure_module(module)?;
        self.backend.version_info(module, version)
    }

    /// The `go.mod` of a version.
    pub fn manifest(&self, module: &str, version: &VersionTag) -> Result<Artifact> {
        self.ensure_module(module)?;
        self.backend.manifest(module, version)
    }

    /// The source archive of a version.
    pub fn archive(&self, module: &str, version: &VersionTag) -> Result<Artifact> {
        self.ensure_module(module)?;
        self.backend.archive(module, version)
    }
}

/// Write-side protocol operation.
#[derive(Clone)]
pub struct UploadService {
    backend: Arc<dyn RegistryBackend>,
}

impl UploadService {
    /// Create a service over the given backend.
    pub fn new(backend: Arc<dyn RegistryBackend>) -> Self {
        UploadService { backend }
    }

    /// Publish an uploaded archive as a new module version.
    pub fn create_module_version(
        &self,
        module: &str,
        version: &VersionTag,
        archive: &mut dyn Read,
    ) -> Result<PublishReceipt> {
        self.backend
            .publish(module, version, archive)
            .inspect_err(|e| {
                if e.is_conflict() || e.is_client_error() {
                    warn!(%module, %version, error = %e, "rejected publish");
                }
            })
    }
}
