//! Versioned module store for the modvault registry.
//!
//! Stores Go module versions and serves them with the semantics of the
//! module proxy protocol: list, info, mod and zip reads, plus a publish
//! operation that validates an uploaded archive and commits it atomically.
//!
//! # Architecture
//!
//! - [`codec`] maps module paths to storage keys
//! - [`manifest`] reads the module identity out of a `go.mod`
//! - [`RegistryBackend`] is the storage capability, implemented by
//!   [`FileRegistry`] (durable) and [`MemoryRegistry`]
//! - [`ingest`] holds the publish validation steps shared by backends
//! - [`DownloadService`] and [`UploadService`] are the protocol operations
//!
//! A published version is complete and immutable: there is no update or
//! delete.

pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod file;
pub mod ingest;
pub mod integrity;
pub mod manifest;
pub mod memory;
pub mod metadata;
pub mod service;
pub mod version;

// Re-exports for convenience.
pub use backend::{Artifact, ArtifactReader, PublishReceipt, RegistryBackend};
pub use config::StoreConfig;
pub use error::{RegistryError, Result};
pub use file::FileRegistry;
pub use integrity::ContentHash;
pub use manifest::{extract_identity, ModuleIdentity, MANIFEST_FILE_NAME};
pub use memory::MemoryRegistry;
pub use metadata::VersionMetadata;
pub use service::{format_version_list, DownloadService, UploadService};
pub use version::{Version, VersionTag};
