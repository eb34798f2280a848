//! Filesystem registry backend.
//!
//! Layout:
//! ```text
//! <base>/
//!   <encoded-module>/
//!     <version>/
//!       go.mod         # Module manifest
//!       source.zip     # Uploaded archive
//!       version.info   # Metadata record, written last
//!   tmp/
//!     <uuid>/          # Staging workspace for one publish attempt
//! ```
//!
//! A version directory only counts as published once `version.info` is
//! present. The exclusive `create_dir` of the version directory is the point
//! at which concurrent publishes of the same version are decided.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::backend::{Artifact, PublishReceipt, RegistryBackend};
use crate::codec::{self, STAGING_DIR};
use crate::config::StoreConfig;
use crate::error::{RegistryError, Result};
use crate::ingest::{self, IngestStage, StagingWorkspace};
use crate::integrity::{ContentHash, HashingWriter};
use crate::manifest::MANIFEST_FILE_NAME;
use crate::metadata::{VersionMetadata, METADATA_FILE_NAME};
use crate::version::{self, VersionTag};

/// File name of the stored source archive.
pub const ARCHIVE_FILE_NAME: &str = "source.zip";

/// Order in which staged files are moved into a version directory.
/// `version.info` goes last so readers never see a partial version.
const COMMIT_ORDER: [&str; 3] = [MANIFEST_FILE_NAME, ARCHIVE_FILE_NAME, METADATA_FILE_NAME];

/// A registry stored in a directory tree.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    root: PathBuf,
}

impl FileRegistry {
    /// Open a registry at the configured base path, which must already exist.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let root = config.base_path().to_path_buf();
        let meta = fs::metadata(&root)
            .map_err(|e| RegistryError::io("file storage directory does not exist", &root, e))?;
        if !meta.is_dir() {
            return Err(RegistryError::io(
                "file storage path is not a directory",
                &root,
                io::Error::other("not a directory"),
            ));
        }
        Ok(FileRegistry { root })
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory under which staging workspaces are created.
    pub fn staging_root(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    fn module_dir(&self, module: &str) -> PathBuf {
        self.root.join(codec::encode(module))
    }

    /// Resolve the directory of a published version, distinguishing a missing
    /// module from a missing version.
    fn version_dir(&self, module: &str, version: &VersionTag) -> Result<PathBuf> {
        codec::validate_module_path(module)?;
        let module_dir = self.module_dir(module);
        if !module_dir.is_dir() {
            return Err(RegistryError::ModuleNotFound {
                module: module.to_string(),
            });
        }

        let dir = module_dir.join(version.dir_name());
        if !dir.join(METADATA_FILE_NAME).is_file() {
            return Err(RegistryError::VersionNotFound {
                module: module.to_string(),
                version: version.to_string(),
            });
        }
        Ok(dir)
    }

    fn open_artifact(&self, module: &str, version: &VersionTag, name: &str) -> Result<Artifact> {
        let path = self.version_dir(module, version)?.join(name);
        let file = File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => RegistryError::VersionNotFound {
                module: module.to_string(),
                version: version.to_string(),
            },
            _ => RegistryError::io("opening stored file", &path, e),
        })?;
        let modified = file
            .metadata()
            .and_then(|m| m.modified())
            .map_err(|e| RegistryError::io("reading modification time", &path, e))?;

        debug!(%module, %version, file = name, "serving stored file");
        Ok(Artifact::new(file, DateTime::<Utc>::from(modified)))
    }

    /// Move the staged files into a freshly created version directory.
    fn commit(
        &self,
        workspace: &StagingWorkspace,
        module: &str,
        version: &VersionTag,
    ) -> Result<()> {
        let module_dir = self.module_dir(module);
        let created_module = !module_dir.is_dir();
        fs::create_dir_all(&module_dir)
            .map_err(|e| RegistryError::io("creating module directory", &module_dir, e))?;

        let final_dir = module_dir.join(version.dir_name());
        match fs::create_dir(&final_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(RegistryError::VersionAlreadyExists {
                    module: module.to_string(),
                    version: version.to_string(),
                })
            }
            Err(e) => return Err(RegistryError::io("creating final dir", &final_dir, e)),
        }

        let moved = COMMIT_ORDER.iter().try_for_each(|name| {
            let target = final_dir.join(name);
            fs::rename(workspace.file(name), &target)
                .map_err(|e| RegistryError::io("moving staged file", target, e))
        });

        if let Err(e) = moved {
            if let Err(cleanup) = fs::remove_dir_all(&final_dir) {
                warn!(path = %final_dir.display(), error = %cleanup, "failed to roll back version directory");
            }
            if created_module {
                remove_empty_dir(&module_dir);
            }
            return Err(e);
        }
        Ok(())
    }
}

/// Remove `dir` if nothing else has been placed in it meanwhile.
fn remove_empty_dir(dir: &Path) {
    match fs::remove_dir(dir) {
        Ok(()) => {}
        Err(e)
            if matches!(
                e.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::DirectoryNotEmpty
            ) => {}
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "failed to roll back module directory")
        }
    }
}

/// Copy the upload into `path`, returning its digest and size.
fn persist_archive(archive: &mut dyn Read, path: &Path) -> Result<(ContentHash, u64)> {
    let file =
        File::create(path).map_err(|e| RegistryError::io("creating source.zip file", path, e))?;
    let mut writer = HashingWriter::new(BufWriter::new(file));
    io::copy(archive, &mut writer)
        .map_err(|e| RegistryError::io("copying upload to source.zip", path, e))?;

    let (buffered, hash, size) = writer.finish();
    let file = buffered
        .into_inner()
        .map_err(|e| RegistryError::io("flushing source.zip", path, e.into_error()))?;
    file.sync_all()
        .map_err(|e| RegistryError::io("syncing source.zip", path, e))?;
    Ok((hash, size))
}

fn write_staged(path: &Path, bytes: &[u8], context: &'static str) -> Result<()> {
    let mut file = File::create(path).map_err(|e| RegistryError::io(context, path, e))?;
    file.write_all(bytes)
        .and_then(|()| file.sync_all())
        .map_err(|e| RegistryError::io(context, path, e))
}

impl RegistryBackend for FileRegistry {
    fn has_module(&self, module: &str) -> bool {
        codec::validate_module_path(module).is_ok() && self.module_dir(module).is_dir()
    }

    fn list_versions(&self, module: &str) -> Result<Vec<VersionTag>> {
        codec::validate_module_path(module)?;
        let module_dir = self.module_dir(module);
        let entries = match fs::read_dir(&module_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(RegistryError::ModuleNotFound {
                    module: module.to_string(),
                })
            }
            Err(e) => {
                return Err(RegistryError::io(
                    "failed reading version directories",
                    &module_dir,
                    e,
                ))
            }
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                RegistryError::io("failed reading version directories", &module_dir, e)
            })?;
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir || !entry.path().join(METADATA_FILE_NAME).is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            match version::parse_version(&name) {
                Ok(v) => versions.push(VersionTag::new(v)),
                Err(e) => debug!(%module, entry = %name, error = %e, "skipping non-version directory"),
            }
        }
        Ok(versions)
    }

    fn version_info(&self, module: &str, version: &VersionTag) -> Result<VersionMetadata> {
        let path = self.version_dir(module, version)?.join(METADATA_FILE_NAME);
        let data =
            fs::read(&path).map_err(|e| RegistryError::io("failed reading version.info", &path, e))?;
        serde_json::from_slice(&data).map_err(|source| RegistryError::MetadataCorrupt {
            module: module.to_string(),
            version: version.to_string(),
            source,
        })
    }

    fn manifest(&self, module: &str, version: &VersionTag) -> Result<Artifact> {
        self.open_artifact(module, version, MANIFEST_FILE_NAME)
    }

    fn archive(&self, module: &str, version: &VersionTag) -> Result<Artifact> {
        self.open_artifact(module, version, ARCHIVE_FILE_NAME)
    }

    fn publish(
        &self,
        module: &str,
        version: &VersionTag,
        archive: &mut dyn Read,
    ) -> Result<PublishReceipt> {
        codec::validate_module_path(module)?;

        // Early rejection only; `commit` makes the authoritative check.
        if self.module_dir(module).join(version.dir_name()).exists() {
            return Err(RegistryError::VersionAlreadyExists {
                module: module.to_string(),
                version: version.to_string(),
            });
        }

        let workspace = StagingWorkspace::create(&self.staging_root())?;
        ingest::advance(module, version, IngestStage::Staged);

        let archive_path = workspace.file(ARCHIVE_FILE_NAME);
        let (archive_hash, archive_size) = persist_archive(archive, &archive_path)?;
        ingest::advance(module, version, IngestStage::ArchiveWritten);

        let staged = File::open(&archive_path)
            .map_err(|e| RegistryError::io("failed opening source as zip", &archive_path, e))?;
        let manifest_bytes = ingest::extract_manifest(BufReader::new(staged), module, version)?;
        write_staged(
            &workspace.file(MANIFEST_FILE_NAME),
            &manifest_bytes,
            "error creating go.mod",
        )?;
        ingest::advance(module, version, IngestStage::ManifestExtracted);

        ingest::verify_identity(module, &manifest_bytes)?;
        ingest::advance(module, version, IngestStage::Validated);

        let metadata = VersionMetadata::published_now(version);
        let metadata_path = workspace.file(METADATA_FILE_NAME);
        let metadata_bytes = serde_json::to_vec(&metadata).map_err(|e| {
            RegistryError::io("failed marshaling version info", &metadata_path, e.into())
        })?;
        write_staged(&metadata_path, &metadata_bytes, "failed writing version info")?;

        self.commit(&workspace, module, version)?;
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

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::io::Cursor;
    use std::sync::Arc;

    use super::*;
    use crate::ingest::test_support::{module_archive, zip_archive};

    fn tag(s: &str) -> VersionTag {
        VersionTag::parse(s).unwrap()
    }

    fn open(dir: &tempfile::TempDir) -> FileRegistry {
        FileRegistry::open(&StoreConfig::new(dir.path())).unwrap()
    }

    fn publish_bytes(
        registry: &FileRegistry,
        module: &str,
        version: &str,
        bytes: &[u8],
    ) -> Result<PublishReceipt> {
        registry.publish(module, &tag(version), &mut Cursor::new(bytes.to_vec()))
    }

    fn staging_is_empty(registry: &FileRegistry) -> bool {
        match fs::read_dir(registry.staging_root()) {
            Ok(mut entries) => entries.next().is_none(),
            Err(e) => e.kind() == io::ErrorKind::NotFound,
        }
    }

    #[test]
    fn open_requires_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = StoreConfig::new(dir.path().join("nope"));
        let err = FileRegistry::open(&missing).unwrap_err();
        assert!(matches!(err, RegistryError::Io { .. }));
    }

    #[test]
    fn publish_and_fetch_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(&dir);

        let module = "example.com/team/widget";
        let archive = module_archive(module, "v1.0.0", module);
        let receipt = publish_bytes(&registry, module, "v1.0.0", &archive).unwrap();
        assert_eq!(receipt.archive_size, archive.len() as u64);
        assert_eq!(receipt.archive_hash, ContentHash::compute(&archive));

        let stored = registry
            .archive("example.com/team/widget", &tag("v1.0.0"))
            .unwrap()
            .into_bytes()
            .unwrap();
        assert_eq!(stored, archive);

        let manifest = registry
            .manifest("example.com/team/widget", &tag("v1.0.0"))
            .unwrap()
            .into_bytes()
            .unwrap();
        assert_eq!(manifest, b"module example.com/team/widget\n\ngo 1.21\n");

        let info = registry
            .version_info("example.com/team/widget", &tag("v1.0.0"))
            .unwrap();
        assert_eq!(info.version, "v1.0.0");
        assert_eq!(info.name, "v1.0.0");
        assert_eq!(info.short, "v1.0.0");
    }

    #[test]
    fn on_disk_layout() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(&dir);

        let archive = module_archive("example.com/a/b", "v0.2.0", "example.com/a/b");
        publish_bytes(&registry, "example.com/a/b", "v0.2.0", &archive).unwrap();

        let version_dir = dir.path().join("example.com_a_b").join("0.2.0");
        assert!(version_dir.join("go.mod").is_file());
        assert!(version_dir.join("source.zip").is_file());

        let raw = fs::read_to_string(version_dir.join("version.info")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["Version"], "v0.2.0");
        assert!(json["Time"].as_str().is_some());
    }

    #[test]
    fn second_publish_conflicts_and_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(&dir);

        let first = module_archive("a/b", "v1.0.0", "a/b");
        publish_bytes(&registry, "a/b", "v1.0.0", &first).unwrap();
        let info_before = registry.version_info("a/b", &tag("v1.0.0")).unwrap();

        let mut second = module_archive("a/b", "v1.0.0", "a/b");
        second.extend_from_slice(b"different trailing bytes");
        let err = publish_bytes(&registry, "a/b", "v1.0.0", &second).unwrap_err();
        assert!(err.is_conflict());

        assert_eq!(registry.version_info("a/b", &tag("v1.0.0")).unwrap(), info_before);
        let stored = registry.archive("a/b", &tag("v1.0.0")).unwrap().into_bytes().unwrap();
        assert_eq!(stored, first);
        assert_eq!(registry.list_versions("a/b").unwrap(), vec![tag("v1.0.0")]);
        assert!(staging_is_empty(&registry));
    }

    #[test]
    fn identity_mismatch_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(&dir);

        let archive = module_archive("a/b", "v1.0.0", "a/c");
        let err = publish_bytes(&registry, "a/b", "v1.0.0", &archive).unwrap_err();
        assert!(matches!(err, RegistryError::IdentityMismatch { .. }));

        assert!(!dir.path().join("a_b").join("1.0.0").exists());
        assert!(!registry.has_module("a/b"));
        assert!(staging_is_empty(&registry));
    }

    #[test]
    fn missing_manifest_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(&dir);

        let archive = zip_archive(&[("a/b@v1.0.0/main.go", &b"package main\n"[..])]);
        let err = publish_bytes(&registry, "a/b", "v1.0.0", &archive).unwrap_err();
        assert!(matches!(err, RegistryError::ManifestMissing { .. }));

        assert!(!dir.path().join("a_b").join("1.0.0").exists());
        assert!(staging_is_empty(&registry));
    }

    #[test]
    fn corrupt_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(&dir);

        let err = publish_bytes(&registry, "a/b", "v1.0.0", b"definitely not a zip").unwrap_err();
        assert!(matches!(err, RegistryError::ArchiveCorrupt { .. }));
        assert!(staging_is_empty(&registry));
    }

    #[test]
    fn failing_upload_stream_aborts() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "client went away"))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let registry = open(&dir);

        let err = registry.publish("a/b", &tag("v1.0.0"), &mut Broken).unwrap_err();
        assert!(matches!(err, RegistryError::Io { .. }));
        assert!(!registry.has_module("a/b"));
        assert!(staging_is_empty(&registry));
    }

    #[test]
    fn not_found_propagation() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(&dir);
        let v1 = tag("v1.0.0");

        assert!(!registry.has_module("x/y"));
        assert!(matches!(
            registry.list_versions("x/y").unwrap_err(),
            RegistryError::ModuleNotFound { .. }
        ));
        assert!(matches!(
            registry.version_info("x/y", &v1).unwrap_err(),
            RegistryError::ModuleNotFound { .. }
        ));
        assert!(matches!(
            registry.manifest("x/y", &v1).unwrap_err(),
            RegistryError::ModuleNotFound { .. }
        ));
        assert!(matches!(
            registry.archive("x/y", &v1).unwrap_err(),
            RegistryError::ModuleNotFound { .. }
        ));

        publish_bytes(&registry, "x/z", "v1.0.0", &module_archive("x/z", "v1.0.0", "x/z")).unwrap();
        let v2 = tag("v2.0.0");
        assert!(matches!(
            registry.version_info("x/z", &v2).unwrap_err(),
            RegistryError::VersionNotFound { .. }
        ));
        assert!(matches!(
            registry.manifest("x/z", &v2).unwrap_err(),
            RegistryError::VersionNotFound { .. }
        ));
        assert!(matches!(
            registry.archive("x/z", &v2).unwrap_err(),
            RegistryError::VersionNotFound { .. }
        ));
    }

    #[test]
    fn listing_is_complete_and_skips_strays() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(&dir);

        for v in ["v1.0.0", "v1.1.0", "v2.0.0"] {
            publish_bytes(&registry, "org/lib", v, &module_archive("org/lib", v, "org/lib")).unwrap();
        }

        let module_dir = dir.path().join("org_lib");
        fs::write(module_dir.join("stray.txt"), b"not a version").unwrap();
        fs::create_dir(module_dir.join("not-semver")).unwrap();
        // A version directory without version.info is still being committed.
        fs::create_dir(module_dir.join("3.0.0")).unwrap();

        let listed: HashSet<String> = registry
            .list_versions("org/lib")
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        let expected: HashSet<String> = ["v1.0.0", "v1.1.0", "v2.0.0"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(listed, expected);

        assert!(matches!(
            registry.version_info("org/lib", &tag("v3.0.0")).unwrap_err(),
            RegistryError::VersionNotFound { .. }
        ));
    }

    #[test]
    fn corrupt_metadata_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(&dir);

        publish_bytes(&registry, "a/b", "v1.0.0", &module_archive("a/b", "v1.0.0", "a/b")).unwrap();
        fs::write(dir.path().join("a_b/1.0.0/version.info"), b"{not json").unwrap();

        let err = registry.version_info("a/b", &tag("v1.0.0")).unwrap_err();
        assert!(matches!(err, RegistryError::MetadataCorrupt { .. }));
    }

    #[test]
    fn invalid_module_paths_are_rejected_before_io() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(&dir);

        let err = publish_bytes(&registry, "../escape", "v1.0.0", b"").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidModulePath { .. }));
        assert!(!registry.staging_root().exists());
        assert!(!registry.has_module("tmp"));
    }

    #[test]
    fn separator_lookalike_paths_do_not_share_storage() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(&dir);

        let archive = module_archive("a/b_c", "v1.0.0", "a/b_c");
        let err = publish_bytes(&registry, "a/b_c", "v1.0.0", &archive).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidModulePath { .. }));
        assert!(!dir.path().join("a_b_c").exists());
        assert!(!registry.has_module("a_b/c"));

        let archive = module_archive("a_b/c", "v1.0.0", "a_b/c");
        let err = publish_bytes(&registry, "a_b/c", "v1.0.0", &archive).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidModulePath { .. }));

        publish_bytes(&registry, "a/b/c", "v1.0.0", &module_archive("a/b/c", "v1.0.0", "a/b/c"))
            .unwrap();
        assert!(!registry.has_module("a/b_c"));
        let err = registry.manifest("a_b/c", &tag("v1.0.0")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidModulePath { .. }));
    }

    #[test]
    fn failed_commit_leaves_no_module_behind() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(&dir);

        // An empty workspace makes the first rename fail.
        let workspace = StagingWorkspace::create(&registry.staging_root()).unwrap();
        let err = registry
            .commit(&workspace, "fresh/mod", &tag("v1.0.0"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Io { .. }));
        assert!(!dir.path().join("fresh_mod").exists());
        assert!(!registry.has_module("fresh/mod"));
        assert!(registry.list_versions("fresh/mod").unwrap_err().is_not_found());
    }

    #[test]
    fn failed_commit_keeps_existing_module() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(&dir);
        publish_bytes(&registry, "a/b", "v1.0.0", &module_archive("a/b", "v1.0.0", "a/b")).unwrap();

        let workspace = StagingWorkspace::create(&registry.staging_root()).unwrap();
        registry.commit(&workspace, "a/b", &tag("v2.0.0")).unwrap_err();

        assert!(!dir.path().join("a_b").join("2.0.0").exists());
        assert_eq!(registry.list_versions("a/b").unwrap(), vec![tag("v1.0.0")]);
    }

    #[test]
    fn reads_records_written_by_other_tooling() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(&dir);

        let version_dir = dir.path().join("example.com_legacy").join("0.1.0");
        fs::create_dir_all(&version_dir).unwrap();
        fs::write(
            version_dir.join("version.info"),
            r#"{"Name":"v0.1.0","Short":"v0.1.0","Time":"2019-06-01T09:00:00.5+02:00","Version":"v0.1.0"}"#,
        )
        .unwrap();
        fs::write(version_dir.join("go.mod"), b"module example.com/legacy\n").unwrap();
        fs::write(version_dir.join("source.zip"), b"PK").unwrap();

        assert_eq!(registry.list_versions("example.com/legacy").unwrap(), vec![tag("v0.1.0")]);
        let info = registry.version_info("example.com/legacy", &tag("v0.1.0")).unwrap();
        assert_eq!(info.short, "v0.1.0");
    }

    #[test]
    fn concurrent_publishes_of_one_version_have_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(open(&dir));
        let archive = Arc::new(module_archive("race/mod", "v1.0.0", "race/mod"));

        let results: Vec<Result<PublishReceipt>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let registry = Arc::clone(&registry);
                    let archive = Arc::clone(&archive);
                    scope.spawn(move || publish_bytes(&registry, "race/mod", "v1.0.0", &archive))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        for result in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(result.is_conflict(), "unexpected error: {result}");
        }
        assert!(staging_is_empty(&registry));
        assert_eq!(
            registry.archive("race/mod", &tag("v1.0.0")).unwrap().into_bytes().unwrap(),
            *archive
        );
    }

    #[test]
    fn concurrent_publishes_of_different_versions_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let registry = open(&dir);

        std::thread::scope(|scope| {
            for minor in 0..6 {
                let registry = &registry;
                scope.spawn(move || {
                    let v = format!("v1.{minor}.0");
                    publish_bytes(registry, "fan/out", &v, &module_archive("fan/out", &v, "fan/out"))
                        .unwrap();
                });
            }
        });

        assert_eq!(registry.list_versions("fan/out").unwrap().len(), 6);
        assert!(staging_is_empty(&registry));
    }
}
