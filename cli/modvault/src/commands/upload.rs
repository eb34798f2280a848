//! `modvault upload`: publish a module checkout to a registry.

use std::path::Path;

use anyhow::{bail, Context, Result};
use modvault_store::VersionTag;
use modvault_uploader::Uploader;

/// Run `modvault upload --registry <url> --version <semver> --module <dir>`.
pub fn run(registry: &str, version: &str, module_dir: &Path) -> Result<()> {
    let tag = VersionTag::parse_lenient(version)
        .with_context(|| format!("{version} is not a valid semver"))?;
    if !module_dir.is_dir() {
        bail!(
            "failed checking module location: {} is not a directory",
            module_dir.display()
        );
    }

    let outcome = Uploader::new(registry)
        .upload(module_dir, tag.version())
        .context("failed uploading")?;
    println!(
        "Published {}@{} ({} bytes) to {}",
        outcome.module, tag, outcome.archive_size, outcome.url
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_version() {
        let dir = tempfile::tempdir().unwrap();
        let err = run("http://127.0.0.1:1", "one.two", dir.path()).unwrap_err();
        assert!(err.to_string().contains("is not a valid semver"));
    }

    #[test]
    fn rejects_missing_module_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = run("http://127.0.0.1:1", "1.0.0", &dir.path().join("absent")).unwrap_err();
        assert!(err.to_string().contains("failed checking module location"));
    }

    #[test]
    fn reports_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = run("http://127.0.0.1:1", "v1.0.0", dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("go.mod"));
    }
}
