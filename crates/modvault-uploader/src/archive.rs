//! Source archive production.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{Result, UploadError};

/// Produces a zip of a module checkout with every entry under `prefix`.
pub trait Archiver {
    /// Write the archive of `module_dir` to `dest`.
    fn archive(&self, module_dir: &Path, prefix: &str, dest: &Path) -> Result<()>;
}

/// Archives the committed `HEAD` of a git checkout with `git archive`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitArchiver;

impl Archiver for GitArchiver {
    fn archive(&self, module_dir: &Path, prefix: &str, dest: &Path) -> Result<()> {
        debug!(dir = %module_dir.display(), %prefix, "running git archive");
        let output = Command::new("git")
            .arg("archive")
            .arg("-o")
            .arg(dest)
            .arg("--prefix")
            .arg(prefix)
            .arg("HEAD")
            .current_dir(module_dir)
            .output()
            .map_err(|e| UploadError::Archive {
                message: format!("failed to invoke git: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(UploadError::Archive {
                message: format!("git archive failed: {}", stderr.trim()),
            });
        }
        Ok(())
    }
}

/// Entry prefix for a module version: `<module>@v<version>/`.
pub fn entry_prefix(module: &str, version: &semver::Version) -> String {
    format!("{module}@v{version}/")
}
