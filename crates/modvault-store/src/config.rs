//! Store configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default storage location when none is configured.
pub const DEFAULT_STORAGE_PATH: &str = "/tmp/storage";

/// Configuration for a filesystem-backed store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding every module. Must exist before the store is opened.
    pub base_path: PathBuf,
}

impl StoreConfig {
    /// Configuration rooted at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            base_path: base_path.into(),
        }
    }

    /// The configured base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::new(DEFAULT_STORAGE_PATH)
    }
}
