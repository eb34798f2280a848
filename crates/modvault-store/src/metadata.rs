//! The `version.info` record served by the `.info` endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::version::VersionTag;

/// File name of the persisted metadata record inside a version directory.
pub const METADATA_FILE_NAME: &str = "version.info";

/// Per-version metadata, derived by the ingester at publish time.
///
/// Serialized with the proxy protocol's field names:
/// `{"Name":"v1.0.0","Short":"v1.0.0","Time":"2024-01-01T00:00:00Z","Version":"v1.0.0"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionMetadata {
    /// Display name.
    pub name: String,
    /// Short name.
    pub short: String,
    /// Publish instant.
    pub time: DateTime<Utc>,
    /// Version tag.
    pub version: String,
}

impl VersionMetadata {
    /// Build the metadata for a version published at `time`.
    pub fn new(tag: &VersionTag, time: DateTime<Utc>) -> Self {
        let rendered = tag.to_string();
        VersionMetadata {
            name: rendered.clone(),
            short: rendered.clone(),
            time,
            version: rendered,
        }
    }

    /// Build the metadata for a version published now.
    pub fn published_now(tag: &VersionTag) -> Self {
        Self::new(tag, Utc::now())
    }
}
