//! Version tags as they appear in the proxy protocol.
//!
//! On the wire a version is always `v` + semver (`v1.2.3`); on disk the
//! version directory drops the prefix (`1.2.3`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::RegistryError;

/// A parsed semantic version.
pub type Version = semver::Version;

/// Prefix carried by every protocol-facing version.
const TAG_PREFIX: char = 'v';

/// A semantic version rendered with a leading `v`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionTag(Version);

impl VersionTag {
    /// Wrap an already-parsed version.
    pub fn new(version: Version) -> Self {
        VersionTag(version)
    }

    /// Parse a protocol tag. The `v` prefix is mandatory.
    pub fn parse(tag: &str) -> Result<Self, RegistryError> {
        let bare = tag
            .strip_prefix(TAG_PREFIX)
            .ok_or_else(|| RegistryError::InvalidVersion {
                version: tag.to_string(),
                detail: "missing 'v' prefix".to_string(),
            })?;
        parse_version(bare)
            .map(VersionTag)
            .map_err(|e| RegistryError::InvalidVersion {
                version: tag.to_string(),
                detail: e.to_string(),
            })
    }

    /// Parse either `v1.2.3` or `1.2.3`.
    pub fn parse_lenient(input: &str) -> Result<Self, RegistryError> {
        let bare = input.strip_prefix(TAG_PREFIX).unwrap_or(input);
        parse_version(bare)
            .map(VersionTag)
            .map_err(|e| RegistryError::InvalidVersion {
                version: input.to_string(),
                detail: e.to_string(),
            })
    }

    /// The underlying semantic version.
    pub fn version(&self) -> &Version {
        &self.0
    }

    /// Directory name used on disk (no prefix).
    pub fn dir_name(&self) -> String {
        self.0.to_string()
    }
}

impl From<Version> for VersionTag {
    fn from(version: Version) -> Self {
        VersionTag(version)
    }
}

impl FromStr for VersionTag {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionTag::parse(s)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TAG_PREFIX}{}", self.0)
    }
}

impl Serialize for VersionTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        VersionTag::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse a version string like "1.2.3".
pub fn parse_version(s: &str) -> Result<Version, semver::Error> {
    Version::parse(s)
}
