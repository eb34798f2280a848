//! Server settings and their TOML file form.
//!
//! ```toml
//! [server]
//! storage = "/srv/modules"
//! port = 8080
//! bind = "127.0.0.1"
//! max_upload_bytes = 104857600
//! ```
//!
//! Every key is optional. Command-line flags and environment variables are
//! layered on top by the binary.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use modvault_store::config::DEFAULT_STORAGE_PATH;
use modvault_store::StoreConfig;
use serde::{Deserialize, Serialize};

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 80;

/// Upload size limit used when none is configured (512 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Errors reading a settings file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Runtime settings of the registry server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Storage base path. Must exist at startup.
    pub storage: PathBuf,
    /// Address to listen on.
    pub bind: IpAddr,
    /// Port to listen on.
    pub port: u16,
    /// Largest accepted publish body.
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            storage: PathBuf::from(DEFAULT_STORAGE_PATH),
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    server: ServerSettings,
}

impl ServerSettings {
    /// Parse settings from TOML text. A missing `[server]` table yields defaults.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<SettingsFile>(text).map(|file| file.server)
    }

    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Socket address to bind.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Store configuration derived from these settings.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.storage.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = ServerSettings::default();
        assert_eq!(settings.storage, PathBuf::from("/tmp/storage"));
        assert_eq!(settings.socket_addr().to_string(), "0.0.0.0:80");
        assert_eq!(settings.max_upload_bytes, 512 * 1024 * 1024);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let settings = ServerSettings::from_toml("[server]\nport = 8080\n").unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.storage, PathBuf::from(DEFAULT_STORAGE_PATH));

        let empty = ServerSettings::from_toml("").unwrap();
        assert_eq!(empty, ServerSettings::default());
    }

    #[test]
    fn full_file() {
        let text = r#"
[server]
storage = "/srv/modules"
bind = "127.0.0.1"
port = 3000
max_upload_bytes = 1024
"#;
        let settings = ServerSettings::from_toml(text).unwrap();
        assert_eq!(settings.store_config().base_path(), Path::new("/srv/modules"));
        assert_eq!(settings.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(settings.max_upload_bytes, 1024);
    }

    #[test]
    fn load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modvault.toml");

        let err = ServerSettings::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        std::fs::write(&path, "[server]\nport = \"eighty\"\n").unwrap();
        let err = ServerSettings::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("modvault.toml"));

        std::fs::write(&path, "[server]\nport = 9000\n").unwrap();
        assert_eq!(ServerSettings::load(&path).unwrap().port, 9000);
    }
}
