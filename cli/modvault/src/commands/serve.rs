//! `modvault serve`: run the registry server.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use modvault_server::ServerSettings;

/// Values given on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct ServeOverrides {
    pub storage: Option<PathBuf>,
    pub bind: Option<IpAddr>,
    pub port: Option<u16>,
    pub max_upload_bytes: Option<usize>,
}

/// Layer flags and environment over the settings file over the defaults.
pub fn resolve_settings(config: Option<&Path>, overrides: &ServeOverrides) -> Result<ServerSettings> {
    let mut settings = match config {
        Some(path) => ServerSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => ServerSettings::default(),
    };

    if let Some(storage) = &overrides.storage {
        settings.storage = storage.clone();
    }
    if let Some(bind) = overrides.bind {
        settings.bind = bind;
    }
    if let Some(port) = overrides.port {
        settings.port = port;
    }
    if let Some(max) = overrides.max_upload_bytes {
        settings.max_upload_bytes = max;
    }
    Ok(settings)
}

/// Run `modvault serve` until interrupted.
pub fn run(settings: &ServerSettings) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime
        .block_on(modvault_server::serve(settings))
        .context("running registry server")
}
