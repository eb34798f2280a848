//! Request path parsing for the proxy and publish endpoints.
//!
//! Module paths contain slashes, so the routes capture everything after the
//! endpoint prefix and split off the `/@v/...` suffix here.

use modvault_store::{RegistryError, VersionTag};

/// Marker separating the module path from the version part.
const VERSION_MARKER: &str = "/@v/";

/// A parsed read request under `/_modulesproxy/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyRequest {
    /// `<module>/@v/list`
    List { module: String },
    /// `<module>/@v/<tag>.info`
    Info { module: String, version: VersionTag },
    /// `<module>/@v/<tag>.mod`
    Mod { module: String, version: VersionTag },
    /// `<module>/@v/<tag>.zip`
    Zip { module: String, version: VersionTag },
}

/// Result of parsing a request path.
#[derive(Debug)]
pub enum Parsed<T> {
    /// The path names a known endpoint.
    Ok(T),
    /// The path has the right shape but an unusable version.
    BadVersion(RegistryError),
    /// No endpoint matches.
    NoRoute,
}

fn split_module(rest: &str) -> Option<(&str, &str)> {
    let (module, tail) = rest.trim_start_matches('/').rsplit_once(VERSION_MARKER)?;
    if module.is_empty() || tail.is_empty() {
        return None;
    }
    Some((module, tail))
}

impl ProxyRequest {
    /// Parse the part of the path after `/_modulesproxy/`.
    pub fn parse(rest: &str) -> Parsed<Self> {
        let Some((module, tail)) = split_module(rest) else {
            return Parsed::NoRoute;
        };
        let module = module.to_string();
        if tail == "list" {
            return Parsed::Ok(ProxyRequest::List { module });
        }

        let Some((tag, ext)) = tail.rsplit_once('.') else {
            return Parsed::NoRoute;
        };
        if !matches!(ext, "info" | "mod" | "zip") {
            return Parsed::NoRoute;
        }
        let version = match VersionTag::parse(tag) {
            Ok(version) => version,
            Err(e) => return Parsed::BadVersion(e),
        };
        Parsed::Ok(match ext {
            "info" => ProxyRequest::Info { module, version },
            "mod" => ProxyRequest::Mod { module, version },
            _ => ProxyRequest::Zip { module, version },
        })
    }

    /// Module path the request is about.
    pub fn module(&self) -> &str {
        match self {
            ProxyRequest::List { module }
            | ProxyRequest::Info { module, .. }
            | ProxyRequest::Mod { module, .. }
            | ProxyRequest::Zip { module, .. } => module,
        }
    }
}

/// A parsed publish request under `/_modules/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Module being published.
    pub module: String,
    /// Version being published.
    pub version: VersionTag,
}

impl UploadRequest {
    /// Parse the part of the path after `/_modules/`.
    pub fn parse(rest: &str) -> Parsed<Self> {
        let Some((module, tag)) = split_module(rest) else {
            return Parsed::NoRoute;
        };
        if tag.contains('/') {
            return Parsed::NoRoute;
        }
        match VersionTag::parse(tag) {
            Ok(version) => Parsed::Ok(UploadRequest {
                module: module.to_string(),
                version,
            }),
            Err(e) => Parsed::BadVersion(e),
        }
    }
}

/// Whether a query string asks for the go-import discovery page.
pub fn is_go_get(query: Option<&str>) -> bool {
    query.is_some_and(|q| q.split('&').any(|pair| pair == "go-get=1"))
}
