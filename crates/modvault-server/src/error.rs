//! HTTP error mapping.

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use modvault_store::RegistryError;
use tracing::error;

/// A failed request, rendered as a status code and a plain-text body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A registry operation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The blocking worker running a registry operation did not complete.
    #[error("registry worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    /// Reading a stored artifact failed after the backend handed it out.
    #[error("failed to read stored artifact: {0}")]
    Read(#[source] std::io::Error),

    /// The upload body is larger than the configured limit.
    #[error("upload exceeds the {limit} byte limit")]
    TooLarge { limit: usize },
}

impl ApiError {
    /// Status code this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Registry(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Registry(e) if e.is_conflict() => StatusCode::CONFLICT,
            ApiError::Registry(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}

/// Errors starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to open storage: {0}")]
    Registry(#[from] RegistryError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server terminated: {0}")]
    Serve(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(e: RegistryError) -> StatusCode {
        ApiError::from(e).status()
    }

    #[test]
    fn registry_errors_map_to_statuses() {
        assert_eq!(
            status_of(RegistryError::ModuleNotFound {
                module: "a/b".to_string()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(RegistryError::VersionNotFound {
                module: "a/b".to_string(),
                version: "v1.0.0".to_string(),
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(RegistryError::VersionAlreadyExists {
                module: "a/b".to_string(),
                version: "v1.0.0".to_string(),
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(RegistryError::IdentityMismatch {
                expected: "a/b".to_string(),
                declared: "a/c".to_string(),
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RegistryError::io(
                "writing archive",
                "/tmp/x",
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            )),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn other_errors_render_their_cause() {
        let e = ApiError::Read(std::io::Error::other("disk gone"));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.to_string(), "failed to read stored artifact: disk gone");
        assert!(std::error::Error::source(&e).is_some());

        let e = ApiError::TooLarge { limit: 64 };
        assert_eq!(e.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(e.to_string(), "upload exceeds the 64 byte limit");
    }

    #[test]
    fn body_is_error_text() {
        let e = ApiError::from(RegistryError::ManifestMissing {
            entry: "a/b@v1.0.0/go.mod".to_string(),
        });
        assert_eq!(e.to_string(), "a/b@v1.0.0/go.mod not found in uploaded archive");
    }
}
