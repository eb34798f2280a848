//! HTTP transport for publish requests.

use std::sync::OnceLock;
use std::time::Duration;

use crate::error::{Result, UploadError};

/// Network timeout for a publish request.
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(300);

/// Status and body of a registry response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

/// Sends an archive to a publish URL.
///
/// Abstracted so the uploader can be tested without a network.
pub trait Transport {
    /// POST `archive` to `url` and return whatever the server answered.
    fn post_archive(&self, url: &str, archive: &[u8]) -> Result<TransportResponse>;
}

/// Transport backed by `ureq`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpTransport;

impl Transport for HttpTransport {
    fn post_archive(&self, url: &str, archive: &[u8]) -> Result<TransportResponse> {
        let transport_error = |reason: String| UploadError::Transport {
            url: url.to_owned(),
            reason,
        };
        let response = http_agent()
            .post(url)
            .header("Content-Type", "application/zip")
            .send(archive)
            .map_err(|e| transport_error(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| transport_error(e.to_string()))?;
        Ok(TransportResponse { status, body })
    }
}

/// Shared `ureq` agent. Non-2xx statuses are returned as responses so their
/// bodies can be reported.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(PUBLISH_TIMEOUT))
            .http_status_as_error(false)
            .build();
        ureq::Agent::new_with_config(config)
    })
}
