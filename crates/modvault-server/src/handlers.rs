//! Axum router and request handlers.
//!
//! Store operations are blocking filesystem work, so every handler moves
//! them onto the blocking pool. Artifacts are streamed out from there and
//! their handles are released once the response body has been sent. Upload
//! bodies are streamed into the ingester under the configured size limit.

use std::io::{Seek, SeekFrom};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use modvault_store::{
    format_version_list, Artifact, DownloadService, RegistryBackend, UploadService,
};
use serde_json::json;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::route::{self, Parsed, ProxyRequest, UploadRequest};
use crate::streaming::{self, LimitedReader};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_ZIP: &str = "application/zip";

/// Format of the `Last-Modified` and `If-Modified-Since` headers.
const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    download: DownloadService,
    upload: UploadService,
    max_upload_bytes: usize,
}

impl AppState {
    /// State serving reads and publishes from one backend.
    pub fn new(backend: Arc<dyn RegistryBackend>, max_upload_bytes: usize) -> Self {
        AppState {
            download: DownloadService::new(backend.clone()),
            upload: UploadService::new(backend),
            max_upload_bytes,
        }
    }
}

/// Build the registry router.
pub fn router(backend: Arc<dyn RegistryBackend>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/_modulesproxy/*rest", get(proxy))
        .route("/_modules/*rest", post(publish))
        .fallback(not_found)
        .layer(middleware::from_fn(go_get_discovery))
        .with_state(AppState::new(backend, max_upload_bytes))
}

/// Answer `?go-get=1` with the discovery page, whatever the path and method.
async fn go_get_discovery(request: Request, next: Next) -> Response {
    if route::is_go_get(request.uri().query()) {
        return discovery_page(request.headers());
    }
    next.run(request).await
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn proxy(
    State(state): State<AppState>,
    Path(rest): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let request = match ProxyRequest::parse(&rest) {
        Parsed::Ok(request) => request,
        Parsed::BadVersion(e) => return Err(e.into()),
        Parsed::NoRoute => return Ok(StatusCode::NOT_FOUND.into_response()),
    };
    debug!(module = request.module(), ?request, "proxy request");

    let download = state.download;
    match request {
        ProxyRequest::List { module } => {
            let versions =
                tokio::task::spawn_blocking(move || download.list_versions(&module)).await??;
            let body = format_version_list(&versions);
            Ok(([(header::CONTENT_TYPE, TEXT_PLAIN)], body).into_response())
        }
        ProxyRequest::Info { module, version } => {
            let metadata =
                tokio::task::spawn_blocking(move || download.version_info(&module, &version))
                    .await??;
            Ok(Json(metadata).into_response())
        }
        ProxyRequest::Mod { module, version } => {
            let opened = open_artifact(move || download.manifest(&module, &version)).await?;
            Ok(artifact_response(opened, TEXT_PLAIN, &headers))
        }
        ProxyRequest::Zip { module, version } => {
            let opened = open_artifact(move || download.archive(&module, &version)).await?;
            Ok(artifact_response(opened, APPLICATION_ZIP, &headers))
        }
    }
}

/// An artifact together with its length in bytes.
type Opened = (Artifact, u64);

async fn open_artifact<F>(open: F) -> Result<Opened, ApiError>
where
    F: FnOnce() -> modvault_store::Result<Artifact> + Send + 'static,
{
    tokio::task::spawn_blocking(move || -> Result<Opened, ApiError> {
        let mut artifact = open()?;
        let len = artifact
            .reader
            .seek(SeekFrom::End(0))
            .and_then(|len| artifact.reader.rewind().map(|()| len))
            .map_err(ApiError::Read)?;
        Ok((artifact, len))
    })
    .await?
}

fn not_modified_since(headers: &HeaderMap, modified: DateTime<Utc>) -> bool {
    headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| DateTime::parse_from_rfc2822(value).ok())
        .is_some_and(|since| modified.timestamp() <= since.timestamp())
}

fn artifact_response(
    (artifact, len): Opened,
    content_type: &'static str,
    headers: &HeaderMap,
) -> Response {
    let last_modified = artifact.modified.format(HTTP_DATE).to_string();
    if not_modified_since(headers, artifact.modified) {
        return (
            StatusCode::NOT_MODIFIED,
            [(header::LAST_MODIFIED, last_modified)],
        )
            .into_response();
    }
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::LAST_MODIFIED, last_modified),
            (header::CONTENT_LENGTH, len.to_string()),
        ],
        streaming::artifact_body(artifact),
    )
        .into_response()
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

async fn publish(
    State(state): State<AppState>,
    Path(rest): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, ApiError> {
    let UploadRequest { module, version } = match UploadRequest::parse(&rest) {
        Parsed::Ok(request) => request,
        Parsed::BadVersion(e) => return Err(e.into()),
        Parsed::NoRoute => return Ok(StatusCode::NOT_FOUND.into_response()),
    };
    let limit = state.max_upload_bytes;
    let declared = declared_length(&headers);
    if declared.is_some_and(|len| len > limit as u64) {
        return Err(ApiError::TooLarge { limit });
    }
    debug!(%module, %version, ?declared, "publish request");

    let mut reader = LimitedReader::new(streaming::body_reader(body), limit as u64);
    let upload = state.upload;
    let receipt = tokio::task::spawn_blocking(move || {
        let published = upload.create_module_version(&module, &version, &mut reader);
        if reader.exceeded() {
            return Err(ApiError::TooLarge { limit });
        }
        published.map_err(ApiError::from)
    })
    .await??;
    info!(
        module = %receipt.module,
        version = %receipt.version,
        "accepted publish"
    );

    let body = json!({
        "module": receipt.module,
        "version": receipt.version.to_string(),
        "size": receipt.archive_size,
        "sha256": receipt.archive_hash.as_str(),
    });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// The go-import page pointing the go tool at this host's proxy endpoint.
fn discovery_page(headers: &HeaderMap) -> Response {
    let Some(host) = headers.get(header::HOST).and_then(|h| h.to_str().ok()) else {
        return (StatusCode::BAD_REQUEST, "missing Host header").into_response();
    };
    Html(format!(
        "<html>\n\t<head>\n\t\t<meta name=\"go-import\" content=\"{host} mod https://{host}/_modulesproxy\">\n\t</head>\n</html>\n"
    ))
    .into_response()
}
