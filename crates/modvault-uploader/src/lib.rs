//! Publish client for the modvault registry.
//!
//! Reads the module path from a checkout's `go.mod`, archives the checkout
//! with every entry under `<module>@v<version>/`, and posts the archive to
//! the registry's publish endpoint.

pub mod archive;
pub mod error;
pub mod publish;
pub mod transport;

pub use archive::{Archiver, GitArchiver};
pub use error::{Result, UploadError};
pub use publish::{publish_url, UploadOutcome, Uploader};
pub use transport::{HttpTransport, Transport, TransportResponse};
