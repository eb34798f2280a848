//! HTTP front end for the modvault registry.
//!
//! Exposes the module proxy read endpoints under `/_modulesproxy/`, the
//! publish endpoint under `/_modules/`, and the `?go-get=1` discovery page.

pub mod error;
pub mod handlers;
pub mod route;
pub mod server;
pub mod settings;
pub mod streaming;

pub use error::{ApiError, ServerError};
pub use handlers::{router, AppState};
pub use server::{run, serve};
pub use settings::{ConfigError, ServerSettings};
