//! Shared error types for the services crate.

use thiserror::Error;

/// Errors raised while talking to the progress backend.
///
/// The store logs and swallows these; they only surface to callers of
/// `ProgressApi` directly.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("no identified user, progress cannot be loaded")]
    UnidentifiedUser,
    #[error("progress endpoint {0} cannot carry path segments")]
    InvalidEndpoint(String),
    #[error("progress request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("progress backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors emitted while building service configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid progress api url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("progress api url {0} cannot be used as a base")]
    NotABase(String),
}

/// Errors emitted while loading a tutorial catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}
