//! Error types for token-vault

use std::io;

use thiserror::Error;

use crate::key::KeyError;
use crate::secret::SecretError;

/// Result type alias for token-vault
pub type Result<T> = std::result::Result<T, Error>;

/// Startup and runtime errors surfaced outside the request path
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Public key could not be fetched or decoded
    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    /// Secret store error
    #[error("Secret store error: {0}")]
    Secret(#[from] SecretError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
