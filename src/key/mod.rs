//! Public key providers for bearer token verification.
//!
//! A [`KeyProvider`] returns the raw DER (`SubjectPublicKeyInfo`) encoding of
//! the RSA key whose private half signs incoming bearer tokens. The verifier
//! asks for it exactly once, at construction.

pub mod file;
pub mod kms;
pub mod pem;

use async_trait::async_trait;

pub use file::PemFileKeyProvider;
pub use kms::KmsKeyProvider;

/// Error variants for key retrieval and decoding.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// The key management service rejected or failed the request.
    #[error("unable to get public key from KMS: {0}")]
    Kms(String),

    /// The service answered without key material.
    #[error("KMS returned no public key for {0}")]
    MissingKeyMaterial(String),

    /// Reading a key file failed.
    #[error("unable to read public key file {path}: {source}")]
    Io {
        /// File that could not be read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A PEM envelope was malformed.
    #[error("malformed PEM public key: {0}")]
    Pem(String),

    /// The key bytes do not decode into an RSA public key.
    #[error("failed to parse public key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),
}

/// Source of the verification key.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Fetch the DER encoded public key.
    async fn get_public_key(&self) -> Result<Vec<u8>, KeyError>;
}
