//! PEM file key provider, for running without KMS.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{KeyError, KeyProvider, pem::pem_to_der};

/// Reads a `PUBLIC KEY` PEM file on each call.
#[derive(Debug, Clone)]
pub struct PemFileKeyProvider {
    path: PathBuf,
}

impl PemFileKeyProvider {
    /// Provider for the PEM file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The configured file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl KeyProvider for PemFileKeyProvider {
    async fn get_public_key(&self) -> Result<Vec<u8>, KeyError> {
        let pem = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| KeyError::Io {
                path: self.path.display().to_string(),
                source,
            })?;

        pem_to_der(&pem)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::key::pem::der_to_pem;

    #[tokio::test]
    async fn reads_der_from_pem_file() {
        // GIVEN: a PEM file on disk
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(der_to_pem(b"public-key-bytes").as_bytes())
            .unwrap();

        // WHEN: the provider reads it
        let provider = PemFileKeyProvider::new(file.path());
        let der = provider.get_public_key().await.unwrap();

        // THEN: the DER payload comes back
        assert_eq!(der, b"public-key-bytes");
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let provider = PemFileKeyProvider::new("/nonexistent/key.pem");
        assert_eq!(provider.path(), Path::new("/nonexistent/key.pem"));

        let err = provider.get_public_key().await.unwrap_err();

        assert!(matches!(err, KeyError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/key.pem"));
    }
}
