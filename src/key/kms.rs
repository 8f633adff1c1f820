//! AWS KMS backed key provider.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_kms::{Client, error::DisplayErrorContext};
use tracing::debug;

use super::{KeyError, KeyProvider};

/// Fetches the public half of an asymmetric KMS signing key.
///
/// Every call is a network round trip; the verifier calls it once at startup.
pub struct KmsKeyProvider {
    client: Client,
    key_id: String,
}

impl KmsKeyProvider {
    /// Build a provider from a shared SDK configuration.
    #[must_use]
    pub fn new(sdk_config: &SdkConfig, key_id: impl Into<String>) -> Self {
        Self::with_client(Client::new(sdk_config), key_id)
    }

    /// Build a provider around an existing client.
    #[must_use]
    pub fn with_client(client: Client, key_id: impl Into<String>) -> Self {
        Self {
            client,
            key_id: key_id.into(),
        }
    }

    /// The configured key id, ARN or alias.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}

#[async_trait]
impl KeyProvider for KmsKeyProvider {
    async fn get_public_key(&self) -> Result<Vec<u8>, KeyError> {
        debug!(key_id = %self.key_id, "Fetching public key from KMS");

        let output = self
            .client
            .get_public_key()
            .key_id(&self.key_id)
            .send()
            .await
            .map_err(|e| KeyError::Kms(DisplayErrorContext(&e).to_string()))?;

        output
            .public_key()
            .map(|blob| blob.as_ref().to_vec())
            .filter(|der| !der.is_empty())
            .ok_or_else(|| KeyError::MissingKeyMaterial(self.key_id.clone()))
    }
}
