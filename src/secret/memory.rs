//! In-memory secret store backed by `DashMap`.
//!
//! Follows the same contract as Secrets Manager so it can stand in for it
//! during local runs (`secrets.backend: memory`) and in tests. Contents are
//! lost on restart.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use super::{SecretCreator, SecretError, SecretGetter, SecretId, SecretPutter, SecretResolver};

/// Process-local secret store.
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: DashMap<String, String>,
}

impl InMemorySecretStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored secrets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Whether the store holds no secrets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

#[async_trait]
impl SecretGetter for InMemorySecretStore {
    async fn get(&self, id: &SecretId) -> Result<String, SecretError> {
        self.secrets
            .get(id.as_str())
            .map(|v| v.value().clone())
            .ok_or_else(|| SecretError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl SecretPutter for InMemorySecretStore {
    async fn put(&self, id: &SecretId, value: &str) -> Result<(), SecretError> {
        let mut entry = self
            .secrets
            .get_mut(id.as_str())
            .ok_or_else(|| SecretError::NotFound(id.to_string()))?;
        *entry = value.to_owned();
        debug!(secret_id = %id, "Secret updated");
        Ok(())
    }
}

#[async_trait]
impl SecretCreator for InMemorySecretStore {
    async fn create(&self, id: &SecretId, value: &str) -> Result<(), SecretError> {
        match self.secrets.entry(id.as_str().to_owned()) {
            Entry::Occupied(_) => Err(SecretError::Upstream {
                id: id.to_string(),
                message: "secret already exists".to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(value.to_owned());
                debug!(secret_id = %id, "Secret created");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl SecretResolver for InMemorySecretStore {
    async fn describe(&self, id: &SecretId) -> Result<(), SecretError> {
        if self.secrets.contains_key(id.as_str()) {
            Ok(())
        } else {
            Err(SecretError::NotFound(id.to_string()))
        }
    }
}
