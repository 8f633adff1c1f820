//! Secret store adapter.
//!
//! Token handlers never see a concrete store. They depend on the narrow
//! capabilities below, each satisfied by [`AwsSecretStore`] in production and
//! [`InMemorySecretStore`] for local runs and tests.

pub mod aws;
pub mod memory;

use std::fmt;

use async_trait::async_trait;

pub use aws::AwsSecretStore;
pub use memory::InMemorySecretStore;

/// Domain segment used for OAuth token secrets.
pub const TOKEN_DOMAIN: &str = "token";

/// Hierarchical secret name: `<root-domain>/<domain>/<user-id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretId(String);

impl SecretId {
    /// Compose an id from its three segments. No escaping is applied.
    #[must_use]
    pub fn compose(root_domain: &str, domain: &str, user_id: &str) -> Self {
        Self(format!("{root_domain}/{domain}/{user_id}"))
    }

    /// The full secret name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Secret store failures.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    /// No secret exists under this id.
    #[error("secret {0} not found")]
    NotFound(String),

    /// The secret exists but holds no string value.
    #[error("secret {0} has no string value")]
    EmptyValue(String),

    /// Any other store failure.
    #[error("secret store request for {id} failed: {message}")]
    Upstream {
        /// Secret the request targeted.
        id: String,
        /// Error detail from the store.
        message: String,
    },
}

impl SecretError {
    /// Whether this is the distinguished "does not exist" outcome.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Read the current value of a secret.
#[async_trait]
pub trait SecretGetter: Send + Sync {
    /// Current string value of `id`.
    async fn get(&self, id: &SecretId) -> Result<String, SecretError>;
}

/// Replace the value of an existing secret.
#[async_trait]
pub trait SecretPutter: Send + Sync {
    /// Store `value` as the new version of `id`.
    async fn put(&self, id: &SecretId, value: &str) -> Result<(), SecretError>;
}

/// Create a secret that does not exist yet.
#[async_trait]
pub trait SecretCreator: Send + Sync {
    /// Create `id` holding `value`.
    async fn create(&self, id: &SecretId, value: &str) -> Result<(), SecretError>;
}

/// Probe whether a secret exists.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    /// `Ok` if `id` exists, [`SecretError::NotFound`] if it does not.
    async fn describe(&self, id: &SecretId) -> Result<(), SecretError>;
}
