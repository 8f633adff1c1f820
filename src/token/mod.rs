//! OAuth token persistence on top of the secret store capabilities.
//!
//! Each user owns one secret, `<root-domain>/token/<user-id>`, holding the
//! JSON encoding of a [`Token`]. Saving overwrites it wholesale.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::secret::{
    SecretCreator, SecretError, SecretGetter, SecretId, SecretPutter, SecretResolver, TOKEN_DOMAIN,
};

/// Stored OAuth credentials.
///
/// Fields written by other clients (`token_type`, ...) are ignored on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Token {
    /// OAuth access token.
    pub access_token: String,
    /// OAuth refresh token.
    pub refresh_token: String,
    /// Access token expiry, RFC3339 on the wire.
    pub expiry: Option<DateTime<Utc>>,
}

/// Body of `PUT /token/save`.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveTokenRequest {
    /// User the token belongs to.
    pub user_id: String,
    /// OAuth access token.
    pub access_token: String,
    /// OAuth refresh token.
    pub refresh_token: String,
    /// Access token expiry.
    pub expiry: DateTime<Utc>,
}

impl SaveTokenRequest {
    /// Whether every string field is non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.user_id.is_empty() && !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }

    /// The token to persist.
    #[must_use]
    pub fn token(&self) -> Token {
        Token {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expiry: Some(self.expiry),
        }
    }
}

/// Token service failures.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The secret store failed.
    #[error(transparent)]
    Secret(#[from] SecretError),

    /// The token could not be encoded or the stored blob could not be decoded.
    #[error("token encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The stored token has an empty access token.
    #[error("stored token {0} has no access token")]
    EmptyAccessToken(String),
}

/// Persist a user's token.
#[async_trait]
pub trait SaveToken: Send + Sync {
    /// Create or overwrite the token stored for `user_id`.
    async fn save_token(&self, user_id: &str, token: &Token) -> Result<(), TokenError>;
}

/// Load a user's token.
#[async_trait]
pub trait RetrieveToken: Send + Sync {
    /// The token stored for `user_id`.
    async fn retrieve_token(&self, user_id: &str) -> Result<Token, TokenError>;
}

/// Resolve-then-create-or-put token writer.
pub struct TokenSaver {
    root_domain: String,
    resolver: Arc<dyn SecretResolver>,
    putter: Arc<dyn SecretPutter>,
    creator: Arc<dyn SecretCreator>,
}

impl TokenSaver {
    /// Build a saver from its three capabilities.
    pub fn new(
        root_domain: impl Into<String>,
        resolver: Arc<dyn SecretResolver>,
        putter: Arc<dyn SecretPutter>,
        creator: Arc<dyn SecretCreator>,
    ) -> Self {
        Self {
            root_domain: root_domain.into(),
            resolver,
            putter,
            creator,
        }
    }

    /// Build a saver from a store that provides every capability.
    pub fn from_store<S>(root_domain: impl Into<String>, store: Arc<S>) -> Self
    where
        S: SecretResolver + SecretPutter + SecretCreator + 'static,
    {
        Self::new(root_domain, store.clone(), store.clone(), store)
    }
}

#[async_trait]
impl SaveToken for TokenSaver {
    async fn save_token(&self, user_id: &str, token: &Token) -> Result<(), TokenError> {
        let value = serde_json::to_string(token)?;
        let id = SecretId::compose(&self.root_domain, TOKEN_DOMAIN, user_id);

        match self.resolver.describe(&id).await {
            Ok(()) => {
                self.putter.put(&id, &value).await?;
                info!(secret_id = %id, "Token updated");
            }
            Err(e) if e.is_not_found() => {
                self.creator.create(&id, &value).await?;
                info!(secret_id = %id, "Token created");
            }
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }
}

/// Resolve-then-get token reader.
pub struct TokenRetriever {
    root_domain: String,
    resolver: Arc<dyn SecretResolver>,
    getter: Arc<dyn SecretGetter>,
}

impl TokenRetriever {
    /// Build a retriever from its two capabilities.
    pub fn new(
        root_domain: impl Into<String>,
        resolver: Arc<dyn SecretResolver>,
        getter: Arc<dyn SecretGetter>,
    ) -> Self {
        Self {
            root_domain: root_domain.into(),
            resolver,
            getter,
        }
    }

    /// Build a retriever from a store that provides both capabilities.
    pub fn from_store<S>(root_domain: impl Into<String>, store: Arc<S>) -> Self
    where
        S: SecretResolver + SecretGetter + 'static,
    {
        Self::new(root_domain, store.clone(), store)
    }
}

#[async_trait]
impl RetrieveToken for TokenRetriever {
    async fn retrieve_token(&self, user_id: &str) -> Result<Token, TokenError> {
        let id = SecretId::compose(&self.root_domain, TOKEN_DOMAIN, user_id);

        self.resolver.describe(&id).await?;
        let value = self.getter.get(&id).await?;
        let token: Token = serde_json::from_str(&value)?;

        if token.access_token.is_empty() {
            return Err(TokenError::EmptyAccessToken(id.to_string()));
        }

        debug!(secret_id = %id, "Token retrieved");
        Ok(token)
    }
}
