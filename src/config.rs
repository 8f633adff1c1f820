//! Configuration management
//!
//! Layering, lowest to highest precedence: built-in defaults, the optional
//! YAML file, `TOKEN_VAULT_`-prefixed environment variables (nested with
//! `__`), then the deployment variables `SMS_ROOT_DOMAIN` and `KMS_KEY_ID`.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Secret store configuration
    pub secrets: SecretsConfig,
    /// Verification key configuration
    pub key: KeyConfig,
    /// Bearer token validation tuning
    pub auth: AuthConfig,
    /// AWS client overrides
    pub aws: AwsConfig,
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist, cannot be parsed,
    /// or required values are missing.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        // Load from file if provided
        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment
            .merge(Env::prefixed("TOKEN_VAULT_").split("__"))
            .merge(
                Env::raw()
                    .only(&["SMS_ROOT_DOMAIN"])
                    .map(|_| "secrets.root_domain".into()),
            )
            .merge(
                Env::raw()
                    .only(&["KMS_KEY_ID"])
                    .map(|_| "key.key_id".into()),
            );

        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Check that every value required by the selected backends is present.
    pub fn validate(&self) -> Result<()> {
        if self.secrets.root_domain.trim().is_empty() {
            return Err(Error::Config(
                "secrets.root_domain is not set (SMS_ROOT_DOMAIN)".to_string(),
            ));
        }

        match self.key.backend {
            KeyBackend::Kms if self.key.key_id.trim().is_empty() => Err(Error::Config(
                "key.key_id is not set (KMS_KEY_ID)".to_string(),
            )),
            KeyBackend::File if self.key.public_key_file.is_none() => Err(Error::Config(
                "key.public_key_file is required when key.backend is 'file'".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Whether any configured backend talks to AWS.
    #[must_use]
    pub fn needs_aws(&self) -> bool {
        self.secrets.backend == SecretBackend::Aws || self.key.backend == KeyBackend::Kms
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size: 64 * 1024,
        }
    }
}

/// Where token secrets live
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretBackend {
    /// AWS Secrets Manager
    #[default]
    Aws,
    /// Process-local map; contents are lost on restart
    Memory,
}

/// Secret store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// Backend selection
    pub backend: SecretBackend,
    /// First segment of every secret id (`<root_domain>/token/<user_id>`)
    pub root_domain: String,
}

/// Where the verification public key comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyBackend {
    /// AWS KMS `GetPublicKey`
    #[default]
    Kms,
    /// PEM encoded `PUBLIC KEY` on disk
    File,
}

/// Verification key configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Backend selection
    pub backend: KeyBackend,
    /// KMS key id, ARN or alias
    pub key_id: String,
    /// PEM file path for the `file` backend
    pub public_key_file: Option<PathBuf>,
}

/// Bearer token validation tuning
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Clock skew tolerance applied to `exp` and `nbf`, in seconds
    pub leeway_secs: u64,
    /// Accepted `aud` values; empty disables the audience check
    pub audiences: Vec<String>,
}

/// AWS client overrides. Unset values fall back to the SDK default chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// Region override
    pub region: Option<String>,
    /// Endpoint override, e.g. a LocalStack URL
    pub endpoint_url: Option<String>,
}
