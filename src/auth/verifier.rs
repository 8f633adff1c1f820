//! Bearer token verification: RS256 signature and claim validation.
//!
//! # Verification flow
//!
//! 1. Decode the JWT header and reject any algorithm other than RS256,
//!    including HS256 tokens keyed with the public key and `none`.
//! 2. Verify the signature against the public key fetched at construction.
//! 3. Validate `exp` / `nbf` when present, and `aud` when audiences are
//!    configured.
//! 4. Require the claims to be a JSON object with a non-empty string `sub`.
//!
//! The key is fetched once. Rotating the KMS key requires a restart.

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::AuthConfig;
use crate::key::{KeyError, KeyProvider, pem::der_to_pem};

/// The only accepted signing algorithm.
pub const EXPECTED_ALGORITHM: Algorithm = Algorithm::RS256;

/// Why a bearer token was rejected. Logged, never returned to clients.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// Malformed token, bad signature, wrong algorithm, expired, etc.
    #[error("JWT verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// The verified claims carry no usable `sub`.
    #[error("token has no subject claim")]
    MissingSubject,
}

/// Turns a bearer token into the subject it was issued for.
///
/// The authentication gate depends on this trait rather than on
/// [`JwtVerifier`] so it can be exercised with stubs.
pub trait BearerVerifier: Send + Sync {
    /// Verify `token` and return its `sub` claim.
    fn verify(&self, token: &str) -> Result<String, VerifyError>;
}

/// RS256 verifier bound to a single public key.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Fetch the public key once and build a verifier around it.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if the provider fails or the key does not decode.
    pub async fn from_provider(
        provider: &dyn KeyProvider,
        config: &AuthConfig,
    ) -> Result<Self, KeyError> {
        let der = provider.get_public_key().await?;
        Self::from_der(&der, config)
    }

    /// Build a verifier from DER (`SubjectPublicKeyInfo`) key bytes.
    pub fn from_der(der: &[u8], config: &AuthConfig) -> Result<Self, KeyError> {
        let pem = der_to_pem(der);
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())?;

        Ok(Self {
            key,
            validation: build_validation(config),
        })
    }
}

impl BearerVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<String, VerifyError> {
        let data = jsonwebtoken::decode::<Map<String, Value>>(token, &self.key, &self.validation)?;

        let subject = extract_subject(&data.claims)?;
        debug!(subject = %subject, "Bearer token verified");
        Ok(subject)
    }
}

/// Build the [`Validation`] used for every token.
fn build_validation(config: &AuthConfig) -> Validation {
    let mut v = Validation::new(EXPECTED_ALGORITHM);
    v.leeway = config.leeway_secs;
    v.validate_nbf = true;
    // exp and nbf are validated when present but not mandatory
    v.required_spec_claims.clear();

    if config.audiences.is_empty() {
        v.validate_aud = false;
    } else {
        v.set_audience(&config.audiences);
    }
    v
}

/// Pull a non-empty string `sub` out of verified claims.
fn extract_subject(claims: &Map<String, Value>) -> Result<String, VerifyError> {
    match claims.get("sub") {
        Some(Value::String(sub)) if !sub.is_empty() => Ok(sub.clone()),
        _ => Err(VerifyError::MissingSubject),
    }
}
