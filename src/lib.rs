//! token-vault library
//!
//! A small backend that stores OAuth credentials on behalf of authenticated
//! users. Callers present an RS256-signed bearer token; the token is verified
//! against a public key fetched from AWS KMS at startup, and the verified
//! `sub` claim selects the user's secret in AWS Secrets Manager.
//!
//! # Layout
//!
//! - [`key`]: public key providers (KMS, PEM file)
//! - [`auth`]: token verifier and the axum authentication gate
//! - [`secret`]: secret id composition and the narrow store capabilities
//! - [`token`]: save / retrieve services built on those capabilities
//! - [`server`]: router, handlers, startup wiring and graceful shutdown

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod aws;
pub mod cli;
pub mod config;
pub mod error;
pub mod key;
pub mod secret;
pub mod server;
pub mod token;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match format {
        Some("json") => subscriber.with(fmt::layer().json()).try_init(),
        _ => subscriber.with(fmt::layer()).try_init(),
    };

    installed.map_err(|e| Error::Internal(format!("Failed to install tracing subscriber: {e}")))
}
