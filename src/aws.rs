//! Shared AWS SDK configuration
//!
//! Loaded once at startup and handed to the KMS and Secrets Manager clients.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::debug;

use crate::config::AwsConfig;

/// Resolve credentials and region from the SDK default chain, applying the
/// configured overrides on top.
pub async fn load_sdk_config(config: &AwsConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &config.endpoint_url {
        debug!(endpoint = %endpoint, "Using AWS endpoint override");
        loader = loader.endpoint_url(endpoint);
    }

    loader.load().await
}
