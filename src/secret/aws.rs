//! AWS Secrets Manager store.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::{
    Client,
    error::{DisplayErrorContext, SdkError},
    operation::{
        describe_secret::DescribeSecretError, get_secret_value::GetSecretValueError,
        put_secret_value::PutSecretValueError,
    },
};
use tracing::debug;

use super::{SecretCreator, SecretError, SecretGetter, SecretId, SecretPutter, SecretResolver};

/// Secrets Manager client implementing every store capability.
#[derive(Clone)]
pub struct AwsSecretStore {
    client: Client,
}

impl AwsSecretStore {
    /// Build a store from a shared SDK configuration.
    #[must_use]
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self::with_client(Client::new(sdk_config))
    }

    /// Build a store around an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn upstream<E, R>(id: &SecretId, err: &SdkError<E, R>) -> SecretError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    SecretError::Upstream {
        id: id.to_string(),
        message: DisplayErrorContext(err).to_string(),
    }
}

#[async_trait]
impl SecretGetter for AwsSecretStore {
    async fn get(&self, id: &SecretId) -> Result<String, SecretError> {
        debug!(secret_id = %id, "GetSecretValue");

        let output = self
            .client
            .get_secret_value()
            .secret_id(id.as_str())
            .send()
            .await
            .map_err(|e: SdkError<GetSecretValueError, _>| {
                if e.as_service_error()
                    .is_some_and(GetSecretValueError::is_resource_not_found_exception)
                {
                    SecretError::NotFound(id.to_string())
                } else {
                    upstream(id, &e)
                }
            })?;

        output
            .secret_string()
            .map(str::to_owned)
            .ok_or_else(|| SecretError::EmptyValue(id.to_string()))
    }
}

#[async_trait]
impl SecretPutter for AwsSecretStore {
    async fn put(&self, id: &SecretId, value: &str) -> Result<(), SecretError> {
        debug!(secret_id = %id, "PutSecretValue");

        self.client
            .put_secret_value()
            .secret_id(id.as_str())
            .secret_string(value)
            .send()
            .await
            .map_err(|e: SdkError<PutSecretValueError, _>| {
                if e.as_service_error()
                    .is_some_and(PutSecretValueError::is_resource_not_found_exception)
                {
                    SecretError::NotFound(id.to_string())
                } else {
                    upstream(id, &e)
                }
            })?;

        Ok(())
    }
}

#[async_trait]
impl SecretCreator for AwsSecretStore {
    async fn create(&self, id: &SecretId, value: &str) -> Result<(), SecretError> {
        debug!(secret_id = %id, "CreateSecret");

        self.client
            .create_secret()
            .name(id.as_str())
            .secret_string(value)
            .send()
            .await
            .map_err(|e| upstream(id, &e))?;

        Ok(())
    }
}

#[async_trait]
impl SecretResolver for AwsSecretStore {
    async fn describe(&self, id: &SecretId) -> Result<(), SecretError> {
        debug!(secret_id = %id, "DescribeSecret");

        self.client
            .describe_secret()
            .secret_id(id.as_str())
            .send()
            .await
            .map_err(|e: SdkError<DescribeSecretError, _>| {
                if e.as_service_error()
                    .is_some_and(DescribeSecretError::is_resource_not_found_exception)
                {
                    SecretError::NotFound(id.to_string())
                } else {
                    upstream(id, &e)
                }
            })?;

        Ok(())
    }
}
