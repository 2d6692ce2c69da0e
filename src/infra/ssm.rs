use async_trait::async_trait;
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::types::ParameterType;

use crate::services::error::ProviderError;
use crate::services::parameter_store::ParameterStore;

/// Writes secrets to AWS SSM Parameter Store.
///
/// Values are stored as `SecureString`, so the process needs
/// `ssm:PutParameter` plus the matching KMS permissions.
pub struct SsmParameterStore {
    client: aws_sdk_ssm::Client,
}

impl SsmParameterStore {
    /// Creates a store using the AWS configuration already loaded by
    /// `aws_config::load_defaults`.
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_ssm::Client::new(config),
        }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn put(&self, name: &str, value: &str) -> Result<(), ProviderError> {
        self.client
            .put_parameter()
            .name(name)
            .value(value)
            .r#type(ParameterType::SecureString)
            .overwrite(true)
            .send()
            .await
            .map_err(|e| {
                ProviderError::Service(format!(
                    "SSM PutParameter failed for '{name}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(())
    }
}
