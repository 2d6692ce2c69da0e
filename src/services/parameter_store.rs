use crate::services::error::ProviderError;

/// Writes secrets into a parameter store (SSM Parameter Store in production).
#[async_trait::async_trait]
pub trait ParameterStore: Send + Sync {
    /// Stores `value` under `name`, replacing any existing value.
    async fn put(&self, name: &str, value: &str) -> Result<(), ProviderError>;
}
