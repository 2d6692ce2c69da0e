use thiserror::Error;

/// Errors surfaced by the API Gateway and Parameter Store boundaries.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider reported that the requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other error returned by the provider or the SDK transport.
    #[error("AWS service error: {0}")]
    Service(String),

    /// The provider answered but left out a field we need.
    #[error("response is missing `{0}`")]
    MissingField(&'static str),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }
}
