use std::fmt;

use crate::services::error::ProviderError;

/// Which API Gateway listing endpoint a lookup goes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// `GetApiKeys`, matched on the key name.
    ApiKey,
    /// `GetRestApis`, matched on the REST API name.
    RestApi,
    /// `GetResources` under one REST API, matched on the resource path.
    Resource { rest_api_id: String },
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::ApiKey => write!(f, "API key"),
            Lookup::RestApi => write!(f, "REST API"),
            Lookup::Resource { rest_api_id } => write!(f, "resource of REST API {rest_api_id}"),
        }
    }
}

/// A named resource as reported by API Gateway.
///
/// `name` is the display name used for matching; for path resources it holds
/// the resource path (`/`, `/users`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRecord {
    pub id: String,
    pub name: String,
}

impl RemoteRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One page of a listing call. `position` is `None` on the last page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<RemoteRecord>,
    pub position: Option<String>,
}

/// Abstraction over the API Gateway management API.
#[async_trait::async_trait]
pub trait GatewayApi: Send + Sync {
    /// Fetches one page of `lookup`, continuing from `position` when given.
    async fn list_page(
        &self,
        lookup: &Lookup,
        position: Option<String>,
    ) -> Result<Page, ProviderError>;

    /// Returns the secret value of the API key with the given id.
    async fn api_key_value(&self, key_id: &str) -> Result<String, ProviderError>;
}
