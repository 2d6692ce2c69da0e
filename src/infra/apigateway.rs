use async_trait::async_trait;
use aws_sdk_apigateway::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use tracing::debug;

use crate::services::error::ProviderError;
use crate::services::gateway_api::{GatewayApi, Lookup, Page, RemoteRecord};

/// API Gateway caps listing pages at 500 items.
const PAGE_LIMIT: i32 = 500;

/// [`GatewayApi`] backed by the AWS API Gateway (v1) management API.
pub struct ApiGatewayClient {
    client: aws_sdk_apigateway::Client,
}

impl ApiGatewayClient {
    /// Creates a client from an already loaded AWS configuration (region,
    /// credentials, endpoint overrides).
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_apigateway::Client::new(config),
        }
    }
}

/// Maps an SDK error onto [`ProviderError`], keeping `NotFoundException`
/// distinguishable from every other failure.
fn classify<E>(err: SdkError<E>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    if err.code() == Some("NotFoundException") {
        ProviderError::NotFound(err.message().unwrap_or("resource not found").to_string())
    } else {
        ProviderError::Service(DisplayErrorContext(&err).to_string())
    }
}

fn record(id: Option<&str>, name: Option<&str>) -> Option<RemoteRecord> {
    Some(RemoteRecord::new(id?, name?))
}

#[async_trait]
impl GatewayApi for ApiGatewayClient {
    async fn list_page(
        &self,
        lookup: &Lookup,
        position: Option<String>,
    ) -> Result<Page, ProviderError> {
        debug!(%lookup, position = position.as_deref(), "Listing page");

        let page = match lookup {
            Lookup::ApiKey => {
                let resp = self
                    .client
                    .get_api_keys()
                    .set_position(position)
                    .limit(PAGE_LIMIT)
                    .send()
                    .await
                    .map_err(classify)?;
                Page {
                    items: resp
                        .items()
                        .iter()
                        .filter_map(|k| record(k.id(), k.name()))
                        .collect(),
                    position: resp.position().map(str::to_string),
                }
            }
            Lookup::RestApi => {
                let resp = self
                    .client
                    .get_rest_apis()
                    .set_position(position)
                    .limit(PAGE_LIMIT)
                    .send()
                    .await
                    .map_err(classify)?;
                Page {
                    items: resp
                        .items()
                        .iter()
                        .filter_map(|api| record(api.id(), api.name()))
                        .collect(),
                    position: resp.position().map(str::to_string),
                }
            }
            Lookup::Resource { rest_api_id } => {
                let resp = self
                    .client
                    .get_resources()
                    .rest_api_id(rest_api_id)
                    .set_position(position)
                    .limit(PAGE_LIMIT)
                    .send()
                    .await
                    .map_err(classify)?;
                Page {
                    items: resp
                        .items()
                        .iter()
                        .filter_map(|r| record(r.id(), r.path()))
                        .collect(),
                    position: resp.position().map(str::to_string),
                }
            }
        };

        Ok(page)
    }

    async fn api_key_value(&self, key_id: &str) -> Result<String, ProviderError> {
        let resp = self
            .client
            .get_api_key()
            .api_key(key_id)
            .include_value(true)
            .send()
            .await
            .map_err(classify)?;

        resp.value()
            .map(str::to_string)
            .ok_or(ProviderError::MissingField("value"))
    }
}
