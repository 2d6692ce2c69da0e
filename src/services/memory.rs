//! In-memory [`GatewayApi`] and [`ParameterStore`] implementations.
//!
//! Listings are split into pages of a configurable size so callers follow
//! `position` exactly as they do against the real API.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::services::error::ProviderError;
use crate::services::gateway_api::{GatewayApi, Lookup, Page, RemoteRecord};
use crate::services::parameter_store::ParameterStore;

const DEFAULT_PAGE_SIZE: usize = 25;

/// In-memory stand-in for API Gateway.
#[derive(Debug)]
pub struct InMemoryGateway {
    api_keys: Vec<RemoteRecord>,
    key_values: HashMap<String, String>,
    rest_apis: Vec<RemoteRecord>,
    resources: HashMap<String, Vec<RemoteRecord>>,
    page_size: usize,
    failure: Option<String>,
    list_calls: AtomicUsize,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            key_values: HashMap::new(),
            rest_apis: Vec::new(),
            resources: HashMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            failure: None,
            list_calls: AtomicUsize::new(0),
        }
    }
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an API key. Keys without a value can be listed but not revealed.
    #[must_use]
    pub fn with_api_key(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        value: Option<&str>,
    ) -> Self {
        let record = RemoteRecord::new(id, name);
        if let Some(value) = value {
            self.key_values.insert(record.id.clone(), value.to_string());
        }
        self.api_keys.push(record);
        self
    }

    #[must_use]
    pub fn with_rest_api(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.rest_apis.push(RemoteRecord::new(id, name));
        self
    }

    #[must_use]
    pub fn with_resource(
        mut self,
        rest_api_id: impl Into<String>,
        id: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        self.resources
            .entry(rest_api_id.into())
            .or_default()
            .push(RemoteRecord::new(id, path));
        self
    }

    /// Sets how many records each listing page carries (minimum 1).
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Makes every call fail with a service error carrying `message`.
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Number of `list_page` calls served so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), ProviderError> {
        match &self.failure {
            Some(message) => Err(ProviderError::Service(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GatewayApi for InMemoryGateway {
    async fn list_page(
        &self,
        lookup: &Lookup,
        position: Option<String>,
    ) -> Result<Page, ProviderError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let records = match lookup {
            Lookup::ApiKey => &self.api_keys,
            Lookup::RestApi => &self.rest_apis,
            Lookup::Resource { rest_api_id } => self
                .resources
                .get(rest_api_id)
                .ok_or_else(|| ProviderError::NotFound(format!("REST API {rest_api_id}")))?,
        };

        let start = match position {
            Some(position) => position
                .parse::<usize>()
                .map_err(|_| ProviderError::Service(format!("invalid position '{position}'")))?,
            None => 0,
        };
        let end = (start + self.page_size).min(records.len());
        let items = records.get(start..end).unwrap_or_default().to_vec();
        let position = (end < records.len()).then(|| end.to_string());

        Ok(Page { items, position })
    }

    async fn api_key_value(&self, key_id: &str) -> Result<String, ProviderError> {
        self.check_failure()?;
        self.key_values
            .get(key_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("API key {key_id}")))
    }
}

/// In-memory stand-in for SSM Parameter Store.
#[derive(Debug, Default)]
pub struct InMemoryParameterStore {
    parameters: Mutex<HashMap<String, String>>,
    failure: Option<String>,
}

impl InMemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.parameters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.parameters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ParameterStore for InMemoryParameterStore {
    async fn put(&self, name: &str, value: &str) -> Result<(), ProviderError> {
        if let Some(message) = &self.failure {
            return Err(ProviderError::Service(message.clone()));
        }
        self.parameters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_string(), value.to_string());
        Ok(())
    }
}
