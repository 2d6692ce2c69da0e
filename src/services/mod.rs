//! Provider-facing abstractions.
//!
//! [`GatewayApi`] lists named API Gateway resources page by page and reveals
//! API key values. [`ParameterStore`] writes secrets. Production
//! implementations live in [`crate::infra`]; [`memory`] holds in-memory ones.

pub mod error;
pub mod gateway_api;
pub mod memory;
pub mod parameter_store;

pub use error::ProviderError;
pub use gateway_api::{GatewayApi, Lookup, Page, RemoteRecord};
pub use parameter_store::ParameterStore;
