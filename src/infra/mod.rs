//! AWS-backed implementations of the provider traits.

mod apigateway;
mod ssm;

pub use apigateway::ApiGatewayClient;
pub use ssm::SsmParameterStore;
