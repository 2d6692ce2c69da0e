//! Copies API key values into Parameter Store.
//!
//! Runs after the deployment itself, so nothing here may fail the hook:
//! every error is logged and recorded in the returned [`PublishReport`].

use anyhow::{Result, anyhow};
use tracing::{error, info};

use crate::config::SecretSpec;
use crate::locator::locate;
use crate::services::{GatewayApi, Lookup, ParameterStore};

/// Outcome of one [`publish`] run, by parameter name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub published: Vec<String>,
    pub failed: Vec<String>,
}

/// Publishes every spec in order. Never returns an error.
pub async fn publish<A, S>(api: &A, store: &S, specs: &[SecretSpec]) -> PublishReport
where
    A: GatewayApi + ?Sized,
    S: ParameterStore + ?Sized,
{
    let mut report = PublishReport::default();

    for spec in specs {
        match publish_one(api, store, spec).await {
            Ok(()) => {
                info!(
                    key_name = %spec.key_name,
                    parameter = %spec.parameter_name,
                    "API key value stored in Parameter Store"
                );
                report.published.push(spec.parameter_name.clone());
            }
            Err(e) => {
                error!(
                    key_name = %spec.key_name,
                    parameter = %spec.parameter_name,
                    error = %e,
                    "Failed to store API key value"
                );
                report.failed.push(spec.parameter_name.clone());
            }
        }
    }

    report
}

async fn publish_one<A, S>(api: &A, store: &S, spec: &SecretSpec) -> Result<()>
where
    A: GatewayApi + ?Sized,
    S: ParameterStore + ?Sized,
{
    let key = locate(api, &Lookup::ApiKey, &spec.key_name)
        .await?
        .ok_or_else(|| anyhow!("API key '{}' not found", spec.key_name))?;
    let value = api.api_key_value(&key.id).await?;
    store.put(&spec.parameter_name, &value).await?;
    Ok(())
}
