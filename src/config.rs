//! Plugin configuration.
//!
//! [`PluginConfig`] names the REST API and root resource to resolve and
//! lists the [`SecretSpec`]s to publish. Loaded from a JSON file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_ROOT_RESOURCE_PATH: &str = "/";

/// Plugin settings, mirroring the `custom.easyUsagePlanKey` block of a
/// Serverless service.
///
/// Stored as a JSON object on disk:
/// ```json
/// {
///   "restApiName": "shared-api",
///   "rootResourcePath": "/",
///   "freshDeployments": true,
///   "secrets": [
///     { "keyName": "partner-key", "parameterName": "/app/partner/api-key" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginConfig {
    /// Name of an existing REST API whose id replaces the REST API placeholder.
    pub rest_api_name: Option<String>,
    /// Path of the resource whose id replaces the root resource placeholder.
    /// Only used together with `rest_api_name`; defaults to `/`.
    pub root_resource_path: Option<String>,
    /// Rename deployment resources so every package creates a new deployment.
    pub fresh_deployments: bool,
    /// API key values to copy into Parameter Store.
    pub secrets: Vec<SecretSpec>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            rest_api_name: None,
            root_resource_path: None,
            fresh_deployments: true,
            secrets: Vec::new(),
        }
    }
}

/// Copy the value of API key `key_name` into parameter `parameter_name`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretSpec {
    pub key_name: String,
    pub parameter_name: String,
}

impl PluginConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn root_resource_path(&self) -> &str {
        self.root_resource_path
            .as_deref()
            .unwrap_or(DEFAULT_ROOT_RESOURCE_PATH)
    }
}
