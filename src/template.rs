//! The compiled CloudFormation template the hooks operate on.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

pub const USAGE_PLAN_KEY_TYPE: &str = "AWS::ApiGateway::UsagePlanKey";
pub const DEPLOYMENT_TYPE: &str = "AWS::ApiGateway::Deployment";

/// A compiled template: a JSON object whose `Resources` member maps logical
/// IDs to `{ "Type": ..., "Properties": {...} }` descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    root: Value,
}

impl Template {
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Loads a template from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read template {}", path.display()))?;
        let root: Value = serde_json::from_str(&content)
            .with_context(|| format!("template {} is not valid JSON", path.display()))?;
        Ok(Self { root })
    }

    /// Writes the template back as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(&self.root)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write template {}", path.display()))?;
        Ok(())
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn as_value_mut(&mut self) -> &mut Value {
        &mut self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    pub fn resources(&self) -> Option<&Map<String, Value>> {
        self.root.get("Resources")?.as_object()
    }

    pub fn resources_mut(&mut self) -> Option<&mut Map<String, Value>> {
        self.root.get_mut("Resources")?.as_object_mut()
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Value> {
        self.resources()?.get(logical_id)
    }

    /// Logical IDs of every resource whose `Type` contains `type_tag`.
    pub fn logical_ids_of_type(&self, type_tag: &str) -> Vec<String> {
        self.resources()
            .map(|resources| {
                resources
                    .iter()
                    .filter(|(_, resource)| {
                        resource
                            .get("Type")
                            .and_then(Value::as_str)
                            .is_some_and(|t| t.contains(type_tag))
                    })
                    .map(|(id, _)| id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The `Properties` mapping of a resource, if it has one.
    pub fn properties_mut(&mut self, logical_id: &str) -> Option<&mut Map<String, Value>> {
        self.resources_mut()?
            .get_mut(logical_id)?
            .get_mut("Properties")?
            .as_object_mut()
    }

    /// Reads a string property of a resource.
    pub fn property_str(&self, logical_id: &str, property: &str) -> Option<&str> {
        self.resource(logical_id)?
            .get("Properties")?
            .get(property)?
            .as_str()
    }
}

impl From<Value> for Template {
    fn from(root: Value) -> Self {
        Self::from_value(root)
    }
}
