//! Writes resolved identifiers into the compiled template.
//!
//! Usage plan keys get their `KeyId` set from `KeyName`. REST API and root
//! resource ids are injected by replacing placeholder tokens wherever they
//! appear, whole or embedded inside a longer string.

use futures::future::join_all;
use serde_json::Value;
use tracing::{info, warn};

use crate::locator::locate;
use crate::services::{GatewayApi, Lookup, ProviderError};
use crate::template::{Template, USAGE_PLAN_KEY_TYPE};

pub const REST_API_ID_PLACEHOLDER: &str = "#{EasyUsagePlanKey:RestApiId}";
pub const ROOT_RESOURCE_ID_PLACEHOLDER: &str = "#{EasyUsagePlanKey:RootResourceId}";

/// Replaces every occurrence of `placeholder` in every string under `value`.
///
/// Returns how many strings changed. Object keys are left alone.
pub fn substitute_placeholders(value: &mut Value, placeholder: &str, replacement: &str) -> usize {
    match value {
        Value::String(s) if s.contains(placeholder) => {
            *s = s.replace(placeholder, replacement);
            1
        }
        Value::Array(items) => items
            .iter_mut()
            .map(|item| substitute_placeholders(item, placeholder, replacement))
            .sum(),
        Value::Object(map) => map
            .values_mut()
            .map(|item| substitute_placeholders(item, placeholder, replacement))
            .sum(),
        _ => 0,
    }
}

/// Resolves the `KeyName` of every usage plan key resource into a `KeyId`.
///
/// Lookups run concurrently; results are applied once all of them are back,
/// so a provider error leaves the template untouched. Resources whose key
/// cannot be found lose their `KeyName` but get no `KeyId`. Returns the
/// number of resources that received a `KeyId`.
pub async fn patch_usage_plan_keys<A>(template: &mut Template, api: &A) -> Result<usize, ProviderError>
where
    A: GatewayApi + ?Sized,
{
    let mut targets = Vec::new();
    for logical_id in template.logical_ids_of_type(USAGE_PLAN_KEY_TYPE) {
        match template
            .property_str(&logical_id, "KeyName")
            .filter(|name| !name.is_empty())
        {
            Some(name) => targets.push((logical_id, name.to_string())),
            None => warn!(%logical_id, "API key name not found"),
        }
    }

    let lookup = Lookup::ApiKey;
    let lookups = targets.iter().map(|(_, name)| {
        let lookup = &lookup;
        async move {
            info!(key_name = %name, "Finding API key id using the API key name");
            locate(api, lookup, name).await
        }
    });
    let found = join_all(lookups)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    let mut patched = 0;
    for ((logical_id, name), key) in targets.into_iter().zip(found) {
        let Some(properties) = template.properties_mut(&logical_id) else {
            continue;
        };
        match key {
            Some(key) => {
                info!(key_name = %name, api_key_id = %key.id, "API key id found successfully");
                properties.insert("KeyId".to_string(), Value::String(key.id));
                patched += 1;
            }
            None => warn!(key_name = %name, %logical_id, "API key not found"),
        }
        properties.remove("KeyName");
    }

    Ok(patched)
}

/// Looks up a REST API by name and injects its id in place of
/// [`REST_API_ID_PLACEHOLDER`]. Returns the id when found.
pub async fn resolve_rest_api<A>(
    template: &mut Template,
    api: &A,
    name: &str,
) -> Result<Option<String>, ProviderError>
where
    A: GatewayApi + ?Sized,
{
    info!(rest_api_name = %name, "Finding REST API id using the REST API name");
    let Some(rest_api) = locate(api, &Lookup::RestApi, name).await? else {
        warn!(rest_api_name = %name, "REST API not found");
        return Ok(None);
    };

    let replaced =
        substitute_placeholders(template.as_value_mut(), REST_API_ID_PLACEHOLDER, &rest_api.id);
    info!(
        rest_api_name = %name,
        rest_api_id = %rest_api.id,
        replaced,
        "REST API id found successfully"
    );
    Ok(Some(rest_api.id))
}

/// Looks up a resource by path under `rest_api_id` and injects its id in
/// place of [`ROOT_RESOURCE_ID_PLACEHOLDER`]. Returns the id when found.
pub async fn resolve_root_resource<A>(
    template: &mut Template,
    api: &A,
    rest_api_id: &str,
    path: &str,
) -> Result<Option<String>, ProviderError>
where
    A: GatewayApi + ?Sized,
{
    info!(%rest_api_id, %path, "Finding root resource id using the resource path");
    let lookup = Lookup::Resource {
        rest_api_id: rest_api_id.to_string(),
    };
    let Some(resource) = locate(api, &lookup, path).await? else {
        warn!(%rest_api_id, %path, "Root resource not found");
        return Ok(None);
    };

    let replaced = substitute_placeholders(
        template.as_value_mut(),
        ROOT_RESOURCE_ID_PLACEHOLDER,
        &resource.id,
    );
    info!(
        %path,
        root_resource_id = %resource.id,
        replaced,
        "Root resource id found successfully"
    );
    Ok(Some(resource.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::InMemoryGateway;
    use serde_json::json;

    fn usage_plan_key(key_name: Option<&str>) -> Value {
        let mut properties = json!({ "KeyType": "API_KEY", "UsagePlanId": { "Ref": "ApiGatewayUsagePlan" } });
        if let Some(name) = key_name {
            properties["KeyName"] = json!(name);
        }
        json!({ "Type": "AWS::ApiGateway::UsagePlanKey", "Properties": properties })
    }

    #[test]
    fn test_substitute_whole_and_inline() {
        let mut value = json!({
            "RestApiId": REST_API_ID_PLACEHOLDER,
            "Arn": { "Fn::Join": ["", ["arn:aws:execute-api:", REST_API_ID_PLACEHOLDER, "/*"]] },
            "Sub": "https://#{EasyUsagePlanKey:RestApiId}.execute-api.eu-west-1.amazonaws.com",
            "Count": 3
        });
        let replaced = substitute_placeholders(&mut value, REST_API_ID_PLACEHOLDER, "a1b2c3");

        assert_eq!(replaced, 3);
        assert_eq!(value["RestApiId"], "a1b2c3");
        assert_eq!(value["Arn"]["Fn::Join"][1][1], "a1b2c3");
        assert_eq!(
            value["Sub"],
            "https://a1b2c3.execute-api.eu-west-1.amazonaws.com"
        );
    }

    #[test]
    fn test_substitute_is_idempotent() {
        let mut value = json!({ "RestApiId": REST_API_ID_PLACEHOLDER });
        substitute_placeholders(&mut value, REST_API_ID_PLACEHOLDER, "a1b2c3");
        let after_first = value.clone();

        let replaced = substitute_placeholders(&mut value, REST_API_ID_PLACEHOLDER, "other");
        assert_eq!(replaced, 0);
        assert_eq!(value, after_first);
    }

    #[test]
    fn test_substitute_leaves_other_kinds_alone() {
        let mut value = json!({ "ParentId": ROOT_RESOURCE_ID_PLACEHOLDER });
        let replaced = substitute_placeholders(&mut value, REST_API_ID_PLACEHOLDER, "a1b2c3");
        assert_eq!(replaced, 0);
        assert_eq!(value["ParentId"], ROOT_RESOURCE_ID_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_usage_plan_key_gets_key_id() {
        let mut template = Template::from_value(json!({
            "Resources": { "ApiGatewayUsagePlanKey1": usage_plan_key(Some("my-key")) }
        }));
        let gateway = InMemoryGateway::new().with_api_key("abc123", "my-key", None);

        let patched = patch_usage_plan_keys(&mut template, &gateway).await.unwrap();

        assert_eq!(patched, 1);
        let properties = &template.resource("ApiGatewayUsagePlanKey1").unwrap()["Properties"];
        assert_eq!(properties["KeyId"], "abc123");
        assert!(properties.get("KeyName").is_none());
    }

    #[tokio::test]
    async fn test_missing_key_drops_name_without_id() {
        let mut template = Template::from_value(json!({
            "Resources": { "ApiGatewayUsagePlanKey1": usage_plan_key(Some("my-key")) }
        }));
        let gateway = InMemoryGateway::new().with_api_key("zzz", "other-key", None);

        let patched = patch_usage_plan_keys(&mut template, &gateway).await.unwrap();

        assert_eq!(patched, 0);
        let properties = &template.resource("ApiGatewayUsagePlanKey1").unwrap()["Properties"];
        assert!(properties.get("KeyId").is_none());
        assert!(properties.get("KeyName").is_none());
    }

    #[tokio::test]
    async fn test_resource_without_name_is_skipped() {
        let mut template = Template::from_value(json!({
            "Resources": { "ApiGatewayUsagePlanKey1": usage_plan_key(None) }
        }));
        let before = template.clone();
        let gateway = InMemoryGateway::new().with_api_key("abc123", "my-key", None);

        let patched = patch_usage_plan_keys(&mut template, &gateway).await.unwrap();

        assert_eq!(patched, 0);
        assert_eq!(template, before);
        assert_eq!(gateway.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_resource_with_empty_name_is_skipped() {
        let mut template = Template::from_value(json!({
            "Resources": { "ApiGatewayUsagePlanKey1": usage_plan_key(Some("")) }
        }));
        let before = template.clone();
        let gateway = InMemoryGateway::new().with_api_key("abc123", "my-key", None);

        let patched = patch_usage_plan_keys(&mut template, &gateway).await.unwrap();

        assert_eq!(patched, 0);
        assert_eq!(template, before);
        assert_eq!(
            template.property_str("ApiGatewayUsagePlanKey1", "KeyName"),
            Some("")
        );
        assert_eq!(gateway.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_several_keys_patched_concurrently() {
        let mut template = Template::from_value(json!({
            "Resources": {
                "KeyA": usage_plan_key(Some("key-a")),
                "KeyB": usage_plan_key(Some("key-b")),
                "Plan": { "Type": "AWS::ApiGateway::UsagePlan", "Properties": { "KeyName": "key-a" } }
            }
        }));
        let gateway = InMemoryGateway::new()
            .with_api_key("id-a", "key-a", None)
            .with_api_key("id-b", "key-b", None)
            .with_page_size(1);

        let patched = patch_usage_plan_keys(&mut template, &gateway).await.unwrap();

        assert_eq!(patched, 2);
        assert_eq!(template.property_str("KeyA", "KeyId"), Some("id-a"));
        assert_eq!(template.property_str("KeyB", "KeyId"), Some("id-b"));
        // not a usage plan key, untouched
        assert_eq!(template.property_str("Plan", "KeyName"), Some("key-a"));
    }

    #[tokio::test]
    async fn test_patch_twice_is_noop() {
        let mut template = Template::from_value(json!({
            "Resources": { "ApiGatewayUsagePlanKey1": usage_plan_key(Some("my-key")) }
        }));
        let gateway = InMemoryGateway::new().with_api_key("abc123", "my-key", None);

        patch_usage_plan_keys(&mut template, &gateway).await.unwrap();
        let after_first = template.clone();
        let patched = patch_usage_plan_keys(&mut template, &gateway).await.unwrap();

        assert_eq!(patched, 0);
        assert_eq!(template, after_first);
    }

    #[tokio::test]
    async fn test_provider_error_leaves_template_untouched() {
        let mut template = Template::from_value(json!({
            "Resources": { "ApiGatewayUsagePlanKey1": usage_plan_key(Some("my-key")) }
        }));
        let before = template.clone();
        let gateway = InMemoryGateway::new().failing("access denied");

        let result = patch_usage_plan_keys(&mut template, &gateway).await;

        assert!(result.is_err());
        assert_eq!(template, before);
    }

    #[tokio::test]
    async fn test_resolve_rest_api_and_root_resource() {
        let mut template = Template::from_value(json!({
            "Resources": {
                "ApiGatewayResourceUsers": {
                    "Type": "AWS::ApiGateway::Resource",
                    "Properties": {
                        "RestApiId": REST_API_ID_PLACEHOLDER,
                        "ParentId": ROOT_RESOURCE_ID_PLACEHOLDER,
                        "PathPart": "users"
                    }
                }
            }
        }));
        let gateway = InMemoryGateway::new()
            .with_rest_api("other", "other-api")
            .with_rest_api("r3st", "shared-api")
            .with_resource("r3st", "child", "/users")
            .with_resource("r3st", "r00t", "/");

        let rest_api_id = resolve_rest_api(&mut template, &gateway, "shared-api")
            .await
            .unwrap()
            .unwrap();
        let root_id = resolve_root_resource(&mut template, &gateway, &rest_api_id, "/")
            .await
            .unwrap();

        assert_eq!(root_id.as_deref(), Some("r00t"));
        assert_eq!(
            template.property_str("ApiGatewayResourceUsers", "RestApiId"),
            Some("r3st")
        );
        assert_eq!(
            template.property_str("ApiGatewayResourceUsers", "ParentId"),
            Some("r00t")
        );
    }

    #[tokio::test]
    async fn test_unknown_rest_api_keeps_placeholder() {
        let mut template = Template::from_value(json!({
            "Resources": {
                "Method": { "Type": "AWS::ApiGateway::Method", "Properties": { "RestApiId": REST_API_ID_PLACEHOLDER } }
            }
        }));
        let gateway = InMemoryGateway::new().with_rest_api("r3st", "Shared-Api");

        let found = resolve_rest_api(&mut template, &gateway, "shared-api")
            .await
            .unwrap();

        assert!(found.is_none());
        assert_eq!(
            template.property_str("Method", "RestApiId"),
            Some(REST_API_ID_PLACEHOLDER)
        );
    }
}
