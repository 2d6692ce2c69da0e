//! Forces API Gateway to create new deployments on every package.
//!
//! CloudFormation only creates a deployment when its logical ID is new, so
//! each `AWS::ApiGateway::Deployment` is renamed to `<id><epoch millis>` and
//! every pointer to it is rewritten to the new ID.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::template::{DEPLOYMENT_TYPE, Template};

/// Renames deployment resources with `epoch_millis` as a suffix and rewrites
/// `Ref`, `Fn::GetAtt`, `Fn::Sub` and `DependsOn` pointers anywhere in the
/// template. Returns the old-to-new logical ID map (empty when the template
/// has no deployments).
///
/// A deployment whose new ID is already taken by a resource that is not
/// renamed itself keeps its ID, so no descriptor is ever overwritten.
pub fn freshen(template: &mut Template, epoch_millis: i64) -> BTreeMap<String, String> {
    let mut renames: BTreeMap<String, String> = template
        .logical_ids_of_type(DEPLOYMENT_TYPE)
        .into_iter()
        .map(|id| {
            let fresh = format!("{id}{epoch_millis}");
            (id, fresh)
        })
        .collect();

    if let Some(resources) = template.resources() {
        // Dropping one rename keeps its key in place, which can block another.
        loop {
            let blocked: Vec<String> = renames
                .iter()
                .filter(|(_, new)| resources.contains_key(*new) && !renames.contains_key(*new))
                .map(|(old, _)| old.clone())
                .collect();
            if blocked.is_empty() {
                break;
            }
            for old in blocked {
                if let Some(new) = renames.remove(&old) {
                    warn!(from = %old, to = %new, "Logical ID already in use, deployment not renamed");
                }
            }
        }
    }

    if renames.is_empty() {
        debug!("No deployment resources to freshen");
        return renames;
    }

    if let Some(resources) = template.resources_mut() {
        // Remove every old key before inserting, since a new ID may equal
        // another deployment's old one.
        let moved: Vec<(String, Value)> = renames
            .iter()
            .filter_map(|(old, new)| Some((new.clone(), resources.remove(old)?)))
            .collect();
        resources.extend(moved);
    }

    let rewritten = rewrite_references(template.as_value_mut(), &renames);
    for (old, new) in &renames {
        info!(from = %old, to = %new, "Deployment renamed");
    }
    info!(deployments = renames.len(), rewritten, "Deployment references updated");

    renames
}

fn rewrite_references(value: &mut Value, renames: &BTreeMap<String, String>) -> usize {
    let mut rewritten = 0;
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                rewritten += match key.as_str() {
                    "Ref" => rename_str(child, renames),
                    "DependsOn" => rename_str_or_list(child, renames),
                    "Fn::GetAtt" => rewrite_get_att(child, renames),
                    "Fn::Sub" => rewrite_sub(child, renames),
                    _ => 0,
                };
                rewritten += rewrite_references(child, renames);
            }
        }
        Value::Array(items) => {
            for item in items {
                rewritten += rewrite_references(item, renames);
            }
        }
        _ => {}
    }
    rewritten
}

fn rename_str(value: &mut Value, renames: &BTreeMap<String, String>) -> usize {
    if let Value::String(s) = value {
        if let Some(new) = renames.get(s.as_str()) {
            *s = new.clone();
            return 1;
        }
    }
    0
}

fn rename_str_or_list(value: &mut Value, renames: &BTreeMap<String, String>) -> usize {
    match value {
        Value::Array(items) => items.iter_mut().map(|item| rename_str(item, renames)).sum(),
        _ => rename_str(value, renames),
    }
}

/// `Fn::GetAtt` is either `[LogicalId, Attr]` or the short `"LogicalId.Attr"`.
fn rewrite_get_att(value: &mut Value, renames: &BTreeMap<String, String>) -> usize {
    match value {
        Value::Array(items) => items
            .first_mut()
            .map(|first| rename_str(first, renames))
            .unwrap_or(0),
        Value::String(s) => {
            let Some((id, attr)) = s.split_once('.') else {
                return 0;
            };
            match renames.get(id) {
                Some(new) => {
                    *s = format!("{new}.{attr}");
                    1
                }
                None => 0,
            }
        }
        _ => 0,
    }
}

/// `Fn::Sub` is either a template string or `[template, variables]`; the
/// variables map is handled by the regular walk.
fn rewrite_sub(value: &mut Value, renames: &BTreeMap<String, String>) -> usize {
    let target = match value {
        Value::Array(items) => items.first_mut(),
        other => Some(other),
    };
    let Some(Value::String(s)) = target else {
        return 0;
    };

    // Single left-to-right scan so a new ID is never renamed a second time.
    let mut rewritten = 0;
    let mut out = String::with_capacity(s.len());
    let mut rest = s.as_str();
    while let Some(start) = rest.find("${") {
        let (before, tail) = rest.split_at(start + 2);
        out.push_str(before);
        let Some(end) = tail.find('}') else {
            rest = tail;
            break;
        };
        let variable = &tail[..end];
        let (id, attr) = match variable.split_once('.') {
            Some((id, attr)) => (id, Some(attr)),
            None => (variable, None),
        };
        match (renames.get(id), attr) {
            (Some(new), Some(attr)) => {
                out.push_str(&format!("{new}.{attr}"));
                rewritten += 1;
            }
            (Some(new), None) => {
                out.push_str(new);
                rewritten += 1;
            }
            (None, _) => out.push_str(variable),
        }
        rest = &tail[end..];
    }
    out.push_str(rest);

    if rewritten > 0 {
        *s = out;
    }
    rewritten
}
