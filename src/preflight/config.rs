// src/preflight/config.rs
//
// Per-node config validation against the knowledge index (spec §4.7 phase 1).

use std::collections::HashMap;

use serde_json::Value;

use crate::knowledge::KnowledgeIndex;
use crate::model::LiteNode;

use super::PreflightIssue;

fn is_expression(v: &Value) -> bool {
    matches!(v, Value::String(s) if s.starts_with('='))
}

fn is_empty(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

pub fn validate_node_config(node: &LiteNode, knowledge: &KnowledgeIndex, errors: &mut Vec<PreflightIssue>, warnings: &mut Vec<PreflightIssue>) {
    let Some(schema) = knowledge.get_node(&node.node_type) else {
        warnings.push(PreflightIssue::warning(
            "unknown_node_type",
            Some(&node.name),
            None,
            format!("node type {:?} is not in the knowledge index; use search_nodes to find the closest match", node.node_type),
        ));
        return;
    };

    let current_values: HashMap<String, Value> = node
        .params
        .as_ref()
        .and_then(|p| p.as_object())
        .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();

    for property in &schema.properties {
        if !property.is_visible(&current_values) {
            continue;
        }
        let value = current_values.get(&property.name);
        if property.required {
            match value {
                None => {
                    errors.push(PreflightIssue::error(
                        "missing_required_property",
                        Some(&node.name),
                        Some(format!("params.{}", property.name)),
                        format!("required property {:?} is missing", property.name),
                        format!("set params.{}", property.name),
                    ));
                    continue;
                }
                Some(v) if is_empty(v) => {
                    errors.push(PreflightIssue::error(
                        "missing_required_property",
                        Some(&node.name),
                        Some(format!("params.{}", property.name)),
                        format!("required property {:?} is empty", property.name),
                        format!("set a non-empty value for params.{}", property.name),
                    ));
                    continue;
                }
                _ => {}
            }
        }
        if let (Some(options), Some(Value::String(s))) = (&property.enum_options, value) {
            if !is_expression(value.unwrap()) && !options.contains(s) {
                errors.push(PreflightIssue::error(
                    "invalid_enum_value",
                    Some(&node.name),
                    Some(format!("params.{}", property.name)),
                    format!("{:?} is not one of the allowed values for {:?}", s, property.name),
                    format!("use one of: {}", options.join(", ")),
                ));
            }
        }
    }

    if let Some(resource_ops) = &schema.resource_operations {
        let resource = current_values.get("resource").and_then(|v| v.as_str());
        let operation = current_values.get("operation").and_then(|v| v.as_str());
        if let Some(resource) = resource {
            if !current_values.get("resource").map(is_expression).unwrap_or(false) {
                if !resource_ops.resources.contains(&resource.to_string()) {
                    errors.push(PreflightIssue::error(
                        "invalid_resource",
                        Some(&node.name),
                        Some("params.resource".to_string()),
                        format!("{resource:?} is not a declared resource"),
                        format!("use one of: {}", resource_ops.resources.join(", ")),
                    ));
                } else if let Some(operation) = operation {
                    if !current_values.get("operation").map(is_expression).unwrap_or(false) {
                        let allowed = resource_ops.operations.get(resource).cloned().unwrap_or_default();
                        if !allowed.contains(&operation.to_string()) {
                            errors.push(PreflightIssue::error(
                                "invalid_operation",
                                Some(&node.name),
                                Some("params.operation".to_string()),
                                format!("{operation:?} is not a declared operation for resource {resource:?}"),
                                format!("use one of: {}", allowed.join(", ")),
                            ));
                        }
                    }
                }
            }
        }
    }

    node_specific_checks(node, &current_values, warnings);
}

fn node_specific_checks(node: &LiteNode, current_values: &HashMap<String, Value>, warnings: &mut Vec<PreflightIssue>) {
    match node.node_type.as_str() {
        "httpRequest" => {
            if let Some(Value::String(url)) = current_values.get("url") {
                if !url.starts_with("http://") && !url.starts_with("https://") && !url.starts_with('=') {
                    warnings.push(PreflightIssue::warning(
                        "best_practice",
                        Some(&node.name),
                        Some("params.url".to_string()),
                        "URL has no protocol; most engines require an explicit http:// or https://",
                    ));
                }
            }
            let method = current_values.get("method").and_then(|v| v.as_str()).unwrap_or("GET").to_uppercase();
            if matches!(method.as_str(), "POST" | "PUT" | "PATCH") && !current_values.contains_key("sendBody") && !current_values.contains_key("body") {
                warnings.push(PreflightIssue::warning(
                    "best_practice",
                    Some(&node.name),
                    None,
                    format!("{method} request has no body configuration"),
                ));
            }
        }
        "postgres" | "mySql" | "mongoDb" => {
            if let Some(Value::String(query)) = current_values.get("query") {
                let upper = query.to_uppercase();
                if query.contains("{{") {
                    warnings.push(PreflightIssue::warning(
                        "security",
                        Some(&node.name),
                        Some("params.query".to_string()),
                        "query embeds a template expression; prefer parameterized queries",
                    ));
                }
                if upper.contains("DELETE") && !upper.contains("WHERE") {
                    warnings.push(PreflightIssue::warning(
                        "security",
                        Some(&node.name),
                        Some("params.query".to_string()),
                        "DELETE without WHERE affects every row",
                    ));
                }
                if upper.contains("DROP ") {
                    warnings.push(PreflightIssue::warning(
                        "security",
                        Some(&node.name),
                        Some("params.query".to_string()),
                        "query contains a DROP statement",
                    ));
                }
            }
        }
        "code" | "function" | "functionItem" => {
            let code = current_values.get("jsCode").or_else(|| current_values.get("code")).and_then(|v| v.as_str()).unwrap_or("");
            if code.contains("eval(") || code.contains("exec(") {
                warnings.push(PreflightIssue::warning(
                    "security",
                    Some(&node.name),
                    None,
                    "code contains eval(/exec(, which executes arbitrary strings as code",
                ));
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(node_type: &str, params: Value) -> LiteNode {
        LiteNode {
            name: "N".to_string(),
            node_type: node_type.to_string(),
            id: "id".to_string(),
            type_version: None,
            params: Some(params),
            credentials: None,
            disabled: None,
            error_mode: None,
            notes: None,
            input_hint: None,
        }
    }

    #[test]
    fn missing_required_property_is_error() {
        let knowledge = KnowledgeIndex::embedded();
        let n = node("httpRequest", json!({}));
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        validate_node_config(&n, &knowledge, &mut errors, &mut warnings);
        assert!(errors.iter().any(|e| e.kind == "missing_required_property"));
    }

    #[test]
    fn unknown_type_is_warning_only() {
        let knowledge = KnowledgeIndex::embedded();
        let n = node("totallyUnknownNode", json!({}));
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        validate_node_config(&n, &knowledge, &mut errors, &mut warnings);
        assert!(errors.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, "unknown_node_type");
    }

    #[test]
    fn show_predicate_hides_irrelevant_required_fields() {
        let knowledge = KnowledgeIndex::embedded();
        let n = node("slack", json!({"resource": "channel", "operation": "create"}));
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        validate_node_config(&n, &knowledge, &mut errors, &mut warnings);
        // "text" is only required when resource=message/operation=post; absent here is fine.
        assert!(!errors.iter().any(|e| e.field_path.as_deref() == Some("params.text")));
    }

    #[test]
    fn invalid_resource_operation_pair_is_error() {
        let knowledge = KnowledgeIndex::embedded();
        let n = node("slack", json!({"resource": "message", "operation": "archive"}));
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        validate_node_config(&n, &knowledge, &mut errors, &mut warnings);
        assert!(errors.iter().any(|e| e.kind == "invalid_operation"));
    }
}
