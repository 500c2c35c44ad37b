// src/tools/schema.rs
//
// Zero-dependency validation of tool arguments against a small JSON-Schema
// subset (type, required, properties, items, enum, minimum, maximum), ahead
// of every handler invocation (spec §4.10). Never panics; always returns a
// formatted, field-labelled message on failure.

use serde_json::Value;

pub fn validate(tool_name: &str, schema: &Value, args: &Value) -> Result<(), String> {
    let mut errors = Vec::new();
    walk(schema, args, "", &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        let mut message = format!("Validation failed for {tool_name:?}:");
        for e in &errors {
            message.push_str("\n  - ");
            message.push_str(e);
        }
        Err(message)
    }
}

fn label(path: &str) -> String {
    if path.is_empty() { "(root)".to_string() } else { path.to_string() }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_matches(declared: &str, value: &Value) -> bool {
    match declared {
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn walk(schema: &Value, value: &Value, path: &str, errors: &mut Vec<String>) {
    let Some(obj) = schema.as_object() else { return };

    if let Some(Value::String(declared)) = obj.get("type") {
        if !type_matches(declared, value) {
            errors.push(format!("{}: expected {declared}, got {}", label(path), type_name(value)));
            return;
        }
    }

    if let Some(Value::Array(allowed)) = obj.get("enum") {
        if !allowed.iter().any(|a| a == value) {
            errors.push(format!("{}: must be one of {}", label(path), render_list(allowed)));
        }
    }

    if let Some(min) = obj.get("minimum").and_then(Value::as_f64) {
        if let Some(n) = value.as_f64() {
            if n < min {
                errors.push(format!("{}: must be >= {min}", label(path)));
            }
        }
    }
    if let Some(max) = obj.get("maximum").and_then(Value::as_f64) {
        if let Some(n) = value.as_f64() {
            if n > max {
                errors.push(format!("{}: must be <= {max}", label(path)));
            }
        }
    }

    if let Some(Value::Array(required)) = obj.get("required") {
        for field in required {
            if let Some(name) = field.as_str() {
                let present = value.get(name).is_some_and(|v| !v.is_null());
                if !present {
                    errors.push(format!("{}: required field is missing", label(&join(path, name))));
                }
            }
        }
    }

    if let Some(Value::Object(props)) = obj.get("properties") {
        if let Value::Object(map) = value {
            for (key, sub_schema) in props {
                if let Some(v) = map.get(key) {
                    walk(sub_schema, v, &join(path, key), errors);
                }
            }
        }
    }

    if let Some(item_schema) = obj.get("items") {
        if let Value::Array(items) = value {
            for (i, item) in items.iter().enumerate() {
                walk(item_schema, item, &format!("{path}[{i}]"), errors);
            }
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() { key.to_string() } else { format!("{path}.{key}") }
}

fn render_list(values: &[Value]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_required_field_reported() {
        let schema = json!({"type": "object", "required": ["workflowId"], "properties": {"workflowId": {"type": "string"}}});
        let err = validate("get_workflow", &schema, &json!({})).unwrap_err();
        assert!(err.starts_with("Validation failed for \"get_workflow\":"));
        assert!(err.contains("workflowId"));
    }

    #[test]
    fn type_mismatch_reported() {
        let schema = json!({"type": "object", "properties": {"limit": {"type": "integer"}}});
        let err = validate("list_workflows", &schema, &json!({"limit": "ten"})).unwrap_err();
        assert!(err.contains("limit"));
        assert!(err.contains("expected integer"));
    }

    #[test]
    fn enum_violation_reported() {
        let schema = json!({"type": "object", "properties": {"mode": {"enum": ["and", "or", "fuzzy"]}}});
        let err = validate("search_nodes", &schema, &json!({"mode": "xor"})).unwrap_err();
        assert!(err.contains("mode"));
    }

    #[test]
    fn valid_args_pass() {
        let schema = json!({
            "type": "object",
            "required": ["workflowId"],
            "properties": {"workflowId": {"type": "string"}, "limit": {"type": "integer", "minimum": 1, "maximum": 100}},
        });
        assert!(validate("list_executions", &schema, &json!({"workflowId": "wf1", "limit": 50})).is_ok());
    }

    #[test]
    fn extra_fields_are_permitted() {
        let schema = json!({"type": "object", "required": ["workflowId"], "properties": {"workflowId": {"type": "string"}}});
        assert!(validate("get_workflow", &schema, &json!({"workflowId": "wf1", "_meta": {"trace": true}})).is_ok());
    }
}
