// src/preflight/expression.rs
//
// Expression syntax validation, recursive on every string value, depth
// capped at 50 (spec §4.7 phase 2).

use serde_json::Value;

use super::PreflightIssue;

const MAX_DEPTH: usize = 50;

pub fn validate_value(
    node_name: &str,
    path: &str,
    value: &Value,
    errors: &mut Vec<PreflightIssue>,
    warnings: &mut Vec<PreflightIssue>,
    depth: usize,
) {
    if depth > MAX_DEPTH {
        return;
    }
    match value {
        Value::String(s) => validate_string(node_name, path, s, errors, warnings),
        Value::Object(map) => {
            for (k, v) in map {
                validate_value(node_name, &format!("{path}.{k}"), v, errors, warnings, depth + 1);
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                validate_value(node_name, &format!("{path}[{i}]"), v, errors, warnings, depth + 1);
            }
        }
        _ => {}
    }
}

fn validate_string(node_name: &str, path: &str, s: &str, errors: &mut Vec<PreflightIssue>, warnings: &mut Vec<PreflightIssue>) {
    let has_open = s.contains("{{");
    let has_close = s.contains("}}");

    if has_open && has_close && !s.starts_with('=') {
        errors.push(PreflightIssue::error(
            "invalid_expression",
            Some(node_name),
            Some(path.to_string()),
            format!("{path:?} looks like an expression but is missing the leading '='"),
            format!("prefix the value with '=': \"={s}\""),
        ));
        return;
    }

    let open_count = s.matches("{{").count();
    let close_count = s.matches("}}").count();
    if open_count != close_count {
        errors.push(PreflightIssue::error(
            "invalid_expression",
            Some(node_name),
            Some(path.to_string()),
            format!("{path:?} has unmatched expression braces"),
            "balance every '{{' with a matching '}}'",
        ));
        return;
    }

    if open_count == 0 {
        if s.contains("${") {
            warnings.push(PreflightIssue::warning(
                "template_literal_hint",
                Some(node_name),
                Some(path.to_string()),
                format!("{path:?} uses '${{...}}' template-literal syntax, which n8n expressions do not evaluate; use '{{{{ }}}}' instead"),
            ));
        }
        return;
    }

    for segment in extract_braced_segments(s) {
        let trimmed = segment.trim();
        if trimmed.is_empty() {
            errors.push(PreflightIssue::error(
                "invalid_expression",
                Some(node_name),
                Some(path.to_string()),
                format!("{path:?} contains an empty expression '{{{{}}}}'"),
                "remove the empty expression or fill in an actual value",
            ));
            continue;
        }
        if segment.contains("{{") {
            errors.push(PreflightIssue::error(
                "invalid_expression",
                Some(node_name),
                Some(path.to_string()),
                format!("{path:?} contains a nested expression, which n8n does not support"),
                "flatten the nested expression into a single '{{ }}' block",
            ));
            continue;
        }
        if segment.contains("?.") {
            warnings.push(PreflightIssue::warning(
                "optional_chaining_hint",
                Some(node_name),
                Some(path.to_string()),
                format!("{path:?} uses optional chaining ('?.'), confirm the engine's expression runtime supports it"),
            ));
        }
    }
}

fn extract_braced_segments(s: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut rest = s;
    while let Some(start) = rest.find("{{") {
        let after_open = &rest[start + 2..];
        if let Some(end) = after_open.find("}}") {
            segments.push(after_open[..end].to_string());
            rest = &after_open[end + 2..];
        } else {
            break;
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(s: &str) -> (Vec<PreflightIssue>, Vec<PreflightIssue>) {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        validate_string("Node1", "params.text", s, &mut errors, &mut warnings);
        (errors, warnings)
    }

    #[test]
    fn missing_equals_prefix_is_error() {
        let (errors, _) = collect("{{$json.name}}");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, "invalid_expression");
    }

    #[test]
    fn with_equals_prefix_is_clean() {
        let (errors, _) = collect("={{$json.name}}");
        assert!(errors.is_empty());
    }

    #[test]
    fn empty_expression_is_error() {
        let (errors, _) = collect("={{ }}");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn unmatched_braces_is_error() {
        let (errors, _) = collect("={{$json.name}");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn optional_chaining_is_warning_only() {
        let (errors, warnings) = collect("={{$json?.name}}");
        assert!(errors.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, "optional_chaining_hint");
    }
}
