// src/focus/summary.rs
//
// Node-type-keyed one-line summaries and "what does this emit" output
// hints (spec §4.5 "Node summaries" / "Output hint"). Grounded on
// unifiedlab::checkpoint::CheckpointStore::get_jobs_summary's lightweight
// partial-deserialization-for-a-cheap-summary idiom, applied here to
// node-type-keyed rules instead of job-status rules.

use serde_json::Value;

use crate::model::LiteNode;

const MAX_SUMMARY_LEN: usize = 100;

pub fn summarize(node: &LiteNode) -> String {
    let params = node.params.as_ref();
    let raw = match node.node_type.as_str() {
        "httpRequest" => summarize_http(params),
        "code" | "function" | "functionItem" => summarize_code(params),
        "if" => summarize_single_condition(params),
        "switch" => summarize_router(params),
        t if t.contains("agent") => summarize_agent(params),
        t if t.starts_with("lmChat") || t.contains("chatModel") => summarize_chat_model(params),
        "webhook" => summarize_webhook(params),
        "set" => summarize_set(params),
        _ => humanize_type(&node.node_type),
    };
    truncate(&raw, MAX_SUMMARY_LEN)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn get_str<'a>(params: Option<&'a Value>, key: &str) -> Option<&'a str> {
    params.and_then(|p| p.get(key)).and_then(|v| v.as_str())
}

fn summarize_http(params: Option<&Value>) -> String {
    let method = get_str(params, "method").unwrap_or("GET");
    let url = get_str(params, "url").unwrap_or("(no url)");
    format!("{method} {}", truncate(url, 80))
}

fn summarize_code(params: Option<&Value>) -> String {
    let language = get_str(params, "language").unwrap_or("js");
    let code = get_str(params, "jsCode").or_else(|| get_str(params, "code")).unwrap_or("");
    for line in code.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*') {
            continue;
        }
        if trimmed.starts_with("import ") || trimmed.starts_with("require(") {
            continue;
        }
        return format!("{language}: {trimmed}");
    }
    format!("{language}: comment-only code")
}

fn summarize_single_condition(params: Option<&Value>) -> String {
    // format-1: conditions.conditions[0].{leftValue, operator.operation, rightValue}
    // format-2 (legacy): conditions.{string,number,boolean}[0].{value1, operation, value2}
    if let Some(p) = params {
        if let Some(cond) = p.pointer("/conditions/conditions/0") {
            let left = cond.get("leftValue").and_then(|v| v.as_str()).unwrap_or("?");
            let right = cond.get("rightValue").and_then(|v| v.as_str()).unwrap_or("?");
            let op = cond.pointer("/operator/operation").and_then(|v| v.as_str()).unwrap_or("equals");
            return format!("{left} {op} {right}");
        }
        for kind in ["string", "number", "boolean"] {
            if let Some(cond) = p.pointer(&format!("/conditions/{kind}/0")) {
                let left = cond.get("value1").map(value_preview).unwrap_or_else(|| "?".to_string());
                let right = cond.get("value2").map(value_preview).unwrap_or_else(|| "?".to_string());
                let op = cond.get("operation").and_then(|v| v.as_str()).unwrap_or("equal");
                return format!("{left} {op} {right}");
            }
        }
    }
    "no condition configured".to_string()
}

fn value_preview(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn summarize_router(params: Option<&Value>) -> String {
    let rules = params
        .and_then(|p| p.pointer("/rules/values"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    if rules.is_empty() {
        return "no rules / expression mode".to_string();
    }
    let labels: Vec<String> = rules
        .iter()
        .take(3)
        .map(|r| r.get("outputKey").and_then(|v| v.as_str()).unwrap_or("output").to_string())
        .collect();
    format!("routes: {}", labels.join(", "))
}

fn summarize_agent(params: Option<&Value>) -> String {
    let prompt = get_str(params, "systemMessage").or_else(|| get_str(params, "text")).unwrap_or("");
    let first_line = prompt.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        "AI agent (no system prompt)".to_string()
    } else {
        format!("agent: {first_line}")
    }
}

fn summarize_chat_model(params: Option<&Value>) -> String {
    let model = get_str(params, "model")
        .or_else(|| params.and_then(|p| p.pointer("/model/value")).and_then(|v| v.as_str()))
        .unwrap_or("default model");
    format!("chat model: {model}")
}

fn summarize_webhook(params: Option<&Value>) -> String {
    let method = get_str(params, "httpMethod").unwrap_or("GET");
    let path = get_str(params, "path").unwrap_or("/");
    format!("{method} {path}")
}

fn summarize_set(params: Option<&Value>) -> String {
    let mut names: Vec<String> = Vec::new();
    if let Some(p) = params {
        if let Some(arr) = p.pointer("/assignments/assignments").and_then(|v| v.as_array()) {
            names.extend(arr.iter().filter_map(|a| a.get("name").and_then(|v| v.as_str()).map(String::from)));
        } else if let Some(arr) = p.pointer("/values/values").and_then(|v| v.as_array()) {
            names.extend(arr.iter().filter_map(|a| a.get("name").and_then(|v| v.as_str()).map(String::from)));
        }
    }
    if names.is_empty() {
        return "sets no fields".to_string();
    }
    let shown: Vec<&str> = names.iter().take(5).map(String::as_str).collect();
    let mut summary = format!("sets {}", shown.join(", "));
    if names.len() > 5 {
        summary.push_str(&format!(", +{} more", names.len() - 5));
    }
    summary
}

fn humanize_type(short_type: &str) -> String {
    let mut out = String::new();
    for (i, ch) in short_type.chars().enumerate() {
        if ch.is_uppercase() && i > 0 {
            out.push(' ');
            out.extend(ch.to_lowercase());
        } else if i == 0 {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
    }
    if out.is_empty() {
        "node".to_string()
    } else {
        out
    }
}

/// Best-effort "what does this emit" hint for dormant upstream nodes.
pub fn output_hint(node: &LiteNode) -> Option<String> {
    let params = node.params.as_ref();
    match node.node_type.as_str() {
        "set" => {
            let names: Vec<String> = params
                .and_then(|p| p.pointer("/assignments/assignments").or_else(|| p.pointer("/values/values")))
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().filter_map(|a| a.get("name").and_then(|v| v.as_str()).map(String::from)).collect())
                .unwrap_or_default();
            if names.is_empty() { None } else { Some(format!("writes: {}", names.join(", "))) }
        }
        "code" | "function" | "functionItem" => {
            let code = get_str(params, "jsCode").or_else(|| get_str(params, "code")).unwrap_or("");
            code.lines().find(|l| l.trim_start().starts_with("return")).map(|l| l.trim().to_string())
        }
        "httpRequest" => get_str(params, "url").map(|u| format!("calls {u}")),
        "postgres" | "mySql" | "mongoDb" => {
            let query = get_str(params, "query").unwrap_or("");
            query.lines().find(|l| l.to_uppercase().contains("SELECT")).map(|l| l.trim().to_string())
        }
        "googleSheets" | "spreadsheetFile" => {
            let sheet = get_str(params, "sheetName");
            let range = get_str(params, "range");
            match (sheet, range) {
                (Some(s), Some(r)) => Some(format!("{s}!{r}")),
                (Some(s), None) => Some(s.to_string()),
                _ => None,
            }
        }
        "executeWorkflow" => params
            .and_then(|p| p.pointer("/workflowId/value"))
            .and_then(|v| v.as_str())
            .map(|id| format!("sub-workflow {id}")),
        _ => None,
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
            id: "id1".to_string(),
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
    fn http_summary_is_method_and_url() {
        let n = node("httpRequest", json!({"method": "POST", "url": "https://api.example.com/thing"}));
        let s = summarize(&n);
        assert!(s.starts_with("POST "));
        assert!(!s.contains("undefined"));
    }

    #[test]
    fn empty_router_never_bare_type_name_scenario_e() {
        let n = node("switch", json!({"rules": {"values": []}}));
        let s = summarize(&n);
        assert!(s.contains("rules"));
        assert_ne!(s, "switch");
        assert!(!s.contains("undefined"));
    }

    #[test]
    fn summary_never_exceeds_cap_or_contains_undefined() {
        let long_url = format!("https://example.com/{}", "x".repeat(200));
        let n = node("httpRequest", json!({"method": "GET", "url": long_url}));
        let s = summarize(&n);
        assert!(s.chars().count() <= MAX_SUMMARY_LEN);
        assert!(!s.contains("undefined"));
    }
}
