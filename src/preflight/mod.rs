// src/preflight/mod.rs
//
// Orchestrates expression, config, security, and structural validators,
// returning a pass/fail verdict (spec §4.7). Grounded on
// unifiedlab::dsl::validate's "collect actionable errors" shape.

pub mod config;
pub mod expression;
pub mod security;
pub mod structural;

use std::time::Instant;

use serde::Serialize;

use crate::knowledge::KnowledgeIndex;
use crate::model::{LiteConnection, LiteNode};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreflightIssue {
    pub kind: String,
    pub node: Option<String>,
    pub field_path: Option<String>,
    pub message: String,
    pub suggested_fix: Option<String>,
}

impl PreflightIssue {
    pub fn error(kind: &str, node: Option<&str>, field_path: Option<String>, message: impl Into<String>, suggested_fix: impl Into<String>) -> Self {
        PreflightIssue {
            kind: kind.to_string(),
            node: node.map(String::from),
            field_path,
            message: message.into(),
            suggested_fix: Some(suggested_fix.into()),
        }
    }
    pub fn warning(kind: &str, node: Option<&str>, field_path: Option<String>, message: impl Into<String>) -> Self {
        PreflightIssue { kind: kind.to_string(), node: node.map(String::from), field_path, message: message.into(), suggested_fix: None }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PreflightVerdict {
    pub pass: bool,
    pub errors: Vec<PreflightIssue>,
    pub warnings: Vec<PreflightIssue>,
    pub summary: String,
    pub duration_ms: u64,
}

pub struct VirtualWorkflow<'a> {
    pub nodes: &'a [LiteNode],
    pub connections: &'a [LiteConnection],
}

pub fn run_preflight(workflow: &VirtualWorkflow, knowledge: &KnowledgeIndex) -> PreflightVerdict {
    let started = Instant::now();

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for node in workflow.nodes {
        config::validate_node_config(node, knowledge, &mut errors, &mut warnings);
        if let Some(params) = &node.params {
            expression::validate_value(&node.name, "params", params, &mut errors, &mut warnings, 0);
            security::scan_value(&node.name, "params", params, &mut warnings);
        }
    }

    structural::validate_structure(workflow.nodes, workflow.connections, &mut errors, &mut warnings);

    let pass = errors.is_empty();
    let duration_ms = started.elapsed().as_millis() as u64;
    let summary = if pass {
        format!("preflight passed with {} warning(s)", warnings.len())
    } else {
        format!("preflight blocked: {} error(s), {} warning(s)", errors.len(), warnings.len())
    };

    PreflightVerdict { pass, errors, warnings, summary, duration_ms }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LiteNode;
    use serde_json::json;

    fn node(name: &str, node_type: &str, params: serde_json::Value) -> LiteNode {
        LiteNode {
            name: name.to_string(),
            node_type: node_type.to_string(),
            id: format!("id-{name}"),
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
    fn missing_prefix_expression_blocks_scenario_d() {
        let knowledge = KnowledgeIndex::embedded();
        let n = node("Set1", "set", json!({"text": "{{$json.name}}"}));
        let verdict = run_preflight(&VirtualWorkflow { nodes: &[n.clone()], connections: &[] }, &knowledge);
        assert!(!verdict.pass);
        assert!(verdict.errors.iter().any(|e| e.kind == "invalid_expression"));

        let fixed = node("Set1", "set", json!({"text": "={{$json.name}}"}));
        let verdict2 = run_preflight(&VirtualWorkflow { nodes: &[fixed], connections: &[] }, &knowledge);
        assert!(!verdict2.errors.iter().any(|e| e.kind == "invalid_expression"));
    }

    #[test]
    fn hardcoded_key_is_warning_not_error_scenario_d() {
        let knowledge = KnowledgeIndex::embedded();
        let key = format!("sk-{}", "A".repeat(30));
        let n = node("HttpNode", "httpRequest", json!({"url": "https://example.com", "apiKey": key}));
        let verdict = run_preflight(&VirtualWorkflow { nodes: &[n], connections: &[] }, &knowledge);
        assert!(verdict.pass);
        assert!(verdict.warnings.iter().any(|w| w.kind == "credential_exposure"));
    }

    #[test]
    fn idempotent_across_runs() {
        let knowledge = KnowledgeIndex::embedded();
        let n = node("Set1", "set", json!({"text": "{{$json.name}}"}));
        let v1 = run_preflight(&VirtualWorkflow { nodes: &[n.clone()], connections: &[] }, &knowledge);
        let v2 = run_preflight(&VirtualWorkflow { nodes: &[n], connections: &[] }, &knowledge);
        assert_eq!(v1.errors.len(), v2.errors.len());
        assert_eq!(v1.warnings.len(), v2.warnings.len());
    }
}
