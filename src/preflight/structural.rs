// src/preflight/structural.rs
//
// Structural and workflow-level checks (spec §4.7 phases 4-5): dangling
// connection endpoints, orphaned non-trigger nodes, duplicate node names.

use std::collections::{HashMap, HashSet};

use crate::model::{LiteConnection, LiteNode};

use super::PreflightIssue;

fn looks_like_trigger(node_type: &str) -> bool {
    let lower = node_type.to_lowercase();
    lower.contains("trigger") || lower.contains("webhook") || lower == "start" || lower.contains("cron") || lower.contains("schedule")
}

pub fn validate_structure(nodes: &[LiteNode], connections: &[LiteConnection], errors: &mut Vec<PreflightIssue>, warnings: &mut Vec<PreflightIssue>) {
    let names: HashSet<&str> = nodes.iter().map(|n| n.name.as_str()).collect();

    for conn in connections {
        if !names.contains(conn.source.as_str()) {
            errors.push(PreflightIssue::error(
                "dangling_connection",
                None,
                None,
                format!("connection source {:?} does not match any node", conn.source),
                format!("remove the connection or add a node named {:?}", conn.source),
            ));
        }
        if !names.contains(conn.target.as_str()) {
            errors.push(PreflightIssue::error(
                "dangling_connection",
                None,
                None,
                format!("connection target {:?} does not match any node", conn.target),
                format!("remove the connection or add a node named {:?}", conn.target),
            ));
        }
    }

    let mut seen = HashSet::new();
    for node in nodes {
        if !seen.insert(node.name.as_str()) {
            errors.push(PreflightIssue::error(
                "duplicate_node_name",
                Some(&node.name),
                None,
                format!("node name {:?} is used by more than one node", node.name),
                "rename one of the duplicates",
            ));
        }
    }

    if nodes.len() > 1 {
        let mut connected: HashMap<&str, bool> = nodes.iter().map(|n| (n.name.as_str(), false)).collect();
        for conn in connections {
            connected.insert(conn.source.as_str(), true);
            connected.insert(conn.target.as_str(), true);
        }
        for node in nodes {
            let has_edge = connected.get(node.name.as_str()).copied().unwrap_or(false);
            if !has_edge && !looks_like_trigger(&node.node_type) {
                warnings.push(PreflightIssue::warning(
                    "orphaned_node",
                    Some(&node.name),
                    None,
                    "node has no incoming or outgoing connections and will never run",
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, node_type: &str) -> LiteNode {
        LiteNode {
            name: name.to_string(),
            node_type: node_type.to_string(),
            id: format!("id-{name}"),
            type_version: None,
            params: None,
            credentials: None,
            disabled: None,
            error_mode: None,
            notes: None,
            input_hint: None,
        }
    }

    fn conn(source: &str, target: &str) -> LiteConnection {
        LiteConnection { source: source.to_string(), target: target.to_string(), kind: None, output_index: None, input_index: None }
    }

    #[test]
    fn dangling_connection_is_error() {
        let nodes = vec![node("A", "set")];
        let connections = vec![conn("A", "Ghost")];
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        validate_structure(&nodes, &connections, &mut errors, &mut warnings);
        assert!(errors.iter().any(|e| e.kind == "dangling_connection"));
    }

    #[test]
    fn duplicate_names_is_error() {
        let nodes = vec![node("A", "set"), node("A", "set")];
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        validate_structure(&nodes, &[], &mut errors, &mut warnings);
        assert!(errors.iter().any(|e| e.kind == "duplicate_node_name"));
    }

    #[test]
    fn orphaned_non_trigger_node_is_warning() {
        let nodes = vec![node("Webhook1", "webhook"), node("A", "set"), node("Orphan", "set")];
        let connections = vec![conn("Webhook1", "A")];
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        validate_structure(&nodes, &connections, &mut errors, &mut warnings);
        assert!(warnings.iter().any(|w| w.kind == "orphaned_node" && w.node.as_deref() == Some("Orphan")));
        assert!(!warnings.iter().any(|w| w.node.as_deref() == Some("Webhook1")));
    }

    #[test]
    fn single_node_workflow_has_no_orphan_warning() {
        let nodes = vec![node("Solo", "set")];
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        validate_structure(&nodes, &[], &mut errors, &mut warnings);
        assert!(warnings.is_empty());
    }
}
