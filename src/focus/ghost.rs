// src/focus/ghost.rs
//
// Execution-trace "ghost payload" hints (spec §4.5 "Execution-trace hints").
// Walks a prior execution's `resultData.runData`, takes the last run per
// node, and for IF/switch-style nodes keeps every output branch distinct so
// a downstream node wired to outputIndex = i sees exactly branch i's keys.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::graph::Adjacency;

const MAX_KEYS: usize = 20;

#[derive(Debug, Clone)]
pub enum NodeGhost {
    Error,
    Outputs(Vec<Vec<String>>),
}

/// Parses a `resultData.runData`-shaped value (or the full execution-detail
/// payload containing it at that pointer) into a per-node ghost map.
pub fn extract_ghost_hints(execution_data: &Value) -> HashMap<String, NodeGhost> {
    let run_data = execution_data
        .pointer("/resultData/runData")
        .or_else(|| execution_data.as_object().map(|_| execution_data))
        .and_then(|v| v.as_object());

    let Some(run_data) = run_data else { return HashMap::new() };

    let mut out = HashMap::new();
    for (node_name, runs) in run_data {
        let Some(runs) = runs.as_array() else { continue };
        let Some(last_run) = runs.last() else { continue };

        let failed = last_run.get("error").map(|e| !e.is_null()).unwrap_or(false);
        if failed {
            out.insert(node_name.clone(), NodeGhost::Error);
            continue;
        }

        let Some(main_branches) = last_run.pointer("/data/main").and_then(|v| v.as_array()) else { continue };
        let outputs: Vec<Vec<String>> = main_branches
            .iter()
            .map(|branch| collect_keys(branch.as_array().map(Vec::as_slice).unwrap_or(&[])))
            .collect();
        out.insert(node_name.clone(), NodeGhost::Outputs(outputs));
    }
    out
}

fn collect_keys(items: &[Value]) -> Vec<String> {
    let mut set = BTreeSet::new();
    for item in items {
        if let Some(json) = item.get("json").and_then(|v| v.as_object()) {
            for k in json.keys() {
                set.insert(k.clone());
            }
        }
    }
    let mut keys: Vec<String> = set.into_iter().collect();
    if keys.len() > MAX_KEYS {
        let truncated = keys.len() - MAX_KEYS;
        keys.truncate(MAX_KEYS);
        keys.push(format!("...+{truncated} more"));
    }
    keys
}

/// For a focused node, the union of its upstream nodes' output keys at the
/// relevant output-index. Trigger nodes (no incoming connections) get None.
pub fn compute_input_hint(node_name: &str, adjacency: &Adjacency, ghosts: &HashMap<String, NodeGhost>) -> Option<Vec<String>> {
    let incoming = adjacency.reverse.get(node_name)?;
    if incoming.is_empty() {
        return None;
    }

    let mut keys: BTreeSet<String> = BTreeSet::new();
    for edge in incoming {
        if let Some(NodeGhost::Outputs(branches)) = ghosts.get(&edge.node) {
            if let Some(branch_keys) = branches.get(edge.output_index) {
                keys.extend(branch_keys.iter().cloned());
            }
        }
    }
    if keys.is_empty() {
        None
    } else {
        Some(keys.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn branch_correctness_scenario_ghost_8() {
        let execution = json!({
            "resultData": {
                "runData": {
                    "IF": [{
                        "data": {
                            "main": [
                                [{"json": {"a": 1}}],
                                [{"json": {"b": 2}}]
                            ]
                        }
                    }]
                }
            }
        });
        let ghosts = extract_ghost_hints(&execution);
        let mut adjacency = Adjacency::default();
        adjacency.reverse.insert(
            "Downstream".to_string(),
            vec![crate::graph::AdjEdge { node: "IF".to_string(), kind: "main".to_string(), output_index: 1, input_index: 0 }],
        );
        let hint = compute_input_hint("Downstream", &adjacency, &ghosts).unwrap();
        assert!(hint.contains(&"b".to_string()));
        assert!(!hint.contains(&"a".to_string()));
    }

    #[test]
    fn truncation_reports_count() {
        let mut items = Vec::new();
        for i in 0..30 {
            items.push(json!({"json": {(format!("k{i}")): i}}));
        }
        let keys = collect_keys(&items);
        assert_eq!(keys.len(), 21);
        assert!(keys.last().unwrap().starts_with("...+"));
    }

    #[test]
    fn trigger_node_has_no_hint() {
        let adjacency = Adjacency::default();
        let ghosts = HashMap::new();
        assert!(compute_input_hint("Trigger", &adjacency, &ghosts).is_none());
    }
}
