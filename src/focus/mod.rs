// src/focus/mod.rs
//
// Scan views, focused views, dormant summaries, and ghost-payload
// integration (spec §4.5).

pub mod ghost;
pub mod summary;

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::codec::{compress_connections, compress_type, topological_order};
use crate::graph::{build_adjacency, branch_follow, classify_zones, compute_boundaries, detect_segments, range_discovery};
use crate::model::{DormantNode, FocusedWorkflowView, LiteConnection, LiteNode, RawNode, RawWorkflow, ScanNode, Zone, ZoneCounts};

const TOKEN_THRESHOLD: usize = 8_000;
const NODE_COUNT_THRESHOLD: usize = 30;

#[derive(Debug, Error)]
pub enum FocusError {
    #[error("unknown node {0:?}")]
    UnknownNode(String),
    #[error("branch from {router:?} output {output_index} has no members")]
    EmptyBranch { router: String, output_index: usize },
    #[error("range from {from:?} to {to:?} has no members")]
    EmptyRange { from: String, to: String },
}

#[derive(Debug, Clone)]
pub enum FocusSelection {
    Explicit(Vec<String>),
    Branch { router: String, output_index: usize, max_depth: Option<usize>, upstream_levels: Option<usize> },
    Range { from: String, to: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentSummary {
    pub label: String,
    #[serde(rename = "memberCount")]
    pub member_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub nodes: Vec<ScanNode>,
    pub connections: Vec<LiteConnection>,
    pub segments: Vec<SegmentSummary>,
    #[serde(rename = "tokenEstimate")]
    pub token_estimate: usize,
    #[serde(rename = "focusRecommended")]
    pub focus_recommended: bool,
}

pub fn scan_workflow(raw: &RawWorkflow) -> ScanResult {
    let connections = compress_connections(&raw.connections);
    let node_names: Vec<String> = raw.nodes.iter().map(|n| n.name.clone()).collect();
    let order = topological_order(&node_names, &connections);

    let mut output_counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for conn in &connections {
        let entry = output_counts.entry(conn.source.as_str()).or_insert(0);
        *entry = (*entry).max(conn.output_index_or_zero() + 1);
    }

    let by_name: std::collections::HashMap<&str, &RawNode> = raw.nodes.iter().map(|n| (n.name.as_str(), n)).collect();

    let mut token_estimate = 0usize;
    let nodes: Vec<ScanNode> = order
        .iter()
        .filter_map(|name| by_name.get(name.as_str()).copied())
        .map(|node| {
            let lite = crate::codec::compress_node_for_scan(node);
            token_estimate += 20 + lite.params.as_ref().map(|p| p.to_string().len() / 4).unwrap_or(0);
            let output_count = output_counts.get(node.name.as_str()).copied().filter(|c| *c > 1);
            ScanNode {
                name: node.name.clone(),
                node_type: compress_type(&node.node_type),
                id: node.id.clone(),
                disabled: node.disabled.filter(|d| *d),
                summary: Some(summary::summarize(&lite)),
                output_count,
            }
        })
        .collect();

    let segments = detect_segments(&connections)
        .into_iter()
        .map(|s| SegmentSummary { label: s.label, member_count: s.members.len() })
        .collect();

    let focus_recommended = token_estimate > TOKEN_THRESHOLD || nodes.len() > NODE_COUNT_THRESHOLD;

    ScanResult { nodes, connections, segments, token_estimate, focus_recommended }
}

pub fn focus_workflow(raw: &RawWorkflow, selection: &FocusSelection, execution_data: Option<&Value>) -> Result<FocusedWorkflowView, FocusError> {
    let connections = compress_connections(&raw.connections);
    let all_names: Vec<String> = raw.nodes.iter().map(|n| n.name.clone()).collect();
    let name_set: HashSet<String> = all_names.iter().cloned().collect();
    let adjacency = build_adjacency(&connections);

    let focused_set: HashSet<String> = match selection {
        FocusSelection::Explicit(names) => {
            for n in names {
                if !name_set.contains(n) {
                    return Err(FocusError::UnknownNode(n.clone()));
                }
            }
            names.iter().cloned().collect()
        }
        FocusSelection::Branch { router, output_index, max_depth, upstream_levels } => {
            if !name_set.contains(router) {
                return Err(FocusError::UnknownNode(router.clone()));
            }
            let mut members = branch_follow(router, *output_index, &adjacency);
            if let Some(limit) = max_depth {
                let immediate: Vec<String> = adjacency
                    .forward
                    .get(router)
                    .map(|edges| edges.iter().filter(|e| e.output_index == *output_index).map(|e| e.node.clone()).collect())
                    .unwrap_or_default();
                let mut bounded = crate::graph::bfs_forward(&immediate, &adjacency, Some(*limit), None);
                bounded.extend(immediate);
                bounded.insert(router.clone());
                members = bounded;
            }
            if members.len() <= 1 {
                return Err(FocusError::EmptyBranch { router: router.clone(), output_index: *output_index });
            }
            if let Some(levels) = upstream_levels {
                let upstream = crate::graph::bfs_backward(&[router.clone()], &adjacency, Some(*levels), None);
                members.extend(upstream);
            }
            members
        }
        FocusSelection::Range { from, to } => {
            if !name_set.contains(from) {
                return Err(FocusError::UnknownNode(from.clone()));
            }
            if !name_set.contains(to) {
                return Err(FocusError::UnknownNode(to.clone()));
            }
            let range = range_discovery(from, to, &adjacency);
            if range.is_empty() {
                return Err(FocusError::EmptyRange { from: from.clone(), to: to.clone() });
            }
            range
        }
    };

    let zones = classify_zones(&all_names, &focused_set, &connections);
    let by_name: std::collections::HashMap<&str, &RawNode> = raw.nodes.iter().map(|n| (n.name.as_str(), n)).collect();
    let ghosts = execution_data.map(ghost::extract_ghost_hints).unwrap_or_default();

    let mut focused_nodes: Vec<LiteNode> = Vec::new();
    let mut dormant_nodes: Vec<DormantNode> = Vec::new();
    let mut zone_counts = ZoneCounts::default();

    for name in &all_names {
        let node = match by_name.get(name.as_str()) {
            Some(n) => *n,
            None => continue,
        };
        let zone = zones.get(name).copied().unwrap_or(Zone::Parallel);
        match zone {
            Zone::Focused => {
                zone_counts.focused += 1;
                let mut lite = crate::codec::compress_node_for_scan(node);
                if execution_data.is_some() {
                    lite.input_hint = ghost::compute_input_hint(name, &adjacency, &ghosts);
                }
                focused_nodes.push(lite);
            }
            other => {
                match other {
                    Zone::Upstream => zone_counts.upstream += 1,
                    Zone::Downstream => zone_counts.downstream += 1,
                    Zone::Parallel => zone_counts.parallel += 1,
                    Zone::Focused => unreachable!(),
                }
                let lite = crate::codec::compress_node_for_scan(node);
                let outputs_to: Vec<String> = adjacency
                    .forward
                    .get(name.as_str())
                    .map(|edges| edges.iter().filter(|e| focused_set.contains(&e.node)).map(|e| e.node.clone()).collect())
                    .unwrap_or_default();
                let inputs_from: Vec<String> = adjacency
                    .reverse
                    .get(name.as_str())
                    .map(|edges| edges.iter().filter(|e| focused_set.contains(&e.node)).map(|e| e.node.clone()).collect())
                    .unwrap_or_default();
                let output_hint = if matches!(other, Zone::Upstream) { summary::output_hint(&lite) } else { None };
                dormant_nodes.push(DormantNode {
                    name: name.clone(),
                    node_type: lite.node_type.clone(),
                    id: lite.id.clone(),
                    zone: other,
                    disabled: lite.disabled,
                    summary: Some(summary::summarize(&lite)),
                    outputs_to,
                    inputs_from,
                    output_hint,
                });
            }
        }
    }

    let focused_connections: Vec<LiteConnection> = connections
        .iter()
        .filter(|c| focused_set.contains(&c.source) && focused_set.contains(&c.target))
        .cloned()
        .collect();
    let boundaries = compute_boundaries(&connections, &focused_set);

    Ok(FocusedWorkflowView {
        id: raw.id.clone(),
        name: raw.name.clone(),
        total_nodes: all_names.len(),
        focused: focused_nodes,
        connections: focused_connections,
        dormant: dormant_nodes,
        boundaries,
        zone_counts,
    })
}
