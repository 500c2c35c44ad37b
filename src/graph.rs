// src/graph.rs
//
// Adjacency construction, bidirectional BFS, branch-following, range
// discovery, zone classification, segment/boundary detection (spec §4.3).
//
// Grounded on unifiedlab::workflow's petgraph::visit::Bfs usage in
// prune_subgraph, generalized to explicit forward/reverse HashMap adjacency
// since Lite Connections (name-keyed) are the natural input shape here
// rather than petgraph's index-keyed DiGraph.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::model::{BoundaryCrossing, BoundaryDirection, LiteConnection, Zone};

#[derive(Debug, Clone)]
pub struct AdjEdge {
    pub node: String,
    pub kind: String,
    pub output_index: usize,
    pub input_index: usize,
}

#[derive(Debug, Default)]
pub struct Adjacency {
    pub forward: HashMap<String, Vec<AdjEdge>>,
    pub reverse: HashMap<String, Vec<AdjEdge>>,
}

pub fn build_adjacency(connections: &[LiteConnection]) -> Adjacency {
    let mut forward: HashMap<String, Vec<AdjEdge>> = HashMap::new();
    let mut reverse: HashMap<String, Vec<AdjEdge>> = HashMap::new();
    for conn in connections {
        forward.entry(conn.source.clone()).or_default().push(AdjEdge {
            node: conn.target.clone(),
            kind: conn.kind_or_main().to_string(),
            output_index: conn.output_index_or_zero(),
            input_index: conn.input_index_or_zero(),
        });
        reverse.entry(conn.target.clone()).or_default().push(AdjEdge {
            node: conn.source.clone(),
            kind: conn.kind_or_main().to_string(),
            output_index: conn.output_index_or_zero(),
            input_index: conn.input_index_or_zero(),
        });
    }
    Adjacency { forward, reverse }
}

/// Multi-start BFS over `adjacency`, visiting each reachable node at most
/// once. Starts are not included unless reached from another start. FIFO
/// queue ordering.
fn bfs(
    starts: &[String],
    adjacency: &HashMap<String, Vec<AdjEdge>>,
    max_depth: Option<usize>,
    exclude: Option<&HashSet<String>>,
) -> HashSet<String> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(String, usize)> = VecDeque::new();
    for s in starts {
        if exclude.map(|e| e.contains(s)).unwrap_or(false) {
            continue;
        }
        if visited.insert(s.clone()) {
            queue.push_back((s.clone(), 0));
        }
    }
    while let Some((node, depth)) = queue.pop_front() {
        if let Some(limit) = max_depth {
            if depth >= limit {
                continue;
            }
        }
        if let Some(edges) = adjacency.get(&node) {
            for edge in edges {
                if exclude.map(|e| e.contains(&edge.node)).unwrap_or(false) {
                    continue;
                }
                if visited.insert(edge.node.clone()) {
                    queue.push_back((edge.node.clone(), depth + 1));
                }
            }
        }
    }
    visited
}

pub fn bfs_forward(starts: &[String], adjacency: &Adjacency, max_depth: Option<usize>, exclude: Option<&HashSet<String>>) -> HashSet<String> {
    bfs(starts, &adjacency.forward, max_depth, exclude)
}

pub fn bfs_backward(starts: &[String], adjacency: &Adjacency, max_depth: Option<usize>, exclude: Option<&HashSet<String>>) -> HashSet<String> {
    bfs(starts, &adjacency.reverse, max_depth, exclude)
}

/// Immediate targets of `router`'s `output_index`, then BFS-forward from
/// those targets following all outputs of downstream nodes. The router
/// itself is always included.
pub fn branch_follow(router: &str, output_index: usize, adjacency: &Adjacency) -> HashSet<String> {
    let immediate: Vec<String> = adjacency
        .forward
        .get(router)
        .map(|edges| edges.iter().filter(|e| e.output_index == output_index).map(|e| e.node.clone()).collect())
        .unwrap_or_default();

    let mut result = bfs_forward(&immediate, adjacency, None, None);
    result.extend(immediate);
    result.insert(router.to_string());
    result
}

/// Nodes "between" start and end: the intersection of forward-reachable(start)
/// and backward-reachable(end). Both endpoints are always included. If the
/// intersection is empty and start != end, falls back to just the endpoints.
pub fn range_discovery(start: &str, end: &str, adjacency: &Adjacency) -> HashSet<String> {
    let mut forward = bfs_forward(&[start.to_string()], adjacency, None, None);
    let mut backward = bfs_backward(&[end.to_string()], adjacency, None, None);
    forward.insert(start.to_string());
    backward.insert(end.to_string());

    let intersection: HashSet<String> = forward.intersection(&backward).cloned().collect();

    if intersection.is_empty() && start != end {
        let mut fallback = HashSet::new();
        fallback.insert(start.to_string());
        fallback.insert(end.to_string());
        return fallback;
    }

    let mut result = intersection;
    result.insert(start.to_string());
    result.insert(end.to_string());
    result
}

/// Classifies every node outside `focused` per spec §4.3: downstream takes
/// precedence over upstream so post-merge paths read as downstream.
pub fn classify_zones(all_names: &[String], focused: &HashSet<String>, connections: &[LiteConnection]) -> HashMap<String, Zone> {
    let adjacency = build_adjacency(connections);
    let focused_vec: Vec<String> = focused.iter().cloned().collect();
    let downstream_reachable = bfs_forward(&focused_vec, &adjacency, None, Some(focused));
    let upstream_reachable = bfs_backward(&focused_vec, &adjacency, None, Some(focused));

    let mut zones = HashMap::new();
    for name in all_names {
        if focused.contains(name) {
            zones.insert(name.clone(), Zone::Focused);
        } else if downstream_reachable.contains(name) {
            zones.insert(name.clone(), Zone::Downstream);
        } else if upstream_reachable.contains(name) {
            zones.insert(name.clone(), Zone::Upstream);
        } else {
            zones.insert(name.clone(), Zone::Parallel);
        }
    }
    zones
}

#[derive(Debug, Clone)]
pub struct Segment {
    pub router: String,
    pub output_index: usize,
    pub label: String,
    pub members: HashSet<String>,
}

/// For each router (a source with any connection at output-index >= 1),
/// one segment per observed output index; the router itself excluded from
/// membership. If-style nodes with exactly two outputs get true/false
/// labels; otherwise "output <i>".
pub fn detect_segments(connections: &[LiteConnection]) -> Vec<Segment> {
    let adjacency = build_adjacency(connections);

    let mut routers: HashMap<String, HashSet<usize>> = HashMap::new();
    for conn in connections {
        let idx = conn.output_index_or_zero();
        if idx >= 1 {
            routers.entry(conn.source.clone()).or_default();
        }
    }
    for conn in connections {
        if routers.contains_key(&conn.source) {
            routers.get_mut(&conn.source).unwrap().insert(conn.output_index_or_zero());
        }
    }

    let mut segments = Vec::new();
    for (router, indices) in &routers {
        let max_index = *indices.iter().max().unwrap_or(&0);
        let is_if_style = max_index == 1;
        for output_index in 0..=max_index {
            let mut members = branch_follow(router, output_index, &adjacency);
            members.remove(router);
            if members.is_empty() {
                continue;
            }
            let label = if is_if_style {
                format!("{router}: {} branch", if output_index == 0 { "true" } else { "false" })
            } else {
                format!("{router}: output {output_index}")
            };
            segments.push(Segment { router: router.clone(), output_index, label, members });
        }
    }
    segments
}

/// One crossing per Lite Connection whose endpoints straddle the focused
/// set: entry when source is outside and target inside, exit otherwise.
pub fn compute_boundaries(connections: &[LiteConnection], focused: &HashSet<String>) -> Vec<BoundaryCrossing> {
    let mut out = Vec::new();
    for conn in connections {
        let source_in = focused.contains(&conn.source);
        let target_in = focused.contains(&conn.target);
        if source_in == target_in {
            continue;
        }
        let direction = if target_in { BoundaryDirection::Entry } else { BoundaryDirection::Exit };
        out.push(BoundaryCrossing {
            source: conn.source.clone(),
            target: conn.target.clone(),
            direction,
            output_index: conn.output_index,
            input_index: conn.input_index,
        });
    }
    out
}
