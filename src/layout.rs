// src/layout.rs
//
// Assigns a 2-D coordinate to every node: layer -> X, lane -> Y, then
// pixel-ification (spec §4.4). Grounded on
// unifiedlab::workflow::recalculate_priorities's topological-propagation
// pattern, generalized from priority recalculation to coordinate assignment.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::graph::{build_adjacency, Adjacency};
use crate::model::LiteConnection;

const LAYER_PIXELS: f64 = 250.0;
const LANE_PIXELS: f64 = 200.0;
const PIXEL_BASE: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

pub fn compute_layout(node_names: &[String], connections: &[LiteConnection]) -> HashMap<String, Position> {
    let adjacency = build_adjacency(connections);
    let layers = assign_layers(node_names, &adjacency);
    let lanes = assign_lanes(node_names, &adjacency);

    node_names
        .iter()
        .map(|name| {
            let layer = layers.get(name).copied().unwrap_or(0);
            let lane = lanes.get(name).copied().unwrap_or(0.0);
            (
                name.clone(),
                Position {
                    x: PIXEL_BASE + layer as f64 * LAYER_PIXELS,
                    y: PIXEL_BASE + lane * LANE_PIXELS,
                },
            )
        })
        .collect()
}

fn assign_layers(node_names: &[String], adjacency: &Adjacency) -> HashMap<String, usize> {
    let mut layer: HashMap<String, usize> = node_names.iter().map(|n| (n.clone(), 0)).collect();

    let roots: Vec<String> = node_names
        .iter()
        .filter(|n| adjacency.reverse.get(n.as_str()).map(|v| v.is_empty()).unwrap_or(true))
        .cloned()
        .collect();

    let mut queue: VecDeque<String> = roots.into_iter().collect();
    let cap = node_names.len().saturating_mul(node_names.len()).saturating_add(16);
    let mut iterations = 0usize;

    while let Some(node) = queue.pop_front() {
        iterations += 1;
        if iterations > cap {
            break;
        }
        let current_layer = *layer.get(&node).unwrap_or(&0);
        if let Some(edges) = adjacency.forward.get(&node) {
            for edge in edges {
                let candidate = current_layer + 1;
                let existing = layer.entry(edge.node.clone()).or_insert(0);
                if candidate > *existing {
                    *existing = candidate;
                    queue.push_back(edge.node.clone());
                }
            }
        }
    }
    layer
}

fn assign_lanes(node_names: &[String], adjacency: &Adjacency) -> HashMap<String, f64> {
    let mut lane: HashMap<String, f64> = HashMap::new();
    let mut visited: HashSet<String> = HashSet::new();

    let roots: Vec<String> = node_names
        .iter()
        .filter(|n| adjacency.reverse.get(n.as_str()).map(|v| v.is_empty()).unwrap_or(true))
        .cloned()
        .collect();

    let mut global_max = -1.0f64;
    for (i, root) in roots.iter().enumerate() {
        if visited.contains(root) {
            continue;
        }
        let start_lane = if i == 0 { 0.0 } else { global_max + 2.0 };
        dfs_assign(root, start_lane, adjacency, &mut lane, &mut visited, &mut global_max);
    }

    for name in node_names {
        lane.entry(name.clone()).or_insert(0.0);
    }

    for name in node_names {
        if let Some(incoming) = adjacency.reverse.get(name) {
            if incoming.len() > 1 {
                let mean: f64 = incoming.iter().map(|e| *lane.get(&e.node).unwrap_or(&0.0)).sum::<f64>() / incoming.len() as f64;
                lane.insert(name.clone(), mean);
                propagate_single_parent_chain(name, mean, adjacency, &mut lane);
            }
        }
    }

    lane
}

fn dfs_assign(
    node: &str,
    node_lane: f64,
    adjacency: &Adjacency,
    lane: &mut HashMap<String, f64>,
    visited: &mut HashSet<String>,
    global_max: &mut f64,
) {
    if !visited.insert(node.to_string()) {
        return;
    }
    lane.insert(node.to_string(), node_lane);
    if node_lane > *global_max {
        *global_max = node_lane;
    }

    let Some(edges) = adjacency.forward.get(node) else { return };
    let mut distinct_outputs: Vec<usize> = edges.iter().map(|e| e.output_index).collect();
    distinct_outputs.sort_unstable();
    distinct_outputs.dedup();

    if distinct_outputs.len() <= 1 {
        for edge in edges {
            dfs_assign(&edge.node, node_lane, adjacency, lane, visited, global_max);
        }
        return;
    }

    let count = distinct_outputs.len();
    for (rank, &output_index) in distinct_outputs.iter().enumerate() {
        let offset = rank as f64 - (count as f64 - 1.0) / 2.0;
        let child_lane = node_lane + offset;
        for edge in edges.iter().filter(|e| e.output_index == output_index) {
            dfs_assign(&edge.node, child_lane, adjacency, lane, visited, global_max);
        }
    }
}

fn propagate_single_parent_chain(start: &str, lane_val: f64, adjacency: &Adjacency, lane: &mut HashMap<String, f64>) {
    let mut current = start.to_string();
    loop {
        let single_child = match adjacency.forward.get(&current) {
            Some(edges) if edges.len() == 1 => Some(edges[0].node.clone()),
            _ => None,
        };
        match single_child {
            Some(child) => {
                let indegree = adjacency.reverse.get(&child).map(|v| v.len()).unwrap_or(0);
                if indegree == 1 {
                    lane.insert(child.clone(), lane_val);
                    current = child;
                } else {
                    break;
                }
            }
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(source: &str, target: &str, output_index: Option<usize>) -> LiteConnection {
        LiteConnection { source: source.to_string(), target: target.to_string(), kind: None, output_index, input_index: None }
    }

    #[test]
    fn layer_propagates_from_roots() {
        let names = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let conns = vec![conn("A", "B", None), conn("B", "C", None)];
        let adjacency = build_adjacency(&conns);
        let layers = assign_layers(&names, &adjacency);
        assert_eq!(layers["A"], 0);
        assert_eq!(layers["B"], 1);
        assert_eq!(layers["C"], 2);
    }

    #[test]
    fn cyclic_input_terminates_with_finite_coordinates() {
        let names = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let conns = vec![conn("A", "B", None), conn("B", "C", None), conn("C", "A", None)];
        let positions = compute_layout(&names, &conns);
        for name in &names {
            let pos = positions.get(name).unwrap();
            assert!(pos.x.is_finite());
            assert!(pos.y.is_finite());
        }
    }

    #[test]
    fn branching_children_distributed_symmetrically() {
        let names = vec!["R".to_string(), "A".to_string(), "B".to_string()];
        let conns = vec![conn("R", "A", Some(0)), conn("R", "B", Some(1))];
        let adjacency = build_adjacency(&conns);
        let lanes = assign_lanes(&names, &adjacency);
        assert!((lanes["A"] - (-0.5)).abs() < 1e-9);
        assert!((lanes["B"] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn convergence_lane_is_mean_of_incoming() {
        let names = vec!["A".to_string(), "B".to_string(), "C".to_string(), "D".to_string()];
        let conns = vec![conn("A", "C", None), conn("B", "C", None), conn("C", "D", None)];
        let adjacency = build_adjacency(&conns);
        let mut lane = HashMap::new();
        lane.insert("A".to_string(), 0.0);
        lane.insert("B".to_string(), 4.0);
        lane.insert("C".to_string(), 0.0);
        lane.insert("D".to_string(), 0.0);
        for name in &names {
            if let Some(incoming) = adjacency.reverse.get(name) {
                if incoming.len() > 1 {
                    let mean: f64 = incoming.iter().map(|e| lane[&e.node]).sum::<f64>() / incoming.len() as f64;
                    lane.insert(name.clone(), mean);
                    propagate_single_parent_chain(name, mean, &adjacency, &mut lane);
                }
            }
        }
        assert_eq!(lane["C"], 2.0);
        assert_eq!(lane["D"], 2.0);
    }
}
