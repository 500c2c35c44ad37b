// src/codec/toposort.rs
//
// Kahn's algorithm over the adjacency induced by all connection kinds,
// spec §4.2 "Topological ordering".

use std::collections::{HashMap, HashSet, VecDeque};

use crate::model::LiteConnection;

/// `node_names` supplies both the full universe and the tie-break / tail
/// ordering for nodes that never reach in-degree zero (disconnected or
/// caught in a cycle).
pub fn topological_order(node_names: &[String], connections: &[LiteConnection]) -> Vec<String> {
    let mut in_degree: HashMap<&str, usize> = node_names.iter().map(|n| (n.as_str(), 0)).collect();
    let mut adjacency: HashMap<&str, Vec<&str>> = node_names.iter().map(|n| (n.as_str(), Vec::new())).collect();

    for conn in connections {
        if let (Some(adj), true) = (adjacency.get_mut(conn.source.as_str()), in_degree.contains_key(conn.target.as_str())) {
            adj.push(conn.target.as_str());
            *in_degree.get_mut(conn.target.as_str()).unwrap() += 1;
        }
    }

    let mut queue: VecDeque<&str> = VecDeque::new();
    for name in node_names {
        if in_degree.get(name.as_str()).copied().unwrap_or(0) == 0 {
            queue.push_back(name.as_str());
        }
    }

    let mut ordered: Vec<String> = Vec::with_capacity(node_names.len());
    let mut emitted: HashSet<&str> = HashSet::new();

    while let Some(name) = queue.pop_front() {
        if !emitted.insert(name) {
            continue;
        }
        ordered.push(name.to_string());
        if let Some(targets) = adjacency.get(name) {
            for &target in targets {
                if let Some(deg) = in_degree.get_mut(target) {
                    if *deg > 0 {
                        *deg -= 1;
                        if *deg == 0 {
                            queue.push_back(target);
                        }
                    }
                }
            }
        }
    }

    // Cyclic / unreachable remainder, appended at the tail in input order.
    for name in node_names {
        if !emitted.contains(name.as_str()) {
            ordered.push(name.clone());
        }
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(source: &str, target: &str) -> LiteConnection {
        LiteConnection { source: source.to_string(), target: target.to_string(), kind: None, output_index: None, input_index: None }
    }

    #[test]
    fn acyclic_chain_orders_precede_successors() {
        let names = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let conns = vec![conn("A", "B"), conn("B", "C")];
        let order = topological_order(&names, &conns);
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn cycle_does_not_crash_and_tail_preserves_input_order() {
        let names = vec!["A".to_string(), "B".to_string()];
        let conns = vec![conn("A", "B"), conn("B", "A")];
        let order = topological_order(&names, &conns);
        assert_eq!(order.len(), 2);
        assert_eq!(order, vec!["A", "B"]);
    }

    #[test]
    fn every_node_appears_exactly_once() {
        let names = vec!["A".to_string(), "B".to_string(), "C".to_string(), "D".to_string()];
        let conns = vec![conn("A", "B"), conn("A", "C"), conn("B", "D"), conn("C", "D")];
        let order = topological_order(&names, &conns);
        let mut seen = HashSet::new();
        for n in &order {
            assert!(seen.insert(n.clone()), "duplicate in topo order: {n}");
        }
        assert_eq!(seen.len(), 4);
    }
}
