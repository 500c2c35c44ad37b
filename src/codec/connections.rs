// src/codec/connections.rs
//
// Connection compression and reconstruction, spec §4.2.

use std::collections::HashMap;

use crate::model::{LiteConnection, RawConnections, RawConnectionTarget};

/// Emit one Lite Connection per {source, output-kind, output-index, target}
/// quadruple. `outputIndex` omitted when 0, `inputIndex` omitted when 0,
/// `type` omitted when "main".
pub fn compress_connections(raw: &RawConnections) -> Vec<LiteConnection> {
    let mut out = Vec::new();
    for (source, kinds) in &raw.0 {
        for (kind, by_output_index) in kinds {
            for (output_index, targets) in by_output_index.iter().enumerate() {
                for target in targets {
                    out.push(LiteConnection {
                        source: source.clone(),
                        target: target.node.clone(),
                        kind: if kind == "main" { None } else { Some(kind.clone()) },
                        output_index: if output_index == 0 { None } else { Some(output_index) },
                        input_index: if target.index == 0 { None } else { Some(target.index) },
                    });
                }
            }
        }
    }
    out
}

/// Group Lite Connections back into the three-level mapping.
///
/// Contract: for each (target, output-kind) pair, explicit `inputIndex`
/// values are honored and reserve that slot; implicit connections (no
/// inputIndex given) are assigned the next free slot starting from the
/// per-pair high-water mark. Explicit reservations are resolved first so an
/// implicit connection processed earlier in the input never collides with
/// an explicit one that appears later.
pub fn reconstruct_connections(lite: &[LiteConnection]) -> RawConnections {
    let mut high_water: HashMap<(String, String), usize> = HashMap::new();
    for conn in lite {
        if let Some(idx) = conn.input_index {
            let key = (conn.target.clone(), conn.kind_or_main().to_string());
            let entry = high_water.entry(key).or_insert(0);
            *entry = (*entry).max(idx + 1);
        }
    }

    let mut assigned_input_index: Vec<usize> = Vec::with_capacity(lite.len());
    for conn in lite {
        let idx = match conn.input_index {
            Some(idx) => idx,
            None => {
                let key = (conn.target.clone(), conn.kind_or_main().to_string());
                let entry = high_water.entry(key).or_insert(0);
                let idx = *entry;
                *entry += 1;
                idx
            }
        };
        assigned_input_index.push(idx);
    }

    let mut result: HashMap<String, HashMap<String, Vec<Vec<RawConnectionTarget>>>> = HashMap::new();
    for (conn, input_index) in lite.iter().zip(assigned_input_index) {
        let kind = conn.kind_or_main().to_string();
        let output_index = conn.output_index_or_zero();
        let by_kind = result.entry(conn.source.clone()).or_default();
        let by_output = by_kind.entry(kind.clone()).or_default();
        if by_output.len() <= output_index {
            by_output.resize_with(output_index + 1, Vec::new);
        }
        by_output[output_index].push(RawConnectionTarget {
            node: conn.target.clone(),
            kind,
            index: input_index,
        });
    }
    RawConnections(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(source: &str, target: &str, output_index: Option<usize>, input_index: Option<usize>) -> LiteConnection {
        LiteConnection {
            source: source.to_string(),
            target: target.to_string(),
            kind: None,
            output_index,
            input_index,
        }
    }

    #[test]
    fn implicit_merge_inputs_land_on_distinct_slots() {
        // Scenario A: A->IF, IF->B(output 0), IF->Merge(output 1), B->Merge
        let lite = vec![
            conn("A", "IF", None, None),
            conn("IF", "B", None, None),
            conn("IF", "Merge", Some(1), None),
            conn("B", "Merge", None, None),
        ];
        let raw = reconstruct_connections(&lite);
        let merge_inputs: Vec<usize> = raw
            .0
            .values()
            .flat_map(|kinds| kinds.get("main"))
            .flat_map(|by_output| by_output.iter())
            .flatten()
            .filter(|t| t.node == "Merge")
            .map(|t| t.index)
            .collect();
        let mut sorted = merge_inputs.clone();
        sorted.sort();
        assert_eq!(sorted, vec![0, 1]);
    }

    #[test]
    fn explicit_index_reserved_ahead_of_implicit() {
        let lite = vec![
            conn("X", "Merge", None, None),
            conn("Y", "Merge", None, Some(0)),
        ];
        let raw = reconstruct_connections(&lite);
        let merge_inputs: Vec<usize> = raw
            .0
            .values()
            .flat_map(|kinds| kinds.get("main"))
            .flat_map(|by_output| by_output.iter())
            .flatten()
            .filter(|t| t.node == "Merge")
            .map(|t| t.index)
            .collect();
        let mut sorted = merge_inputs.clone();
        sorted.sort();
        assert_eq!(sorted, vec![0, 1]);
    }

    #[test]
    fn compress_round_trips_indices() {
        let mut raw = RawConnections::default();
        raw.0
            .entry("A".to_string())
            .or_default()
            .entry("main".to_string())
            .or_default()
            .push(vec![RawConnectionTarget { node: "B".to_string(), kind: "main".to_string(), index: 0 }]);
        let lite = compress_connections(&raw);
        assert_eq!(lite.len(), 1);
        assert_eq!(lite[0].output_index, None);
        assert_eq!(lite[0].input_index, None);
    }
}
