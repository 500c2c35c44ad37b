// src/codec/mod.rs
//
// Bidirectional mapping between raw engine JSON and the lite representation
// (spec §4.2). Grounded on unifiedlab::workflow::WorkflowEngine's recursive
// JSON-walking style and its existing use of petgraph::algo::toposort.

mod connections;
mod credentials;
mod params;
mod prefix;
mod toposort;

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::model::{LiteNode, LiteWorkflow, RawNode, RawWorkflow};

pub use connections::{compress_connections, reconstruct_connections};
pub use params::resolve_type_version;
pub use prefix::{compress_type, restore_type};
pub use toposort::topological_order;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed raw workflow: missing or invalid field {0:?}")]
    MissingField(&'static str),
}

/// Validates the shape of raw JSON before full deserialization so a missing
/// `nodes` array surfaces as a named field rather than a generic parse error.
pub fn parse_raw_workflow(value: &Value) -> Result<RawWorkflow, CodecError> {
    let obj = value.as_object().ok_or(CodecError::MissingField("root"))?;
    match obj.get("nodes") {
        Some(Value::Array(_)) => {}
        _ => return Err(CodecError::MissingField("nodes")),
    }
    serde_json::from_value(value.clone()).map_err(|_| CodecError::MissingField("nodes"))
}

/// Compresses a raw workflow into its lite projection. Nodes are emitted in
/// topological order when the connection graph is acyclic.
pub fn compress(raw: &RawWorkflow) -> LiteWorkflow {
    let lite_connections = compress_connections(&raw.connections);

    let node_names: Vec<String> = raw.nodes.iter().map(|n| n.name.clone()).collect();
    let order = topological_order(&node_names, &lite_connections);
    let position_by_name: HashMap<&str, usize> =
        order.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();

    let mut lite_nodes: Vec<LiteNode> = raw.nodes.iter().map(compress_node).collect();
    lite_nodes.sort_by_key(|n| position_by_name.get(n.name.as_str()).copied().unwrap_or(usize::MAX));

    let tags: Vec<String> = raw
        .tags
        .iter()
        .filter_map(|t| t.as_str().map(|s| s.to_string()).or_else(|| {
            t.get("name").and_then(|v| v.as_str()).map(|s| s.to_string())
        }))
        .collect();

    LiteWorkflow {
        id: raw.id.clone(),
        name: raw.name.clone(),
        active: raw.active,
        nodes: lite_nodes,
        connections: lite_connections,
        tags,
        settings: raw.settings.clone(),
    }
}

pub fn compress_node_for_scan(node: &RawNode) -> LiteNode {
    compress_node(node)
}

fn compress_node(node: &RawNode) -> LiteNode {
    let params = params::clean_params(&node.parameters);
    let credentials = node.credentials.as_ref().map(credentials::reduce_credentials);
    LiteNode {
        name: node.name.clone(),
        node_type: compress_type(&node.node_type),
        id: node.id.clone(),
        type_version: if node.type_version == 1.0 { None } else { Some(node.type_version) },
        params,
        credentials,
        disabled: node.disabled.filter(|d| *d),
        error_mode: node.on_error.clone().filter(|m| m != "stopWorkflow"),
        notes: node.notes.clone(),
        input_hint: None,
    }
}

/// Reconstructs a raw workflow from its lite projection. When `original` is
/// supplied (an update in progress), type-versions and credential ids fall
/// back to the corresponding original node looked up by its stable node id,
/// not its display name, so a rename applied to `lite` (the name changes,
/// the id doesn't) still resolves to the right original. Nodes with no
/// original (new additions) get an auto-assigned position rather than
/// stacking at the canvas origin.
pub fn reconstruct(lite: &LiteWorkflow, original: Option<&RawWorkflow>) -> RawWorkflow {
    let original_by_id: HashMap<&str, &RawNode> =
        original.map(|w| w.nodes.iter().map(|n| (n.id.as_str(), n)).collect()).unwrap_or_default();

    let node_names: Vec<String> = lite.nodes.iter().map(|n| n.name.clone()).collect();
    let new_node_positions = crate::layout::compute_layout(&node_names, &lite.connections);

    let nodes: Vec<RawNode> = lite
        .nodes
        .iter()
        .map(|lite_node| {
            reconstruct_node(
                lite_node,
                original_by_id.get(lite_node.id.as_str()).copied(),
                new_node_positions.get(&lite_node.name),
            )
        })
        .collect();

    let connections = reconstruct_connections(&lite.connections);

    RawWorkflow {
        id: lite.id.clone(),
        name: lite.name.clone(),
        active: lite.active,
        nodes,
        connections,
        settings: lite.settings.clone(),
        tags: lite.tags.iter().map(|t| Value::String(t.clone())).collect(),
        version_id: original.and_then(|w| w.version_id.clone()),
        created_at: original.and_then(|w| w.created_at.clone()),
        updated_at: original.and_then(|w| w.updated_at.clone()),
        extra: HashMap::new(),
    }
}

fn reconstruct_node(lite_node: &LiteNode, original: Option<&RawNode>, auto_position: Option<&crate::layout::Position>) -> RawNode {
    let node_type = restore_type(&lite_node.node_type);
    let type_version = resolve_type_version(lite_node.type_version, original.map(|n| n.type_version), &lite_node.node_type);
    let credentials = lite_node.credentials.as_ref().map(|lite_creds| {
        credentials::restore_credentials(lite_creds, original.and_then(|n| n.credentials.as_ref()))
    });

    let position = match original {
        Some(n) => n.position,
        None => auto_position.map(|p| [p.x, p.y]).unwrap_or([0.0, 0.0]),
    };

    RawNode {
        id: lite_node.id.clone(),
        name: lite_node.name.clone(),
        node_type,
        type_version,
        position,
        parameters: lite_node.params.clone().map(|p| params::restore_params(&p)).unwrap_or(Value::Object(Default::default())),
        credentials,
        disabled: lite_node.disabled,
        on_error: lite_node.error_mode.clone(),
        notes: lite_node.notes.clone(),
        extra: original.map(|n| n.extra.clone()).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawConnectionTarget;

    fn sample_raw() -> RawWorkflow {
        let mut connections = crate::model::RawConnections::default();
        connections
            .0
            .entry("A".to_string())
            .or_default()
            .entry("main".to_string())
            .or_default()
            .push(vec![RawConnectionTarget { node: "B".to_string(), kind: "main".to_string(), index: 0 }]);

        RawWorkflow {
            id: "wf1".to_string(),
            name: "Sample".to_string(),
            active: false,
            nodes: vec![
                RawNode {
                    id: "n1".to_string(),
                    name: "A".to_string(),
                    node_type: "n8n-nodes-base.httpRequest".to_string(),
                    type_version: 1.0,
                    position: [0.0, 0.0],
                    parameters: serde_json::json!({"url": "https://example.com", "options": {}}),
                    credentials: None,
                    disabled: None,
                    on_error: None,
                    notes: None,
                    extra: HashMap::new(),
                },
                RawNode {
                    id: "n2".to_string(),
                    name: "B".to_string(),
                    node_type: "n8n-nodes-base.set".to_string(),
                    type_version: 3.0,
                    position: [100.0, 0.0],
                    parameters: serde_json::json!({}),
                    credentials: None,
                    disabled: None,
                    on_error: None,
                    notes: None,
                    extra: HashMap::new(),
                },
            ],
            connections,
            settings: None,
            tags: vec![],
            version_id: Some("v1".to_string()),
            created_at: None,
            updated_at: None,
            extra: HashMap::new(),
        }
    }

    #[test]
    fn round_trip_preserves_observable_shape() {
        let raw = sample_raw();
        let lite = compress(&raw);
        assert_eq!(lite.nodes.len(), 2);
        assert_eq!(lite.nodes[0].name, "A");
        assert_eq!(lite.nodes[0].node_type, "httpRequest");

        let reconstructed = reconstruct(&lite, Some(&raw));
        let names: Vec<&str> = reconstructed.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(reconstructed.nodes[1].type_version, 3.0);
        assert_eq!(reconstructed.nodes[0].node_type, "n8n-nodes-base.httpRequest");
    }

    #[test]
    fn missing_nodes_field_is_a_named_failure() {
        let value = serde_json::json!({"id": "wf1", "name": "No nodes"});
        let err = parse_raw_workflow(&value).unwrap_err();
        matches!(err, CodecError::MissingField("nodes"));
    }
}
