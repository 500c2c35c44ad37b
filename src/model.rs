// src/model.rs
//
// =============================================================================
// N8N-MCP: DATA MODEL
// =============================================================================
//
// Raw engine-shaped types, the compact "Lite" projection, and the view
// types (Scan / Dormant / Focused) served to the assistant. See spec §3.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// RAW WORKFLOW (mirrors the remote engine's representation)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawWorkflow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub connections: RawConnections,
    #[serde(default)]
    pub settings: Option<Value>,
    #[serde(default)]
    pub tags: Vec<Value>,

    // Bloat fields tolerated on read, not reproduced unless passing through.
    #[serde(default, rename = "versionId")]
    pub version_id: Option<String>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(rename = "typeVersion", default)]
    pub type_version: f64,
    #[serde(default)]
    pub position: [f64; 2],
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub credentials: Option<HashMap<String, RawCredentialRef>>,
    #[serde(default)]
    pub disabled: Option<bool>,
    #[serde(rename = "onError", default)]
    pub on_error: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCredentialRef {
    pub id: String,
    pub name: String,
}

/// source-node-name -> output-kind -> per-output-index list of targets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConnections(pub HashMap<String, HashMap<String, Vec<Vec<RawConnectionTarget>>>>);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawConnectionTarget {
    pub node: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub index: usize,
}

// ============================================================================
// LITE WORKFLOW (the compact projection)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiteWorkflow {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub nodes: Vec<LiteNode>,
    pub connections: Vec<LiteConnection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiteNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "typeVersion")]
    pub type_version: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "errorMode")]
    pub error_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "inputHint")]
    pub input_hint: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct LiteConnection {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "outputIndex")]
    pub output_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "inputIndex")]
    pub input_index: Option<usize>,
}

impl LiteConnection {
    pub fn kind_or_main(&self) -> &str {
        self.kind.as_deref().unwrap_or("main")
    }
    pub fn output_index_or_zero(&self) -> usize {
        self.output_index.unwrap_or(0)
    }
    pub fn input_index_or_zero(&self) -> usize {
        self.input_index.unwrap_or(0)
    }
}

// ============================================================================
// SCAN / DORMANT / FOCUSED VIEW TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "outputCount")]
    pub output_count: Option<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Focused,
    Upstream,
    Downstream,
    Parallel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DormantNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub id: String,
    pub zone: Zone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", rename = "outputsTo")]
    pub outputs_to: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", rename = "inputsFrom")]
    pub inputs_from: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "outputHint")]
    pub output_hint: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BoundaryDirection {
    Entry,
    Exit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryCrossing {
    pub source: String,
    pub target: String,
    pub direction: BoundaryDirection,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "outputIndex")]
    pub output_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "inputIndex")]
    pub input_index: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneCounts {
    pub focused: usize,
    pub upstream: usize,
    pub downstream: usize,
    pub parallel: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusedWorkflowView {
    pub id: String,
    pub name: String,
    #[serde(rename = "totalNodes")]
    pub total_nodes: usize,
    pub focused: Vec<LiteNode>,
    pub connections: Vec<LiteConnection>,
    pub dormant: Vec<DormantNode>,
    pub boundaries: Vec<BoundaryCrossing>,
    #[serde(rename = "zoneCounts")]
    pub zone_counts: ZoneCounts,
}

// ============================================================================
// SNAPSHOT / PENDING OPERATION
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotTrigger {
    PreCreate,
    PreUpdateWorkflow,
    PreUpdateNodes,
    PreDelete,
    Manual,
}

impl SnapshotTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotTrigger::PreCreate => "pre-create",
            SnapshotTrigger::PreUpdateWorkflow => "pre-update-workflow",
            SnapshotTrigger::PreUpdateNodes => "pre-update-nodes",
            SnapshotTrigger::PreDelete => "pre-delete",
            SnapshotTrigger::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub id: String,
    #[serde(rename = "workflowId")]
    pub workflow_id: String,
    #[serde(rename = "workflowName")]
    pub workflow_name: String,
    pub timestamp: String,
    pub trigger: SnapshotTrigger,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub meta: SnapshotMeta,
    pub workflow: RawWorkflow,
}

#[derive(Debug, Clone)]
pub struct PendingOperation {
    pub token: String,
    pub tool_name: String,
    pub summary: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
