// src/tools/dispatch.rs
//
// The tool router: one struct wrapping the engine client, knowledge index,
// snapshot store, and approval gate, with one method per tool (spec §6.5).
// Grounded on other_examples/bcb1cc23_agentika-labs-grepika__src-server.rs's
// ToolRouter/Parameters/ServerHandler wiring; the manual JSON-Schema
// validation ahead of every handler is this system's own addition (spec
// §4.10, component 11).

use std::collections::HashSet;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::tool::ToolCallContext;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult, PaginatedRequestParams,
    ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{tool, tool_router, RoleServer, ServerHandler};
use serde_json::{json, Value};

use crate::approval::ApprovalGate;
use crate::codec;
use crate::config::Config;
use crate::engine::{EngineClient, ListWorkflowsFilter};
use crate::error::McpToolError;
use crate::focus::{self, FocusSelection};
use crate::graph::{bfs_backward, bfs_forward, build_adjacency};
use crate::knowledge::{KnowledgeIndex, SearchMode};
use crate::model::{LiteConnection, LiteNode, LiteWorkflow, RawWorkflow, SnapshotTrigger};
use crate::preflight::{run_preflight, PreflightVerdict, VirtualWorkflow};
use crate::snapshot::SnapshotStore;

use super::schema;

fn ok(value: Value) -> CallToolResult {
    let text = serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("{{\"serializationError\": {e:?}}}"));
    CallToolResult::success(vec![Content::text(text)])
}

fn ok_serialize(value: &impl serde::Serialize) -> CallToolResult {
    ok(serde_json::to_value(value).unwrap_or(Value::Null))
}

fn err_text(message: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message.into())])
}

/// Outcome of running a mutating tool call through the approval gate.
enum Gate {
    Proceed,
    Result(CallToolResult),
}

#[derive(Clone)]
pub struct McpServer {
    engine: Arc<EngineClient>,
    knowledge: Arc<KnowledgeIndex>,
    snapshots: Arc<SnapshotStore>,
    approval: Arc<ApprovalGate>,
    tool_router: ToolRouter<McpServer>,
}

impl McpServer {
    pub fn new(config: &Config) -> Self {
        let engine = Arc::new(EngineClient::new(config.engine_host_url.clone(), config.engine_api_key.clone(), config.timeout_ms));
        let knowledge = Arc::new(KnowledgeIndex::embedded());
        let snapshots = Arc::new(SnapshotStore::new(config.snapshot_root.clone()));
        let approval = Arc::new(ApprovalGate::new(config.require_approval, config.snapshot_root.join("audit.log")));
        McpServer { engine, knowledge, snapshots, approval, tool_router: Self::tool_router() }
    }

    fn gate(&self, tool: &str, workflow_id: Option<&str>, summary: &str, approve: Option<&str>) -> Gate {
        if !self.approval.is_required() {
            self.approval.audit(tool, workflow_id, summary, true, "");
            return Gate::Proceed;
        }
        match approve {
            Some(token) => match self.approval.consume(token, tool) {
                Ok(_) => {
                    self.approval.audit(tool, workflow_id, summary, true, "");
                    Gate::Proceed
                }
                Err(e) => {
                    self.approval.audit(tool, workflow_id, summary, false, &e.to_string());
                    Gate::Result(err_text(e.to_string()))
                }
            },
            None => {
                let op = self.approval.stage(tool, summary);
                self.approval.audit(tool, workflow_id, summary, false, "");
                Gate::Result(ok(json!({"pending": true, "approve_token": op.token, "summary": summary})))
            }
        }
    }

    async fn fetch_raw(&self, workflow_id: &str) -> Result<RawWorkflow, CallToolResult> {
        self.engine.get_workflow(workflow_id).await.map_err(|e| err_text(format!("Error: {e}")))
    }

    fn save_snapshot(&self, workflow: &RawWorkflow, trigger: SnapshotTrigger, description: &str) -> Option<Value> {
        match self.snapshots.save_snapshot(workflow, trigger, description, chrono::Utc::now()) {
            Ok(meta) => serde_json::to_value(&meta).ok(),
            Err(e) => {
                log::warn!("snapshot write failed for {:?}: {e}", workflow.id);
                None
            }
        }
    }

    fn preflight_or_blocked(
        &self,
        tool: &str,
        workflow_id: Option<&str>,
        summary: &str,
        lite: &LiteWorkflow,
        snapshot: Option<&Value>,
    ) -> Result<(), CallToolResult> {
        let verdict: PreflightVerdict = run_preflight(&VirtualWorkflow { nodes: &lite.nodes, connections: &lite.connections }, &self.knowledge);
        if verdict.pass {
            Ok(())
        } else {
            self.approval.audit(tool, workflow_id, summary, false, &verdict.summary);
            Err(ok(json!({
                "blocked": true,
                "message": verdict.summary,
                "errors": verdict.errors,
                "warnings": verdict.warnings,
                "snapshot": snapshot,
            })))
        }
    }

    fn lite_workflow_from_args(&self, args: &Value, id: &str, active: bool) -> Result<LiteWorkflow, CallToolResult> {
        let name = args.get("name").and_then(Value::as_str).unwrap_or("Untitled").to_string();
        let nodes: Vec<LiteNode> = serde_json::from_value(args.get("nodes").cloned().unwrap_or(Value::Array(vec![])))
            .map_err(|e| err_text(format!("invalid \"nodes\": {e}")))?;
        let connections: Vec<LiteConnection> = serde_json::from_value(args.get("connections").cloned().unwrap_or(Value::Array(vec![])))
            .map_err(|e| err_text(format!("invalid \"connections\": {e}")))?;
        let tags: Vec<String> = args.get("tags").and_then(|v| serde_json::from_value(v.clone()).ok()).unwrap_or_default();
        Ok(LiteWorkflow { id: id.to_string(), name, active, nodes, connections, tags, settings: args.get("settings").cloned() })
    }

    fn selection_from_args(&self, args: &Value) -> Result<FocusSelection, CallToolResult> {
        if let Some(Value::Array(names)) = args.get("nodeNames") {
            let names: Vec<String> = names.iter().filter_map(|v| v.as_str().map(String::from)).collect();
            return Ok(FocusSelection::Explicit(names));
        }
        if let Some(router) = args.get("router").and_then(Value::as_str) {
            let output_index = args.get("outputIndex").and_then(Value::as_u64).unwrap_or(0) as usize;
            let max_depth = args.get("maxDepth").and_then(Value::as_u64).map(|v| v as usize);
            let upstream_levels = args.get("upstreamLevels").and_then(Value::as_u64).map(|v| v as usize);
            return Ok(FocusSelection::Branch { router: router.to_string(), output_index, max_depth, upstream_levels });
        }
        if let (Some(from), Some(to)) = (args.get("from").and_then(Value::as_str), args.get("to").and_then(Value::as_str)) {
            return Ok(FocusSelection::Range { from: from.to_string(), to: to.to_string() });
        }
        Err(err_text("focus selection requires one of: nodeNames, {router, outputIndex}, or {from, to}"))
    }
}

macro_rules! validated {
    ($tool:expr, $schema:expr, $args:expr) => {
        if let Err(e) = schema::validate($tool, &$schema, &$args) {
            return Ok(err_text(e));
        }
    };
}

#[tool_router]
impl McpServer {
    // ---------- read ----------

    #[tool(description = "List workflows known to the engine, optionally filtered by active state, name, or tags.")]
    async fn list_workflows(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("list_workflows", json!({"type": "object", "properties": {
            "active": {"type": "boolean"}, "name": {"type": "string"}, "tags": {"type": "string"},
            "cursor": {"type": "string"}, "limit": {"type": "integer", "minimum": 1, "maximum": 250},
        }}), args);

        let filter = ListWorkflowsFilter {
            active: args.get("active").and_then(Value::as_bool),
            name: args.get("name").and_then(Value::as_str).map(String::from),
            tags: args.get("tags").and_then(Value::as_str).map(String::from),
        };
        let cursor = args.get("cursor").and_then(Value::as_str);
        let limit = args.get("limit").and_then(Value::as_u64).map(|v| v as u32);

        match self.engine.list_workflows(cursor, limit, &filter).await {
            Ok(page) => {
                let summaries: Vec<Value> = page
                    .data
                    .iter()
                    .map(|w| json!({"id": w.id, "name": w.name, "active": w.active, "nodeCount": w.nodes.len()}))
                    .collect();
                Ok(ok(json!({"data": summaries, "nextCursor": page.next_cursor})))
            }
            Err(e) => Ok(err_text(format!("Error: {e}"))),
        }
    }

    #[tool(description = "Scan a workflow: one-line-per-node summaries, segments, and a token-budget recommendation on whether to focus.")]
    async fn scan_workflow(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("scan_workflow", json!({"type": "object", "required": ["workflowId"], "properties": {"workflowId": {"type": "string"}}}), args);
        let workflow_id = args["workflowId"].as_str().unwrap_or_default();
        let raw = match self.fetch_raw(workflow_id).await {
            Ok(w) => w,
            Err(e) => return Ok(e),
        };
        Ok(ok_serialize(&focus::scan_workflow(&raw)))
    }

    #[tool(description = "Fetch a workflow in its compact lite representation (type-compressed, parameters cleaned, connections index-compressed).")]
    async fn get_workflow(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("get_workflow", json!({"type": "object", "required": ["workflowId"], "properties": {"workflowId": {"type": "string"}}}), args);
        let workflow_id = args["workflowId"].as_str().unwrap_or_default();
        let raw = match self.fetch_raw(workflow_id).await {
            Ok(w) => w,
            Err(e) => return Ok(e),
        };
        Ok(ok_serialize(&codec::compress(&raw)))
    }

    #[tool(description = "Fetch a workflow's full raw engine JSON, unmodified. Expensive on large workflows; prefer get_workflow.")]
    async fn get_raw_workflow(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("get_raw_workflow", json!({"type": "object", "required": ["workflowId"], "properties": {"workflowId": {"type": "string"}}}), args);
        let workflow_id = args["workflowId"].as_str().unwrap_or_default();
        match self.fetch_raw(workflow_id).await {
            Ok(w) => Ok(ok_serialize(&w)),
            Err(e) => Ok(e),
        }
    }

    #[tool(description = "Focus a workflow on an explicit node list, a branch from a router's output, or a range between two nodes. Other nodes appear as dormant stubs classified by zone.")]
    async fn focus_workflow(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("focus_workflow", json!({"type": "object", "required": ["workflowId"], "properties": {"workflowId": {"type": "string"}, "executionId": {"type": "string"}}}), args);
        let workflow_id = args["workflowId"].as_str().unwrap_or_default();
        let raw = match self.fetch_raw(workflow_id).await {
            Ok(w) => w,
            Err(e) => return Ok(e),
        };
        let selection = match self.selection_from_args(&args) {
            Ok(s) => s,
            Err(e) => return Ok(e),
        };
        let execution_data = match args.get("executionId").and_then(Value::as_str) {
            Some(exec_id) => match self.engine.get_execution(exec_id, true).await {
                Ok(detail) => detail.data,
                Err(e) => return Ok(err_text(format!("Error: {e}"))),
            },
            None => None,
        };
        match focus::focus_workflow(&raw, &selection, execution_data.as_ref()) {
            Ok(view) => Ok(ok_serialize(&view)),
            Err(e) => Ok(err_text(e.to_string())),
        }
    }

    #[tool(description = "Grow an existing focused node set by one or more hops in both directions and re-run focus_workflow.")]
    async fn expand_focus(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("expand_focus", json!({"type": "object", "required": ["workflowId", "nodeNames"], "properties": {
            "workflowId": {"type": "string"}, "nodeNames": {"type": "array", "items": {"type": "string"}},
            "additionalDepth": {"type": "integer", "minimum": 1, "maximum": 20},
        }}), args);
        let workflow_id = args["workflowId"].as_str().unwrap_or_default();
        let raw = match self.fetch_raw(workflow_id).await {
            Ok(w) => w,
            Err(e) => return Ok(e),
        };
        let seed: Vec<String> = args["nodeNames"].as_array().unwrap_or(&vec![]).iter().filter_map(|v| v.as_str().map(String::from)).collect();
        let depth = args.get("additionalDepth").and_then(Value::as_u64).map(|v| v as usize).unwrap_or(1);

        let connections = codec::compress_connections(&raw.connections);
        let adjacency = build_adjacency(&connections);
        let mut expanded: HashSet<String> = bfs_forward(&seed, &adjacency, Some(depth), None);
        expanded.extend(bfs_backward(&seed, &adjacency, Some(depth), None));
        expanded.extend(seed);

        let selection = FocusSelection::Explicit(expanded.into_iter().collect());
        match focus::focus_workflow(&raw, &selection, None) {
            Ok(view) => Ok(ok_serialize(&view)),
            Err(e) => Ok(err_text(e.to_string())),
        }
    }

    // ---------- write ----------

    #[tool(description = "Create a new workflow from its lite representation. Blocked if preflight validation finds errors.")]
    async fn create_workflow(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("create_workflow", json!({"type": "object", "required": ["name", "nodes"], "properties": {
            "name": {"type": "string"}, "nodes": {"type": "array"}, "connections": {"type": "array"}, "approve": {"type": "string"},
        }}), args);

        let lite = match self.lite_workflow_from_args(&args, "", false) {
            Ok(l) => l,
            Err(e) => return Ok(e),
        };
        let summary = format!("create workflow {:?}", lite.name);
        if let Err(blocked) = self.preflight_or_blocked("create_workflow", None, &summary, &lite, None) {
            return Ok(blocked);
        }

        let approve = args.get("approve").and_then(Value::as_str);
        match self.gate("create_workflow", None, &summary, approve) {
            Gate::Result(r) => return Ok(r),
            Gate::Proceed => {}
        }

        let raw = codec::reconstruct(&lite, None);
        match self.engine.create_workflow(&raw).await {
            Ok(created) => {
                log::info!("created workflow {:?} ({:?})", created.id, created.name);
                Ok(ok_serialize(&codec::compress(&created)))
            }
            Err(e) => Ok(err_text(format!("Error: {e}"))),
        }
    }

    #[tool(description = "Replace a workflow's entire definition from its lite representation. Writes a pre-update snapshot first; blocked if preflight fails.")]
    async fn update_workflow_full(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("update_workflow_full", json!({"type": "object", "required": ["workflowId", "nodes"], "properties": {
            "workflowId": {"type": "string"}, "name": {"type": "string"}, "nodes": {"type": "array"},
            "connections": {"type": "array"}, "approve": {"type": "string"},
        }}), args);
        let workflow_id = args["workflowId"].as_str().unwrap_or_default().to_string();

        let original = match self.fetch_raw(&workflow_id).await {
            Ok(w) => w,
            Err(e) => return Ok(e),
        };
        let snapshot = self.save_snapshot(&original, SnapshotTrigger::PreUpdateWorkflow, "before full update");

        let mut lite = match self.lite_workflow_from_args(&args, &workflow_id, original.active) {
            Ok(l) => l,
            Err(e) => return Ok(e),
        };
        if args.get("name").is_none() {
            lite.name = original.name.clone();
        }

        let summary = format!("replace workflow {workflow_id:?}");
        if let Err(blocked) = self.preflight_or_blocked("update_workflow_full", Some(&workflow_id), &summary, &lite, snapshot.as_ref()) {
            return Ok(blocked);
        }

        match self.gate("update_workflow_full", Some(&workflow_id), &summary, args.get("approve").and_then(Value::as_str)) {
            Gate::Result(r) => return Ok(r),
            Gate::Proceed => {}
        }

        let raw = codec::reconstruct(&lite, Some(&original));
        match self.engine.update_workflow(&workflow_id, &raw).await {
            Ok(updated) => {
                log::info!("updated workflow {workflow_id:?}");
                Ok(ok_serialize(&codec::compress(&updated)))
            }
            Err(e) => Ok(err_text(format!("Error: {e}"))),
        }
    }

    #[tool(description = "Apply a targeted patch (add/remove nodes, add/remove connections) to a workflow without resending its full definition. Writes a pre-update snapshot first.")]
    async fn update_workflow_surgical(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("update_workflow_surgical", json!({"type": "object", "required": ["workflowId"], "properties": {
            "workflowId": {"type": "string"},
            "addNodes": {"type": "array"}, "removeNodeNames": {"type": "array", "items": {"type": "string"}},
            "addConnections": {"type": "array"}, "removeConnections": {"type": "array"},
            "renameNode": {"type": "object", "required": ["from", "to"], "properties": {
                "from": {"type": "string"}, "to": {"type": "string"},
            }},
            "setDisabled": {"type": "array", "items": {"type": "object", "required": ["name", "disabled"], "properties": {
                "name": {"type": "string"}, "disabled": {"type": "boolean"},
            }}},
            "updateNode": {"type": "array", "items": {"type": "object", "required": ["name"], "properties": {
                "name": {"type": "string"}, "params": {"type": "object"}, "type": {"type": "string"},
                "typeVersion": {"type": "number"}, "notes": {"type": "string"},
            }}},
            "approve": {"type": "string"},
        }}), args);
        let workflow_id = args["workflowId"].as_str().unwrap_or_default().to_string();

        let original = match self.fetch_raw(&workflow_id).await {
            Ok(w) => w,
            Err(e) => return Ok(e),
        };
        let snapshot = self.save_snapshot(&original, SnapshotTrigger::PreUpdateNodes, "before surgical update");

        let mut lite = codec::compress(&original);

        if let Some(rename) = args.get("renameNode") {
            let from = rename.get("from").and_then(Value::as_str).unwrap_or_default();
            let to = rename.get("to").and_then(Value::as_str).unwrap_or_default();
            if lite.nodes.iter().any(|n| n.name == to) {
                return Ok(err_text(McpToolError::conflict("node", to).to_string()));
            }
            match lite.nodes.iter_mut().find(|n| n.name == from) {
                Some(node) => node.name = to.to_string(),
                None => return Ok(err_text(McpToolError::missing("node", from).to_string())),
            }
            // Rewrite in place rather than dropping connections, so credential
            // and wiring restoration downstream still resolves by node id.
            for conn in lite.connections.iter_mut() {
                if conn.source == from {
                    conn.source = to.to_string();
                }
                if conn.target == from {
                    conn.target = to.to_string();
                }
            }
        }
        if let Some(updates) = args.get("setDisabled").and_then(Value::as_array) {
            for entry in updates {
                let name = entry.get("name").and_then(Value::as_str).unwrap_or_default();
                let disabled = entry.get("disabled").and_then(Value::as_bool).unwrap_or(false);
                match lite.nodes.iter_mut().find(|n| n.name == name) {
                    Some(node) => node.disabled = disabled.then_some(true),
                    None => return Ok(err_text(McpToolError::missing("node", name).to_string())),
                }
            }
        }
        if let Some(updates) = args.get("updateNode").and_then(Value::as_array) {
            for entry in updates {
                let name = entry.get("name").and_then(Value::as_str).unwrap_or_default();
                let Some(node) = lite.nodes.iter_mut().find(|n| n.name == name) else {
                    return Ok(err_text(McpToolError::missing("node", name).to_string()));
                };
                if let Some(params) = entry.get("params") {
                    node.params = Some(params.clone());
                }
                if let Some(node_type) = entry.get("type").and_then(Value::as_str) {
                    node.node_type = node_type.to_string();
                }
                if let Some(type_version) = entry.get("typeVersion").and_then(Value::as_f64) {
                    node.type_version = Some(type_version);
                }
                if let Some(notes) = entry.get("notes").and_then(Value::as_str) {
                    node.notes = Some(notes.to_string());
                }
            }
        }
        if let Some(remove) = args.get("removeNodeNames").and_then(Value::as_array) {
            let names: HashSet<String> = remove.iter().filter_map(|v| v.as_str().map(String::from)).collect();
            lite.nodes.retain(|n| !names.contains(&n.name));
            lite.connections.retain(|c| !names.contains(&c.source) && !names.contains(&c.target));
        }
        if let Some(add) = args.get("addNodes") {
            match serde_json::from_value::<Vec<LiteNode>>(add.clone()) {
                Ok(nodes) => lite.nodes.extend(nodes),
                Err(e) => return Ok(err_text(format!("invalid \"addNodes\": {e}"))),
            }
        }
        if let Some(remove) = args.get("removeConnections").and_then(Value::as_array) {
            let pairs: HashSet<(String, String)> = remove
                .iter()
                .filter_map(|v| Some((v.get("source")?.as_str()?.to_string(), v.get("target")?.as_str()?.to_string())))
                .collect();
            lite.connections.retain(|c| !pairs.contains(&(c.source.clone(), c.target.clone())));
        }
        if let Some(add) = args.get("addConnections") {
            match serde_json::from_value::<Vec<LiteConnection>>(add.clone()) {
                Ok(conns) => lite.connections.extend(conns),
                Err(e) => return Ok(err_text(format!("invalid \"addConnections\": {e}"))),
            }
        }

        let summary = format!("patch workflow {workflow_id:?}");
        if let Err(blocked) = self.preflight_or_blocked("update_workflow_surgical", Some(&workflow_id), &summary, &lite, snapshot.as_ref()) {
            return Ok(blocked);
        }

        match self.gate("update_workflow_surgical", Some(&workflow_id), &summary, args.get("approve").and_then(Value::as_str)) {
            Gate::Result(r) => return Ok(r),
            Gate::Proceed => {}
        }

        let raw = codec::reconstruct(&lite, Some(&original));
        match self.engine.update_workflow(&workflow_id, &raw).await {
            Ok(updated) => Ok(ok_serialize(&codec::compress(&updated))),
            Err(e) => Ok(err_text(format!("Error: {e}"))),
        }
    }

    #[tool(description = "Permanently delete a workflow. Requires confirm=true. Writes a pre-delete snapshot first.")]
    async fn delete_workflow(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("delete_workflow", json!({"type": "object", "required": ["workflowId", "confirm"], "properties": {
            "workflowId": {"type": "string"}, "confirm": {"type": "boolean"}, "approve": {"type": "string"},
        }}), args);
        let workflow_id = args["workflowId"].as_str().unwrap_or_default().to_string();
        if args["confirm"].as_bool() != Some(true) {
            return Ok(err_text("delete_workflow requires confirm=true"));
        }

        let original = match self.fetch_raw(&workflow_id).await {
            Ok(w) => w,
            Err(e) => return Ok(e),
        };
        let snapshot = self.save_snapshot(&original, SnapshotTrigger::PreDelete, "before delete");

        let summary = format!("delete workflow {workflow_id:?}");
        match self.gate("delete_workflow", Some(&workflow_id), &summary, args.get("approve").and_then(Value::as_str)) {
            Gate::Result(r) => return Ok(r),
            Gate::Proceed => {}
        }

        match self.engine.delete_workflow(&workflow_id).await {
            Ok(()) => {
                log::info!("deleted workflow {workflow_id:?}");
                Ok(ok(json!({"deleted": true, "workflowId": workflow_id, "snapshot": snapshot})))
            }
            Err(e) => Ok(err_text(format!("Error: {e}"))),
        }
    }

    // ---------- activation ----------

    #[tool(description = "Enable a workflow's automatic triggers.")]
    async fn activate_workflow(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("activate_workflow", json!({"type": "object", "required": ["workflowId"], "properties": {"workflowId": {"type": "string"}, "approve": {"type": "string"}}}), args);
        let workflow_id = args["workflowId"].as_str().unwrap_or_default().to_string();
        let summary = format!("activate workflow {workflow_id:?}");
        match self.gate("activate_workflow", Some(&workflow_id), &summary, args.get("approve").and_then(Value::as_str)) {
            Gate::Result(r) => return Ok(r),
            Gate::Proceed => {}
        }
        match self.engine.activate_workflow(&workflow_id).await {
            Ok(w) => {
                log::info!("activated workflow {workflow_id:?}");
                Ok(ok_serialize(&codec::compress(&w)))
            }
            Err(e) => Ok(err_text(format!("Error: {e}"))),
        }
    }

    #[tool(description = "Disable a workflow's automatic triggers.")]
    async fn deactivate_workflow(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("deactivate_workflow", json!({"type": "object", "required": ["workflowId"], "properties": {"workflowId": {"type": "string"}, "approve": {"type": "string"}}}), args);
        let workflow_id = args["workflowId"].as_str().unwrap_or_default().to_string();
        let summary = format!("deactivate workflow {workflow_id:?}");
        match self.gate("deactivate_workflow", Some(&workflow_id), &summary, args.get("approve").and_then(Value::as_str)) {
            Gate::Result(r) => return Ok(r),
            Gate::Proceed => {}
        }
        match self.engine.deactivate_workflow(&workflow_id).await {
            Ok(w) => {
                log::info!("deactivated workflow {workflow_id:?}");
                Ok(ok_serialize(&codec::compress(&w)))
            }
            Err(e) => Ok(err_text(format!("Error: {e}"))),
        }
    }

    // ---------- execution ----------

    #[tool(description = "List past executions, optionally filtered by workflow id or status.")]
    async fn list_executions(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("list_executions", json!({"type": "object", "properties": {"workflowId": {"type": "string"}, "status": {"type": "string"}}}), args);
        let workflow_id = args.get("workflowId").and_then(Value::as_str);
        let status = args.get("status").and_then(Value::as_str);
        match self.engine.list_executions(workflow_id, status).await {
            Ok(list) => Ok(ok_serialize(&list)),
            Err(e) => Ok(err_text(format!("Error: {e}"))),
        }
    }

    #[tool(description = "Fetch one execution's detail, optionally including per-node run data.")]
    async fn get_execution(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("get_execution", json!({"type": "object", "required": ["executionId"], "properties": {"executionId": {"type": "string"}, "includeData": {"type": "boolean"}}}), args);
        let execution_id = args["executionId"].as_str().unwrap_or_default();
        let include_data = args.get("includeData").and_then(Value::as_bool).unwrap_or(false);
        match self.engine.get_execution(execution_id, include_data).await {
            Ok(detail) => Ok(ok(json!({"id": detail.id, "workflowId": detail.workflow_id, "status": detail.status, "data": detail.data}))),
            Err(e) => Ok(err_text(format!("Error: {e}"))),
        }
    }

    #[tool(description = "Invoke a workflow's webhook, production or test, with a JSON payload.")]
    async fn trigger_webhook(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("trigger_webhook", json!({"type": "object", "required": ["path"], "properties": {
            "path": {"type": "string"}, "test": {"type": "boolean"}, "payload": {"type": "object"}, "approve": {"type": "string"},
        }}), args);
        let path = args["path"].as_str().unwrap_or_default().to_string();
        let test = args.get("test").and_then(Value::as_bool).unwrap_or(false);
        let payload = args.get("payload").cloned().unwrap_or(Value::Object(Default::default()));

        let summary = format!("trigger webhook {path:?}{}", if test { " (test)" } else { "" });
        match self.gate("trigger_webhook", None, &summary, args.get("approve").and_then(Value::as_str)) {
            Gate::Result(r) => return Ok(r),
            Gate::Proceed => {}
        }

        match self.engine.trigger_webhook(&path, test, &payload).await {
            Ok(response) => Ok(ok(response)),
            Err(e) => Ok(err_text(format!("Error: {e}"))),
        }
    }

    #[tool(description = "Dry-run a single webhook-triggered node by invoking its test webhook with a sample payload. Non-webhook nodes cannot be dry-run this way.")]
    async fn test_node(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("test_node", json!({"type": "object", "required": ["workflowId", "nodeName"], "properties": {
            "workflowId": {"type": "string"}, "nodeName": {"type": "string"}, "payload": {"type": "object"}, "approve": {"type": "string"},
        }}), args);
        let workflow_id = args["workflowId"].as_str().unwrap_or_default();
        let node_name = args["nodeName"].as_str().unwrap_or_default();

        let raw = match self.fetch_raw(workflow_id).await {
            Ok(w) => w,
            Err(e) => return Ok(e),
        };
        let Some(node) = raw.nodes.iter().find(|n| n.name == node_name) else {
            return Ok(err_text(McpToolError::missing("node", node_name).to_string()));
        };
        if !node.node_type.to_lowercase().contains("webhook") {
            return Ok(err_text(format!(
                "node {node_name:?} ({}) has no test webhook; only webhook-triggered nodes can be dry-run this way. Use trigger_webhook directly if it exposes one.",
                node.node_type
            )));
        }
        let path = node.parameters.get("path").and_then(Value::as_str).unwrap_or_default().to_string();
        let payload = args.get("payload").cloned().unwrap_or(Value::Object(Default::default()));

        let summary = format!("dry-run node {node_name:?} in workflow {workflow_id:?}");
        match self.gate("test_node", Some(workflow_id), &summary, args.get("approve").and_then(Value::as_str)) {
            Gate::Result(r) => return Ok(r),
            Gate::Proceed => {}
        }

        match self.engine.trigger_webhook(&path, true, &payload).await {
            Ok(response) => Ok(ok(response)),
            Err(e) => Ok(err_text(format!("Error: {e}"))),
        }
    }

    // ---------- versioning ----------

    #[tool(description = "List snapshots recorded for a workflow, newest first.")]
    async fn list_snapshots(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("list_snapshots", json!({"type": "object", "required": ["workflowId"], "properties": {"workflowId": {"type": "string"}}}), args);
        let workflow_id = args["workflowId"].as_str().unwrap_or_default();
        match self.snapshots.list_snapshots(workflow_id) {
            Ok(list) => Ok(ok_serialize(&list)),
            Err(e) => Ok(err_text(format!("snapshot store error: {e}"))),
        }
    }

    #[tool(description = "Roll a workflow back to a prior snapshot (or the most recent one if snapshotId is omitted). Takes a fresh safety snapshot of the current state first.")]
    async fn rollback_workflow(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("rollback_workflow", json!({"type": "object", "required": ["workflowId"], "properties": {
            "workflowId": {"type": "string"}, "snapshotId": {"type": "string"}, "approve": {"type": "string"},
        }}), args);
        let workflow_id = args["workflowId"].as_str().unwrap_or_default().to_string();

        let target = match args.get("snapshotId").and_then(Value::as_str) {
            Some(id) => self.snapshots.get_snapshot(&workflow_id, id),
            None => self.snapshots.latest_snapshot(&workflow_id),
        };
        let target = match target {
            Ok(s) => s,
            Err(e) => return Ok(err_text(format!("snapshot store error: {e}"))),
        };

        let summary = format!("rollback workflow {workflow_id:?} to snapshot {:?}", target.meta.id);
        match self.gate("rollback_workflow", Some(&workflow_id), &summary, args.get("approve").and_then(Value::as_str)) {
            Gate::Result(r) => return Ok(r),
            Gate::Proceed => {}
        }

        let current = match self.fetch_raw(&workflow_id).await {
            Ok(w) => w,
            Err(e) => return Ok(e),
        };
        let safety = self.save_snapshot(&current, SnapshotTrigger::Manual, "automatic safety snapshot before rollback");

        match self.engine.update_workflow(&workflow_id, &target.workflow).await {
            Ok(restored) => Ok(ok(json!({"rolledBackTo": target.meta, "safetySnapshot": safety, "workflow": codec::compress(&restored)}))),
            Err(e) => Ok(err_text(format!("Error: {e}"))),
        }
    }

    // ---------- approval ----------

    #[tool(description = "Turn the approval gate on or off at runtime. When on, mutating tools stage a pending operation and require a second call with the returned approve token.")]
    async fn set_approval_mode(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("set_approval_mode", json!({"type": "object", "required": ["required"], "properties": {"required": {"type": "boolean"}}}), args);
        let required = args["required"].as_bool().unwrap_or(false);
        let now = self.approval.set_required(required);
        Ok(ok(json!({"approvalRequired": now})))
    }

    // ---------- knowledge ----------

    #[tool(description = "Search the node knowledge index by type, display name, or keyword. Modes: and, or, fuzzy.")]
    async fn search_nodes(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("search_nodes", json!({"type": "object", "required": ["query"], "properties": {
            "query": {"type": "string"}, "mode": {"enum": ["and", "or", "fuzzy"]},
            "limit": {"type": "integer", "minimum": 1, "maximum": 100}, "source": {"type": "string"},
        }}), args);
        let query = args["query"].as_str().unwrap_or_default();
        let mode = match args.get("mode").and_then(Value::as_str) {
            Some("or") => SearchMode::Or,
            Some("fuzzy") => SearchMode::Fuzzy,
            _ => SearchMode::And,
        };
        let limit = args.get("limit").and_then(Value::as_u64).unwrap_or(20) as usize;
        let source = args.get("source").and_then(Value::as_str);
        Ok(ok_serialize(&self.knowledge.search_nodes(query, mode, limit, source)))
    }

    #[tool(description = "Resolve a node query (exact type, compact type, or display name) to its full schema. Suggests search_nodes on a miss.")]
    async fn get_node(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("get_node", json!({"type": "object", "required": ["query"], "properties": {"query": {"type": "string"}}}), args);
        let query = args["query"].as_str().unwrap_or_default();
        match self.knowledge.get_node(query) {
            Some(schema) => Ok(ok_serialize(schema)),
            None => Ok(err_text(format!("{}; try search_nodes to find the closest match", McpToolError::missing("node", query)))),
        }
    }

    #[tool(description = "Return a node type's declared property schema, formatted for constructing its parameters.")]
    async fn get_payload_schema(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("get_payload_schema", json!({"type": "object", "required": ["nodeType"], "properties": {"nodeType": {"type": "string"}}}), args);
        let node_type = args["nodeType"].as_str().unwrap_or_default();
        match self.knowledge.get_node(node_type) {
            Some(schema) => Ok(ok(json!({"nodeType": schema.node_type, "properties": schema.properties, "resourceOperations": schema.resource_operations}))),
            None => Ok(err_text(format!("{}; try search_nodes to find the closest match", McpToolError::missing("node", node_type)))),
        }
    }

    #[tool(description = "Search known workflow-building patterns by keyword.")]
    async fn search_patterns(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("search_patterns", json!({"type": "object", "required": ["query"], "properties": {"query": {"type": "string"}}}), args);
        Ok(ok_serialize(&self.knowledge.search_patterns(args["query"].as_str().unwrap_or_default())))
    }

    #[tool(description = "Fetch one named pattern's full description.")]
    async fn get_pattern(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("get_pattern", json!({"type": "object", "required": ["name"], "properties": {"name": {"type": "string"}}}), args);
        let name = args["name"].as_str().unwrap_or_default();
        match self.knowledge.get_pattern(name) {
            Some(p) => Ok(ok_serialize(p)),
            None => Ok(err_text(format!("{}; try search_patterns to find the closest match", McpToolError::missing("pattern", name)))),
        }
    }

    #[tool(description = "Search known node-specific quirks and gotchas by keyword.")]
    async fn get_quirks(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("get_quirks", json!({"type": "object", "required": ["query"], "properties": {"query": {"type": "string"}}}), args);
        Ok(ok_serialize(&self.knowledge.search_quirks(args["query"].as_str().unwrap_or_default())))
    }

    #[tool(description = "Search known expression recipes by keyword.")]
    async fn search_expressions(&self, Parameters(args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        validated!("search_expressions", json!({"type": "object", "required": ["query"], "properties": {"query": {"type": "string"}}}), args);
        Ok(ok_serialize(&self.knowledge.search_expressions(args["query"].as_str().unwrap_or_default())))
    }

    #[tool(description = "List the distinct node providers (sources) present in the knowledge index.")]
    async fn list_providers(&self, Parameters(_args): Parameters<Value>) -> Result<CallToolResult, rmcp::ErrorData> {
        Ok(ok(json!(self.knowledge.providers())))
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            server_info: Implementation { name: "n8n-mcp".to_string(), version: env!("CARGO_PKG_VERSION").to_string(), ..Default::default() },
            capabilities: ServerCapabilities::builder().enable_tools().enable_logging().build(),
            instructions: Some(
                "Mediates between an AI assistant and a workflow-automation engine. Start with scan_workflow on \
                 large workflows before get_workflow; focus_workflow narrows a view to a branch or range. Every \
                 mutating tool may return {pending: true, approve_token} when the approval gate is on — replay the \
                 same call with that token in the approve field to proceed."
                    .to_string(),
            ),
        }
    }

    async fn call_tool(&self, request: CallToolRequestParams, context: RequestContext<RoleServer>) -> Result<CallToolResult, rmcp::ErrorData> {
        let tcc = ToolCallContext::new(self, request, context);
        self.tool_router.call(tcc).await
    }

    async fn list_tools(&self, _request: Option<PaginatedRequestParams>, _context: RequestContext<RoleServer>) -> Result<ListToolsResult, rmcp::ErrorData> {
        Ok(ListToolsResult { tools: self.tool_router.list_all(), next_cursor: None, meta: None })
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tool_router.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::RawContent;
    use wiremock::matchers::{method as http_method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(engine_url: &str, snapshot_root: std::path::PathBuf, require_approval: bool) -> Config {
        Config {
            engine_host_url: engine_url.to_string(),
            engine_api_key: "test-key".to_string(),
            timeout_ms: 5_000,
            snapshot_root,
            require_approval,
        }
    }

    fn raw_workflow(id: &str, name: &str, node_names: &[&str]) -> Value {
        let nodes: Vec<Value> = node_names
            .iter()
            .map(|n| {
                json!({
                    "id": format!("id-{n}"), "name": n, "type": "n8n-nodes-base.noOp",
                    "typeVersion": 1, "position": [0.0, 0.0], "parameters": {},
                })
            })
            .collect();
        json!({"id": id, "name": name, "active": false, "nodes": nodes, "connections": {}, "settings": null, "tags": [], "versionId": "v1"})
    }

    fn text_of(result: &CallToolResult) -> String {
        match &result.content[0].raw {
            RawContent::Text(t) => t.text.clone(),
            other => panic!("expected text content, got {other:?}"),
        }
    }

    fn json_of(result: &CallToolResult) -> Value {
        serde_json::from_str(&text_of(result)).expect("tool result is valid JSON")
    }

    #[tokio::test]
    async fn rollback_fetches_target_before_taking_safety_snapshot_scenario_f() {
        let mock = MockServer::start().await;
        let snapshot_dir = tempfile::tempdir().unwrap();

        let store = SnapshotStore::new(snapshot_dir.path().to_path_buf());
        let seeded_workflow: RawWorkflow = serde_json::from_value(raw_workflow("wf1", "Demo", &["A"])).unwrap();
        let seeded_meta = store
            .save_snapshot(&seeded_workflow, SnapshotTrigger::PreUpdateWorkflow, "before full update", chrono::Utc::now())
            .unwrap();

        Mock::given(http_method("GET"))
            .and(path("/api/v1/workflows/wf1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(raw_workflow("wf1", "Demo", &["A", "B"])))
            .mount(&mock)
            .await;
        Mock::given(http_method("PUT"))
            .and(path("/api/v1/workflows/wf1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(raw_workflow("wf1", "Demo", &["A"])))
            .mount(&mock)
            .await;

        let config = test_config(&mock.uri(), snapshot_dir.path().to_path_buf(), false);
        let server = McpServer::new(&config);

        let result = server.rollback_workflow(Parameters(json!({"workflowId": "wf1"}))).await.unwrap();
        let body = json_of(&result);

        // If the safety snapshot were taken before resolving "latest", this
        // would incorrectly resolve to the safety snapshot itself.
        assert_eq!(body["rolledBackTo"]["id"], json!(seeded_meta.id));
        assert_eq!(body["rolledBackTo"]["trigger"], json!("pre-update-workflow"));
        assert!(!body["safetySnapshot"].is_null());
        assert_eq!(body["workflow"]["nodes"].as_array().unwrap().len(), 1);

        let list_result = server.list_snapshots(Parameters(json!({"workflowId": "wf1"}))).await.unwrap();
        let snapshots = json_of(&list_result);
        let snapshots = snapshots.as_array().unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0]["trigger"], json!("manual"));
        assert_eq!(snapshots[1]["id"], json!(seeded_meta.id));
    }

    #[tokio::test]
    async fn create_workflow_blocked_by_preflight_never_calls_engine_scenario_d() {
        let mock = MockServer::start().await;
        let snapshot_dir = tempfile::tempdir().unwrap();
        let config = test_config(&mock.uri(), snapshot_dir.path().to_path_buf(), false);
        let server = McpServer::new(&config);

        let args = json!({
            "name": "Bad workflow",
            "nodes": [{"name": "Set1", "type": "n8n-nodes-base.set", "id": "n1", "params": {"text": "{{$json.name}}"}}],
            "connections": [],
        });
        let result = server.create_workflow(Parameters(args)).await.unwrap();
        let body = json_of(&result);
        assert_eq!(body["blocked"], json!(true));
        assert!(body["errors"].as_array().unwrap().iter().any(|e| e["kind"] == "invalid_expression"));
        assert!(mock.received_requests().await.unwrap().is_empty(), "preflight failure must not reach the engine");

        Mock::given(http_method("POST"))
            .and(path("/api/v1/workflows"))
            .respond_with(ResponseTemplate::new(200).set_body_json(raw_workflow("wf2", "Bad workflow", &["Set1"])))
            .mount(&mock)
            .await;

        let fixed_args = json!({
            "name": "Bad workflow",
            "nodes": [{"name": "Set1", "type": "n8n-nodes-base.set", "id": "n1", "params": {"text": "={{$json.name}}"}}],
            "connections": [],
        });
        let fixed_result = server.create_workflow(Parameters(fixed_args)).await.unwrap();
        let fixed_body = json_of(&fixed_result);
        assert!(fixed_body.get("blocked").is_none());
        assert_eq!(mock.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_workflow_requires_two_calls_when_approval_enabled_scenario_15() {
        let mock = MockServer::start().await;
        let snapshot_dir = tempfile::tempdir().unwrap();
        let config = test_config(&mock.uri(), snapshot_dir.path().to_path_buf(), true);
        let server = McpServer::new(&config);

        Mock::given(http_method("GET"))
            .and(path("/api/v1/workflows/wf1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(raw_workflow("wf1", "Demo", &["A"])))
            .mount(&mock)
            .await;
        Mock::given(http_method("DELETE"))
            .and(path("/api/v1/workflows/wf1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&mock)
            .await;

        let first = server.delete_workflow(Parameters(json!({"workflowId": "wf1", "confirm": true}))).await.unwrap();
        let first_body = json_of(&first);
        assert_eq!(first_body["pending"], json!(true));
        let token = first_body["approve_token"].as_str().expect("pending response carries a token").to_string();

        assert!(
            mock.received_requests().await.unwrap().iter().all(|r| r.method.as_str() != "DELETE"),
            "staging an approval must not delete anything yet"
        );

        let second = server
            .delete_workflow(Parameters(json!({"workflowId": "wf1", "confirm": true, "approve": token})))
            .await
            .unwrap();
        let second_body = json_of(&second);
        assert_eq!(second_body["deleted"], json!(true));

        let requests = mock.received_requests().await.unwrap();
        assert_eq!(requests.iter().filter(|r| r.method.as_str() == "DELETE").count(), 1);
    }

    #[tokio::test]
    async fn rename_node_preserves_connections_and_credential_id() {
        let mock = MockServer::start().await;
        let snapshot_dir = tempfile::tempdir().unwrap();
        let config = test_config(&mock.uri(), snapshot_dir.path().to_path_buf(), false);
        let server = McpServer::new(&config);

        let original = json!({
            "id": "wf1", "name": "Demo", "active": false,
            "nodes": [
                {
                    "id": "n1", "name": "OldName", "type": "n8n-nodes-base.slack", "typeVersion": 1,
                    "position": [0.0, 0.0], "parameters": {},
                    "credentials": {"slackApi": {"id": "cred-123", "name": "My Slack"}},
                },
                {"id": "n2", "name": "B", "type": "n8n-nodes-base.noOp", "typeVersion": 1, "position": [0.0, 0.0], "parameters": {}},
            ],
            "connections": {"OldName": {"main": [[{"node": "B", "type": "main", "index": 0}]]}},
            "settings": null, "tags": [], "versionId": "v1",
        });

        Mock::given(http_method("GET"))
            .and(path("/api/v1/workflows/wf1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&original))
            .mount(&mock)
            .await;

        Mock::given(http_method("PUT"))
            .and(path("/api/v1/workflows/wf1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&original))
            .mount(&mock)
            .await;

        let result = server
            .update_workflow_surgical(Parameters(json!({"workflowId": "wf1", "renameNode": {"from": "OldName", "to": "NewName"}})))
            .await
            .unwrap();
        let body = json_of(&result);
        assert!(body.get("blocked").is_none(), "unexpected block: {body:?}");

        let requests = mock.received_requests().await.unwrap();
        let put_request = requests.iter().find(|r| r.method.as_str() == "PUT").expect("engine received an update");
        let sent: Value = serde_json::from_slice(&put_request.body).unwrap();
        let nodes = sent["nodes"].as_array().unwrap();
        let renamed = nodes.iter().find(|n| n["name"] == "NewName").expect("renamed node present");
        assert_eq!(renamed["id"], json!("n1"));
        assert_eq!(renamed["credentials"]["slackApi"]["id"], json!("cred-123"), "credential id survives rename via id-based lookup");

        let conns = sent["connections"].as_object().unwrap();
        assert!(conns.contains_key("NewName"), "connection source rewritten to the new name");
        assert!(!conns.contains_key("OldName"));
    }

    #[tokio::test]
    async fn rename_node_rejects_collision_with_existing_name() {
        let mock = MockServer::start().await;
        let snapshot_dir = tempfile::tempdir().unwrap();
        let config = test_config(&mock.uri(), snapshot_dir.path().to_path_buf(), false);
        let server = McpServer::new(&config);

        Mock::given(http_method("GET"))
            .and(path("/api/v1/workflows/wf1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(raw_workflow("wf1", "Demo", &["A", "B"])))
            .mount(&mock)
            .await;

        let result = server
            .update_workflow_surgical(Parameters(json!({"workflowId": "wf1", "renameNode": {"from": "A", "to": "B"}})))
            .await
            .unwrap();
        let text = text_of(&result);
        assert!(text.contains("already in use"), "unexpected message: {text}");
        assert!(mock.received_requests().await.unwrap().iter().all(|r| r.method.as_str() != "PUT"));
    }
}
