// src/approval.rs
//
// Approval gate and audit log (spec §4.9). Mutating tools stage a pending
// operation and hand back an opaque token; the caller must replay the call
// with that token before the engine sees the request. Grounded on
// unifiedlab::guardian's in-memory lease-with-expiry bookkeeping.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::PendingOperation;

const EXPIRY_MINUTES: i64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    #[error("no pending operation for token {0:?}")]
    UnknownToken(String),
    #[error("approval token {0:?} has expired; re-issue the request")]
    Expired(String),
}

#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    timestamp: String,
    tool: &'a str,
    workflow_id: Option<&'a str>,
    summary: &'a str,
    approved: bool,
    result: &'a str,
}

pub struct ApprovalGate {
    require_approval: AtomicBool,
    pending: Mutex<HashMap<String, PendingOperation>>,
    audit_log_path: PathBuf,
}

impl ApprovalGate {
    pub fn new(require_approval: bool, audit_log_path: PathBuf) -> Self {
        ApprovalGate { require_approval: AtomicBool::new(require_approval), pending: Mutex::new(HashMap::new()), audit_log_path }
    }

    pub fn is_required(&self) -> bool {
        self.require_approval.load(Ordering::SeqCst)
    }

    /// Flips the gate at runtime; returns the new state. Backs the
    /// `set_approval_mode` tool.
    pub fn set_required(&self, required: bool) -> bool {
        self.require_approval.store(required, Ordering::SeqCst);
        required
    }

    /// Stages a pending operation and returns the token the caller must
    /// replay. Purges expired entries first so the map never grows unbounded.
    pub fn stage(&self, tool_name: impl Into<String>, summary: impl Into<String>) -> PendingOperation {
        let now = Utc::now();
        let mut pending = self.pending.lock().expect("approval map poisoned");
        purge_expired(&mut pending, now);

        let token = generate_token(now);
        let op = PendingOperation { token: token.clone(), tool_name: tool_name.into(), summary: summary.into(), created_at: now };
        pending.insert(token, op.clone());
        op
    }

    /// Consumes a token if present, unexpired, and matching `tool_name`.
    /// Consuming removes it: a token is single-use.
    pub fn consume(&self, token: &str, tool_name: &str) -> Result<PendingOperation, ApprovalError> {
        let now = Utc::now();
        let mut pending = self.pending.lock().expect("approval map poisoned");
        purge_expired(&mut pending, now);

        let (matches_tool, expired) = {
            let op = pending.get(token).ok_or_else(|| ApprovalError::UnknownToken(token.to_string()))?;
            (op.tool_name == tool_name, now.signed_duration_since(op.created_at).num_minutes() >= EXPIRY_MINUTES)
        };
        if !matches_tool {
            return Err(ApprovalError::UnknownToken(token.to_string()));
        }
        if expired {
            pending.remove(token);
            return Err(ApprovalError::Expired(token.to_string()));
        }
        Ok(pending.remove(token).expect("presence checked above"))
    }

    /// Appends one line to the audit log. Write failures are logged and
    /// swallowed: an audit-log outage must never block a tool response.
    pub fn audit(&self, tool: &str, workflow_id: Option<&str>, summary: &str, approved: bool, result: &str) {
        let entry = AuditEntry { timestamp: Utc::now().to_rfc3339(), tool, workflow_id, summary, approved, result };
        let line = match serde_json::to_string(&entry) {
            Ok(l) => l,
            Err(e) => {
                log::warn!("failed to serialize audit entry: {e}");
                return;
            }
        };
        if let Some(parent) = self.audit_log_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::warn!("failed to create audit log directory {parent:?}: {e}");
                return;
            }
        }
        let write_result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)
            .and_then(|mut f| writeln!(f, "{line}"));
        if let Err(e) = write_result {
            log::warn!("failed to append audit log entry: {e}");
        }
    }
}

fn purge_expired(pending: &mut HashMap<String, PendingOperation>, now: DateTime<Utc>) {
    pending.retain(|_, op| now.signed_duration_since(op.created_at).num_minutes() < EXPIRY_MINUTES);
}

fn generate_token(now: DateTime<Utc>) -> String {
    format!("appr_{:013x}_{}", now.timestamp_millis().max(0), uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_then_consume_succeeds_once() {
        let dir = tempfile::tempdir().unwrap();
        let gate = ApprovalGate::new(true, dir.path().join("audit.jsonl"));
        let op = gate.stage("deleteWorkflow", "delete wf1");
        let consumed = gate.consume(&op.token, "deleteWorkflow").unwrap();
        assert_eq!(consumed.summary, "delete wf1");
        assert!(matches!(gate.consume(&op.token, "deleteWorkflow"), Err(ApprovalError::UnknownToken(_))));
    }

    #[test]
    fn consume_wrong_tool_name_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let gate = ApprovalGate::new(true, dir.path().join("audit.jsonl"));
        let op = gate.stage("deleteWorkflow", "delete wf1");
        assert!(matches!(gate.consume(&op.token, "updateWorkflow"), Err(ApprovalError::UnknownToken(_))));
    }

    #[test]
    fn audit_appends_jsonl_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let gate = ApprovalGate::new(false, path.clone());
        gate.audit("deleteWorkflow", Some("wf1"), "delete wf1", true, "ok");
        gate.audit("deleteWorkflow", Some("wf1"), "delete wf1", true, "ok");
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
