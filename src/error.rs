// src/error.rs
//
// Shared error taxonomy. Component-local errors (`EngineError`, `CodecError`,
// `GraphError`, `SnapshotError`) live beside their modules; `McpToolError`
// backs the dispatcher's "unknown entity" and "name already in use" tool
// responses so those messages aren't hand-rolled per call site.

use thiserror::Error;

use crate::engine::EngineError;
use crate::snapshot::SnapshotError;

#[derive(Debug, Error)]
pub enum McpToolError {
    #[error("Error: {0}")]
    Engine(#[from] EngineError),

    #[error("Unknown {kind} {quoted:?}")]
    MissingEntity { kind: &'static str, quoted: String },

    #[error("{kind} {quoted:?} already in use")]
    Conflict { kind: &'static str, quoted: String },

    #[error("snapshot store error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("{0}")]
    Invalid(String),
}

impl McpToolError {
    pub fn missing(kind: &'static str, name: impl Into<String>) -> Self {
        McpToolError::MissingEntity { kind, quoted: name.into() }
    }
    pub fn conflict(kind: &'static str, name: impl Into<String>) -> Self {
        McpToolError::Conflict { kind, quoted: name.into() }
    }
}
