// src/engine/error.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("request to {path} timed out after {timeout_ms}ms")]
    Timeout { path: String, timeout_ms: u64 },

    #[error("{status} {path}: {body}")]
    Status { status: u16, path: String, body: String },

    #[error("network error calling {path}: {source}")]
    Network { path: String, source: reqwest::Error },
}

impl EngineError {
    pub fn path(&self) -> &str {
        match self {
            EngineError::Timeout { path, .. } => path,
            EngineError::Status { path, .. } => path,
            EngineError::Network { path, .. } => path,
        }
    }
}
