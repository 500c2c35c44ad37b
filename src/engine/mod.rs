// src/engine/mod.rs

mod client;
mod error;

pub use client::{EngineClient, ExecutionDetail, ExecutionSummary, ListWorkflowsFilter, ListWorkflowsPage};
pub use error::EngineError;
