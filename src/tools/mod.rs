// src/tools/mod.rs
//
// Tool dispatcher and handlers (spec §4.10). Grounded on
// other_examples/bcb1cc23_agentika-labs-grepika__src-server.rs's
// ToolRouter/Parameters wiring.

pub mod dispatch;
pub mod schema;

pub use dispatch::McpServer;
