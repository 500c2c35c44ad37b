// src/main.rs
//
// Entry point: parses the CLI, loads configuration from the environment,
// wires the engine client / knowledge index / snapshot store / approval
// gate into the tool router, and serves MCP over stdio.

use anyhow::{Context, Result};
use clap::Parser;
use rmcp::transport::stdio;
use rmcp::ServiceExt;

use n8n_mcp::{Config, McpServer};

#[derive(Parser)]
#[command(name = "n8n-mcp", version, about = "MCP server mediating an AI assistant and a workflow-automation engine's REST API")]
struct Cli {
    /// Print the embedded node knowledge index's provider list and exit, without starting the server.
    #[arg(long)]
    list_providers: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if cli.list_providers {
        let knowledge = n8n_mcp::knowledge::KnowledgeIndex::embedded();
        for provider in knowledge.providers() {
            println!("{provider}");
        }
        return Ok(());
    }

    let config = Config::from_env().context("loading configuration from the environment")?;
    log::info!("starting n8n-mcp against {}", config.engine_host_url);

    let server = McpServer::new(&config);
    let service = server.serve(stdio()).await.context("starting MCP stdio transport")?;
    service.waiting().await.context("MCP service loop")?;

    Ok(())
}
