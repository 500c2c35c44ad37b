// src/config.rs
//
// Environment-derived process configuration, following unifiedlab's
// ResourceLedger::detect() environment-sniffing style (spec §6.2).

use std::path::PathBuf;

const ENV_ENGINE_HOST: &str = "N8N_HOST_URL";
const ENV_ENGINE_API_KEY: &str = "N8N_API_KEY";
const ENV_TIMEOUT_MS: &str = "N8N_TIMEOUT_MS";
const ENV_SNAPSHOT_ROOT: &str = "N8N_SNAPSHOT_ROOT";
const ENV_REQUIRE_APPROVAL: &str = "N8N_REQUIRE_APPROVAL";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub engine_host_url: String,
    pub engine_api_key: String,
    pub timeout_ms: u64,
    pub snapshot_root: PathBuf,
    pub require_approval: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let engine_host_url = std::env::var(ENV_ENGINE_HOST)
            .map_err(|_| ConfigError::Missing(ENV_ENGINE_HOST))?;
        let engine_api_key = std::env::var(ENV_ENGINE_API_KEY)
            .map_err(|_| ConfigError::Missing(ENV_ENGINE_API_KEY))?;

        let timeout_ms = std::env::var(ENV_TIMEOUT_MS)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        let snapshot_root = std::env::var(ENV_SNAPSHOT_ROOT)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_snapshot_root());

        let require_approval = std::env::var(ENV_REQUIRE_APPROVAL)
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Config {
            engine_host_url: engine_host_url.trim_end_matches('/').to_string(),
            engine_api_key,
            timeout_ms,
            snapshot_root,
            require_approval,
        })
    }
}

/// Relative to the running executable's install location, never the launch
/// directory (which may be unwritable on some hosts — spec §4.8).
fn default_snapshot_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("n8n-mcp-snapshots")
}
