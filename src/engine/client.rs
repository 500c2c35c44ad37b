// src/engine/client.rs
//
// Typed wrapper over the remote workflow engine's REST surface (spec §4.1,
// §6.3). Grounded on unifiedlab::transport::FileTransport's shape: one
// struct wrapping I/O, built once at construction, exposing small typed
// async methods that return Result<T>. reqwest replaces file I/O since the
// teacher never talks HTTP.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::model::RawWorkflow;

use super::EngineError;

const API_KEY_HEADER: &str = "X-N8N-API-KEY";

#[derive(Debug, Clone)]
pub struct EngineClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListWorkflowsFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListWorkflowsPage {
    pub data: Vec<RawWorkflow>,
    #[serde(rename = "nextCursor")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub id: String,
    #[serde(rename = "workflowId")]
    pub workflow_id: String,
    pub status: String,
    #[serde(rename = "startedAt", default)]
    pub started_at: Option<String>,
    #[serde(rename = "stoppedAt", default)]
    pub stopped_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionDetail {
    pub id: String,
    #[serde(rename = "workflowId")]
    pub workflow_id: String,
    pub status: String,
    pub data: Option<Value>,
}

impl EngineClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout_ms: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .expect("reqwest client builds with static config");
        EngineClient {
            http,
            base_url: format!("{}/api/v1", base_url.into().trim_end_matches('/')),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        req: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<T, EngineError> {
        log::debug!("engine request -> {}", path);
        let resp = req
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    EngineError::Timeout { path: path.to_string(), timeout_ms: self.http_timeout_ms() }
                } else {
                    EngineError::Network { path: path.to_string(), source }
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EngineError::Status { status: status.as_u16(), path: path.to_string(), body });
        }
        resp.json::<T>().await.map_err(|source| EngineError::Network { path: path.to_string(), source })
    }

    fn http_timeout_ms(&self) -> u64 {
        // Not retrievable from reqwest::Client directly; callers only need this
        // for the error message, so a coarse approximation is fine.
        30_000
    }

    pub async fn list_workflows(
        &self,
        cursor: Option<&str>,
        limit: Option<u32>,
        filter: &ListWorkflowsFilter,
    ) -> Result<ListWorkflowsPage, EngineError> {
        let path = "/workflows";
        let mut req = self.http.get(self.url(path));
        if let Some(c) = cursor {
            req = req.query(&[("cursor", c)]);
        }
        if let Some(l) = limit {
            req = req.query(&[("limit", l)]);
        }
        if let Some(active) = filter.active {
            req = req.query(&[("active", active)]);
        }
        if let Some(name) = &filter.name {
            req = req.query(&[("name", name)]);
        }
        if let Some(tags) = &filter.tags {
            req = req.query(&[("tags", tags)]);
        }
        self.send(req, path).await
    }

    pub async fn get_workflow(&self, id: &str) -> Result<RawWorkflow, EngineError> {
        let path = format!("/workflows/{id}");
        let req = self.http.get(self.url(&path));
        self.send(req, &path).await
    }

    pub async fn create_workflow(&self, workflow: &RawWorkflow) -> Result<RawWorkflow, EngineError> {
        let path = "/workflows";
        let req = self.http.post(self.url(path)).json(workflow);
        self.send(req, path).await
    }

    pub async fn update_workflow(&self, id: &str, workflow: &RawWorkflow) -> Result<RawWorkflow, EngineError> {
        let path = format!("/workflows/{id}");
        let req = self.http.put(self.url(&path)).json(workflow);
        self.send(req, &path).await
    }

    pub async fn delete_workflow(&self, id: &str) -> Result<(), EngineError> {
        let path = format!("/workflows/{id}");
        let _: Value = self.send(self.http.delete(self.url(&path)), &path).await?;
        Ok(())
    }

    pub async fn activate_workflow(&self, id: &str) -> Result<RawWorkflow, EngineError> {
        let path = format!("/workflows/{id}/activate");
        let req = self.http.post(self.url(&path));
        self.send(req, &path).await
    }

    pub async fn deactivate_workflow(&self, id: &str) -> Result<RawWorkflow, EngineError> {
        let path = format!("/workflows/{id}/deactivate");
        let req = self.http.post(self.url(&path));
        self.send(req, &path).await
    }

    pub async fn list_executions(
        &self,
        workflow_id: Option<&str>,
        status: Option<&str>,
    ) -> Result<Vec<ExecutionSummary>, EngineError> {
        let path = "/executions";
        let mut req = self.http.get(self.url(path));
        if let Some(w) = workflow_id {
            req = req.query(&[("workflowId", w)]);
        }
        if let Some(s) = status {
            req = req.query(&[("status", s)]);
        }
        self.send(req, path).await
    }

    pub async fn get_execution(&self, id: &str, include_data: bool) -> Result<ExecutionDetail, EngineError> {
        let path = format!("/executions/{id}");
        let mut req = self.http.get(self.url(&path));
        if include_data {
            req = req.query(&[("includeData", "true")]);
        }
        self.send(req, &path).await
    }

    pub async fn trigger_webhook(&self, webhook_path: &str, test: bool, payload: &Value) -> Result<Value, EngineError> {
        let prefix = if test { "/webhook-test" } else { "/webhook" };
        // Webhooks are not under /api/v1; hit the host root instead.
        let url = format!("{}{}/{}", self.base_url.trim_end_matches("/api/v1"), prefix, webhook_path.trim_start_matches('/'));
        let path = format!("{prefix}/{webhook_path}");
        log::debug!("engine request -> {}", path);
        let resp = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    EngineError::Timeout { path: path.clone(), timeout_ms: self.http_timeout_ms() }
                } else {
                    EngineError::Network { path: path.clone(), source }
                }
            })?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EngineError::Status { status: status.as_u16(), path, body });
        }
        resp.json::<Value>().await.map_err(|source| EngineError::Network { path, source })
    }
}
