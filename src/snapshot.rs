// src/snapshot.rs
//
// Filesystem-backed snapshot store (spec §4.8). One directory per workflow
// under a configurable root, an `_index.json` newest-first metadata array,
// and one `<snapshotId>.json` per snapshot holding the full raw workflow.
// Grounded on unifiedlab::eventlog's append-then-prune directory layout.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::model::{RawWorkflow, Snapshot, SnapshotMeta, SnapshotTrigger};

const MAX_SNAPSHOTS_PER_WORKFLOW: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("no snapshots recorded for workflow {0:?}")]
    NoSnapshots(String),

    #[error("snapshot {snapshot_id:?} not found for workflow {workflow_id:?}")]
    NotFound { workflow_id: String, snapshot_id: String },
}

pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: PathBuf) -> Self {
        SnapshotStore { root }
    }

    fn workflow_dir(&self, workflow_id: &str) -> PathBuf {
        self.root.join(workflow_id)
    }

    fn index_path(&self, workflow_id: &str) -> PathBuf {
        self.workflow_dir(workflow_id).join("_index.json")
    }

    fn snapshot_path(&self, workflow_id: &str, snapshot_id: &str) -> PathBuf {
        self.workflow_dir(workflow_id).join(format!("{snapshot_id}.json"))
    }

    fn read_index(&self, workflow_id: &str) -> Result<Vec<SnapshotMeta>, SnapshotError> {
        let path = self.index_path(workflow_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_index(&self, workflow_id: &str, index: &[SnapshotMeta]) -> Result<(), SnapshotError> {
        let path = self.index_path(workflow_id);
        let raw = serde_json::to_string_pretty(index)?;
        fs::write(path, raw)?;
        Ok(())
    }

    pub fn save_snapshot(
        &self,
        workflow: &RawWorkflow,
        trigger: SnapshotTrigger,
        description: impl Into<String>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<SnapshotMeta, SnapshotError> {
        let dir = self.workflow_dir(&workflow.id);
        fs::create_dir_all(&dir)?;

        let timestamp = now.to_rfc3339();
        let id = snapshot_id(&workflow.id, &timestamp, workflow);

        let meta = SnapshotMeta {
            id: id.clone(),
            workflow_id: workflow.id.clone(),
            workflow_name: workflow.name.clone(),
            timestamp,
            trigger,
            description: description.into(),
        };

        let snapshot = Snapshot { meta: meta.clone(), workflow: workflow.clone() };
        let raw = serde_json::to_string_pretty(&snapshot)?;
        fs::write(self.snapshot_path(&workflow.id, &id), raw)?;

        let mut index = self.read_index(&workflow.id)?;
        index.insert(0, meta.clone());
        self.prune(&workflow.id, &mut index)?;
        self.write_index(&workflow.id, &index)?;

        Ok(meta)
    }

    pub fn list_snapshots(&self, workflow_id: &str) -> Result<Vec<SnapshotMeta>, SnapshotError> {
        self.read_index(workflow_id)
    }

    pub fn get_snapshot(&self, workflow_id: &str, snapshot_id: &str) -> Result<Snapshot, SnapshotError> {
        let path = self.snapshot_path(workflow_id, snapshot_id);
        if !path.exists() {
            return Err(SnapshotError::NotFound { workflow_id: workflow_id.to_string(), snapshot_id: snapshot_id.to_string() });
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn latest_snapshot(&self, workflow_id: &str) -> Result<Snapshot, SnapshotError> {
        let index = self.read_index(workflow_id)?;
        let latest = index.first().ok_or_else(|| SnapshotError::NoSnapshots(workflow_id.to_string()))?;
        self.get_snapshot(workflow_id, &latest.id)
    }

    fn prune(&self, workflow_id: &str, index: &mut Vec<SnapshotMeta>) -> Result<(), SnapshotError> {
        while index.len() > MAX_SNAPSHOTS_PER_WORKFLOW {
            if let Some(evicted) = index.pop() {
                let path = self.snapshot_path(workflow_id, &evicted.id);
                if path.exists() {
                    fs::remove_file(path)?;
                }
            }
        }
        Ok(())
    }
}

fn snapshot_id(workflow_id: &str, timestamp: &str, workflow: &RawWorkflow) -> String {
    let mut hasher = Sha256::new();
    hasher.update(workflow_id.as_bytes());
    hasher.update(timestamp.as_bytes());
    if let Ok(body) = serde_json::to_vec(workflow) {
        hasher.update(&body);
    }
    let digest = hasher.finalize();
    format!("snap_{}", hex::encode(&digest)[..16].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_workflow(id: &str) -> RawWorkflow {
        RawWorkflow {
            id: id.to_string(),
            name: "Demo".to_string(),
            active: false,
            nodes: Vec::new(),
            connections: Default::default(),
            settings: None,
            tags: Vec::new(),
            version_id: None,
            created_at: None,
            updated_at: None,
            extra: Default::default(),
        }
    }

    #[test]
    fn save_then_list_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().to_path_buf());
        let wf = sample_workflow("wf1");
        let now = chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let meta = store.save_snapshot(&wf, SnapshotTrigger::PreUpdateWorkflow, "before update", now).unwrap();

        let list = store.list_snapshots("wf1").unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, meta.id);

        let snap = store.get_snapshot("wf1", &meta.id).unwrap();
        assert_eq!(snap.workflow.id, "wf1");
    }

    #[test]
    fn prunes_to_twenty_newest() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().to_path_buf());
        let wf = sample_workflow("wf1");
        for i in 0..25 {
            let now = chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, i).unwrap();
            store.save_snapshot(&wf, SnapshotTrigger::Manual, format!("snap {i}"), now).unwrap();
        }
        let list = store.list_snapshots("wf1").unwrap();
        assert_eq!(list.len(), MAX_SNAPSHOTS_PER_WORKFLOW);
    }

    #[test]
    fn unknown_snapshot_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().to_path_buf());
        let wf = sample_workflow("wf1");
        let now = chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        store.save_snapshot(&wf, SnapshotTrigger::Manual, "first", now).unwrap();
        let err = store.get_snapshot("wf1", "snap_doesnotexist").unwrap_err();
        assert!(matches!(err, SnapshotError::NotFound { .. }));
    }
}
