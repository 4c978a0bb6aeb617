//! Project snapshots and where they are saved.
//!
//! Saving is fire-and-forget from the editor's point of view: a
//! [`PersistSink`] never reports failures back, it logs them. In-memory
//! editor state is never rolled back because a save failed.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use pagecraft_engine::Theme;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{PersistError, PersistResult};
use crate::page::Page;

/// Everything needed to restore an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub project_id: String,
    pub pages: Vec<Page>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectSnapshot {
    pub fn to_json(&self) -> PersistResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> PersistResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Key-value store of snapshots, keyed by project id.
pub trait ProjectStore: Send + Sync {
    fn load(&self, project_id: &str) -> PersistResult<ProjectSnapshot>;
    fn save(&self, snapshot: &ProjectSnapshot) -> PersistResult<()>;
}

/// Snapshots kept as JSON strings in memory.
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
    projects: DashMap<String, String>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

impl ProjectStore for MemoryProjectStore {
    fn load(&self, project_id: &str) -> PersistResult<ProjectSnapshot> {
        let json = self
            .projects
            .get(project_id)
            .ok_or_else(|| PersistError::NotFound {
                project_id: project_id.to_string(),
            })?;
        ProjectSnapshot::from_json(json.value())
    }

    fn save(&self, snapshot: &ProjectSnapshot) -> PersistResult<()> {
        let json = snapshot.to_json()?;
        self.projects.insert(snapshot.project_id.clone(), json);
        Ok(())
    }
}

/// One `<project id>.json` file per project under a root directory.
#[derive(Debug, Clone)]
pub struct FileProjectStore {
    root: PathBuf,
}

impl FileProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, project_id: &str) -> PersistResult<PathBuf> {
        let valid = !project_id.is_empty()
            && project_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PersistError::InvalidProjectId {
                project_id: project_id.to_string(),
            });
        }
        Ok(self.root.join(format!("{project_id}.json")))
    }
}

impl ProjectStore for FileProjectStore {
    fn load(&self, project_id: &str) -> PersistResult<ProjectSnapshot> {
        let path = self.path_for(project_id)?;
        if !path.exists() {
            return Err(PersistError::NotFound {
                project_id: project_id.to_string(),
            });
        }
        ProjectSnapshot::from_json(&fs::read_to_string(path)?)
    }

    fn save(&self, snapshot: &ProjectSnapshot) -> PersistResult<()> {
        let path = self.path_for(&snapshot.project_id)?;
        fs::create_dir_all(&self.root)?;
        // write-then-rename so a crash never leaves a truncated project
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, snapshot.to_json()?)?;
        fs::rename(&tmp, &path)?;
        debug!(project = %snapshot.project_id, path = %path.display(), "project saved");
        Ok(())
    }
}

/// Receives a snapshot after every editor mutation.
pub trait PersistSink: Send + Sync {
    fn schedule(&self, snapshot: ProjectSnapshot);
}

/// Saves inline on the caller's thread.
pub struct DirectPersist {
    store: Arc<dyn ProjectStore>,
}

impl DirectPersist {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }
}

impl PersistSink for DirectPersist {
    fn schedule(&self, snapshot: ProjectSnapshot) {
        if let Err(e) = self.store.save(&snapshot) {
            warn!(project = %snapshot.project_id, error = %e, "project save failed");
        }
    }
}

/// Hands snapshots to a worker task. Within a burst only the newest pending
/// snapshot of each project is written. Stores may block: every burst is
/// saved on tokio's blocking pool.
#[derive(Clone)]
pub struct BackgroundPersist {
    tx: mpsc::UnboundedSender<ProjectSnapshot>,
}

impl BackgroundPersist {
    /// Spawns the worker on the current tokio runtime. The worker exits once
    /// every sender has been dropped and the queue is drained.
    pub fn spawn(store: Arc<dyn ProjectStore>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<ProjectSnapshot>();
        let handle = tokio::spawn(async move {
            let mut saved = 0u64;
            while let Some(first) = rx.recv().await {
                let mut pending = BTreeMap::new();
                pending.insert(first.project_id.clone(), first);
                while let Ok(newer) = rx.try_recv() {
                    pending.insert(newer.project_id.clone(), newer);
                }
                let store = Arc::clone(&store);
                let burst = pending.into_values().collect::<Vec<_>>();
                match tokio::task::spawn_blocking(move || save_burst(store.as_ref(), burst)).await {
                    Ok(count) => saved += count,
                    Err(e) => warn!(error = %e, "background save task failed"),
                }
            }
            info!(saved, "persist worker stopped");
        });
        (Self { tx }, handle)
    }

    pub fn try_schedule(&self, snapshot: ProjectSnapshot) -> PersistResult<()> {
        self.tx.send(snapshot).map_err(|_| PersistError::WorkerStopped)
    }
}

fn save_burst(store: &dyn ProjectStore, burst: Vec<ProjectSnapshot>) -> u64 {
    let mut saved = 0;
    for snapshot in burst {
        match store.save(&snapshot) {
            Ok(()) => saved += 1,
            Err(e) => {
                warn!(project = %snapshot.project_id, error = %e, "background project save failed")
            }
        }
    }
    saved
}

impl PersistSink for BackgroundPersist {
    fn schedule(&self, snapshot: ProjectSnapshot) {
        if let Err(e) = self.try_schedule(snapshot) {
            warn!(error = %e, "project snapshot dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snapshot(id: &str) -> ProjectSnapshot {
        let now = Utc::now();
        ProjectSnapshot {
            project_id: id.to_string(),
            pages: vec![Page::new("Home", "home")],
            theme: Theme::default(),
            template_ref: Some("landing".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryProjectStore::new();
        assert!(matches!(store.load("p1"), Err(PersistError::NotFound { .. })));
        let saved = snapshot("p1");
        store.save(&saved).unwrap();
        assert_eq!(store.load("p1").unwrap(), saved);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn file_store_writes_one_file_per_project() {
        let root = std::env::temp_dir().join(format!("pagecraft-test-{}", uuid::Uuid::new_v4()));
        let store = FileProjectStore::new(&root);
        let saved = snapshot("site_1");
        store.save(&saved).unwrap();
        assert!(root.join("site_1.json").exists());
        assert_eq!(store.load("site_1").unwrap(), saved);
        assert!(matches!(
            store.save(&snapshot("../escape")),
            Err(PersistError::InvalidProjectId { .. })
        ));
        let _ = fs::remove_dir_all(root);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn background_worker_writes_files_off_the_runtime() {
        let root = std::env::temp_dir().join(format!("pagecraft-test-{}", uuid::Uuid::new_v4()));
        let store = Arc::new(FileProjectStore::new(&root));
        let (sink, handle) = BackgroundPersist::spawn(store.clone());
        sink.schedule(snapshot("site_a"));
        sink.schedule(snapshot("../bad"));
        drop(sink);
        handle.await.unwrap();
        assert!(store.load("site_a").is_ok());
        assert!(matches!(store.load("../bad"), Err(PersistError::InvalidProjectId { .. })));
        let _ = fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn background_worker_drains_before_stopping() {
        let store = Arc::new(MemoryProjectStore::new());
        let (sink, handle) = BackgroundPersist::spawn(store.clone());
        sink.schedule(snapshot("a"));
        sink.schedule(snapshot("b"));
        drop(sink);
        handle.await.unwrap();
        assert!(store.load("a").is_ok());
        assert!(store.load("b").is_ok());
    }
}
