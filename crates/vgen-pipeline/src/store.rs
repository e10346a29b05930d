//! Task state store.
//!
//! An explicit, injected service rather than process-wide state: a keyed
//! map of task records behind a lock. Stages within one task run
//! sequentially, so per-record updates reduce to last-write-wins; the
//! lock only guards the map against concurrent batch workers touching
//! different tasks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use vgen_models::{Task, TaskId, TaskPatch};

/// Concurrency-safe keyed store of task records.
#[derive(Clone, Default)]
pub struct TaskStore {
    inner: Arc<RwLock<HashMap<String, Task>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh record for `id`, replacing any previous one.
    pub async fn create(&self, id: &TaskId) -> Task {
        let task = Task::new(id.clone());
        self.inner
            .write()
            .await
            .insert(id.as_str().to_string(), task.clone());
        task
    }

    /// Merge a partial update into the record for `id`.
    ///
    /// Unknown ids are ignored (the orchestrator always creates first);
    /// terminal records are frozen by [`Task::apply`].
    pub async fn merge(&self, id: &TaskId, patch: TaskPatch) {
        let mut map = self.inner.write().await;
        match map.get_mut(id.as_str()) {
            Some(task) => task.apply(patch),
            None => debug!(task_id = %id, "merge for unknown task ignored"),
        }
    }

    /// Snapshot the record for `id`.
    pub async fn get(&self, id: &TaskId) -> Option<Task> {
        self.inner.read().await.get(id.as_str()).cloned()
    }
}
