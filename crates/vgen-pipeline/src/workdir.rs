//! Task working-directory resolver.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::PipelineResult;
use vgen_models::TaskId;

/// Maps task ids to per-task working directories.
#[derive(Debug, Clone)]
pub struct TaskDirs {
    root: PathBuf,
}

impl TaskDirs {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root from `VGEN_TASK_DIR`, defaulting to `storage/tasks`.
    pub fn from_env() -> Self {
        let root = std::env::var("VGEN_TASK_DIR").unwrap_or_else(|_| "storage/tasks".to_string());
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for one task's artifacts, created on first use.
    pub async fn resolve(&self, task_id: &TaskId) -> PipelineResult<PathBuf> {
        let dir = self.root.join(task_id.as_str());
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }
}
