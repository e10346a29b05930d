//! Batch driver configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Batch driver configuration.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Pending subject list, one per line
    pub tasks_file: PathBuf,
    /// Append-only completion log
    pub completed_file: PathBuf,
    /// Worker pool size; 1 runs subjects serially
    pub max_workers: usize,
    /// Pause after each subject to avoid bursting providers
    pub pause_after: Duration,
    /// Additionally prepend a title cover to every produced video
    pub prepend_cover: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            tasks_file: PathBuf::from("tasks.txt"),
            completed_file: PathBuf::from("completed.txt"),
            max_workers: 1,
            pause_after: Duration::from_secs(1),
            prepend_cover: false,
        }
    }
}

impl BatchConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tasks_file: std::env::var("VGEN_TASKS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.tasks_file),
            completed_file: std::env::var("VGEN_COMPLETED_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.completed_file),
            max_workers: std::env::var("VGEN_BATCH_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_workers),
            pause_after: Duration::from_secs(
                std::env::var("VGEN_BATCH_PAUSE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1),
            ),
            prepend_cover: std::env::var("VGEN_PREPEND_COVER")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.prepend_cover),
        }
    }
}
