//! Task identity, state and result records.
//!
//! A task is one run of the generation pipeline for a single subject.
//! Its record is owned by the task state store and mutated only through
//! merge patches produced by the orchestrator and the stage functions.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique task identifier.
///
/// Either caller-supplied or generated. A failed task is never resumed
/// under the same id; retries allocate a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh random task id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap a caller-supplied identifier.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Task processing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Task record exists but processing has not started
    #[default]
    Created,
    /// Pipeline is running
    Processing,
    /// Pipeline finished (including early stop-at exits)
    Complete,
    /// A stage failed; the record is frozen
    Failed,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Created => "created",
            TaskState::Processing => "processing",
            TaskState::Complete => "complete",
            TaskState::Failed => "failed",
        }
    }

    /// Terminal states accept no further mutation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Complete | TaskState::Failed)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result fields populated incrementally as stages complete.
///
/// All fields are optional: an early stop-at exit carries only the fields
/// relevant to the stage reached. `subtitle_path` distinguishes "no
/// subtitles produced" (empty string) from "stage not reached" (absent).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materials: Option<Vec<PathBuf>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<PathBuf>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_videos: Option<Vec<PathBuf>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Vec<PathBuf>>,
}

impl TaskResult {
    /// Overlay `patch` onto `self`: every `Some` field in the patch wins.
    pub fn merge(&mut self, patch: TaskResult) {
        macro_rules! take {
            ($field:ident) => {
                if patch.$field.is_some() {
                    self.$field = patch.$field;
                }
            };
        }
        take!(script);
        take!(terms);
        take!(audio_file);
        take!(audio_duration);
        take!(subtitle_path);
        take!(materials);
        take!(videos);
        take!(combined_videos);
        take!(thumbnails);
    }
}

/// One task's full record as held by the task state store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub state: TaskState,
    /// Progress percentage (0-100), non-decreasing while processing
    pub progress: u8,
    pub result: TaskResult,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: TaskId) -> Self {
        let now = Utc::now();
        Self {
            id,
            state: TaskState::Created,
            progress: 0,
            result: TaskResult::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Apply a patch to this record.
    ///
    /// Terminal records are frozen: the patch is dropped. Progress never
    /// moves backwards.
    pub fn apply(&mut self, patch: TaskPatch) {
        if self.is_terminal() {
            return;
        }
        if let Some(state) = patch.state {
            self.state = state;
        }
        if let Some(progress) = patch.progress {
            self.progress = self.progress.max(progress.min(100));
        }
        self.result.merge(patch.result);
        self.updated_at = Utc::now();
    }
}

/// Partial update merged into an existing task record.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub state: Option<TaskState>,
    pub progress: Option<u8>,
    pub result: TaskResult,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, state: TaskState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn result(mut self, result: TaskResult) -> Self {
        self.result = result;
        self
    }

    /// Shorthand for the failure transition.
    pub fn failed() -> Self {
        Self::new().state(TaskState::Failed)
    }

    /// Shorthand for a completion carrying (part of) a result.
    pub fn complete_with(result: TaskResult) -> Self {
        Self::new()
            .state(TaskState::Complete)
            .progress(100)
            .result(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_generation_is_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
        assert_eq!(TaskId::from("abc").as_str(), "abc");
    }

    #[test]
    fn test_state_terminality() {
        assert!(!TaskState::Created.is_terminal());
        assert!(!TaskState::Processing.is_terminal());
        assert!(TaskState::Complete.is_terminal());
        assert!(TaskState::Failed.is_terminal());
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut task = Task::new(TaskId::new());
        task.apply(TaskPatch::new().state(TaskState::Processing).progress(30));
        assert_eq!(task.progress, 30);

        // A lower value must not move progress backwards
        task.apply(TaskPatch::new().progress(10));
        assert_eq!(task.progress, 30);

        task.apply(TaskPatch::new().progress(120));
        assert_eq!(task.progress, 100);
    }

    #[test]
    fn test_terminal_records_are_frozen() {
        let mut task = Task::new(TaskId::new());
        task.apply(TaskPatch::failed());
        assert_eq!(task.state, TaskState::Failed);

        let mut patch_result = TaskResult::default();
        patch_result.script = Some("late".into());
        task.apply(TaskPatch::new().progress(99).result(patch_result));
        assert_eq!(task.progress, 0);
        assert_eq!(task.result.script, None);
    }

    #[test]
    fn test_result_merge_overlays_some_fields() {
        let mut result = TaskResult {
            script: Some("original".into()),
            ..Default::default()
        };
        result.merge(TaskResult {
            terms: Some(vec!["money".into()]),
            ..Default::default()
        });
        assert_eq!(result.script.as_deref(), Some("original"));
        assert_eq!(result.terms, Some(vec!["money".to_string()]));

        result.merge(TaskResult {
            script: Some("replaced".into()),
            ..Default::default()
        });
        assert_eq!(result.script.as_deref(), Some("replaced"));
    }

    #[test]
    fn test_result_serde_skips_absent_fields() {
        let result = TaskResult {
            script: Some("hello".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("script"));
        assert!(!json.contains("audio_file"));
    }
}
