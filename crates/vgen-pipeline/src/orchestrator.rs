//! Pipeline orchestrator state machine.
//!
//! Runs the stages in fixed dependency order, checkpoints progress in
//! the task store, honors early `stop_at` exits with partial results,
//! and fails the task the moment any stage reports no usable output.

use std::path::Path;
use std::str::FromStr;

use serde_json::json;
use tokio::fs;
use tracing::info;

use crate::collaborators::Collaborators;
use crate::error::{PipelineError, PipelineResult, StageFailure};
use crate::store::TaskStore;
use crate::workdir::TaskDirs;
use vgen_models::{TaskId, TaskPatch, TaskResult, TaskState, VideoParams};

/// Stage name at which the orchestrator halts early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopAt {
    Script,
    Terms,
    Audio,
    Subtitle,
    Materials,
    /// Full run
    #[default]
    Video,
}

impl StopAt {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopAt::Script => "script",
            StopAt::Terms => "terms",
            StopAt::Audio => "audio",
            StopAt::Subtitle => "subtitle",
            StopAt::Materials => "materials",
            StopAt::Video => "video",
        }
    }
}

impl std::fmt::Display for StopAt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StopAt {
    type Err = std::convert::Infallible;

    /// Unrecognized values behave as a full run.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "script" => StopAt::Script,
            "terms" => StopAt::Terms,
            "audio" => StopAt::Audio,
            "subtitle" => StopAt::Subtitle,
            "materials" => StopAt::Materials,
            _ => StopAt::Video,
        })
    }
}

/// The pipeline orchestrator.
pub struct Pipeline {
    pub(crate) store: TaskStore,
    pub(crate) dirs: TaskDirs,
    pub(crate) collab: Collaborators,
}

impl Pipeline {
    pub fn new(store: TaskStore, dirs: TaskDirs, collab: Collaborators) -> Self {
        Self {
            store,
            dirs,
            collab,
        }
    }

    /// The injected task state store.
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    async fn checkpoint(&self, task_id: &TaskId, progress: u8) {
        self.store
            .merge(
                task_id,
                TaskPatch::new()
                    .state(TaskState::Processing)
                    .progress(progress),
            )
            .await;
    }

    async fn complete(&self, task_id: &TaskId, result: TaskResult) -> TaskResult {
        self.store
            .merge(task_id, TaskPatch::complete_with(result.clone()))
            .await;
        result
    }

    /// Run the pipeline for one task.
    ///
    /// Returns the (possibly partial) result record on success. A failed
    /// stage returns `Err`, never an empty result: callers can always
    /// tell failure apart from success with empty fields.
    pub async fn run(
        &self,
        task_id: &TaskId,
        params: &VideoParams,
        stop_at: StopAt,
    ) -> PipelineResult<TaskResult> {
        info!(task_id = %task_id, stop_at = %stop_at, "starting task");
        self.store.create(task_id).await;
        self.checkpoint(task_id, 5).await;
        let task_dir = self.dirs.resolve(task_id).await?;

        // 1. Script
        let script = self
            .stage_script(task_id, params)
            .await
            .map_err(|f| PipelineError::stage("script", f))?;
        if script.contains("Error:") {
            // The provider reported failure inside an otherwise
            // successful response body.
            let failure = self
                .fail_stage(
                    task_id,
                    "script",
                    StageFailure::ScriptErrorMarker,
                    "the text provider returned an error payload",
                )
                .await;
            return Err(PipelineError::stage("script", failure));
        }
        self.checkpoint(task_id, 10).await;
        if stop_at == StopAt::Script {
            let result = TaskResult {
                script: Some(script),
                ..Default::default()
            };
            return Ok(self.complete(task_id, result).await);
        }

        // 2. Terms (skipped for local sources)
        let terms = if params.video_source.is_local() {
            Vec::new()
        } else {
            self.stage_terms(task_id, params, &script)
                .await
                .map_err(|f| PipelineError::stage("terms", f))?
        };
        self.save_script_data(&task_dir, &script, &terms, params)
            .await?;
        if stop_at == StopAt::Terms {
            let result = TaskResult {
                script: Some(script),
                terms: Some(terms),
                ..Default::default()
            };
            return Ok(self.complete(task_id, result).await);
        }
        self.checkpoint(task_id, 20).await;

        // 3. Audio
        let (audio_file, audio_duration, alignment) = self
            .stage_audio(task_id, params, &script, &task_dir)
            .await
            .map_err(|f| PipelineError::stage("audio", f))?;
        self.checkpoint(task_id, 30).await;
        if stop_at == StopAt::Audio {
            let result = TaskResult {
                audio_file: Some(audio_file),
                audio_duration: Some(audio_duration),
                ..Default::default()
            };
            return Ok(self.complete(task_id, result).await);
        }

        // 4. Subtitle (soft: an empty path means "no subtitles")
        let subtitle_path = self
            .stage_subtitle(task_id, params, &script, &alignment, &audio_file, &task_dir)
            .await;
        if stop_at == StopAt::Subtitle {
            let result = TaskResult {
                subtitle_path: Some(subtitle_path),
                ..Default::default()
            };
            return Ok(self.complete(task_id, result).await);
        }
        self.checkpoint(task_id, 40).await;

        // 5. Materials
        let materials = self
            .stage_materials(task_id, params, &terms, audio_duration)
            .await
            .map_err(|f| PipelineError::stage("materials", f))?;
        if stop_at == StopAt::Materials {
            let result = TaskResult {
                materials: Some(materials),
                ..Default::default()
            };
            return Ok(self.complete(task_id, result).await);
        }
        self.checkpoint(task_id, 50).await;

        // 6. Render all variants and derive thumbnails
        let rendered = self
            .render_variants(
                task_id,
                params,
                &materials,
                &audio_file,
                &subtitle_path,
                &task_dir,
            )
            .await
            .map_err(|f| PipelineError::stage("render", f))?;

        info!(
            task_id = %task_id,
            videos = rendered.videos.len(),
            "task finished"
        );

        let result = TaskResult {
            videos: Some(rendered.videos),
            combined_videos: Some(rendered.combined),
            thumbnails: Some(rendered.thumbnails),
            script: Some(script),
            terms: Some(terms),
            audio_file: Some(audio_file),
            audio_duration: Some(audio_duration),
            subtitle_path: Some(subtitle_path),
            materials: Some(materials),
        };
        Ok(self.complete(task_id, result).await)
    }

    /// Persist `script.json` (script, search terms, full params) into the
    /// task directory.
    async fn save_script_data(
        &self,
        task_dir: &Path,
        script: &str,
        terms: &[String],
        params: &VideoParams,
    ) -> PipelineResult<()> {
        let data = json!({
            "script": script,
            "search_terms": terms,
            "params": params,
        });
        let path = task_dir.join("script.json");
        fs::write(&path, serde_json::to_string_pretty(&data)?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_at_parsing() {
        assert_eq!("script".parse::<StopAt>().unwrap(), StopAt::Script);
        assert_eq!("materials".parse::<StopAt>().unwrap(), StopAt::Materials);
        assert_eq!("video".parse::<StopAt>().unwrap(), StopAt::Video);
        // Unrecognized values behave as a full run
        assert_eq!("bogus".parse::<StopAt>().unwrap(), StopAt::Video);
        assert_eq!("".parse::<StopAt>().unwrap(), StopAt::Video);
    }

    #[test]
    fn test_stop_at_round_trip() {
        for stop in [
            StopAt::Script,
            StopAt::Terms,
            StopAt::Audio,
            StopAt::Subtitle,
            StopAt::Materials,
            StopAt::Video,
        ] {
            assert_eq!(stop.as_str().parse::<StopAt>().unwrap(), stop);
        }
    }
}
