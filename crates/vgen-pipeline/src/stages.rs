//! Stage functions.
//!
//! Each stage wraps one collaborator call, validates its output, and on
//! failure marks the task FAILED in the store, logs an actionable hint
//! and returns a named [`StageFailure`]. The orchestrator stops at the
//! first failure.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::collaborators::Alignment;
use crate::error::StageFailure;
use crate::orchestrator::Pipeline;
use crate::subtitles::parse_srt_file;
use vgen_models::{SubtitleProvider, TaskId, TaskPatch, VideoParams};

const SCRIPT_HINT: &str = "check the text provider configuration and quota";
const AUDIO_HINT: &str = "check that the voice matches the script language, and that the network is reachable (a VPN may be required)";
const DOWNLOAD_HINT: &str = "the footage provider may be unreachable; check network/VPN";
const LOCAL_MATERIALS_HINT: &str = "no valid materials found, check the material files and try again";

impl Pipeline {
    /// Mark the task FAILED and log the reason with a hint for the
    /// operator. Returns the failure so callers can `return Err(...)` it.
    pub(crate) async fn fail_stage(
        &self,
        task_id: &TaskId,
        stage: &'static str,
        failure: StageFailure,
        hint: &str,
    ) -> StageFailure {
        error!(task_id = %task_id, stage, "stage failed: {}. {}", failure, hint);
        self.store.merge(task_id, TaskPatch::failed()).await;
        failure
    }

    /// Script stage: use the caller's script verbatim or generate one.
    pub(crate) async fn stage_script(
        &self,
        task_id: &TaskId,
        params: &VideoParams,
    ) -> Result<String, StageFailure> {
        info!(task_id = %task_id, "generating video script");

        let supplied = params.video_script.trim();
        let script = if supplied.is_empty() {
            match self
                .collab
                .script
                .generate_script(
                    &params.video_subject,
                    &params.video_language,
                    params.paragraph_number,
                )
                .await
            {
                Ok(script) => script.trim().to_string(),
                Err(e) => {
                    return Err(self.fail_stage(task_id, "script", e.into(), SCRIPT_HINT).await)
                }
            }
        } else {
            debug!(task_id = %task_id, "using caller-supplied script");
            supplied.to_string()
        };

        if script.is_empty() {
            return Err(self
                .fail_stage(task_id, "script", StageFailure::EmptyScript, SCRIPT_HINT)
                .await);
        }
        Ok(script)
    }

    /// Terms stage: parse caller-supplied terms or request five.
    ///
    /// The orchestrator skips this stage entirely for local sources.
    pub(crate) async fn stage_terms(
        &self,
        task_id: &TaskId,
        params: &VideoParams,
        script: &str,
    ) -> Result<Vec<String>, StageFailure> {
        info!(task_id = %task_id, "generating video terms");

        let terms = match &params.video_terms {
            Some(input) => {
                let terms = input.resolve();
                debug!(task_id = %task_id, ?terms, "using caller-supplied terms");
                terms
            }
            None => match self
                .collab
                .script
                .generate_terms(&params.video_subject, script, 5)
                .await
            {
                Ok(terms) => terms,
                Err(e) => {
                    return Err(self.fail_stage(task_id, "terms", e.into(), SCRIPT_HINT).await)
                }
            },
        };

        if terms.is_empty() {
            return Err(self
                .fail_stage(task_id, "terms", StageFailure::EmptyTerms, SCRIPT_HINT)
                .await);
        }
        Ok(terms)
    }

    /// Audio stage: synthesize narration and measure its duration.
    ///
    /// Duration is ceiling-rounded to whole seconds.
    pub(crate) async fn stage_audio(
        &self,
        task_id: &TaskId,
        params: &VideoParams,
        script: &str,
        task_dir: &Path,
    ) -> Result<(PathBuf, u64, Alignment), StageFailure> {
        info!(task_id = %task_id, "generating audio");

        let audio_file = task_dir.join("audio.mp3");
        let alignment = match self
            .collab
            .voice
            .synthesize(script, &params.voice_name, params.voice_rate, &audio_file)
            .await
        {
            Ok(Some(alignment)) => alignment,
            Ok(None) => {
                return Err(self
                    .fail_stage(task_id, "audio", StageFailure::SynthesisFailed, AUDIO_HINT)
                    .await)
            }
            Err(e) => return Err(self.fail_stage(task_id, "audio", e.into(), AUDIO_HINT).await),
        };

        let audio_duration = alignment.duration().ceil() as u64;
        Ok((audio_file, audio_duration, alignment))
    }

    /// Subtitle stage.
    ///
    /// Soft by design: every failure path degrades to "no subtitles"
    /// (empty string) instead of failing the task.
    pub(crate) async fn stage_subtitle(
        &self,
        task_id: &TaskId,
        params: &VideoParams,
        script: &str,
        alignment: &Alignment,
        audio_file: &Path,
        task_dir: &Path,
    ) -> String {
        if !params.subtitle_enabled {
            return String::new();
        }

        let subtitle_path = task_dir.join("subtitle.srt");
        let provider = params.subtitle_provider;
        info!(task_id = %task_id, ?provider, "generating subtitle");

        let mut use_recognition = provider == SubtitleProvider::Whisper;
        if provider == SubtitleProvider::Edge {
            match self
                .collab
                .voice
                .write_subtitle(script, alignment, &subtitle_path)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    warn!(task_id = %task_id, "alignment produced no subtitle, falling back to recognition");
                    use_recognition = true;
                }
                Err(e) => {
                    warn!(task_id = %task_id, "subtitle from alignment failed, falling back to recognition: {e:#}");
                    use_recognition = true;
                }
            }
        }

        if use_recognition {
            if let Err(e) = self
                .collab
                .recognizer
                .transcribe(audio_file, &subtitle_path)
                .await
            {
                warn!(task_id = %task_id, "subtitle transcription failed: {e:#}");
                return String::new();
            }
            info!(task_id = %task_id, "correcting subtitle");
            if let Err(e) = self.collab.recognizer.correct(&subtitle_path, script).await {
                warn!(task_id = %task_id, "subtitle correction failed: {e:#}");
            }
        }

        match parse_srt_file(&subtitle_path).await {
            Ok(lines) if !lines.is_empty() => subtitle_path.to_string_lossy().to_string(),
            Ok(_) => {
                warn!(task_id = %task_id, "subtitle file is invalid: {}", subtitle_path.display());
                String::new()
            }
            Err(e) => {
                warn!(task_id = %task_id, "failed to read subtitle file: {e}");
                String::new()
            }
        }
    }

    /// Materials stage: preprocess local clips or download stock footage.
    pub(crate) async fn stage_materials(
        &self,
        task_id: &TaskId,
        params: &VideoParams,
        terms: &[String],
        audio_duration: u64,
    ) -> Result<Vec<PathBuf>, StageFailure> {
        if params.video_source.is_local() {
            info!(task_id = %task_id, "preprocessing local materials");
            let materials = match self
                .collab
                .materials
                .preprocess_local(&params.video_materials, params.video_clip_duration)
                .await
            {
                Ok(materials) => materials,
                Err(e) => {
                    return Err(self
                        .fail_stage(task_id, "materials", e.into(), LOCAL_MATERIALS_HINT)
                        .await)
                }
            };
            if materials.is_empty() {
                return Err(self
                    .fail_stage(
                        task_id,
                        "materials",
                        StageFailure::NoMaterials,
                        LOCAL_MATERIALS_HINT,
                    )
                    .await);
            }
            return Ok(materials);
        }

        info!(task_id = %task_id, source = %params.video_source, "downloading videos");
        let downloaded = match self
            .collab
            .materials
            .download(
                task_id,
                terms,
                params.video_source,
                params.video_aspect,
                params.video_concat_mode,
                audio_duration * params.video_count as u64,
                params.video_clip_duration,
            )
            .await
        {
            Ok(clips) => clips,
            Err(e) => {
                return Err(self
                    .fail_stage(task_id, "materials", e.into(), DOWNLOAD_HINT)
                    .await)
            }
        };
        if downloaded.is_empty() {
            return Err(self
                .fail_stage(
                    task_id,
                    "materials",
                    StageFailure::DownloadFailed,
                    DOWNLOAD_HINT,
                )
                .await);
        }
        Ok(downloaded)
    }
}
