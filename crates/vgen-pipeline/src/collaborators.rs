//! Collaborator contracts.
//!
//! The pipeline consumes its external services (text generation, voice
//! synthesis, speech recognition, material acquisition, composition)
//! purely through these traits. Implementations are host-supplied and
//! assumed correct; their internals are out of scope here, so errors
//! cross the seam as `anyhow::Error`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use vgen_models::{ConcatMode, TaskId, TransitionMode, VideoAspect, VideoParams, VideoSource};

/// One timed text fragment of a synthesis alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentSegment {
    /// Start offset in seconds
    pub start: f64,
    /// End offset in seconds
    pub end: f64,
    pub text: String,
}

/// Timing data returned by speech synthesis, used for audio duration and
/// the default subtitle path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    pub segments: Vec<AlignmentSegment>,
}

impl Alignment {
    /// Total spoken duration in seconds (end of the last segment).
    pub fn duration(&self) -> f64 {
        self.segments.last().map(|s| s.end).unwrap_or(0.0)
    }
}

/// Text-generation collaborator (LLM).
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Generate a narration script for a subject.
    async fn generate_script(
        &self,
        subject: &str,
        language: &str,
        paragraph_number: u32,
    ) -> anyhow::Result<String>;

    /// Derive `amount` stock-footage search terms from subject and script.
    async fn generate_terms(
        &self,
        subject: &str,
        script: &str,
        amount: usize,
    ) -> anyhow::Result<Vec<String>>;
}

/// Voice collaborator: TTS synthesis with alignment output.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize narration to `output_path`.
    ///
    /// `Ok(None)` means synthesis produced no usable result, which fails
    /// the audio stage.
    async fn synthesize(
        &self,
        text: &str,
        voice_name: &str,
        voice_rate: f32,
        output_path: &Path,
    ) -> anyhow::Result<Option<Alignment>>;

    /// Write a subtitle file from the alignment.
    ///
    /// Returns whether a usable subtitle file was written; `Ok(false)`
    /// triggers the recognition fallback.
    async fn write_subtitle(
        &self,
        text: &str,
        alignment: &Alignment,
        output_path: &Path,
    ) -> anyhow::Result<bool>;
}

/// Speech-recognition collaborator for the subtitle fallback path.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe an audio file to a subtitle file.
    async fn transcribe(&self, audio_path: &Path, subtitle_path: &Path) -> anyhow::Result<()>;

    /// Reconcile recognized text against the original script.
    async fn correct(&self, subtitle_path: &Path, script: &str) -> anyhow::Result<()>;
}

/// Material collaborator: local preprocessing or stock-footage download.
#[async_trait]
pub trait MaterialProvider: Send + Sync {
    /// Validate caller-supplied materials against the per-clip cap and
    /// return their resolved paths.
    async fn preprocess_local(
        &self,
        materials: &[String],
        max_clip_duration: u64,
    ) -> anyhow::Result<Vec<PathBuf>>;

    /// Download enough footage to cover `audio_duration` seconds.
    #[allow(clippy::too_many_arguments)]
    async fn download(
        &self,
        task_id: &TaskId,
        search_terms: &[String],
        source: VideoSource,
        aspect: VideoAspect,
        concat_mode: ConcatMode,
        audio_duration: u64,
        max_clip_duration: u64,
    ) -> anyhow::Result<Vec<PathBuf>>;
}

/// Arguments for combining clips into one variant timeline.
#[derive(Debug, Clone)]
pub struct CombineRequest {
    pub clips: Vec<PathBuf>,
    pub audio_file: PathBuf,
    pub output: PathBuf,
    pub aspect: VideoAspect,
    pub concat_mode: ConcatMode,
    pub transition_mode: TransitionMode,
    /// Per-clip duration cap in seconds
    pub max_clip_duration: u64,
    pub threads: usize,
}

/// Composition collaborator: timeline assembly and final rendering.
#[async_trait]
pub trait VideoComposer: Send + Sync {
    /// Combine clips into a single timeline at least as long as the audio.
    async fn combine(&self, request: CombineRequest) -> anyhow::Result<PathBuf>;

    /// Mux the combined timeline with narration and subtitles into the
    /// final output, styled from the full parameter record.
    async fn render(
        &self,
        combined_path: &Path,
        audio_path: &Path,
        subtitle_path: Option<&Path>,
        output_path: &Path,
        params: &VideoParams,
    ) -> anyhow::Result<PathBuf>;
}

/// The full set of injected collaborator services.
#[derive(Clone)]
pub struct Collaborators {
    pub script: Arc<dyn ScriptGenerator>,
    pub voice: Arc<dyn SpeechSynthesizer>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub materials: Arc<dyn MaterialProvider>,
    pub composer: Arc<dyn VideoComposer>,
}
