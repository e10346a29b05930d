//! End-to-end orchestrator tests against fake collaborators.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use vgen_models::{
    ConcatMode, SubtitleProvider, TaskId, TaskState, TermsInput, VideoAspect, VideoParams,
    VideoSource,
};
use vgen_pipeline::{
    Alignment, AlignmentSegment, Collaborators, CombineRequest, MaterialProvider, Pipeline,
    ScriptGenerator, SpeechRecognizer, SpeechSynthesizer, StopAt, TaskDirs, TaskStore,
    VideoComposer,
};

struct FakeLlm {
    script: String,
    terms: Vec<String>,
}

#[async_trait]
impl ScriptGenerator for FakeLlm {
    async fn generate_script(
        &self,
        _subject: &str,
        _language: &str,
        _paragraph_number: u32,
    ) -> anyhow::Result<String> {
        Ok(self.script.clone())
    }

    async fn generate_terms(
        &self,
        _subject: &str,
        _script: &str,
        _amount: usize,
    ) -> anyhow::Result<Vec<String>> {
        Ok(self.terms.clone())
    }
}

struct FakeVoice {
    /// Simulated narration length in seconds
    duration: f64,
    /// When set, synthesis returns no usable result
    fail: bool,
    /// Whether the alignment path produces a subtitle file
    subtitle_ok: bool,
}

const VALID_SRT: &str = "1\n00:00:00,000 --> 00:00:02,000\nline one\n\n2\n00:00:02,000 --> 00:00:04,000\nline two\n";

#[async_trait]
impl SpeechSynthesizer for FakeVoice {
    async fn synthesize(
        &self,
        text: &str,
        _voice_name: &str,
        _voice_rate: f32,
        output_path: &Path,
    ) -> anyhow::Result<Option<Alignment>> {
        if self.fail {
            return Ok(None);
        }
        tokio::fs::write(output_path, b"mp3").await?;
        Ok(Some(Alignment {
            segments: vec![AlignmentSegment {
                start: 0.0,
                end: self.duration,
                text: text.to_string(),
            }],
        }))
    }

    async fn write_subtitle(
        &self,
        _text: &str,
        _alignment: &Alignment,
        output_path: &Path,
    ) -> anyhow::Result<bool> {
        if !self.subtitle_ok {
            return Ok(false);
        }
        tokio::fs::write(output_path, VALID_SRT).await?;
        Ok(true)
    }
}

struct FakeRecognizer {
    /// Number of cues the transcription produces
    lines: usize,
}

#[async_trait]
impl SpeechRecognizer for FakeRecognizer {
    async fn transcribe(&self, _audio_path: &Path, subtitle_path: &Path) -> anyhow::Result<()> {
        let mut content = String::new();
        for i in 0..self.lines {
            content.push_str(&format!(
                "{}\n00:00:0{},000 --> 00:00:0{},000\nrecognized {}\n\n",
                i + 1,
                i,
                i + 1,
                i
            ));
        }
        tokio::fs::write(subtitle_path, content).await?;
        Ok(())
    }

    async fn correct(&self, _subtitle_path: &Path, _script: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

struct FakeMaterials;

#[async_trait]
impl MaterialProvider for FakeMaterials {
    async fn preprocess_local(
        &self,
        materials: &[String],
        _max_clip_duration: u64,
    ) -> anyhow::Result<Vec<PathBuf>> {
        Ok(materials
            .iter()
            .map(PathBuf::from)
            .filter(|p| p.exists())
            .collect())
    }

    async fn download(
        &self,
        _task_id: &TaskId,
        _search_terms: &[String],
        _source: VideoSource,
        _aspect: VideoAspect,
        _concat_mode: ConcatMode,
        _audio_duration: u64,
        _max_clip_duration: u64,
    ) -> anyhow::Result<Vec<PathBuf>> {
        Ok(vec![PathBuf::from("stock-1.mp4"), PathBuf::from("stock-2.mp4")])
    }
}

#[derive(Default)]
struct FakeComposer {
    combine_modes: Mutex<Vec<ConcatMode>>,
}

#[async_trait]
impl VideoComposer for FakeComposer {
    async fn combine(&self, request: CombineRequest) -> anyhow::Result<PathBuf> {
        self.combine_modes.lock().unwrap().push(request.concat_mode);
        tokio::fs::write(&request.output, b"combined").await?;
        Ok(request.output)
    }

    async fn render(
        &self,
        _combined_path: &Path,
        _audio_path: &Path,
        _subtitle_path: Option<&Path>,
        output_path: &Path,
        _params: &VideoParams,
    ) -> anyhow::Result<PathBuf> {
        tokio::fs::write(output_path, b"final").await?;
        Ok(output_path.to_path_buf())
    }
}

struct Harness {
    pipeline: Pipeline,
    composer: Arc<FakeComposer>,
    tmp: TempDir,
}

fn harness(llm: FakeLlm, voice: FakeVoice, recognizer: FakeRecognizer) -> Harness {
    let tmp = TempDir::new().unwrap();
    let composer = Arc::new(FakeComposer::default());
    let collab = Collaborators {
        script: Arc::new(llm),
        voice: Arc::new(voice),
        recognizer: Arc::new(recognizer),
        materials: Arc::new(FakeMaterials),
        composer: composer.clone(),
    };
    let pipeline = Pipeline::new(TaskStore::new(), TaskDirs::new(tmp.path()), collab);
    Harness {
        pipeline,
        composer,
        tmp,
    }
}

fn default_llm() -> FakeLlm {
    FakeLlm {
        script: "A short narration about money.".to_string(),
        terms: vec!["money".into(), "wealth".into()],
    }
}

fn default_voice() -> FakeVoice {
    FakeVoice {
        duration: 9.3,
        fail: false,
        subtitle_ok: true,
    }
}

#[tokio::test]
async fn stop_at_script_returns_only_script() {
    let h = harness(default_llm(), default_voice(), FakeRecognizer { lines: 2 });
    let id = TaskId::new();
    let params = VideoParams::new("money", "en-US-JennyNeural");

    let result = h.pipeline.run(&id, &params, StopAt::Script).await.unwrap();
    assert_eq!(result.script.as_deref(), Some("A short narration about money."));
    assert!(result.terms.is_none());
    assert!(result.audio_file.is_none());
    assert!(result.videos.is_none());

    let task = h.pipeline.store().get(&id).await.unwrap();
    assert_eq!(task.state, TaskState::Complete);
    assert_eq!(task.progress, 100);
}

#[tokio::test]
async fn script_error_marker_fails_the_task() {
    let llm = FakeLlm {
        script: "Error: upstream quota exhausted".to_string(),
        terms: vec![],
    };
    let h = harness(llm, default_voice(), FakeRecognizer { lines: 2 });
    let id = TaskId::new();
    let params = VideoParams::new("money", "en-US-JennyNeural");

    let err = h.pipeline.run(&id, &params, StopAt::Video).await.unwrap_err();
    assert_eq!(err.failed_stage(), Some("script"));

    let task = h.pipeline.store().get(&id).await.unwrap();
    assert_eq!(task.state, TaskState::Failed);
    // Failure fires before the post-script checkpoint
    assert_eq!(task.progress, 5);
    assert_eq!(task.result, Default::default());
}

#[tokio::test]
async fn supplied_terms_string_splits_on_both_comma_kinds() {
    let h = harness(default_llm(), default_voice(), FakeRecognizer { lines: 2 });
    let id = TaskId::new();
    let mut params = VideoParams::new("money", "en-US-JennyNeural");
    params.video_terms = Some(TermsInput::Text("money, wealth，saving ,budget".into()));

    let result = h.pipeline.run(&id, &params, StopAt::Terms).await.unwrap();
    assert_eq!(
        result.terms.as_deref(),
        Some(&["money".to_string(), "wealth".into(), "saving".into(), "budget".into()][..])
    );

    // script.json persisted alongside
    let script_file = h.tmp.path().join(id.as_str()).join("script.json");
    let data: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(script_file).unwrap()).unwrap();
    assert_eq!(data["search_terms"][2], "saving");
    assert_eq!(data["params"]["video_subject"], "money");
}

#[tokio::test]
async fn multi_variant_run_forces_random_concat() {
    let h = harness(default_llm(), default_voice(), FakeRecognizer { lines: 2 });
    let id = TaskId::new();

    let clip = h.tmp.path().join("clip.mp4");
    std::fs::write(&clip, b"clip").unwrap();

    let mut params = VideoParams::new("money matters", "en-US-JennyNeural");
    params.video_source = VideoSource::Local;
    params.video_materials = vec![clip.to_string_lossy().to_string()];
    params.video_concat_mode = ConcatMode::Sequential;
    params.video_count = 2;
    params.subtitle_enabled = false;

    let result = h.pipeline.run(&id, &params, StopAt::Video).await.unwrap();

    let modes = h.composer.combine_modes.lock().unwrap().clone();
    assert_eq!(modes, vec![ConcatMode::Random, ConcatMode::Random]);

    let videos = result.videos.unwrap();
    assert_eq!(videos.len(), 2);
    assert!(videos[0].ends_with("money_matters-1.mp4"));
    assert!(videos[1].ends_with("money_matters-2.mp4"));
    assert_eq!(result.combined_videos.unwrap().len(), 2);
}

#[tokio::test]
async fn local_source_full_run_completes_with_empty_terms() {
    let h = harness(default_llm(), default_voice(), FakeRecognizer { lines: 2 });
    let id = TaskId::new();

    let clip = h.tmp.path().join("material.mp4");
    std::fs::write(&clip, b"clip").unwrap();

    let mut params = VideoParams::new("金钱的作用", "zh-CN-XiaoyiNeural");
    params.video_source = VideoSource::Local;
    params.video_materials = vec![clip.to_string_lossy().to_string()];
    params.video_count = 1;

    let result = h.pipeline.run(&id, &params, StopAt::Video).await.unwrap();

    assert_eq!(result.videos.as_ref().unwrap().len(), 1);
    assert_eq!(result.materials.as_ref().unwrap().len(), 1);
    assert_eq!(result.terms.as_deref(), Some(&[][..]));
    // 9.3s of narration, ceiling-rounded
    assert_eq!(result.audio_duration, Some(10));
    assert!(result
        .subtitle_path
        .as_deref()
        .unwrap()
        .ends_with("subtitle.srt"));

    let task = h.pipeline.store().get(&id).await.unwrap();
    assert_eq!(task.state, TaskState::Complete);
    assert_eq!(task.progress, 100);
}

#[tokio::test]
async fn audio_failure_fails_at_last_checkpoint() {
    let voice = FakeVoice {
        duration: 0.0,
        fail: true,
        subtitle_ok: false,
    };
    let h = harness(default_llm(), voice, FakeRecognizer { lines: 2 });
    let id = TaskId::new();
    let params = VideoParams::new("money", "en-US-JennyNeural");

    let err = h.pipeline.run(&id, &params, StopAt::Video).await.unwrap_err();
    assert_eq!(err.failed_stage(), Some("audio"));

    let task = h.pipeline.store().get(&id).await.unwrap();
    assert_eq!(task.state, TaskState::Failed);
    // Audio begins after the terms checkpoint
    assert_eq!(task.progress, 20);
    assert!(task.result.audio_file.is_none());
}

#[tokio::test]
async fn whisper_zero_lines_is_soft_failure() {
    let voice = FakeVoice {
        duration: 3.0,
        fail: false,
        subtitle_ok: true,
    };
    let h = harness(default_llm(), voice, FakeRecognizer { lines: 0 });
    let id = TaskId::new();
    let mut params = VideoParams::new("money", "en-US-JennyNeural");
    params.subtitle_provider = SubtitleProvider::Whisper;

    let result = h.pipeline.run(&id, &params, StopAt::Subtitle).await.unwrap();
    assert_eq!(result.subtitle_path.as_deref(), Some(""));

    let task = h.pipeline.store().get(&id).await.unwrap();
    assert_eq!(task.state, TaskState::Complete);
    assert_eq!(task.progress, 100);
}

#[tokio::test]
async fn edge_provider_falls_back_to_recognition() {
    let voice = FakeVoice {
        duration: 3.0,
        fail: false,
        subtitle_ok: false,
    };
    let h = harness(default_llm(), voice, FakeRecognizer { lines: 2 });
    let id = TaskId::new();
    let params = VideoParams::new("money", "en-US-JennyNeural");

    let result = h.pipeline.run(&id, &params, StopAt::Subtitle).await.unwrap();
    assert!(result
        .subtitle_path
        .as_deref()
        .unwrap()
        .ends_with("subtitle.srt"));
}

#[tokio::test]
async fn stop_at_audio_returns_audio_fields_only() {
    let h = harness(default_llm(), default_voice(), FakeRecognizer { lines: 2 });
    let id = TaskId::new();
    let params = VideoParams::new("money", "en-US-JennyNeural");

    let result = h.pipeline.run(&id, &params, StopAt::Audio).await.unwrap();
    assert!(result.audio_file.as_ref().unwrap().ends_with("audio.mp3"));
    assert_eq!(result.audio_duration, Some(10));
    assert!(result.videos.is_none());
    assert!(result.materials.is_none());
}
