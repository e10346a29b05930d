//! Batch driver demo with stub collaborators.
//!
//! Reads `tasks.txt` / `completed.txt` from the current directory (or the
//! `VGEN_*` overrides) and runs every pending subject through the pipeline
//! with canned script, voice and material services. Useful for exercising
//! the checkpointing and worker-pool behavior without any real providers.
//!
//! Run with: `cargo run --example batch_demo`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vgen_batch::{BatchConfig, BatchDriver};
use vgen_models::{ConcatMode, TaskId, VideoAspect, VideoParams, VideoSource};
use vgen_pipeline::{
    Alignment, AlignmentSegment, Collaborators, CombineRequest, MaterialProvider, Pipeline,
    ScriptGenerator, SpeechRecognizer, SpeechSynthesizer, TaskDirs, TaskStore, VideoComposer,
};

struct StubLlm;

#[async_trait]
impl ScriptGenerator for StubLlm {
    async fn generate_script(
        &self,
        subject: &str,
        _language: &str,
        paragraph_number: u32,
    ) -> anyhow::Result<String> {
        Ok(std::iter::repeat(format!("A short paragraph about {subject}."))
            .take(paragraph_number.max(1) as usize)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    async fn generate_terms(
        &self,
        subject: &str,
        _script: &str,
        amount: usize,
    ) -> anyhow::Result<Vec<String>> {
        Ok((1..=amount).map(|i| format!("{subject} {i}")).collect())
    }
}

struct StubVoice;

#[async_trait]
impl SpeechSynthesizer for StubVoice {
    async fn synthesize(
        &self,
        text: &str,
        _voice_name: &str,
        _voice_rate: f32,
        output_path: &Path,
    ) -> anyhow::Result<Option<Alignment>> {
        tokio::fs::write(output_path, b"demo audio").await?;
        Ok(Some(Alignment {
            segments: vec![AlignmentSegment {
                start: 0.0,
                end: 8.0,
                text: text.to_string(),
            }],
        }))
    }

    async fn write_subtitle(
        &self,
        text: &str,
        alignment: &Alignment,
        output_path: &Path,
    ) -> anyhow::Result<bool> {
        let end = alignment.duration();
        let srt = format!("1\n00:00:00,000 --> 00:00:{:02},000\n{text}\n", end as u64);
        tokio::fs::write(output_path, srt).await?;
        Ok(true)
    }
}

struct StubRecognizer;

#[async_trait]
impl SpeechRecognizer for StubRecognizer {
    async fn transcribe(&self, _audio_path: &Path, subtitle_path: &Path) -> anyhow::Result<()> {
        tokio::fs::write(subtitle_path, "1\n00:00:00,000 --> 00:00:08,000\ndemo\n").await?;
        Ok(())
    }

    async fn correct(&self, _subtitle_path: &Path, _script: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

struct StubMaterials;

#[async_trait]
impl MaterialProvider for StubMaterials {
    async fn preprocess_local(
        &self,
        materials: &[String],
        _max_clip_duration: u64,
    ) -> anyhow::Result<Vec<PathBuf>> {
        Ok(materials.iter().map(PathBuf::from).collect())
    }

    async fn download(
        &self,
        task_id: &TaskId,
        search_terms: &[String],
        _source: VideoSource,
        _aspect: VideoAspect,
        _concat_mode: ConcatMode,
        _audio_duration: u64,
        _max_clip_duration: u64,
    ) -> anyhow::Result<Vec<PathBuf>> {
        info!(task_id = %task_id, terms = ?search_terms, "stub download");
        Ok(vec![PathBuf::from("stub-clip.mp4")])
    }
}

struct StubComposer;

#[async_trait]
impl VideoComposer for StubComposer {
    async fn combine(&self, request: CombineRequest) -> anyhow::Result<PathBuf> {
        tokio::fs::write(&request.output, b"demo combined").await?;
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
        tokio::fs::write(output_path, b"demo final").await?;
        Ok(output_path.to_path_buf())
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);
    let env_filter = EnvFilter::from_default_env()
        .add_directive("vgen=info".parse().unwrap());
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }

    let collab = Collaborators {
        script: Arc::new(StubLlm),
        voice: Arc::new(StubVoice),
        recognizer: Arc::new(StubRecognizer),
        materials: Arc::new(StubMaterials),
        composer: Arc::new(StubComposer),
    };
    let pipeline = Arc::new(Pipeline::new(
        TaskStore::new(),
        TaskDirs::from_env(),
        collab,
    ));

    let template = VideoParams::new("", "zh-CN-XiaoxiaoNeural");
    let driver = BatchDriver::new(BatchConfig::from_env(), pipeline, Arc::new(StubLlm), template);

    match driver.run().await {
        Ok(summary) => info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            "batch demo finished"
        ),
        Err(e) => {
            error!("batch demo failed: {e}");
            std::process::exit(1);
        }
    }
}
