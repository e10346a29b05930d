//! Batch driver: bounded worker pool over the pending subject list.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::checkpoint::{load_completed, load_subjects, CompletedLog, CompletedMarker};
use crate::config::BatchConfig;
use crate::error::BatchResult;
use vgen_media::{overlay_title_on_first_frame, prepend_cover, ThumbnailOptions};
use vgen_models::{TaskId, TermsInput, VideoParams};
use vgen_pipeline::{Pipeline, ScriptGenerator, StopAt};

/// Outcome of one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Subjects actually handed to the pipeline
    pub processed: usize,
    /// Subjects that produced at least one video
    pub succeeded: usize,
    /// Subjects skipped because they were already completed
    pub skipped: usize,
}

/// Runs the pipeline over every pending subject.
pub struct BatchDriver {
    config: BatchConfig,
    pipeline: Arc<Pipeline>,
    script_gen: Arc<dyn ScriptGenerator>,
    /// Per-subject params are cloned from this and filled with the
    /// subject, eager script and eager terms.
    template: VideoParams,
}

impl BatchDriver {
    pub fn new(
        config: BatchConfig,
        pipeline: Arc<Pipeline>,
        script_gen: Arc<dyn ScriptGenerator>,
        template: VideoParams,
    ) -> Self {
        Self {
            config,
            pipeline,
            script_gen,
            template,
        }
    }

    /// Process every subject not yet in the completed log.
    pub async fn run(&self) -> BatchResult<BatchSummary> {
        let subjects = load_subjects(&self.config.tasks_file).await?;
        if subjects.is_empty() {
            warn!("no subjects to process");
            return Ok(BatchSummary::default());
        }
        let completed = load_completed(&self.config.completed_file).await?;

        let total = subjects.len();
        let pending: Vec<(usize, String)> = subjects
            .into_iter()
            .enumerate()
            .map(|(i, s)| (i + 1, s))
            .filter(|(_, s)| !completed.contains(s))
            .collect();
        let skipped = total - pending.len();
        info!(
            pending = pending.len(),
            skipped, "starting batch video generation"
        );

        let log = CompletedLog::open(&self.config.completed_file).await?;
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers.max(1)));
        let mut workers = JoinSet::new();

        for (idx, subject) in pending {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let pipeline = Arc::clone(&self.pipeline);
            let script_gen = Arc::clone(&self.script_gen);
            let template = self.template.clone();
            let marker = log.marker();
            let pause = self.config.pause_after;

            workers.spawn(async move {
                let _permit = permit;
                let videos =
                    process_subject(pipeline, script_gen, template, &subject, idx, marker).await;
                tokio::time::sleep(pause).await;
                (subject, videos)
            });
        }

        let mut summary = BatchSummary {
            skipped,
            ..Default::default()
        };
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((subject, videos)) => {
                    summary.processed += 1;
                    if !videos.is_empty() {
                        summary.succeeded += 1;
                        if self.config.prepend_cover {
                            // Cover composition runs here in the main
                            // loop, not on the worker pool.
                            self.prepend_covers(&subject, &videos).await;
                        }
                    }
                }
                Err(e) => error!("batch worker panicked: {e}"),
            }
        }

        log.close().await;
        info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            "batch run finished"
        );
        Ok(summary)
    }

    async fn prepend_covers(&self, subject: &str, videos: &[PathBuf]) {
        for video in videos {
            let cover = match overlay_title_on_first_frame(
                video,
                subject,
                &ThumbnailOptions::default(),
            )
            .await
            {
                Ok(cover) => cover,
                Err(e) => {
                    warn!("cover frame for {} failed: {e}", video.display());
                    continue;
                }
            };
            match prepend_cover(video, &cover).await {
                Ok(out) => info!("cover prepended: {}", out.display()),
                Err(e) => warn!("cover prepend for {} failed: {e}", video.display()),
            }
        }
    }
}

/// Run one subject through the pipeline; returns its produced videos
/// (empty on any failure — the subject is then simply not completed).
async fn process_subject(
    pipeline: Arc<Pipeline>,
    script_gen: Arc<dyn ScriptGenerator>,
    template: VideoParams,
    subject: &str,
    idx: usize,
    marker: CompletedMarker,
) -> Vec<PathBuf> {
    info!("[{idx}] processing subject: {subject}");
    let task_id = TaskId::new();

    // Script and terms are generated eagerly so the params record is
    // complete before the orchestrator starts.
    let script = match script_gen
        .generate_script(subject, &template.video_language, template.paragraph_number)
        .await
    {
        Ok(script) => script,
        Err(e) => {
            error!("[{idx}] script generation failed for {subject}: {e:#}");
            return Vec::new();
        }
    };
    let terms = match script_gen.generate_terms(subject, &script, 5).await {
        Ok(terms) => terms,
        Err(e) => {
            error!("[{idx}] term generation failed for {subject}: {e:#}");
            return Vec::new();
        }
    };

    let mut params = template;
    params.video_subject = subject.to_string();
    params.video_script = script;
    params.video_terms = Some(TermsInput::Text(terms.join(", ")));

    match pipeline.run(&task_id, &params, StopAt::Video).await {
        Ok(result) => {
            let videos = result.videos.unwrap_or_default();
            if videos.is_empty() {
                error!("[{idx}] no videos produced for {subject}");
                return Vec::new();
            }
            for video in &videos {
                info!("[{idx}] completed: {}", video.display());
                if let Err(e) = marker.mark(subject).await {
                    error!("[{idx}] failed to record completion of {subject}: {e}");
                }
            }
            videos
        }
        Err(e) => {
            error!("[{idx}] video generation failed for {subject}: {e}");
            Vec::new()
        }
    }
}
