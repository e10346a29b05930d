//! Render stage: per-variant timeline assembly, final rendering and
//! thumbnail derivation.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::collaborators::CombineRequest;
use crate::error::StageFailure;
use crate::orchestrator::Pipeline;
use vgen_media::{overlay_title_on_first_frame, ThumbnailOptions};
use vgen_models::{sanitize_subject, TaskId, TaskPatch, VideoParams};

/// Output of the render stage: final videos, combined timelines,
/// thumbnails (one per variant that produced one).
pub(crate) struct RenderedVariants {
    pub videos: Vec<PathBuf>,
    pub combined: Vec<PathBuf>,
    pub thumbnails: Vec<PathBuf>,
}

const RENDER_HINT: &str = "check the composition service logs";

impl Pipeline {
    /// Render all requested variants.
    ///
    /// Progress advances twice per variant by `50 / N / 2`, taking the
    /// task from 50 to 100 evenly regardless of N.
    pub(crate) async fn render_variants(
        &self,
        task_id: &TaskId,
        params: &VideoParams,
        materials: &[PathBuf],
        audio_file: &Path,
        subtitle_path: &str,
        task_dir: &Path,
    ) -> Result<RenderedVariants, StageFailure> {
        let concat_mode = params.effective_concat_mode();
        let safe_subject = sanitize_subject(&params.video_subject);

        let mut videos = Vec::new();
        let mut combined_videos = Vec::new();
        let mut thumbnails = Vec::new();

        let mut progress = 50.0_f64;
        let step = 50.0 / params.video_count as f64 / 2.0;

        for idx in 1..=params.video_count {
            let combined_path = task_dir.join(format!("combined-{idx}.mp4"));
            info!(task_id = %task_id, variant = idx, "combining video => {}", combined_path.display());
            let combined = match self
                .collab
                .composer
                .combine(CombineRequest {
                    clips: materials.to_vec(),
                    audio_file: audio_file.to_path_buf(),
                    output: combined_path,
                    aspect: params.video_aspect,
                    concat_mode,
                    transition_mode: params.video_transition_mode,
                    max_clip_duration: params.video_clip_duration,
                    threads: params.n_threads,
                })
                .await
            {
                Ok(path) => path,
                Err(e) => {
                    return Err(self.fail_stage(task_id, "render", e.into(), RENDER_HINT).await)
                }
            };
            progress += step;
            self.store
                .merge(task_id, TaskPatch::new().progress(progress.round() as u8))
                .await;

            let final_path = task_dir.join(format!("{safe_subject}-{idx}.mp4"));
            info!(task_id = %task_id, variant = idx, "generating video => {}", final_path.display());
            let subtitle = if subtitle_path.is_empty() {
                None
            } else {
                Some(Path::new(subtitle_path))
            };
            let final_video = match self
                .collab
                .composer
                .render(&combined, audio_file, subtitle, &final_path, params)
                .await
            {
                Ok(path) => path,
                Err(e) => {
                    return Err(self.fail_stage(task_id, "render", e.into(), RENDER_HINT).await)
                }
            };
            progress += step;
            self.store
                .merge(task_id, TaskPatch::new().progress(progress.round() as u8))
                .await;

            // Thumbnail failure never fails the variant; the path is
            // simply omitted.
            match overlay_title_on_first_frame(
                &final_video,
                &params.video_subject,
                &ThumbnailOptions::default(),
            )
            .await
            {
                Ok(thumb) => thumbnails.push(thumb),
                Err(e) => {
                    warn!(task_id = %task_id, variant = idx, "thumbnail generation failed: {e}")
                }
            }

            videos.push(final_video);
            combined_videos.push(combined);
        }

        if videos.is_empty() {
            return Err(self
                .fail_stage(task_id, "render", StageFailure::RenderFailed, RENDER_HINT)
                .await);
        }

        Ok(RenderedVariants {
            videos,
            combined: combined_videos,
            thumbnails,
        })
    }
}
