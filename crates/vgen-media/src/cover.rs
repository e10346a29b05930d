//! Cover composition: prepend a full-frame cover image to a finished
//! video, or burn the title into its opening seconds.
//!
//! The prepend path joins the cover clip and the main video with the
//! concat demuxer in stream-copy mode, so the main video is never
//! re-encoded and the splice is lossless.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;
use crate::thumbnail::ThumbnailOptions;

/// Derive a sibling path with a suffix appended to the stem.
fn sibling(path: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());
    path.with_file_name(format!("{stem}{suffix}.{extension}"))
}

/// Burn `title` into the first `window_seconds` of `video_path`.
///
/// Re-encodes the video stream (the overlay requires it) and copies the
/// audio. Returns the titled sibling output.
pub async fn burn_title_into_opening(
    video_path: impl AsRef<Path>,
    title: &str,
    window_seconds: f64,
    opts: &ThumbnailOptions,
) -> MediaResult<PathBuf> {
    let video_path = video_path.as_ref();
    if !video_path.exists() {
        return Err(MediaError::FileNotFound(video_path.to_path_buf()));
    }

    let output = sibling(video_path, "-titled", "mp4");
    let filter = format!(
        "{}:enable='between(t,0,{:.2})'",
        crate::thumbnail::title_filter(title, opts),
        window_seconds
    );

    let cmd = FfmpegCommand::new(&output)
        .input(video_path)
        .video_filter(filter)
        .video_codec("libx264")
        .output_args(["-c:a", "copy"]);
    FfmpegRunner::new().run(&cmd).await?;

    Ok(output)
}

/// Prepend `cover_image` to `video_path` as a one-frame clip.
///
/// The cover clip is rendered to match the main video's geometry and
/// frame rate, then joined by raw stream concatenation. Operates purely
/// on the paths given: if the main video was deleted in the meantime the
/// probe reports `FileNotFound` and nothing is written.
pub async fn prepend_cover(
    video_path: impl AsRef<Path>,
    cover_image: impl AsRef<Path>,
) -> MediaResult<PathBuf> {
    let video_path = video_path.as_ref();
    let cover_image = cover_image.as_ref();
    if !cover_image.exists() {
        return Err(MediaError::FileNotFound(cover_image.to_path_buf()));
    }

    let info = probe_video(video_path).await?;
    let frame_duration = 1.0 / info.fps.max(1.0);
    let runner = FfmpegRunner::new();

    // Encode the image as a clip one frame long, matching the main video
    // so the stream-copy concat is valid.
    let cover_clip = sibling(video_path, "-cover-clip", "mp4");
    let scale = format!("scale={}:{}", info.width, info.height);
    let cmd = FfmpegCommand::new(&cover_clip)
        .input_with_args(["-loop", "1"], cover_image)
        .duration(frame_duration)
        .frame_rate(info.fps)
        .video_filter(scale)
        .video_codec("libx264")
        .output_args(["-pix_fmt", "yuv420p"]);
    runner.run(&cmd).await?;

    // Concat demuxer list; single quotes in paths are escaped per the
    // demuxer's quoting rules.
    let list_path = sibling(video_path, "-concat", "txt");
    let list = format!(
        "file '{}'\nfile '{}'\n",
        escape_concat_path(&cover_clip),
        escape_concat_path(video_path),
    );
    fs::write(&list_path, list).await?;

    let output = sibling(video_path, "-with-cover", "mp4");
    let cmd = FfmpegCommand::new(&output)
        .input_with_args(["-f", "concat", "-safe", "0"], &list_path)
        .copy_codecs();
    let result = runner.run(&cmd).await;

    // Scratch files are best-effort cleanup
    if let Err(e) = fs::remove_file(&list_path).await {
        debug!("failed to remove concat list {}: {}", list_path.display(), e);
    }
    if let Err(e) = fs::remove_file(&cover_clip).await {
        debug!("failed to remove cover clip {}: {}", cover_clip.display(), e);
    }

    result?;
    Ok(output)
}

/// Escape a path for the concat demuxer's single-quoted file directive.
fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "'\\''")
}
