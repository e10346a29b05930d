//! Thumbnail generation: first-frame extraction plus a centered title
//! overlay, wrapped at a fixed character count per line.

use std::path::{Path, PathBuf};
use tracing::warn;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use vgen_models::wrap_title;

/// Styling for the title overlay.
#[derive(Debug, Clone)]
pub struct ThumbnailOptions {
    /// Characters per line before wrapping
    pub max_chars_per_line: usize,
    pub font_size: u32,
    pub font_color: String,
    pub border_color: String,
    pub border_width: u32,
    pub line_spacing: u32,
    /// Font file; `None` uses the bundled fallback font
    pub font_file: Option<PathBuf>,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self {
            max_chars_per_line: 6,
            font_size: 160,
            font_color: "#FFFF66".to_string(),
            border_color: "black".to_string(),
            border_width: 10,
            line_spacing: 60,
            font_file: None,
        }
    }
}

/// Escape the characters drawtext treats specially.
pub(crate) fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

/// Resolve the fallback font shipped with the application.
fn fallback_font() -> PathBuf {
    let resource_dir =
        std::env::var("VGEN_RESOURCE_DIR").unwrap_or_else(|_| "resource".to_string());
    Path::new(&resource_dir)
        .join("fonts")
        .join("ZiHunBianTaoTi-2.ttf")
}

/// Build the drawtext filter for a centered, wrapped title.
pub(crate) fn title_filter(title: &str, opts: &ThumbnailOptions) -> String {
    let text = wrap_title(title, opts.max_chars_per_line).join("\n");
    let text = escape_drawtext(&text);
    let font_file = opts
        .font_file
        .clone()
        .unwrap_or_else(fallback_font)
        .to_string_lossy()
        .to_string();

    format!(
        "drawtext=fontfile='{}':text='{}':fontcolor={}:bordercolor={}:borderw={}:fontsize={}:x=(w-text_w)/2:y=(h-text_h)/2:line_spacing={}",
        font_file,
        text,
        opts.font_color,
        opts.border_color,
        opts.border_width,
        opts.font_size,
        opts.line_spacing,
    )
}

/// Extract the first frame of `video_path` and overlay `title` onto it.
///
/// Returns the thumbnail path. Frame extraction failure is an error;
/// overlay failure falls back to the plain extracted frame, since an
/// untitled thumbnail beats none.
pub async fn overlay_title_on_first_frame(
    video_path: impl AsRef<Path>,
    title: &str,
    opts: &ThumbnailOptions,
) -> MediaResult<PathBuf> {
    let video_path = video_path.as_ref();
    if !video_path.exists() {
        return Err(MediaError::FileNotFound(video_path.to_path_buf()));
    }

    let thumbnail_path = video_path.with_file_name(format!(
        "{}-thumbnail.jpg",
        video_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string())
    ));

    let runner = FfmpegRunner::new();

    let extract = FfmpegCommand::new(&thumbnail_path)
        .input(video_path)
        .single_frame();
    runner.run(&extract).await?;

    let overlay = FfmpegCommand::new(&thumbnail_path)
        .input(&thumbnail_path)
        .video_filter(title_filter(title, opts));
    if let Err(e) = runner.run(&overlay).await {
        warn!(
            video = %video_path.display(),
            "title overlay failed, keeping plain first frame: {}",
            e
        );
    }

    Ok(thumbnail_path)
}
