//! Pipeline parameters and mode enumerations.
//!
//! `VideoParams` is assembled once per task and treated as immutable by
//! the pipeline; the only normalization applied after construction is the
//! forced-random concatenation mode for multi-variant runs, exposed via
//! [`VideoParams::effective_concat_mode`].

use serde::{Deserialize, Serialize};
use tracing::info;

/// Where source clips come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoSource {
    /// Caller-supplied local material files
    Local,
    #[default]
    Pexels,
    Pixabay,
}

impl VideoSource {
    /// Local material selection does not depend on search terms.
    pub fn is_local(&self) -> bool {
        matches!(self, VideoSource::Local)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoSource::Local => "local",
            VideoSource::Pexels => "pexels",
            VideoSource::Pixabay => "pixabay",
        }
    }
}

impl std::fmt::Display for VideoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Clip ordering when building a variant's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConcatMode {
    #[default]
    Sequential,
    Random,
}

/// Transition applied between consecutive clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionMode {
    #[default]
    None,
    Shuffle,
    FadeIn,
    FadeOut,
    SlideIn,
    SlideOut,
}

/// Target output aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoAspect {
    #[default]
    Portrait,
    Landscape,
    Square,
}

impl VideoAspect {
    /// Output frame dimensions in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            VideoAspect::Portrait => (1080, 1920),
            VideoAspect::Landscape => (1920, 1080),
            VideoAspect::Square => (1080, 1080),
        }
    }
}

/// Which path produces the subtitle file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleProvider {
    /// TTS alignment output, with automatic fallback to recognition
    #[default]
    Edge,
    /// Speech recognition over the rendered audio, plus correction
    Whisper,
}

/// Search terms as supplied by the caller.
///
/// Untagged so a config file can hold either a comma-separated string or
/// a prebuilt list; any other shape is rejected at deserialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TermsInput {
    Text(String),
    List(Vec<String>),
}

impl TermsInput {
    /// Resolve to an ordered term list: split `Text` on `,` / `，`, trim
    /// every entry, drop empties.
    pub fn resolve(&self) -> Vec<String> {
        match self {
            TermsInput::Text(s) => s
                .split(|c| c == ',' || c == '，')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
            TermsInput::List(items) => items
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

/// Full parameter record for one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoParams {
    pub video_subject: String,
    /// Pre-supplied script; empty means "generate one"
    #[serde(default)]
    pub video_script: String,
    /// Pre-supplied search terms; absent means "generate five"
    #[serde(default)]
    pub video_terms: Option<TermsInput>,
    #[serde(default)]
    pub video_language: String,
    #[serde(default = "default_paragraph_number")]
    pub paragraph_number: u32,

    pub voice_name: String,
    #[serde(default = "default_voice_rate")]
    pub voice_rate: f32,
    #[serde(default = "default_voice_volume")]
    pub voice_volume: f32,

    #[serde(default = "default_true")]
    pub subtitle_enabled: bool,
    #[serde(default)]
    pub subtitle_provider: SubtitleProvider,

    #[serde(default)]
    pub video_source: VideoSource,
    /// Local material references, used only when `video_source` is local
    #[serde(default)]
    pub video_materials: Vec<String>,
    #[serde(default)]
    pub video_concat_mode: ConcatMode,
    #[serde(default)]
    pub video_transition_mode: TransitionMode,
    #[serde(default)]
    pub video_aspect: VideoAspect,
    /// Per-clip duration cap in seconds
    #[serde(default = "default_clip_duration")]
    pub video_clip_duration: u64,
    /// Number of output variants
    #[serde(default = "default_video_count")]
    pub video_count: u32,
    #[serde(default = "default_n_threads")]
    pub n_threads: usize,

    // Subtitle styling, consumed by the composer
    #[serde(default)]
    pub font_name: String,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default = "default_fore_color")]
    pub text_fore_color: String,
    #[serde(default = "default_stroke_color")]
    pub stroke_color: String,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,
    #[serde(default = "default_subtitle_position")]
    pub subtitle_position: String,

    // Background music, passed opaquely to the composer
    #[serde(default)]
    pub bgm_type: String,
    #[serde(default = "default_bgm_volume")]
    pub bgm_volume: f32,
}

fn default_paragraph_number() -> u32 {
    1
}
fn default_voice_rate() -> f32 {
    1.0
}
fn default_voice_volume() -> f32 {
    1.0
}
fn default_true() -> bool {
    true
}
fn default_clip_duration() -> u64 {
    5
}
fn default_video_count() -> u32 {
    1
}
fn default_n_threads() -> usize {
    2
}
fn default_font_size() -> u32 {
    60
}
fn default_fore_color() -> String {
    "#FFFFFF".to_string()
}
fn default_stroke_color() -> String {
    "#000000".to_string()
}
fn default_stroke_width() -> f32 {
    1.5
}
fn default_subtitle_position() -> String {
    "bottom".to_string()
}
fn default_bgm_volume() -> f32 {
    0.2
}

impl VideoParams {
    /// Minimal constructor; everything else takes its default.
    pub fn new(subject: impl Into<String>, voice_name: impl Into<String>) -> Self {
        Self {
            video_subject: subject.into(),
            video_script: String::new(),
            video_terms: None,
            video_language: String::new(),
            paragraph_number: default_paragraph_number(),
            voice_name: voice_name.into(),
            voice_rate: default_voice_rate(),
            voice_volume: default_voice_volume(),
            subtitle_enabled: true,
            subtitle_provider: SubtitleProvider::default(),
            video_source: VideoSource::default(),
            video_materials: Vec::new(),
            video_concat_mode: ConcatMode::default(),
            video_transition_mode: TransitionMode::default(),
            video_aspect: VideoAspect::default(),
            video_clip_duration: default_clip_duration(),
            video_count: default_video_count(),
            n_threads: default_n_threads(),
            font_name: String::new(),
            font_size: default_font_size(),
            text_fore_color: default_fore_color(),
            stroke_color: default_stroke_color(),
            stroke_width: default_stroke_width(),
            subtitle_position: default_subtitle_position(),
            bgm_type: String::new(),
            bgm_volume: default_bgm_volume(),
        }
    }

    /// Concatenation mode actually used by the render stage.
    ///
    /// Multiple variants from one clip pool must not share an ordering,
    /// so sequential mode is overridden to random when more than one
    /// variant is requested. The override is logged when it fires.
    pub fn effective_concat_mode(&self) -> ConcatMode {
        if self.video_count > 1 && self.video_concat_mode == ConcatMode::Sequential {
            info!(
                video_count = self.video_count,
                "sequential concat mode overridden to random for multi-variant run"
            );
            return ConcatMode::Random;
        }
        if self.video_count > 1 {
            ConcatMode::Random
        } else {
            self.video_concat_mode
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms_text_splits_on_both_comma_kinds() {
        let input = TermsInput::Text("money, wealth，saving ,  budget".to_string());
        assert_eq!(
            input.resolve(),
            vec!["money", "wealth", "saving", "budget"]
        );
    }

    #[test]
    fn test_terms_text_drops_empty_entries() {
        let input = TermsInput::Text(",money,，, wealth ,".to_string());
        assert_eq!(input.resolve(), vec!["money", "wealth"]);
    }

    #[test]
    fn test_terms_list_trims_entries() {
        let input = TermsInput::List(vec![" money ".into(), "".into(), "wealth".into()]);
        assert_eq!(input.resolve(), vec!["money", "wealth"]);
    }

    #[test]
    fn test_terms_deserialize_both_shapes() {
        let text: TermsInput = serde_json::from_str(r#""a, b""#).unwrap();
        assert_eq!(text.resolve(), vec!["a", "b"]);

        let list: TermsInput = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(list.resolve(), vec!["a", "b"]);

        // Any other shape is a configuration error
        assert!(serde_json::from_str::<TermsInput>("42").is_err());
    }

    #[test]
    fn test_effective_concat_mode_forced_random() {
        let mut params = VideoParams::new("subject", "voice");
        params.video_concat_mode = ConcatMode::Sequential;
        params.video_count = 3;
        assert_eq!(params.effective_concat_mode(), ConcatMode::Random);

        params.video_count = 1;
        assert_eq!(params.effective_concat_mode(), ConcatMode::Sequential);
    }

    #[test]
    fn test_aspect_dimensions() {
        assert_eq!(VideoAspect::Portrait.dimensions(), (1080, 1920));
        assert_eq!(VideoAspect::Landscape.dimensions(), (1920, 1080));
        assert_eq!(VideoAspect::Square.dimensions(), (1080, 1080));
    }

    #[test]
    fn test_params_deserialize_with_defaults() {
        let params: VideoParams = serde_json::from_str(
            r#"{"video_subject": "金钱的作用", "voice_name": "zh-CN-XiaoyiNeural"}"#,
        )
        .unwrap();
        assert_eq!(params.video_count, 1);
        assert!(params.subtitle_enabled);
        assert_eq!(params.video_source, VideoSource::Pexels);
        assert_eq!(params.subtitle_provider, SubtitleProvider::Edge);
    }
}
