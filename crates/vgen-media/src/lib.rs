//! FFmpeg CLI wrapper for the media operations the pipeline owns:
//! first-frame thumbnails with a burned-in title, and cover clips
//! prepended to finished videos without re-encoding the main stream.

pub mod command;
pub mod cover;
pub mod error;
pub mod probe;
pub mod thumbnail;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use cover::{burn_title_into_opening, prepend_cover};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_video, VideoInfo};
pub use thumbnail::{overlay_title_on_first_frame, ThumbnailOptions};
