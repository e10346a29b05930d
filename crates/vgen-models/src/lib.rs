//! Shared data models for the vgen pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Task identity, state and incrementally-merged results
//! - Pipeline parameters and their mode enumerations
//! - Filename and title-wrapping utilities

pub mod params;
pub mod task;
pub mod utils;

// Re-export common types
pub use params::{
    ConcatMode, SubtitleProvider, TermsInput, TransitionMode, VideoAspect, VideoParams,
    VideoSource,
};
pub use task::{Task, TaskId, TaskPatch, TaskResult, TaskState};
pub use utils::{sanitize_subject, wrap_title};
