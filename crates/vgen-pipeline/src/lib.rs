//! Subject-to-video pipeline orchestrator.
//!
//! The orchestrator runs the stages (script, terms, audio, subtitle,
//! materials, render) in fixed order against a set of injected
//! collaborator services, supports stopping early at any named stage,
//! tracks fractional progress in a task state store, and fails the whole
//! task the moment any stage produces no usable output.

pub mod collaborators;
pub mod error;
pub mod orchestrator;
pub mod render;
pub mod stages;
pub mod store;
pub mod subtitles;
pub mod workdir;

pub use collaborators::{
    Alignment, AlignmentSegment, Collaborators, CombineRequest, MaterialProvider,
    ScriptGenerator, SpeechRecognizer, SpeechSynthesizer, VideoComposer,
};
pub use error::{PipelineError, PipelineResult, StageFailure};
pub use orchestrator::{Pipeline, StopAt};
pub use store::TaskStore;
pub use subtitles::{parse_srt, parse_srt_file, SubtitleLine};
pub use workdir::TaskDirs;
