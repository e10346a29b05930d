//! Resumable batch execution over many subjects.
//!
//! Reads the pending/completed checkpoint log pair, filters subjects
//! already done, and runs the pipeline for the rest under a bounded
//! worker pool. Completion is persisted only after a subject has
//! produced at least one final video.

pub mod checkpoint;
pub mod config;
pub mod driver;
pub mod error;

pub use checkpoint::{load_completed, load_subjects, CompletedLog, CompletedMarker};
pub use config::BatchConfig;
pub use driver::{BatchDriver, BatchSummary};
pub use error::{BatchError, BatchResult};
