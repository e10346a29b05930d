//! Batch driver error types.

use thiserror::Error;

pub type BatchResult<T> = Result<T, BatchError>;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("pipeline error: {0}")]
    Pipeline(#[from] vgen_pipeline::PipelineError),

    #[error("completed log writer is closed")]
    LogClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
