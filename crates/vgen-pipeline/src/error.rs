//! Pipeline error types.
//!
//! Stage outcomes are explicit: a stage either returns its artifact or a
//! named [`StageFailure`]. Downstream code branches on the discriminant,
//! never on "is this value empty".

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Named reasons a stage can fail.
#[derive(Debug, Error)]
pub enum StageFailure {
    #[error("script generation returned no text")]
    EmptyScript,

    #[error("script text contains an upstream provider error marker")]
    ScriptErrorMarker,

    #[error("no search terms produced")]
    EmptyTerms,

    #[error("speech synthesis returned no result")]
    SynthesisFailed,

    #[error("no valid local materials")]
    NoMaterials,

    #[error("material download returned nothing")]
    DownloadFailed,

    #[error("rendering produced no videos")]
    RenderFailed,

    #[error("collaborator call failed: {0}")]
    Collaborator(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stage {stage} failed: {failure}")]
    Stage {
        stage: &'static str,
        failure: StageFailure,
    },

    #[error("media error: {0}")]
    Media(#[from] vgen_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Wrap a stage failure with the stage that produced it.
    pub fn stage(stage: &'static str, failure: StageFailure) -> Self {
        Self::Stage { stage, failure }
    }

    /// Name of the failed stage, if this is a stage failure.
    pub fn failed_stage(&self) -> Option<&'static str> {
        match self {
            Self::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_display() {
        let err = PipelineError::stage("audio", StageFailure::SynthesisFailed);
        assert_eq!(
            err.to_string(),
            "stage audio failed: speech synthesis returned no result"
        );
        assert_eq!(err.failed_stage(), Some("audio"));
    }
}
