use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures surfaced at the pipeline boundary.
///
/// A rejected subject is not in here: it is a valid `AnalysisResult`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("image payload is {size} bytes, the upload limit is {limit} bytes")]
    InputTooLarge { size: usize, limit: usize },
    #[error("classifier unavailable: {0}")]
    ModelUnavailable(String),
    #[error("image could not be decoded: {0}")]
    UnreadableImage(String),
    #[error("run {0} was superseded by a newer upload or a reset")]
    Superseded(u64),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl PipelineError {
    /// The failure kind recorded in the pipeline state, if this error parks the
    /// state machine in `Failed`.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            PipelineError::ModelUnavailable(_) => Some(FailureKind::ModelUnavailable),
            PipelineError::UnreadableImage(_) => Some(FailureKind::UnreadableImage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    ModelUnavailable,
    UnreadableImage,
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
