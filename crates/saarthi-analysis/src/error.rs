use std::time::Duration;

use saarthi_core::error::{CompletionError, InputError};
use saarthi_core::types::StageKind;
use thiserror::Error;

/// Why a single analyzer stage failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageFailure {
    #[error("completion error: {0}")]
    Completion(#[from] CompletionError),
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("malformed output: {0}")]
    Malformed(String),
    #[error("schema violation: {0}")]
    Schema(String),
}

/// Errors that can occur in the analysis stages.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),
    #[error("{stage} analysis failed: {cause}")]
    Stage {
        stage: StageKind,
        cause: StageFailure,
    },
}

impl AnalysisError {
    pub fn stage(stage: StageKind, cause: impl Into<StageFailure>) -> Self {
        AnalysisError::Stage {
            stage,
            cause: cause.into(),
        }
    }

    /// The stage that failed, if the failure came from a stage.
    pub fn failed_stage(&self) -> Option<StageKind> {
        match self {
            AnalysisError::Stage { stage, .. } => Some(*stage),
            AnalysisError::InvalidInput(_) => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            AnalysisError::Stage {
                cause: StageFailure::Timeout(_),
                ..
            }
        )
    }
}
