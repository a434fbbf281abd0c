//! Error types for the turn pipeline.

use std::time::Duration;

use saarthi_analysis::AnalysisError;
use saarthi_core::error::{CompletionError, InputError};
use saarthi_core::safety::LeakKind;
use saarthi_core::types::StageKind;

use crate::state::TurnState;

/// A safety-relevant analyzer failed, so the turn cannot be trusted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("aggregation failed at {stage} stage: {cause}")]
pub struct AggregationError {
    pub stage: StageKind,
    pub cause: AnalysisError,
}

/// The writing step did not produce a usable reply.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthesisError {
    #[error("completion error: {0}")]
    Completion(#[from] CompletionError),
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("reply was empty")]
    Empty,
}

/// Errors from the turn pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
    #[error("synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
    #[error("reply rejected: {0}")]
    SafetyLeak(LeakKind),
    #[error("invalid turn transition: {from} -> {to}")]
    InvalidTransition { from: TurnState, to: TurnState },
}

impl ChatError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ChatError::InvalidInput(_))
    }
}
