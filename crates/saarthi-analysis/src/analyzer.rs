//! The analyzer contract shared by the three stages.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use saarthi_core::completion::{CompletionRequest, CompletionService};
use saarthi_core::error::{CompletionError, InputError};
use saarthi_core::types::{StageKind, TurnContext};

use crate::error::{AnalysisError, StageFailure};
use crate::prompts::render_prior_context;

/// One independently invocable analysis stage.
///
/// Implementations are stateless between calls: the only side effect of
/// `analyze` is the completion call.
#[async_trait]
pub trait Analyzer: Send + Sync {
    type Output: Send;

    fn stage(&self) -> StageKind;

    /// Analyze one utterance, optionally nudged by the previous turn.
    async fn analyze(
        &self,
        text: &str,
        prior: Option<&TurnContext>,
    ) -> Result<Self::Output, AnalysisError>;
}

/// Completion plumbing shared by the analyzers: input check, prompt
/// assembly, timeout.
#[derive(Clone)]
pub struct StageClient {
    completion: Arc<dyn CompletionService>,
    timeout: Duration,
    model: Option<String>,
}

impl StageClient {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        timeout: Duration,
        model: Option<String>,
    ) -> Self {
        Self {
            completion,
            timeout,
            model,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one completion call for `stage` and return its raw text.
    pub async fn call(
        &self,
        stage: StageKind,
        instructions: &str,
        text: &str,
        prior: Option<&TurnContext>,
    ) -> Result<String, AnalysisError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(InputError::Empty.into());
        }

        let mut request = CompletionRequest::new(stage, instructions, text)
            .with_model(self.model.clone());
        if let Some(prior) = prior {
            request = request.with_context(render_prior_context(prior));
        }

        let started = Instant::now();
        let raw = match tokio::time::timeout(self.timeout, self.completion.complete(&request)).await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                tracing::debug!(stage = %stage, error = %e, "Analyzer completion failed");
                return Err(AnalysisError::stage(stage, e));
            }
            Err(_) => {
                tracing::debug!(
                    stage = %stage,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Analyzer completion timed out"
                );
                return Err(AnalysisError::stage(stage, StageFailure::Timeout(self.timeout)));
            }
        };

        if raw.trim().is_empty() {
            return Err(AnalysisError::stage(stage, CompletionError::Empty));
        }

        tracing::debug!(
            stage = %stage,
            backend = self.completion.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            raw_len = raw.len(),
            "Analyzer completion returned"
        );
        Ok(raw)
    }
}
