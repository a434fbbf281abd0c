//! Intent classification against the closed master list.

use std::sync::Arc;

use async_trait::async_trait;
use saarthi_core::completion::CompletionService;
use saarthi_core::config::SaarthiConfig;
use saarthi_core::types::{IntentResult, StageKind, TurnContext};

use crate::analyzer::{Analyzer, StageClient};
use crate::error::AnalysisError;
use crate::parse::parse_record;
use crate::prompts::intent_instructions;
use crate::validate::repair_intent;

pub struct IntentAnalyzer {
    client: StageClient,
    instructions: String,
}

impl IntentAnalyzer {
    pub fn new(completion: Arc<dyn CompletionService>, config: &SaarthiConfig) -> Self {
        Self {
            client: StageClient::new(
                completion,
                config.pipeline.analyzer_timeout(),
                config.analysis.model.clone(),
            ),
            instructions: intent_instructions(),
        }
    }
}

#[async_trait]
impl Analyzer for IntentAnalyzer {
    type Output = IntentResult;

    fn stage(&self) -> StageKind {
        StageKind::Intent
    }

    async fn analyze(
        &self,
        text: &str,
        prior: Option<&TurnContext>,
    ) -> Result<IntentResult, AnalysisError> {
        let raw = self
            .client
            .call(StageKind::Intent, &self.instructions, text, prior)
            .await?;
        let record = parse_record::<IntentResult>(&raw)
            .and_then(repair_intent)
            .map_err(|cause| AnalysisError::stage(StageKind::Intent, cause))?;
        tracing::debug!(
            intent = %record.primary_intent,
            confidence = record.confidence_score,
            "Intent analysis complete"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use saarthi_core::completion::ScriptedCompletion;
    use saarthi_core::error::CompletionError;
    use saarthi_core::types::Intent;

    use crate::error::StageFailure;

    #[tokio::test]
    async fn test_intent_legacy_alias_repaired() {
        let raw = r#"{"primary_intent": "self_reflection", "secondary_intents": ["seeking_support", "self_exploration"], "confidence_score": 0.7, "rationale": "thinking aloud"}"#;
        let a = IntentAnalyzer::new(
            Arc::new(ScriptedCompletion::new().reply(StageKind::Intent, raw)),
            &SaarthiConfig::default(),
        );
        let result = a.analyze("why do I always do this", None).await.unwrap();
        assert_eq!(result.primary_intent, Intent::SelfExploration);
        assert_eq!(
            result.secondary_intents.into_iter().collect::<Vec<_>>(),
            vec![Intent::SeekingComfort]
        );
    }

    #[tokio::test]
    async fn test_intent_score_out_of_range() {
        let raw = r#"{"primary_intent": "venting", "confidence_score": 7, "rationale": ""}"#;
        let a = IntentAnalyzer::new(
            Arc::new(ScriptedCompletion::new().reply(StageKind::Intent, raw)),
            &SaarthiConfig::default(),
        );
        let err = a.analyze("ugh", None).await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Stage {
                cause: StageFailure::Schema(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_intent_completion_failure() {
        let a = IntentAnalyzer::new(
            Arc::new(
                ScriptedCompletion::new()
                    .fail(StageKind::Intent, CompletionError::Unavailable("down".into())),
            ),
            &SaarthiConfig::default(),
        );
        let err = a.analyze("hello", None).await.unwrap_err();
        assert_eq!(err.failed_stage(), Some(StageKind::Intent));
        assert!(err.to_string().contains("down"));
    }

    #[tokio::test]
    async fn test_intent_timeout() {
        let mut config = SaarthiConfig::default();
        config.pipeline.analyzer_timeout_ms = 20;
        let svc = Arc::new(ScriptedCompletion::new().hang(StageKind::Intent));
        let a = IntentAnalyzer::new(svc.clone(), &config);
        let err = a.analyze("hello", None).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(
            err,
            AnalysisError::stage(StageKind::Intent, StageFailure::Timeout(Duration::from_millis(20)))
        );
        assert_eq!(svc.in_flight(), 0);
    }
}
