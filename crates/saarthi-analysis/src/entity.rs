//! Entity, topic and coreference extraction.

use std::sync::Arc;

use async_trait::async_trait;
use saarthi_core::completion::CompletionService;
use saarthi_core::config::SaarthiConfig;
use saarthi_core::types::{EntityResult, StageKind, TurnContext};

use crate::analyzer::{Analyzer, StageClient};
use crate::error::AnalysisError;
use crate::parse::parse_record;
use crate::prompts::entity_instructions;
use crate::validate::repair_entities;

/// Extracts entities, resolves pronouns and summarizes the topic.
pub struct EntityAnalyzer {
    client: StageClient,
    instructions: String,
    max_topic_words: usize,
}

impl EntityAnalyzer {
    pub fn new(completion: Arc<dyn CompletionService>, config: &SaarthiConfig) -> Self {
        Self {
            client: StageClient::new(
                completion,
                config.pipeline.analyzer_timeout(),
                config.analysis.model.clone(),
            ),
            instructions: entity_instructions(),
            max_topic_words: config.analysis.max_topic_words,
        }
    }
}

#[async_trait]
impl Analyzer for EntityAnalyzer {
    type Output = EntityResult;

    fn stage(&self) -> StageKind {
        StageKind::Entity
    }

    async fn analyze(
        &self,
        text: &str,
        prior: Option<&TurnContext>,
    ) -> Result<EntityResult, AnalysisError> {
        let raw = self
            .client
            .call(StageKind::Entity, &self.instructions, text, prior)
            .await?;
        let record = parse_record::<EntityResult>(&raw)
            .and_then(|r| repair_entities(r, self.max_topic_words))
            .map_err(|cause| AnalysisError::stage(StageKind::Entity, cause))?;
        tracing::debug!(
            entities = record.entities.len(),
            safety_signals = record.safety_signals().count(),
            "Entity analysis complete"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saarthi_core::completion::ScriptedCompletion;
    use saarthi_core::error::InputError;
    use saarthi_core::types::EntityType;

    use crate::error::StageFailure;

    fn analyzer(svc: ScriptedCompletion) -> EntityAnalyzer {
        EntityAnalyzer::new(Arc::new(svc), &SaarthiConfig::default())
    }

    #[tokio::test]
    async fn test_entity_analysis_repairs_output() {
        let raw = r#"Here you go:
{"topic_summary": "Work pressure impacting mental health and sleep",
 "entities": [
  {"text": "Mr. Smith", "type": "PERSON", "normalized_value": "Mr. Smith", "is_sensitive": true, "confidence_score": 1.0, "coreference_target": null},
  {"text": "He", "type": "PRONOUN", "normalized_value": "he", "is_sensitive": false, "confidence_score": 0.9, "coreference_target": "mr. smith"},
  {"text": "hurt myself", "type": "safety signal", "normalized_value": "self-harm", "is_sensitive": false, "confidence_score": 0.8}
 ]}"#;
        let a = analyzer(ScriptedCompletion::new().reply(StageKind::Entity, raw));
        let result = a.analyze("Mr. Smith... He makes me want to hurt myself", None).await.unwrap();

        assert_eq!(result.topic_summary, "Work pressure impacting mental health");
        assert_eq!(result.entities[1].coreference_target.as_deref(), Some("Mr. Smith"));
        assert_eq!(result.entities[2].entity_type, EntityType::SafetySignal);
        assert!(result.entities[2].is_sensitive);
    }

    #[tokio::test]
    async fn test_entity_empty_input_makes_no_call() {
        let svc = Arc::new(ScriptedCompletion::new());
        let a = EntityAnalyzer::new(svc.clone(), &SaarthiConfig::default());
        let err = a.analyze("   ", None).await.unwrap_err();
        assert_eq!(err, AnalysisError::InvalidInput(InputError::Empty));
        assert!(svc.calls().is_empty());
    }

    #[tokio::test]
    async fn test_entity_unknown_type_is_schema_failure() {
        let raw = r#"{"topic_summary": "trip", "entities": [{"text": "Paris", "type": "LOCATION", "normalized_value": "Paris", "confidence_score": 0.9}]}"#;
        let a = analyzer(ScriptedCompletion::new().reply(StageKind::Entity, raw));
        let err = a.analyze("I went to Paris", None).await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Stage {
                stage: StageKind::Entity,
                cause: StageFailure::Schema(_)
            }
        ));
    }
}
