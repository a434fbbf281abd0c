//! Fan-out of the three analyzers and merge of their records.

use std::sync::Arc;
use std::time::Instant;

use saarthi_analysis::{Analyzer, EntityAnalyzer, IntentAnalyzer, ToneAnalyzer};
use saarthi_core::completion::CompletionService;
use saarthi_core::config::SaarthiConfig;
use saarthi_core::types::{StageKind, ToneResult, TurnContext};

use crate::error::AggregationError;

/// Runs the Entity, Intent and Tone analyzers concurrently for one turn.
///
/// Entity and Intent are safety-relevant: if either fails the turn fails
/// and the other in-flight calls are dropped. A Tone failure degrades to
/// [`ToneResult::degraded`].
pub struct Aggregator {
    entity: EntityAnalyzer,
    intent: IntentAnalyzer,
    tone: ToneAnalyzer,
}

impl Aggregator {
    pub fn new(completion: Arc<dyn CompletionService>, config: &SaarthiConfig) -> Self {
        Self {
            entity: EntityAnalyzer::new(Arc::clone(&completion), config),
            intent: IntentAnalyzer::new(Arc::clone(&completion), config),
            tone: ToneAnalyzer::new(completion, config),
        }
    }

    pub async fn aggregate(
        &self,
        text: &str,
        prior: Option<&TurnContext>,
    ) -> Result<TurnContext, AggregationError> {
        let started = Instant::now();

        let entity = async {
            self.entity
                .analyze(text, prior)
                .await
                .map_err(|cause| AggregationError {
                    stage: StageKind::Entity,
                    cause,
                })
        };
        let intent = async {
            self.intent
                .analyze(text, prior)
                .await
                .map_err(|cause| AggregationError {
                    stage: StageKind::Intent,
                    cause,
                })
        };
        let tone = async {
            match self.tone.analyze(text, prior).await {
                Ok(tone) => Ok::<_, AggregationError>(tone),
                Err(e) => {
                    tracing::warn!(stage = %StageKind::Tone, error = %e, "Tone unavailable, continuing with neutral tone");
                    Ok(ToneResult::degraded())
                }
            }
        };

        let (entity, intent, tone) = tokio::try_join!(entity, intent, tone)?;

        tracing::debug!(
            entities = entity.entities.len(),
            intent = %intent.primary_intent,
            emotion = %tone.primary_emotion,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Turn analysis merged"
        );
        Ok(TurnContext::merge(entity, intent, tone))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use saarthi_core::completion::ScriptedCompletion;
    use saarthi_core::error::CompletionError;
    use saarthi_core::types::{Emotion, Intent};

    use super::*;

    const ENTITY: &str = r#"{"topic_summary":"exam stress","entities":[{"text":"exam","type":"TOPIC_ACADEMIC","normalized_value":"exam","is_sensitive":false,"confidence_score":0.9}]}"#;
    const INTENT: &str = r#"{"primary_intent":"venting","secondary_intents":[],"confidence_score":0.8,"rationale":"Frustration about the exam."}"#;
    const TONE: &str = r#"{"primary_emotion":"sadness","secondary_emotions":["shame"],"sentiment":"negative","intensity_score":0.8,"rationale":"Exclamations and self-criticism."}"#;

    fn full_script() -> ScriptedCompletion {
        ScriptedCompletion::new()
            .reply(StageKind::Entity, ENTITY)
            .reply(StageKind::Intent, INTENT)
            .reply(StageKind::Tone, TONE)
    }

    fn aggregator(svc: Arc<ScriptedCompletion>) -> Aggregator {
        let mut config = SaarthiConfig::default();
        config.pipeline.analyzer_timeout_ms = 100;
        Aggregator::new(svc, &config)
    }

    #[tokio::test]
    async fn test_aggregate_merges_all_three() {
        let svc = Arc::new(full_script());
        let ctx = aggregator(Arc::clone(&svc))
            .aggregate("I failed my exam", None)
            .await
            .unwrap();
        assert_eq!(ctx.entity.topic_summary, "exam stress");
        assert_eq!(ctx.intent.primary_intent, Intent::Venting);
        assert_eq!(ctx.tone.primary_emotion, Emotion::Sadness);
        assert_eq!(svc.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_tone_failure_degrades() {
        let svc = Arc::new(full_script().fail(StageKind::Tone, CompletionError::Empty));
        let ctx = aggregator(svc).aggregate("I failed my exam", None).await.unwrap();
        assert!(ctx.tone.is_degraded());
        assert_eq!(ctx.tone.intensity_score, 0.0);
        assert_eq!(ctx.tone.rationale, "tone unavailable");
    }

    #[tokio::test]
    async fn test_intent_failure_is_hard() {
        let svc = Arc::new(
            full_script().fail(StageKind::Intent, CompletionError::Unavailable("down".into())),
        );
        let err = aggregator(svc).aggregate("I failed my exam", None).await.unwrap_err();
        assert_eq!(err.stage, StageKind::Intent);
    }

    #[tokio::test]
    async fn test_entity_malformed_is_hard() {
        let svc = Arc::new(full_script().reply(StageKind::Entity, "not json at all"));
        let err = aggregator(svc).aggregate("I failed my exam", None).await.unwrap_err();
        assert_eq!(err.stage, StageKind::Entity);
    }

    #[tokio::test]
    async fn test_intent_timeout_drops_siblings() {
        let svc = Arc::new(
            full_script()
                .hang(StageKind::Intent)
                .hang(StageKind::Tone),
        );
        let err = aggregator(Arc::clone(&svc))
            .aggregate("I failed my exam", None)
            .await
            .unwrap_err();
        assert_eq!(err.stage, StageKind::Intent);
        assert!(err.cause.is_timeout());
        assert_eq!(svc.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_tone_timeout_degrades() {
        let svc = Arc::new(full_script().hang(StageKind::Tone));
        let started = Instant::now();
        let ctx = aggregator(svc).aggregate("I failed my exam", None).await.unwrap();
        assert!(ctx.tone.is_degraded());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_merge_is_deterministic() {
        let a = aggregator(Arc::new(full_script()))
            .aggregate("I failed my exam", None)
            .await
            .unwrap();
        let b = aggregator(Arc::new(full_script().with_delay(Duration::from_millis(5))))
            .aggregate("I failed my exam", None)
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
