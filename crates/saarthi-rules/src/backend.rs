//! Offline completion backend.
//!
//! Answers every stage with deterministic rules instead of a language
//! model, speaking the same JSON contract the analyzers parse.

use async_trait::async_trait;
use saarthi_core::brief::SynthesisBrief;
use saarthi_core::completion::{CompletionRequest, CompletionService};
use saarthi_core::error::CompletionError;
use saarthi_core::types::{Sentiment, StageKind};
use serde::Serialize;

use crate::entity::EntityExtractor;
use crate::intent::IntentClassifier;
use crate::reply::ReplyComposer;
use crate::tone::ToneScorer;

/// Rule-based [`CompletionService`].
#[derive(Default)]
pub struct RuleBasedCompletion {
    entities: EntityExtractor,
    intents: IntentClassifier,
    tone: ToneScorer,
    replies: ReplyComposer,
}

impl RuleBasedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    fn synthesize(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let brief = request
            .context
            .as_deref()
            .and_then(SynthesisBrief::parse)
            .ok_or_else(|| CompletionError::Rejected("missing turn brief".to_string()))?;
        Ok(self.replies.compose(&brief))
    }
}

fn to_json<T: Serialize>(record: &T) -> Result<String, CompletionError> {
    serde_json::to_string(record).map_err(|e| CompletionError::Rejected(e.to_string()))
}

#[async_trait]
impl CompletionService for RuleBasedCompletion {
    fn name(&self) -> &str {
        "rules"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let text = request.input.as_str();
        match request.stage {
            StageKind::Entity => to_json(&self.entities.extract(text)),
            StageKind::Intent => {
                let negative = self.tone.score(text).sentiment == Sentiment::Negative;
                to_json(&self.intents.classify(text, negative))
            }
            StageKind::Tone => to_json(&self.tone.score(text)),
            StageKind::Synthesis => self.synthesize(request),
        }
    }
}
