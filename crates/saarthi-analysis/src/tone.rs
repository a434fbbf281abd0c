//! Emotion, sentiment and intensity detection.

use std::sync::Arc;

use async_trait::async_trait;
use saarthi_core::completion::CompletionService;
use saarthi_core::config::SaarthiConfig;
use saarthi_core::types::{StageKind, ToneResult, TurnContext};

use crate::analyzer::{Analyzer, StageClient};
use crate::error::AnalysisError;
use crate::parse::parse_record;
use crate::prompts::tone_instructions;
use crate::validate::repair_tone;

/// Note appended to the rationale when the crisis floor is applied.
const URGENCY_NOTE: &str = "Urgency: the previous turn was on the safety path.";

pub struct ToneAnalyzer {
    client: StageClient,
    instructions: String,
    crisis_intensity_floor: f32,
}

impl ToneAnalyzer {
    pub fn new(completion: Arc<dyn CompletionService>, config: &SaarthiConfig) -> Self {
        Self {
            client: StageClient::new(
                completion,
                config.pipeline.analyzer_timeout(),
                config.analysis.model.clone(),
            ),
            instructions: tone_instructions(),
            crisis_intensity_floor: config.analysis.crisis_intensity_floor.clamp(0.0, 1.0),
        }
    }
}

/// Raise intensity to the crisis floor when the previous turn was a crisis.
pub fn apply_crisis_nudge(mut tone: ToneResult, prior: Option<&TurnContext>, floor: f32) -> ToneResult {
    let on_safety_path = prior
        .map(|p| p.intent.primary_intent.is_safety_critical())
        .unwrap_or(false);
    if !on_safety_path {
        return tone;
    }
    if tone.intensity_score < floor {
        tone.intensity_score = floor;
    }
    tone.intensity_score = tone.intensity_score.clamp(0.0, 1.0);
    if !tone.rationale.contains(URGENCY_NOTE) {
        tone.rationale = if tone.rationale.is_empty() {
            URGENCY_NOTE.to_string()
        } else {
            format!("{} {}", tone.rationale, URGENCY_NOTE)
        };
    }
    tone
}

#[async_trait]
impl Analyzer for ToneAnalyzer {
    type Output = ToneResult;

    fn stage(&self) -> StageKind {
        StageKind::Tone
    }

    async fn analyze(
        &self,
        text: &str,
        prior: Option<&TurnContext>,
    ) -> Result<ToneResult, AnalysisError> {
        let raw = self
            .client
            .call(StageKind::Tone, &self.instructions, text, prior)
            .await?;
        let record = parse_record::<ToneResult>(&raw)
            .and_then(repair_tone)
            .map_err(|cause| AnalysisError::stage(StageKind::Tone, cause))?;
        let record = apply_crisis_nudge(record, prior, self.crisis_intensity_floor);
        tracing::debug!(
            emotion = %record.primary_emotion,
            sentiment = %record.sentiment,
            intensity = record.intensity_score,
            "Tone analysis complete"
        );
        Ok(record)
    }
}
