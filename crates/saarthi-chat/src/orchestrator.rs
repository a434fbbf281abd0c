//! Turn orchestrator: the single entry point of the pipeline.
//!
//! Sequences aggregation and synthesis, enforces the boundary between the
//! hidden analysis and the visible reply, and applies the safety fallbacks.

use std::sync::Arc;
use std::time::Instant;

use saarthi_core::completion::CompletionService;
use saarthi_core::config::{SaarthiConfig, SafetyConfig};
use saarthi_core::grounding::GroundingService;
use saarthi_core::redact::log_preview;
use saarthi_core::safety::{EscalationPolicy, LeakDetector, SafetyAssessment};
use saarthi_core::types::{validate_utterance, TurnContext};
use serde::Serialize;
use uuid::Uuid;

use crate::aggregator::Aggregator;
use crate::error::ChatError;
use crate::state::{TurnMachine, TurnState};
use crate::synthesizer::Synthesizer;

/// Characters of the utterance shown in log previews.
const PREVIEW_CHARS: usize = 48;

/// What the host receives for one turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub turn_id: Uuid,
    pub reply: String,
    pub safety_flag: bool,
    pub state: TurnState,
    /// `None` only when a safety-relevant analyzer failed.
    pub context: Option<TurnContext>,
}

/// Runs one turn from utterance to reply.
///
/// Holds no per-conversation state: the host passes the previous turn's
/// context back in if it wants continuity.
pub struct Orchestrator {
    aggregator: Aggregator,
    synthesizer: Synthesizer,
    escalation: EscalationPolicy,
    leaks: LeakDetector,
    safety: SafetyConfig,
    max_message_chars: usize,
    backend: String,
}

impl Orchestrator {
    pub fn new(completion: Arc<dyn CompletionService>, config: &SaarthiConfig) -> Self {
        Self {
            aggregator: Aggregator::new(Arc::clone(&completion), config),
            backend: completion.name().to_string(),
            synthesizer: Synthesizer::new(completion, config),
            escalation: EscalationPolicy::new(&config.safety),
            leaks: LeakDetector::new(),
            safety: config.safety.clone(),
            max_message_chars: config.pipeline.max_message_chars,
        }
    }

    /// Install a grounding service for the writing step.
    pub fn with_grounding(mut self, grounding: Arc<dyn GroundingService>) -> Self {
        self.synthesizer = self.synthesizer.with_grounding(grounding);
        self
    }

    /// Process one utterance.
    ///
    /// Only invalid input is returned as an error. Every other failure is
    /// turned into a safe reply with `state == Errored`. Dropping the
    /// returned future cancels all in-flight completion calls.
    pub async fn process_turn(
        &self,
        text: &str,
        prior: Option<&TurnContext>,
    ) -> Result<TurnOutcome, ChatError> {
        self.run(Uuid::new_v4(), text, prior).await
    }

    #[tracing::instrument(name = "turn", skip_all, fields(turn_id = %turn_id, backend = %self.backend))]
    async fn run(
        &self,
        turn_id: Uuid,
        text: &str,
        prior: Option<&TurnContext>,
    ) -> Result<TurnOutcome, ChatError> {
        let started = Instant::now();
        let mut machine = TurnMachine::new(turn_id);

        let text = match validate_utterance(text, self.max_message_chars) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(chars = text.chars().count(), error = %e, "Rejected utterance");
                return Err(e.into());
            }
        };

        tracing::info!(
            chars = text.chars().count(),
            preview = %log_preview(text, PREVIEW_CHARS, self.safety.redact_logs),
            has_prior = prior.is_some(),
            "Turn started"
        );

        machine.advance(TurnState::Aggregating)?;
        let ctx = match self.aggregator.aggregate(text, prior).await {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::warn!(stage = %e.stage, error = %e, "Analysis failed, sending safety reply");
                machine.advance(TurnState::Errored)?;
                return Ok(TurnOutcome {
                    turn_id,
                    reply: self.escalation.ensure_escalation(&self.safety.safety_fallback_reply),
                    safety_flag: true,
                    state: machine.state(),
                    context: None,
                });
            }
        };

        let assessment = SafetyAssessment::from_context(&ctx);
        let safety_flag = assessment.flagged();
        if safety_flag {
            tracing::info!(signals = assessment.signals.len(), "Safety path engaged");
        }

        machine.advance(TurnState::Synthesizing)?;
        let written = self
            .synthesizer
            .synthesize(text, &ctx, safety_flag)
            .await
            .map_err(ChatError::from)
            .and_then(|reply| match self.leaks.scan(&reply) {
                Some(kind) => Err(ChatError::SafetyLeak(kind)),
                None => Ok(reply),
            });

        let (reply, state) = match written {
            Ok(reply) => {
                machine.advance(TurnState::Done)?;
                (reply, machine.state())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Synthesis failed, sending fallback reply");
                machine.advance(TurnState::Errored)?;
                (self.safety.fallback_reply.clone(), machine.state())
            }
        };

        let reply = if safety_flag {
            let escalated = self.escalation.ensure_escalation(&reply);
            if escalated.len() != reply.len() {
                tracing::info!("Crisis resources appended to reply");
            }
            escalated
        } else {
            reply
        };

        tracing::info!(
            state = %state,
            safety_flag,
            intent = %ctx.intent.primary_intent,
            emotion = %ctx.tone.primary_emotion,
            reply_chars = reply.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Turn finished"
        );

        Ok(TurnOutcome {
            turn_id,
            reply,
            safety_flag,
            state,
            context: Some(ctx),
        })
    }
}

#[cfg(test)]
mod tests {
    use saarthi_core::completion::ScriptedCompletion;
    use saarthi_core::error::{CompletionError, InputError};
    use saarthi_core::types::StageKind;

    use super::*;

    const ENTITY: &str = r#"{"topic_summary":"a hard week","entities":[]}"#;
    const INTENT: &str = r#"{"primary_intent":"venting","confidence_score":0.7,"rationale":"r"}"#;
    const CRISIS_INTENT: &str = r#"{"primary_intent":"crisis_help","confidence_score":0.95,"rationale":"r"}"#;
    const TONE: &str = r#"{"primary_emotion":"sadness","sentiment":"negative","intensity_score":0.6,"rationale":"r"}"#;

    fn script(intent: &str) -> ScriptedCompletion {
        ScriptedCompletion::new()
            .reply(StageKind::Entity, ENTITY)
            .reply(StageKind::Intent, intent)
            .reply(StageKind::Tone, TONE)
    }

    fn orchestrator(svc: Arc<ScriptedCompletion>) -> Orchestrator {
        let mut config = SaarthiConfig::default();
        config.pipeline.analyzer_timeout_ms = 100;
        config.pipeline.synthesizer_timeout_ms = 100;
        Orchestrator::new(svc, &config)
    }

    #[tokio::test]
    async fn test_happy_path() {
        let svc = Arc::new(script(INTENT).reply(
            StageKind::Synthesis,
            "That sounds exhausting. I'm here to listen.",
        ));
        let out = orchestrator(svc).process_turn("rough week", None).await.unwrap();
        assert_eq!(out.state, TurnState::Done);
        assert!(!out.safety_flag);
        assert_eq!(out.reply, "That sounds exhausting. I'm here to listen.");
        assert!(out.context.is_some());
    }

    #[tokio::test]
    async fn test_blank_input_rejected_before_any_call() {
        let svc = Arc::new(script(INTENT));
        let err = orchestrator(Arc::clone(&svc))
            .process_turn("   ", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::InvalidInput(InputError::Empty)));
        assert!(svc.calls().is_empty());
    }

    #[tokio::test]
    async fn test_too_long_input_rejected() {
        let svc = Arc::new(script(INTENT));
        let mut config = SaarthiConfig::default();
        config.pipeline.max_message_chars = 5;
        let err = Orchestrator::new(svc.clone(), &config)
            .process_turn("far too long", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::InvalidInput(InputError::TooLong(5))));
        assert!(svc.calls().is_empty());
    }

    #[tokio::test]
    async fn test_crisis_cue_appended_when_missing() {
        let svc = Arc::new(
            script(CRISIS_INTENT).reply(StageKind::Synthesis, "I'm so sorry you feel this way."),
        );
        let out = orchestrator(svc).process_turn("I can't go on", None).await.unwrap();
        assert!(out.safety_flag);
        assert_eq!(out.state, TurnState::Done);
        assert!(out.reply.starts_with("I'm so sorry you feel this way."));
        assert!(out.reply.contains("988"));
    }

    #[tokio::test]
    async fn test_passing_emergency_mention_still_gets_crisis_message() {
        let reply = "I hear you. This is not an emergency-room matter, let's just talk it through.";
        let svc = Arc::new(script(CRISIS_INTENT).reply(StageKind::Synthesis, reply));
        let out = orchestrator(svc).process_turn("I can't go on", None).await.unwrap();
        let crisis = SaarthiConfig::default().safety.crisis_message;
        assert!(out.safety_flag);
        assert!(out.reply.starts_with(reply));
        assert!(out.reply.ends_with(&crisis));
    }

    #[tokio::test]
    async fn test_quoted_word_with_colon_is_not_a_leak() {
        let reply = "When your mom said \"enough\": that must have stung.";
        let svc = Arc::new(script(INTENT).reply(StageKind::Synthesis, reply));
        let out = orchestrator(svc).process_turn("rough week", None).await.unwrap();
        assert_eq!(out.state, TurnState::Done);
        assert_eq!(out.reply, reply);
    }

    #[tokio::test]
    async fn test_leaked_reply_replaced_by_fallback() {
        let svc = Arc::new(script(INTENT).reply(
            StageKind::Synthesis,
            r#"{"primary_intent": "venting"}"#,
        ));
        let out = orchestrator(svc).process_turn("rough week", None).await.unwrap();
        let fallback = SaarthiConfig::default().safety.fallback_reply;
        assert_eq!(out.state, TurnState::Errored);
        assert_eq!(out.reply, fallback);
        assert!(out.context.is_some());
    }

    #[tokio::test]
    async fn test_synthesis_failure_with_flag_keeps_cue() {
        let svc = Arc::new(
            script(CRISIS_INTENT)
                .fail(StageKind::Synthesis, CompletionError::Unavailable("down".into())),
        );
        let out = orchestrator(svc).process_turn("I can't go on", None).await.unwrap();
        assert_eq!(out.state, TurnState::Errored);
        assert!(out.safety_flag);
        assert!(out.reply.contains("988"));
    }

    #[tokio::test]
    async fn test_synthesis_failure_without_flag_has_no_cue() {
        let svc = Arc::new(script(INTENT).hang(StageKind::Synthesis));
        let out = orchestrator(svc).process_turn("rough week", None).await.unwrap();
        assert_eq!(out.state, TurnState::Errored);
        assert!(!out.safety_flag);
        assert!(!out.reply.contains("988"));
    }

    #[tokio::test]
    async fn test_outcome_serializes_without_raw_errors() {
        let svc = Arc::new(script(INTENT).reply(StageKind::Synthesis, "I hear you."));
        let out = orchestrator(svc).process_turn("rough week", None).await.unwrap();
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["state"], "done");
        assert_eq!(json["safety_flag"], false);
    }
}
