//! The writing step: turns the merged analysis into the user-facing reply.

use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use regex::Regex;
use saarthi_core::brief::SynthesisBrief;
use saarthi_core::completion::{CompletionRequest, CompletionService, ToolKind};
use saarthi_core::config::SaarthiConfig;
use saarthi_core::grounding::GroundingService;
use saarthi_core::types::{EntityType, StageKind, TurnContext};

use crate::error::SynthesisError;

/// Longest grounding digest placed in the hidden brief.
const DIGEST_CHARS: usize = 200;

const SYNTHESIS_INSTRUCTIONS: &str = "\
You are Saarthi, a warm and supportive companion. Write the reply the user \
will read.

You receive the user's message and a hidden analysis of it. Use the analysis \
to choose your register, but never quote it, name its fields or labels, or \
output JSON, lists of labels or code.

Register:
- If the person is venting or exploring their feelings, listen and validate. \
Reflect the feeling back in plain words before anything else.
- If they ask for advice, coping ideas or help learning something, offer one \
or two small, practical steps.
- If they are celebrating or thanking you, respond with warm acknowledgment.
- If the analysis marks the turn as a safety concern, or they ask for crisis \
help or safety, say you are glad they reached out and point them clearly to a \
crisis line such as 988 or local emergency services.

Rules:
- Write 2 to 5 sentences of natural prose.
- Never diagnose and never promise medical outcomes.
- Do not include links or citation markers. If background notes are \
provided, fold their ideas into your own words.";

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(?\b(?:https?://|www\.)[^\s)]+\)?").expect("url regex"));
static CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*\[(?:\d+(?:\s*,\s*\d+)*|source|sources|citation|ref)\]").expect("citation regex")
});
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("spaces regex"));
static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+([.,!?;:])").expect("punct regex"));

/// Produces the reply for one turn, optionally grounded by a search service.
pub struct Synthesizer {
    completion: Arc<dyn CompletionService>,
    grounding: Option<Arc<dyn GroundingService>>,
    grounding_enabled: bool,
    max_snippets: usize,
    timeout: Duration,
    model: Option<String>,
}

impl Synthesizer {
    pub fn new(completion: Arc<dyn CompletionService>, config: &SaarthiConfig) -> Self {
        Self {
            completion,
            grounding: None,
            grounding_enabled: config.synthesis.grounding_enabled,
            max_snippets: config.synthesis.max_grounding_snippets,
            timeout: config.pipeline.synthesizer_timeout(),
            model: config.synthesis.model.clone(),
        }
    }

    pub fn with_grounding(mut self, grounding: Arc<dyn GroundingService>) -> Self {
        self.grounding = Some(grounding);
        self
    }

    fn grounding_active(&self) -> bool {
        self.grounding_enabled && self.max_snippets > 0 && self.grounding.is_some()
    }

    pub async fn synthesize(
        &self,
        text: &str,
        ctx: &TurnContext,
        safety_flag: bool,
    ) -> Result<String, SynthesisError> {
        let notes = self.ground(ctx).await;
        let brief = SynthesisBrief::new(ctx.clone(), safety_flag, notes);

        let tools = if self.grounding_active() {
            vec![ToolKind::Search]
        } else {
            Vec::new()
        };
        let request = CompletionRequest::new(StageKind::Synthesis, SYNTHESIS_INSTRUCTIONS, text)
            .with_context(brief.render())
            .with_tools(tools)
            .with_model(self.model.clone());

        let started = Instant::now();
        let raw = tokio::time::timeout(self.timeout, self.completion.complete(&request))
            .await
            .map_err(|_| SynthesisError::Timeout(self.timeout))??;

        let reply = clean_reply(&raw);
        if reply.is_empty() {
            return Err(SynthesisError::Empty);
        }
        tracing::debug!(
            backend = self.completion.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            reply_chars = reply.chars().count(),
            "Reply synthesized"
        );
        Ok(reply)
    }

    /// Digested grounding notes, or none when grounding is off or fails.
    async fn ground(&self, ctx: &TurnContext) -> Vec<String> {
        let Some(service) = self.grounding.as_ref().filter(|_| self.grounding_active()) else {
            return Vec::new();
        };
        let query = grounding_query(ctx);
        if query.is_empty() {
            return Vec::new();
        }
        match tokio::time::timeout(self.timeout, service.search(&query, self.max_snippets)).await {
            Ok(Ok(snippets)) => snippets
                .iter()
                .take(self.max_snippets)
                .map(|s| s.digest(DIGEST_CHARS))
                .collect(),
            Ok(Err(e)) => {
                tracing::warn!(service = service.name(), error = %e, "Grounding failed, continuing without it");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(service = service.name(), "Grounding timed out, continuing without it");
                Vec::new()
            }
        }
    }
}

/// Search query from the topic, non-sensitive entities and the emotions.
/// Sensitive spans never leave the process.
pub fn grounding_query(ctx: &TurnContext) -> String {
    let mut terms: Vec<String> = Vec::new();
    let mut add = |term: &str| {
        let term = term.trim().to_lowercase();
        if !term.is_empty() && !terms.contains(&term) {
            terms.push(term);
        }
    };

    add(ctx.entity.topic_summary.as_str());
    for e in &ctx.entity.entities {
        if e.is_sensitive || matches!(e.entity_type, EntityType::Pronoun | EntityType::Person) {
            continue;
        }
        add(e.normalized_value.as_str());
    }
    if !ctx.tone.is_degraded() {
        add(ctx.tone.primary_emotion.as_str());
        for s in &ctx.tone.secondary_emotions {
            add(s.as_str());
        }
    }
    terms.join(" ")
}

/// Remove links and citation markers and tidy the whitespace they leave.
pub fn clean_reply(raw: &str) -> String {
    let text = URL.replace_all(raw, "");
    let text = CITATION.replace_all(&text, "");
    let text = SPACES.replace_all(&text, " ");
    let text = SPACE_BEFORE_PUNCT.replace_all(&text, "$1");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use async_trait::async_trait;
    use saarthi_core::completion::ScriptedCompletion;
    use saarthi_core::error::{CompletionError, GroundingError};
    use saarthi_core::grounding::GroundingSnippet;
    use saarthi_core::types::{
        Emotion, Entity, EntityResult, Intent, IntentResult, Sentiment, ToneResult,
    };

    use super::*;

    fn context() -> TurnContext {
        TurnContext::merge(
            EntityResult {
                topic_summary: "academic pressure around exam".into(),
                entities: vec![
                    Entity {
                        text: "exam".into(),
                        entity_type: EntityType::TopicAcademic,
                        normalized_value: "exam".into(),
                        is_sensitive: false,
                        confidence_score: 0.9,
                        coreference_target: None,
                    },
                    Entity {
                        text: "sam@example.com".into(),
                        entity_type: EntityType::Pii,
                        normalized_value: "sam@example.com".into(),
                        is_sensitive: true,
                        confidence_score: 1.0,
                        coreference_target: None,
                    },
                ],
            },
            IntentResult {
                primary_intent: Intent::Venting,
                secondary_intents: BTreeSet::new(),
                confidence_score: 0.8,
                rationale: String::new(),
            },
            ToneResult {
                primary_emotion: Emotion::Sadness,
                secondary_emotions: BTreeSet::new(),
                sentiment: Sentiment::Negative,
                intensity_score: 0.8,
                rationale: String::new(),
            },
        )
    }

    /// Records the last request it saw.
    #[derive(Default)]
    struct Capture {
        last: std::sync::Mutex<Option<CompletionRequest>>,
    }

    #[async_trait]
    impl CompletionService for Capture {
        fn name(&self) -> &str {
            "capture"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
            *self.last.lock().unwrap() = Some(request.clone());
            Ok("That sounds really hard [1]. See https://example.org/help for more.".into())
        }
    }

    struct StaticGrounding(Result<Vec<GroundingSnippet>, GroundingError>);

    #[async_trait]
    impl GroundingService for StaticGrounding {
        fn name(&self) -> &str {
            "static"
        }

        async fn search(
            &self,
            _query: &str,
            limit: usize,
        ) -> Result<Vec<GroundingSnippet>, GroundingError> {
            self.0.clone().map(|mut v| {
                v.truncate(limit);
                v
            })
        }
    }

    #[test]
    fn test_clean_reply_strips_links_and_markers() {
        assert_eq!(
            clean_reply("That sounds really hard [1]. See https://example.org/help for more."),
            "That sounds really hard. See for more."
        );
        assert_eq!(clean_reply("Try this [source], (www.x.org) ok"), "Try this, ok");
        assert_eq!(clean_reply("  plain reply  "), "plain reply");
    }

    #[test]
    fn test_grounding_query_skips_sensitive() {
        let q = grounding_query(&context());
        assert!(q.contains("exam"));
        assert!(q.contains("sadness"));
        assert!(!q.contains("sam@example.com"));
    }

    #[tokio::test]
    async fn test_synthesize_with_grounding() {
        let capture = Arc::new(Capture::default());
        let grounding = Arc::new(StaticGrounding(Ok(vec![GroundingSnippet::new(
            "Pomodoro study blocks",
            "Work for twenty-five minutes, then rest. Repeat.",
        )
        .with_source("https://example.org/pomodoro")])));
        let synth = Synthesizer::new(capture.clone(), &SaarthiConfig::default())
            .with_grounding(grounding);

        let reply = synth.synthesize("I failed my exam", &context(), false).await.unwrap();
        assert!(!reply.contains("http"));
        assert!(!reply.contains("[1]"));

        let request = capture.last.lock().unwrap().clone().unwrap();
        assert_eq!(request.stage, StageKind::Synthesis);
        assert_eq!(request.tools, vec![ToolKind::Search]);
        let brief = SynthesisBrief::parse(request.context.as_deref().unwrap()).unwrap();
        assert_eq!(
            brief.grounding,
            vec!["Pomodoro study blocks: Work for twenty-five minutes, then rest.".to_string()]
        );
        assert!(!request.context.unwrap().contains("example.org/pomodoro"));
    }

    #[tokio::test]
    async fn test_grounding_failure_is_ignored() {
        let capture = Arc::new(Capture::default());
        let grounding = Arc::new(StaticGrounding(Err(GroundingError::Unavailable("offline".into()))));
        let synth = Synthesizer::new(capture.clone(), &SaarthiConfig::default())
            .with_grounding(grounding);
        assert!(synth.synthesize("hi", &context(), false).await.is_ok());
        let request = capture.last.lock().unwrap().clone().unwrap();
        let brief = SynthesisBrief::parse(request.context.as_deref().unwrap()).unwrap();
        assert!(brief.grounding.is_empty());
    }

    #[tokio::test]
    async fn test_no_search_tool_without_grounding() {
        let capture = Arc::new(Capture::default());
        let synth = Synthesizer::new(capture.clone(), &SaarthiConfig::default());
        synth.synthesize("hi", &context(), false).await.unwrap();
        assert!(capture.last.lock().unwrap().as_ref().unwrap().tools.is_empty());
    }

    #[tokio::test]
    async fn test_empty_and_failed_replies() {
        let svc = Arc::new(ScriptedCompletion::new().reply(StageKind::Synthesis, "  [1] "));
        let synth = Synthesizer::new(svc, &SaarthiConfig::default());
        assert_eq!(
            synth.synthesize("hi", &context(), false).await.unwrap_err(),
            SynthesisError::Empty
        );

        let svc = Arc::new(
            ScriptedCompletion::new().fail(StageKind::Synthesis, CompletionError::Unavailable("x".into())),
        );
        let synth = Synthesizer::new(svc, &SaarthiConfig::default());
        assert!(matches!(
            synth.synthesize("hi", &context(), false).await.unwrap_err(),
            SynthesisError::Completion(_)
        ));
    }

    #[tokio::test]
    async fn test_synthesis_timeout() {
        let mut config = SaarthiConfig::default();
        config.pipeline.synthesizer_timeout_ms = 20;
        let svc = Arc::new(ScriptedCompletion::new().hang(StageKind::Synthesis));
        let synth = Synthesizer::new(svc.clone(), &config);
        assert!(matches!(
            synth.synthesize("hi", &context(), true).await.unwrap_err(),
            SynthesisError::Timeout(_)
        ));
        assert_eq!(svc.in_flight(), 0);
    }
}
