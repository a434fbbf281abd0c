//! Safety policy shared across the pipeline.
//!
//! Three concerns live here:
//! - deriving the turn's safety flag from the merged analysis,
//! - making sure a flagged reply carries a crisis-resource cue,
//! - catching replies that leak internal structured records.

use regex::Regex;

use crate::config::SafetyConfig;
use crate::types::{EntityType, Intent, TurnContext};

/// Why a turn was put on the safety path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetySignal {
    /// The primary intent is `crisis_help` or `seeking_safety`.
    CriticalIntent(Intent),
    /// A sensitive `SAFETY_SIGNAL` entity was extracted.
    SignalEntity(String),
}

/// All safety signals found in one turn's context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafetyAssessment {
    pub signals: Vec<SafetySignal>,
}

impl SafetyAssessment {
    /// Collect signals from the merged context.
    ///
    /// This is a cross-stage decision: no single analyzer owns it.
    pub fn from_context(ctx: &TurnContext) -> Self {
        let mut signals = Vec::new();
        if ctx.intent.primary_intent.is_safety_critical() {
            signals.push(SafetySignal::CriticalIntent(ctx.intent.primary_intent));
        }
        for entity in ctx.entity.safety_signals() {
            signals.push(SafetySignal::SignalEntity(entity.normalized_value.clone()));
        }
        Self { signals }
    }

    pub fn flagged(&self) -> bool {
        !self.signals.is_empty()
    }
}

/// Derived safety flag for a merged context.
pub fn safety_flag(ctx: &TurnContext) -> bool {
    SafetyAssessment::from_context(ctx).flagged()
}

// =============================================================================
// Escalation cues
// =============================================================================

/// Checks and enforces crisis-resource cues in replies.
#[derive(Debug, Clone)]
pub struct EscalationPolicy {
    crisis_message: String,
    markers: Vec<Regex>,
}

impl EscalationPolicy {
    pub fn new(config: &SafetyConfig) -> Self {
        Self {
            crisis_message: config.crisis_message.clone(),
            markers: config
                .resource_markers
                .iter()
                .map(|m| m.trim())
                .filter(|m| !m.is_empty())
                .filter_map(|m| marker_regex(m))
                .collect(),
        }
    }

    /// Whether the reply references at least one crisis resource.
    ///
    /// A marker only counts as a whole phrase: "emergency number" matches,
    /// "not an emergency" does not.
    pub fn has_escalation_cue(&self, reply: &str) -> bool {
        self.markers.iter().any(|re| re.is_match(reply))
    }

    /// Append the crisis message unless the reply already carries a cue.
    pub fn ensure_escalation(&self, reply: &str) -> String {
        if self.has_escalation_cue(reply) {
            return reply.to_string();
        }
        let trimmed = reply.trim_end();
        if trimmed.is_empty() {
            self.crisis_message.clone()
        } else {
            format!("{}\n\n{}", trimmed, self.crisis_message)
        }
    }

    pub fn crisis_message(&self) -> &str {
        &self.crisis_message
    }
}

/// Case-insensitive whole-phrase matcher; inner whitespace may vary.
fn marker_regex(marker: &str) -> Option<Regex> {
    let words: Vec<String> = marker.split_whitespace().map(regex::escape).collect();
    let pattern = format!(r"(?i)\b{}\b", words.join(r"\s+"));
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(marker, error = %e, "Ignoring unusable resource marker");
            None
        }
    }
}

// =============================================================================
// Structured-output leak detection
// =============================================================================

/// Field names of the internal records.
const RECORD_FIELDS: [&str; 13] = [
    "topic_summary",
    "normalized_value",
    "is_sensitive",
    "confidence_score",
    "coreference_target",
    "primary_intent",
    "secondary_intents",
    "primary_emotion",
    "secondary_emotions",
    "intensity_score",
    "turn_context",
    "safety_flag",
    "entities\":",
];

/// What made a reply look like structured output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeakKind {
    Json,
    CodeFence,
    FieldName(String),
    TaxonomyLabel(String),
}

impl std::fmt::Display for LeakKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeakKind::Json => write!(f, "reply is JSON"),
            LeakKind::CodeFence => write!(f, "reply contains a code fence"),
            LeakKind::FieldName(name) => write!(f, "reply contains field name {}", name),
            LeakKind::TaxonomyLabel(label) => write!(f, "reply contains taxonomy label {}", label),
        }
    }
}

/// Detects replies that look like internal structured records.
///
/// Only labels that cannot occur in ordinary prose are checked: intent
/// labels containing an underscore and the upper-case entity labels.
pub struct LeakDetector {
    json_key: Regex,
    labels: Vec<(String, Regex)>,
}

impl Default for LeakDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LeakDetector {
    pub fn new() -> Self {
        let mut labels = Vec::new();
        for intent in Intent::ALL {
            let label = intent.as_str();
            if label.contains('_') {
                labels.push(label.to_string());
            }
        }
        for entity_type in EntityType::ALL {
            let label = entity_type.as_str();
            if label.contains('_') {
                labels.push(label.to_string());
            }
        }
        let labels = labels
            .into_iter()
            .map(|label| {
                let re = Regex::new(&format!(r"\b{}\b", regex::escape(&label)))
                    .expect("escaped label is a valid regex");
                (label, re)
            })
            .collect();

        Self {
            json_key: Regex::new(
                r#""[A-Za-z_][A-Za-z0-9_]*"\s*:\s*(?:"|\{|\[|-?\d|true\b|false\b|null\b)"#,
            )
            .expect("json key regex"),
            labels,
        }
    }

    /// Return the first leak found, or `None` for clean prose.
    pub fn scan(&self, reply: &str) -> Option<LeakKind> {
        let trimmed = reply.trim();
        if (trimmed.starts_with('{') || trimmed.starts_with('['))
            && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
        {
            return Some(LeakKind::Json);
        }
        if trimmed.contains("```") {
            return Some(LeakKind::CodeFence);
        }
        if self.json_key.is_match(trimmed) {
            return Some(LeakKind::Json);
        }
        let lower = trimmed.to_lowercase();
        if let Some(field) = RECORD_FIELDS.iter().find(|f| lower.contains(*f)) {
            return Some(LeakKind::FieldName(field.trim_end_matches("\":").to_string()));
        }
        self.labels
            .iter()
            .find(|(_, re)| re.is_match(trimmed))
            .map(|(label, _)| LeakKind::TaxonomyLabel(label.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::types::{
        Entity, EntityResult, IntentResult, Sentiment, ToneResult, Emotion,
    };

    fn context(intent: Intent, entities: Vec<Entity>) -> TurnContext {
        TurnContext::merge(
            EntityResult {
                topic_summary: "t".into(),
                entities,
            },
            IntentResult {
                primary_intent: intent,
                secondary_intents: BTreeSet::new(),
                confidence_score: 0.9,
                rationale: String::new(),
            },
            ToneResult {
                primary_emotion: Emotion::Sadness,
                secondary_emotions: BTreeSet::new(),
                sentiment: Sentiment::Negative,
                intensity_score: 0.5,
                rationale: String::new(),
            },
        )
    }

    fn signal_entity(sensitive: bool) -> Entity {
        Entity {
            text: "end it all".into(),
            entity_type: EntityType::SafetySignal,
            normalized_value: "suicidal ideation".into(),
            is_sensitive: sensitive,
            confidence_score: 0.9,
            coreference_target: None,
        }
    }

    #[test]
    fn test_flag_from_crisis_intent() {
        assert!(safety_flag(&context(Intent::CrisisHelp, vec![])));
        assert!(safety_flag(&context(Intent::SeekingSafety, vec![])));
        assert!(!safety_flag(&context(Intent::Venting, vec![])));
    }

    #[test]
    fn test_flag_from_safety_signal_entity() {
        let ctx = context(Intent::Venting, vec![signal_entity(true)]);
        let assessment = SafetyAssessment::from_context(&ctx);
        assert!(assessment.flagged());
        assert_eq!(
            assessment.signals,
            vec![SafetySignal::SignalEntity("suicidal ideation".into())]
        );
    }

    #[test]
    fn test_unsensitive_signal_entity_does_not_flag() {
        // The entity stage repairs this before it gets here; the policy reads
        // the fields as given.
        let ctx = context(Intent::Venting, vec![signal_entity(false)]);
        assert!(!safety_flag(&ctx));
    }

    #[test]
    fn test_escalation_cue_detection() {
        let policy = EscalationPolicy::new(&SafetyConfig::default());
        assert!(policy.has_escalation_cue("Please call 988 right away."));
        assert!(policy.has_escalation_cue("A crisis HELPLINE can help."));
        assert!(!policy.has_escalation_cue("That sounds really hard."));
    }

    #[test]
    fn test_passing_mention_of_emergency_is_not_a_cue() {
        let policy = EscalationPolicy::new(&SafetyConfig::default());
        let reply = "I hear you. This is not an emergency-room matter, let's just talk it through.";
        assert!(!policy.has_escalation_cue(reply));
        assert!(!policy.has_escalation_cue("It's not an emergency, just a bad day."));
        let escalated = policy.ensure_escalation(reply);
        assert!(escalated.starts_with(reply));
        assert!(escalated.ends_with(policy.crisis_message()));
        assert!(policy.has_escalation_cue("Call your local emergency  number."));
        assert!(policy.has_escalation_cue("Contact emergency services now."));
    }

    #[test]
    fn test_marker_needs_word_boundary() {
        let policy = EscalationPolicy::new(&SafetyConfig::default());
        assert!(!policy.has_escalation_cue("Back in 1988 things were different."));
        assert!(policy.has_escalation_cue("Text 988."));
    }

    #[test]
    fn test_ensure_escalation_appends_once() {
        let policy = EscalationPolicy::new(&SafetyConfig::default());
        let reply = policy.ensure_escalation("I'm so sorry you're hurting.");
        assert!(reply.starts_with("I'm so sorry you're hurting."));
        assert!(reply.contains("988"));
        assert_eq!(policy.ensure_escalation(&reply), reply);
        assert_eq!(policy.ensure_escalation("  "), policy.crisis_message());
    }

    #[test]
    fn test_leak_detector_json() {
        let d = LeakDetector::new();
        assert_eq!(d.scan(r#"{"reply": "hi"}"#), Some(LeakKind::Json));
        assert_eq!(d.scan("[1, 2]"), Some(LeakKind::Json));
        assert_eq!(
            d.scan("Sure! \"primary_intent\": \"venting\""),
            Some(LeakKind::Json)
        );
        assert_eq!(d.scan(r#"Noted "score": 0.4 today."#), Some(LeakKind::Json));
    }

    #[test]
    fn test_leak_detector_fence_and_fields() {
        let d = LeakDetector::new();
        assert_eq!(d.scan("```json\n{}\n```"), Some(LeakKind::CodeFence));
        assert_eq!(
            d.scan("Your intensity_score is high."),
            Some(LeakKind::FieldName("intensity_score".into()))
        );
    }

    #[test]
    fn test_leak_detector_taxonomy_labels() {
        let d = LeakDetector::new();
        assert_eq!(
            d.scan("I classified this as crisis_help."),
            Some(LeakKind::TaxonomyLabel("crisis_help".into()))
        );
        assert_eq!(
            d.scan("Mentions of TOPIC_MENTAL_HEALTH noted."),
            Some(LeakKind::TaxonomyLabel("TOPIC_MENTAL_HEALTH".into()))
        );
    }

    #[test]
    fn test_leak_detector_allows_prose() {
        let d = LeakDetector::new();
        for reply in [
            "That sounds really painful. Failing an exam doesn't make you stupid.",
            "Venting is okay. I'm here, and planning the next step can wait.",
            "It makes sense to feel sadness and frustration right now {gently}.",
            "When your mom said \"enough\": that must have stung.",
            "You wrote \"done\": and then stopped, and that is okay.",
        ] {
            assert_eq!(d.scan(reply), None, "{reply}");
        }
    }
}
