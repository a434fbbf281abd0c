//! Intent classification from utterance text.
//!
//! Maps an utterance onto the intent master list using the compiled
//! pattern set. Crisis patterns always win.

pub mod patterns;

use std::collections::BTreeSet;

use saarthi_core::types::{Intent, IntentResult};

use patterns::PatternSet;

/// Secondary intents kept per result.
const MAX_SECONDARY: usize = 2;
/// Secondary intents below this confidence are ignored.
const SECONDARY_FLOOR: f32 = 0.6;

/// Rule-based classifier producing an [`IntentResult`].
#[derive(Default)]
pub struct IntentClassifier {
    patterns: PatternSet,
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `text`. `negative` is the tone hint used when nothing matches.
    pub fn classify(&self, text: &str, negative: bool) -> IntentResult {
        let matches = self.patterns.detect(text);

        let Some(best) = matches.first() else {
            let (primary_intent, rationale) = if negative {
                (Intent::Venting, "No explicit request; negative wording reads as venting.")
            } else {
                (Intent::SharingFeelings, "No explicit request; reads as sharing.")
            };
            return IntentResult {
                primary_intent,
                secondary_intents: BTreeSet::new(),
                confidence_score: 0.5,
                rationale: rationale.to_string(),
            };
        };

        let secondary_intents: BTreeSet<Intent> = matches
            .iter()
            .skip(1)
            .filter(|m| m.confidence >= SECONDARY_FLOOR && m.intent != best.intent)
            .take(MAX_SECONDARY)
            .map(|m| m.intent)
            .collect();

        IntentResult {
            primary_intent: best.intent,
            secondary_intents,
            confidence_score: best.confidence,
            rationale: format!("Matched the phrase '{}'.", best.matched_text.trim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_exam_failure() {
        let result = IntentClassifier::new().classify("I failed my exam!!! I'm so stupid.", true);
        assert!(matches!(
            result.primary_intent,
            Intent::Venting | Intent::SeekingComfort
        ));
        assert!(result.confidence_score >= 0.7);
    }

    #[test]
    fn test_classify_crisis() {
        let result = IntentClassifier::new().classify("I want to end my life.", true);
        assert_eq!(result.primary_intent, Intent::CrisisHelp);
        assert!(result.rationale.contains("end my life"));
    }

    #[test]
    fn test_default_when_nothing_matches() {
        let c = IntentClassifier::new();
        let negative = c.classify("the rain again", true);
        assert_eq!(negative.primary_intent, Intent::Venting);
        assert_eq!(negative.confidence_score, 0.5);
        let neutral = c.classify("the rain again", false);
        assert_eq!(neutral.primary_intent, Intent::SharingFeelings);
    }

    #[test]
    fn test_secondary_excludes_primary_and_is_bounded() {
        let result = IntentClassifier::new().classify(
            "What should I do? I can't decide. Pros and cons? Any advice?",
            false,
        );
        assert!(!result.secondary_intents.contains(&result.primary_intent));
        assert!(result.secondary_intents.len() <= MAX_SECONDARY);
    }
}
