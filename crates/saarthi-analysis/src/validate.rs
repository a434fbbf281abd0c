//! Per-stage validation and repair.
//!
//! Repairs fix things the completion capability routinely gets slightly
//! wrong and are logged at debug. Anything that cannot be repaired without
//! guessing (scores out of range, `unknown` as a primary emotion) is a
//! schema violation.

use std::collections::BTreeSet;

use saarthi_core::types::{Emotion, EntityResult, IntentResult, ToneResult};
use tracing::debug;

use crate::error::StageFailure;

/// Reject non-finite scores and scores outside `[0.0, 1.0]`.
pub fn check_score(field: &str, value: f32) -> Result<f32, StageFailure> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(StageFailure::Schema(format!(
            "{} out of range: {}",
            field, value
        )));
    }
    Ok(value)
}

/// Keep the first `max_words` words of a summary.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Validate and repair an entity record.
pub fn repair_entities(
    mut result: EntityResult,
    max_topic_words: usize,
) -> Result<EntityResult, StageFailure> {
    let summary = truncate_words(&result.topic_summary, max_topic_words);
    if summary != result.topic_summary.trim() {
        debug!(max_topic_words, "Truncated topic summary");
    }
    result.topic_summary = summary;

    let before = result.entities.len();
    result.entities.retain(|e| !e.text.trim().is_empty());
    if result.entities.len() != before {
        debug!(dropped = before - result.entities.len(), "Dropped blank entities");
    }

    for idx in 0..result.entities.len() {
        let (earlier, rest) = result.entities.split_at_mut(idx);
        let entity = &mut rest[0];

        check_score("confidence_score", entity.confidence_score)?;

        entity.text = entity.text.trim().to_string();
        entity.normalized_value = entity.normalized_value.trim().to_string();
        if entity.normalized_value.is_empty() {
            entity.normalized_value = entity.text.clone();
        }

        if entity.entity_type.is_always_sensitive() && !entity.is_sensitive {
            debug!(entity_type = %entity.entity_type, "Forced is_sensitive");
            entity.is_sensitive = true;
        }

        if let Some(target) = entity.coreference_target.take() {
            let target = target.trim();
            let resolved = earlier
                .iter()
                .find(|e| e.normalized_value == target)
                .or_else(|| {
                    earlier
                        .iter()
                        .find(|e| e.normalized_value.eq_ignore_ascii_case(target))
                })
                .map(|e| e.normalized_value.clone());
            if resolved.is_none() && !target.is_empty() {
                debug!(entity_type = %entity.entity_type, "Nulled dangling coreference target");
            }
            entity.coreference_target = resolved;
        }
    }

    Ok(result)
}

/// Validate and repair an intent record.
pub fn repair_intent(mut result: IntentResult) -> Result<IntentResult, StageFailure> {
    check_score("confidence_score", result.confidence_score)?;
    if result.secondary_intents.remove(&result.primary_intent) {
        debug!(intent = %result.primary_intent, "Removed primary intent from secondary set");
    }
    result.rationale = result.rationale.trim().to_string();
    Ok(result)
}

/// Validate and repair a tone record.
pub fn repair_tone(mut result: ToneResult) -> Result<ToneResult, StageFailure> {
    if result.primary_emotion == Emotion::Unknown {
        return Err(StageFailure::Schema(
            "unknown is not a valid primary emotion".into(),
        ));
    }
    check_score("intensity_score", result.intensity_score)?;

    let secondary: BTreeSet<String> = result
        .secondary_emotions
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    result.secondary_emotions = secondary;
    result.rationale = result.rationale.trim().to_string();
    Ok(result)
}
