//! Raw completion text to typed record.
//!
//! Completion output is free text that is supposed to hold one JSON object.
//! Models like to wrap it in a fenced block or add a sentence around it, so
//! the object is located first and only then deserialized.

use serde::de::DeserializeOwned;

use crate::error::StageFailure;

/// Locate the JSON object in raw completion text.
///
/// A fenced block (```` ```json ```` or a bare fence) wins when present;
/// otherwise the outermost `{ ... }` span is used.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let candidate = fenced_block(raw).unwrap_or(raw);
    let start = candidate.find('{')?;
    let end = candidate.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&candidate[start..=end])
}

/// Contents of the first fenced code block, without the language tag.
fn fenced_block(raw: &str) -> Option<&str> {
    let open = raw.find("```")?;
    let after_fence = &raw[open + 3..];
    // Skip the info string ("json", "JSON", ...) up to the end of the line.
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    let block = &body[..close];
    if block.contains('{') {
        Some(block)
    } else {
        None
    }
}

/// Parse raw completion text into a stage record.
///
/// Text with no JSON object, or with invalid JSON, is malformed. Valid JSON
/// that does not fit the record (missing fields, out-of-taxonomy labels,
/// wrong types) is a schema violation.
pub fn parse_record<T: DeserializeOwned>(raw: &str) -> Result<T, StageFailure> {
    let object = extract_json_object(raw)
        .ok_or_else(|| StageFailure::Malformed("no JSON object in completion output".into()))?;
    let value: serde_json::Value =
        serde_json::from_str(object).map_err(|e| StageFailure::Malformed(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| StageFailure::Schema(e.to_string()))
}
