//! Optional grounding capability consulted by the writing step.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GroundingError;

/// One search hit. Only a digest of it ever reaches the hidden prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingSnippet {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub source: Option<String>,
}

impl GroundingSnippet {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Title plus the first sentence of the body, capped at `max_chars`.
    /// Sources are never part of the digest.
    pub fn digest(&self, max_chars: usize) -> String {
        let body = self.body.trim();
        let first_sentence = body
            .find(['.', '!', '?'])
            .map(|i| &body[..=i])
            .unwrap_or(body);
        let line = if first_sentence.is_empty() {
            self.title.trim().to_string()
        } else {
            format!("{}: {}", self.title.trim(), first_sentence)
        };
        let mut digest: String = line.chars().take(max_chars).collect();
        if line.chars().count() > max_chars {
            digest.push('…');
        }
        digest
    }
}

/// Search capability used to ground replies.
#[async_trait]
pub trait GroundingService: Send + Sync {
    fn name(&self) -> &str;

    /// Return at most `limit` snippets relevant to `query`.
    async fn search(&self, query: &str, limit: usize)
        -> Result<Vec<GroundingSnippet>, GroundingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_first_sentence_without_source() {
        let s = GroundingSnippet::new(
            "Box breathing",
            "Breathe in for four counts, hold for four. Repeat for a few minutes.",
        )
        .with_source("https://example.org/breathing");
        let d = s.digest(200);
        assert_eq!(d, "Box breathing: Breathe in for four counts, hold for four.");
        assert!(!d.contains("example.org"));
    }

    #[test]
    fn test_digest_truncates() {
        let s = GroundingSnippet::new("Grounding", "Name five things you can see around you right now.");
        let d = s.digest(12);
        assert_eq!(d, "Grounding: N…");
    }

    #[test]
    fn test_digest_empty_body() {
        let s = GroundingSnippet::new("Journaling", "   ");
        assert_eq!(s.digest(50), "Journaling");
    }
}
