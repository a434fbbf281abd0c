//! Built-in coping library used as an offline grounding service.

use async_trait::async_trait;
use saarthi_core::error::GroundingError;
use saarthi_core::grounding::{GroundingService, GroundingSnippet};

/// One library entry.
#[derive(Debug, Clone)]
pub struct CopingEntry {
    pub keywords: Vec<String>,
    pub title: String,
    pub body: String,
    pub source: Option<String>,
}

impl CopingEntry {
    fn builtin(keywords: &[&str], title: &str, body: &str, source: &str) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            title: title.to_string(),
            body: body.to_string(),
            source: Some(source.to_string()),
        }
    }
}

/// Keyword-scored lookup over a fixed set of coping techniques.
pub struct CopingLibrary {
    entries: Vec<CopingEntry>,
}

impl Default for CopingLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl CopingLibrary {
    pub fn new() -> Self {
        let entries = vec![
            CopingEntry::builtin(
                &["exam", "test", "study", "grades", "academic", "finals", "homework", "assignment"],
                "Pomodoro study blocks",
                "Work for twenty-five minutes, then rest for five. Short blocks make a big task feel smaller.",
                "https://en.wikipedia.org/wiki/Pomodoro_Technique",
            ),
            CopingEntry::builtin(
                &["anxiety", "anxious", "panic", "stress", "stressed", "overwhelmed", "breathe"],
                "Box breathing",
                "Breathe in for four counts, hold for four, breathe out for four, and hold for four. Repeat for a few minutes.",
                "https://www.healthline.com/health/box-breathing",
            ),
            CopingEntry::builtin(
                &["panic", "flashback", "flashbacks", "numb", "racing"],
                "The 5-4-3-2-1 grounding exercise",
                "Name five things you can see, four you can touch, three you can hear, two you can smell and one you can taste.",
                "https://www.urmc.rochester.edu/behavioral-health-partners/bhp-blog/april-2018/5-4-3-2-1-coping-technique-for-anxiety",
            ),
            CopingEntry::builtin(
                &["stupid", "failure", "failed", "worthless", "ashamed", "self-criticism", "academic"],
                "Self-compassion break",
                "Talk to yourself the way you would talk to a good friend in the same situation. Mistakes are part of being human.",
                "https://self-compassion.org/exercises/",
            ),
            CopingEntry::builtin(
                &["sleep", "insomnia", "tired", "nightmares", "fatigue"],
                "Wind-down routine",
                "Put screens away half an hour before bed and keep the same wake-up time each day.",
                "https://www.sleepfoundation.org/sleep-hygiene",
            ),
            CopingEntry::builtin(
                &["lonely", "loneliness", "alone", "friends", "relationship", "isolated"],
                "Small reconnection",
                "Send one short message to someone you trust today. It does not need to be a long conversation.",
                "https://www.nimh.nih.gov/health/topics/caring-for-your-mental-health",
            ),
            CopingEntry::builtin(
                &["work", "deadline", "deadlines", "job", "burnout", "boss", "project"],
                "One next step",
                "Write down the single smallest next action and do only that. Progress builds momentum.",
                "https://www.mind.org.uk/information-support/tips-for-everyday-living/how-to-be-mentally-healthy-at-work/",
            ),
            CopingEntry::builtin(
                &["sad", "sadness", "down", "depressed", "depression", "hopeless"],
                "Gentle movement",
                "A ten-minute walk outside can lift your mood a little. Go at whatever pace feels okay.",
                "https://www.nhs.uk/mental-health/self-help/guides-tools-and-activities/",
            ),
            CopingEntry::builtin(
                &["angry", "anger", "frustrated", "frustration", "furious"],
                "Pause and name it",
                "Step away for a moment and name the feeling out loud. Naming an emotion can lower its intensity.",
                "https://www.apa.org/topics/anger/control",
            ),
        ];
        Self { entries }
    }

    pub fn with_entries(entries: Vec<CopingEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Score entries by keyword hits, best first. Ties keep library order.
    pub fn lookup(&self, query: &str, limit: usize) -> Vec<GroundingSnippet> {
        let words: Vec<String> = query
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect();

        let mut scored: Vec<(usize, &CopingEntry)> = self
            .entries
            .iter()
            .map(|entry| {
                let hits = entry
                    .keywords
                    .iter()
                    .filter(|k| words.iter().any(|w| w == *k))
                    .count();
                (hits, entry)
            })
            .filter(|(hits, _)| *hits > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        scored
            .into_iter()
            .take(limit)
            .map(|(_, entry)| {
                let snippet = GroundingSnippet::new(&entry.title, &entry.body);
                match &entry.source {
                    Some(source) => snippet.with_source(source),
                    None => snippet,
                }
            })
            .collect()
    }
}

#[async_trait]
impl GroundingService for CopingLibrary {
    fn name(&self) -> &str {
        "coping-library"
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<GroundingSnippet>, GroundingError> {
        if self.entries.is_empty() {
            return Err(GroundingError::Unavailable("coping library is empty".to_string()));
        }
        let hits = self.lookup(query, limit);
        tracing::debug!(query_len = query.len(), hits = hits.len(), "Coping library searched");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_exam_query() {
        let lib = CopingLibrary::new();
        let hits = lib.lookup("academic pressure around exam", 3);
        assert_eq!(hits[0].title, "Pomodoro study blocks");
        assert!(hits.len() <= 3);
        assert!(hits.iter().any(|h| h.title == "Self-compassion break"));
    }

    #[test]
    fn test_lookup_respects_limit_and_misses() {
        let lib = CopingLibrary::new();
        assert_eq!(lib.lookup("anxious panic stress overwhelmed", 1).len(), 1);
        assert!(lib.lookup("the weather today", 3).is_empty());
        assert!(lib.lookup("exam", 0).is_empty());
    }

    #[tokio::test]
    async fn test_search_trait() {
        let lib = CopingLibrary::new();
        let hits = lib.search("can't sleep, insomnia again", 2).await.unwrap();
        assert_eq!(hits[0].title, "Wind-down routine");
        assert!(hits[0].source.is_some());
    }

    #[tokio::test]
    async fn test_empty_library_is_unavailable() {
        let lib = CopingLibrary::with_entries(vec![]);
        assert!(lib.is_empty());
        let err = lib.search("exam", 3).await.unwrap_err();
        assert!(matches!(err, GroundingError::Unavailable(_)));
    }
}
