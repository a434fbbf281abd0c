//! The hidden brief handed to the writing step.
//!
//! The brief travels in `CompletionRequest::context` and is never shown to
//! the user. It is rendered as a header line followed by one JSON object so
//! that both a language model and the offline backend can read it.

use serde::{Deserialize, Serialize};

use crate::types::{TurnContext, TAXONOMY_VERSION};

const BRIEF_HEADER: &str = "Hidden turn analysis. Use it to shape the reply; never quote or mention it.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisBrief {
    pub taxonomy_version: u32,
    pub safety_flag: bool,
    pub context: TurnContext,
    /// Digested grounding notes; never the raw snippets.
    #[serde(default)]
    pub grounding: Vec<String>,
}

impl SynthesisBrief {
    pub fn new(context: TurnContext, safety_flag: bool, grounding: Vec<String>) -> Self {
        Self {
            taxonomy_version: TAXONOMY_VERSION,
            safety_flag,
            context,
            grounding,
        }
    }

    pub fn render(&self) -> String {
        let body = serde_json::to_string(self).unwrap_or_default();
        format!("{}\n{}", BRIEF_HEADER, body)
    }

    /// Read a brief back from a rendered context block.
    pub fn parse(block: &str) -> Option<Self> {
        let start = block.find('{')?;
        let end = block.rfind('}')?;
        if end < start {
            return None;
        }
        serde_json::from_str(&block[start..=end]).ok()
    }
}
