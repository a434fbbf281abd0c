use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SaarthiError};

/// Top-level configuration for the Saarthi pipeline.
///
/// Loaded from `~/.saarthi/config.toml` by default. Every section falls back
/// to its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaarthiConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
}

impl SaarthiConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SaarthiConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SaarthiError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Turn-level limits and timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Timeout applied to each analyzer call independently.
    pub analyzer_timeout_ms: u64,
    /// Timeout applied to the synthesizer call.
    pub synthesizer_timeout_ms: u64,
    /// Longest accepted utterance, in characters.
    pub max_message_chars: usize,
}

impl PipelineConfig {
    pub fn analyzer_timeout(&self) -> Duration {
        Duration::from_millis(self.analyzer_timeout_ms)
    }

    pub fn synthesizer_timeout(&self) -> Duration {
        Duration::from_millis(self.synthesizer_timeout_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            analyzer_timeout_ms: 15_000,
            synthesizer_timeout_ms: 30_000,
            max_message_chars: 2000,
        }
    }
}

/// Analyzer stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum tone intensity when the previous turn was on the safety path.
    pub crisis_intensity_floor: f32,
    /// Longest accepted topic summary, in words.
    pub max_topic_words: usize,
    /// Model hint forwarded to the completion capability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            crisis_intensity_floor: 0.8,
            max_topic_words: crate::types::MAX_TOPIC_WORDS,
            model: None,
        }
    }
}

/// Synthesizer stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Whether the synthesizer may consult a grounding capability.
    pub grounding_enabled: bool,
    /// Maximum grounding snippets folded into the hidden prompt.
    pub max_grounding_snippets: usize,
    /// Model hint forwarded to the completion capability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            grounding_enabled: true,
            max_grounding_snippets: 3,
            model: None,
        }
    }
}

/// Safety escalation and fallback wording.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Escalation cue appended whenever the safety flag is set and the reply
    /// lacks one.
    pub crisis_message: String,
    /// Phrases that count as a crisis-resource reference. Matched
    /// case-insensitively on word boundaries.
    pub resource_markers: Vec<String>,
    /// Reply used when the writing step fails.
    pub fallback_reply: String,
    /// Reply used when a safety-relevant analyzer fails.
    pub safety_fallback_reply: String,
    /// Redact PII from utterance previews written to logs.
    pub redact_logs: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            crisis_message: "If you are in immediate danger or thinking about ending your life, \
                please call or text 988 (Suicide & Crisis Lifeline) or your local emergency \
                number right now, and reach out to someone you trust."
                .to_string(),
            resource_markers: vec![
                "988".to_string(),
                "crisis line".to_string(),
                "lifeline".to_string(),
                "helpline".to_string(),
                "hotline".to_string(),
                "emergency services".to_string(),
                "emergency number".to_string(),
                "911".to_string(),
                "112".to_string(),
            ],
            fallback_reply: "I'm sorry, I'm having trouble putting my thoughts into words right \
                now. I'm still here and I'd like to keep listening. Could you tell me a little \
                more about how you're feeling?"
                .to_string(),
            safety_fallback_reply: "I want to make sure you're safe. I couldn't fully understand \
                your message just now, but if you are going through something painful, you \
                don't have to face it alone. If you are in danger or thinking about hurting \
                yourself, please call or text 988 (Suicide & Crisis Lifeline) or your local \
                emergency number, or reach out to someone you trust."
                .to_string(),
            redact_logs: true,
        }
    }
}
