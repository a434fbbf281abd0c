//! Data model shared by every pipeline stage.
//!
//! The analyzer records (`EntityResult`, `IntentResult`, `ToneResult`) and the
//! merged `TurnContext` are internal-only values: they never cross the
//! user-facing boundary as text. Taxonomy enums serialize to the wire labels
//! the completion capability is asked to produce and parse back leniently
//! (case, separators, and a small set of legacy aliases).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::InputError;

/// Version of the canonical entity/intent/emotion taxonomy.
///
/// Rendered into every analyzer prompt so that completion output can be
/// traced back to the schema it was asked to follow.
pub const TAXONOMY_VERSION: u32 = 1;

/// Maximum number of words allowed in an entity topic summary.
pub const MAX_TOPIC_WORDS: usize = 5;

// =============================================================================
// Stage identity
// =============================================================================

/// Identifies one unit of work in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Entity,
    Intent,
    Tone,
    Synthesis,
}

impl StageKind {
    /// The three analyzer stages, in the order their results are merged.
    pub const ANALYZERS: [StageKind; 3] = [StageKind::Entity, StageKind::Intent, StageKind::Tone];

    /// Whether a failure of this stage could hide a crisis signal.
    pub fn is_safety_relevant(&self) -> bool {
        matches!(self, StageKind::Entity | StageKind::Intent)
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Entity => write!(f, "entity"),
            StageKind::Intent => write!(f, "intent"),
            StageKind::Tone => write!(f, "tone"),
            StageKind::Synthesis => write!(f, "synthesis"),
        }
    }
}

/// Lowercase a label and fold spaces and hyphens into underscores.
fn normalize_label(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

// =============================================================================
// Entities
// =============================================================================

/// Closed entity taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityType {
    Person,
    Relationship,
    TopicAcademic,
    TopicWork,
    Event,
    TopicMentalHealth,
    TopicPhysicalHealth,
    Symptom,
    Treatment,
    CopingStrategy,
    EmotionExplicit,
    Pii,
    SafetySignal,
    Pronoun,
}

impl EntityType {
    pub const ALL: [EntityType; 14] = [
        EntityType::Person,
        EntityType::Relationship,
        EntityType::TopicAcademic,
        EntityType::TopicWork,
        EntityType::Event,
        EntityType::TopicMentalHealth,
        EntityType::TopicPhysicalHealth,
        EntityType::Symptom,
        EntityType::Treatment,
        EntityType::CopingStrategy,
        EntityType::EmotionExplicit,
        EntityType::Pii,
        EntityType::SafetySignal,
        EntityType::Pronoun,
    ];

    /// Wire label, e.g. `TOPIC_MENTAL_HEALTH`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "PERSON",
            EntityType::Relationship => "RELATIONSHIP",
            EntityType::TopicAcademic => "TOPIC_ACADEMIC",
            EntityType::TopicWork => "TOPIC_WORK",
            EntityType::Event => "EVENT",
            EntityType::TopicMentalHealth => "TOPIC_MENTAL_HEALTH",
            EntityType::TopicPhysicalHealth => "TOPIC_PHYSICAL_HEALTH",
            EntityType::Symptom => "SYMPTOM",
            EntityType::Treatment => "TREATMENT",
            EntityType::CopingStrategy => "COPING_STRATEGY",
            EntityType::EmotionExplicit => "EMOTION_EXPLICIT",
            EntityType::Pii => "PII",
            EntityType::SafetySignal => "SAFETY_SIGNAL",
            EntityType::Pronoun => "PRONOUN",
        }
    }

    /// Entities of this type must always carry `is_sensitive = true`.
    pub fn is_always_sensitive(&self) -> bool {
        matches!(self, EntityType::Pii | EntityType::SafetySignal)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        EntityType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown entity type: {}", s))
    }
}

impl Serialize for EntityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One extracted entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Exact span from the utterance.
    pub text: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Standardized term, used as the coreference key.
    pub normalized_value: String,
    #[serde(default)]
    pub is_sensitive: bool,
    pub confidence_score: f32,
    /// `normalized_value` of an earlier entity this one refers to.
    #[serde(default)]
    pub coreference_target: Option<String>,
}

/// Output of the entity stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityResult {
    #[serde(default)]
    pub topic_summary: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl EntityResult {
    /// Entities flagged as safety signals.
    pub fn safety_signals(&self) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(|e| e.entity_type == EntityType::SafetySignal && e.is_sensitive)
    }
}

// =============================================================================
// Intents
// =============================================================================

/// Grouping of the intent master list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentCategory {
    EmotionalSupport,
    ProblemSolving,
    InformationExchange,
    SelfGrowth,
    Creative,
    SocialRelational,
    MetaInteraction,
    SafetyCrisis,
}

/// Closed intent master list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Intent {
    // Emotional support & expression
    Venting,
    SeekingComfort,
    SeekingValidation,
    SharingFeelings,
    CelebratingSuccess,
    SeekingCompanionship,
    // Problem-solving & decision making
    SeekingAdvice,
    BrainstormingSolutions,
    Troubleshooting,
    Planning,
    DecisionMakingSupport,
    ComparisonSeeking,
    // Information exchange
    FactualQuery,
    ExplanationSeeking,
    ClarificationSeeking,
    ConfirmationSeeking,
    // Self-growth & learning
    SelfExploration,
    LearningSkill,
    GoalSetting,
    FeedbackSeeking,
    HabitFormation,
    // Creative & entertainment
    CreativeGeneration,
    Roleplaying,
    BrainstormingIdeas,
    HumorEngagement,
    // Social & relational
    SmallTalk,
    SharingExperience,
    GratitudeExpression,
    PersuasionOrDebate,
    // Meta-interaction
    GivingFeedback,
    GivingInstruction,
    Correction,
    ConversationManagement,
    ProceduralQuery,
    TestingBoundaries,
    // Safety & crisis
    CrisisHelp,
    SeekingSafety,
}

impl Intent {
    pub const ALL: [Intent; 37] = [
        Intent::Venting,
        Intent::SeekingComfort,
        Intent::SeekingValidation,
        Intent::SharingFeelings,
        Intent::CelebratingSuccess,
        Intent::SeekingCompanionship,
        Intent::SeekingAdvice,
        Intent::BrainstormingSolutions,
        Intent::Troubleshooting,
        Intent::Planning,
        Intent::DecisionMakingSupport,
        Intent::ComparisonSeeking,
        Intent::FactualQuery,
        Intent::ExplanationSeeking,
        Intent::ClarificationSeeking,
        Intent::ConfirmationSeeking,
        Intent::SelfExploration,
        Intent::LearningSkill,
        Intent::GoalSetting,
        Intent::FeedbackSeeking,
        Intent::HabitFormation,
        Intent::CreativeGeneration,
        Intent::Roleplaying,
        Intent::BrainstormingIdeas,
        Intent::HumorEngagement,
        Intent::SmallTalk,
        Intent::SharingExperience,
        Intent::GratitudeExpression,
        Intent::PersuasionOrDebate,
        Intent::GivingFeedback,
        Intent::GivingInstruction,
        Intent::Correction,
        Intent::ConversationManagement,
        Intent::ProceduralQuery,
        Intent::TestingBoundaries,
        Intent::CrisisHelp,
        Intent::SeekingSafety,
    ];

    /// Wire label, e.g. `seeking_comfort`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Venting => "venting",
            Intent::SeekingComfort => "seeking_comfort",
            Intent::SeekingValidation => "seeking_validation",
            Intent::SharingFeelings => "sharing_feelings",
            Intent::CelebratingSuccess => "celebrating_success",
            Intent::SeekingCompanionship => "seeking_companionship",
            Intent::SeekingAdvice => "seeking_advice",
            Intent::BrainstormingSolutions => "brainstorming_solutions",
            Intent::Troubleshooting => "troubleshooting",
            Intent::Planning => "planning",
            Intent::DecisionMakingSupport => "decision_making_support",
            Intent::ComparisonSeeking => "comparison_seeking",
            Intent::FactualQuery => "factual_query",
            Intent::ExplanationSeeking => "explanation_seeking",
            Intent::ClarificationSeeking => "clarification_seeking",
            Intent::ConfirmationSeeking => "confirmation_seeking",
            Intent::SelfExploration => "self_exploration",
            Intent::LearningSkill => "learning_skill",
            Intent::GoalSetting => "goal_setting",
            Intent::FeedbackSeeking => "feedback_seeking",
            Intent::HabitFormation => "habit_formation",
            Intent::CreativeGeneration => "creative_generation",
            Intent::Roleplaying => "roleplaying",
            Intent::BrainstormingIdeas => "brainstorming_ideas",
            Intent::HumorEngagement => "humor_engagement",
            Intent::SmallTalk => "small_talk",
            Intent::SharingExperience => "sharing_experience",
            Intent::GratitudeExpression => "gratitude_expression",
            Intent::PersuasionOrDebate => "persuasion_or_debate",
            Intent::GivingFeedback => "giving_feedback",
            Intent::GivingInstruction => "giving_instruction",
            Intent::Correction => "correction",
            Intent::ConversationManagement => "conversation_management",
            Intent::ProceduralQuery => "procedural_query",
            Intent::TestingBoundaries => "testing_boundaries",
            Intent::CrisisHelp => "crisis_help",
            Intent::SeekingSafety => "seeking_safety",
        }
    }

    pub fn category(&self) -> IntentCategory {
        use Intent::*;
        match self {
            Venting | SeekingComfort | SeekingValidation | SharingFeelings
            | CelebratingSuccess | SeekingCompanionship => IntentCategory::EmotionalSupport,
            SeekingAdvice | BrainstormingSolutions | Troubleshooting | Planning
            | DecisionMakingSupport | ComparisonSeeking => IntentCategory::ProblemSolving,
            FactualQuery | ExplanationSeeking | ClarificationSeeking | ConfirmationSeeking => {
                IntentCategory::InformationExchange
            }
            SelfExploration | LearningSkill | GoalSetting | FeedbackSeeking | HabitFormation => {
                IntentCategory::SelfGrowth
            }
            CreativeGeneration | Roleplaying | BrainstormingIdeas | HumorEngagement => {
                IntentCategory::Creative
            }
            SmallTalk | SharingExperience | GratitudeExpression | PersuasionOrDebate => {
                IntentCategory::SocialRelational
            }
            GivingFeedback | GivingInstruction | Correction | ConversationManagement
            | ProceduralQuery | TestingBoundaries => IntentCategory::MetaInteraction,
            CrisisHelp | SeekingSafety => IntentCategory::SafetyCrisis,
        }
    }

    /// `crisis_help` and `seeking_safety` put the turn on the safety path.
    pub fn is_safety_critical(&self) -> bool {
        self.category() == IntentCategory::SafetyCrisis
    }

    /// Labels emitted by the older prompt variant, mapped onto the master list.
    fn from_legacy_alias(label: &str) -> Option<Intent> {
        match label {
            "self_reflection" => Some(Intent::SelfExploration),
            "gratitude" => Some(Intent::GratitudeExpression),
            "seeking_support" => Some(Intent::SeekingComfort),
            "seek_coping" | "seeking_coping" | "asking_for_advice" => Some(Intent::SeekingAdvice),
            "ask_info" => Some(Intent::FactualQuery),
            _ => None,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        Intent::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == wanted)
            .or_else(|| Intent::from_legacy_alias(&wanted))
            .ok_or_else(|| format!("unknown intent: {}", s))
    }
}

impl Serialize for Intent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Intent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Output of the intent stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub primary_intent: Intent,
    #[serde(default)]
    pub secondary_intents: BTreeSet<Intent>,
    pub confidence_score: f32,
    #[serde(default)]
    pub rationale: String,
}

// =============================================================================
// Tone
// =============================================================================

/// Overall polarity of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "positive" => Ok(Sentiment::Positive),
            "neutral" | "mixed" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            _ => Err(format!("unknown sentiment: {}", s)),
        }
    }
}

impl Serialize for Sentiment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Sentiment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Primary emotion families.
///
/// `Unknown` is never a valid analyzer answer; it only appears in the
/// degraded tone record used when the tone stage fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Emotion {
    // Positive
    Joy,
    Excitement,
    Gratitude,
    Pride,
    Relief,
    Hope,
    Love,
    Contentment,
    Serenity,
    Awe,
    // Negative
    Sadness,
    Anger,
    Fear,
    Anxiety,
    Guilt,
    Shame,
    Disgust,
    Loneliness,
    Jealousy,
    Frustration,
    Disappointment,
    Boredom,
    // Neutral / complex
    Surprise,
    Anticipation,
    Trust,
    Curiosity,
    Confusion,
    Empathy,
    Unknown,
}

impl Emotion {
    /// Every emotion an analyzer may report as primary.
    pub const ALL: [Emotion; 28] = [
        Emotion::Joy,
        Emotion::Excitement,
        Emotion::Gratitude,
        Emotion::Pride,
        Emotion::Relief,
        Emotion::Hope,
        Emotion::Love,
        Emotion::Contentment,
        Emotion::Serenity,
        Emotion::Awe,
        Emotion::Sadness,
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Anxiety,
        Emotion::Guilt,
        Emotion::Shame,
        Emotion::Disgust,
        Emotion::Loneliness,
        Emotion::Jealousy,
        Emotion::Frustration,
        Emotion::Disappointment,
        Emotion::Boredom,
        Emotion::Surprise,
        Emotion::Anticipation,
        Emotion::Trust,
        Emotion::Curiosity,
        Emotion::Confusion,
        Emotion::Empathy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Excitement => "excitement",
            Emotion::Gratitude => "gratitude",
            Emotion::Pride => "pride",
            Emotion::Relief => "relief",
            Emotion::Hope => "hope",
            Emotion::Love => "love",
            Emotion::Contentment => "contentment",
            Emotion::Serenity => "serenity",
            Emotion::Awe => "awe",
            Emotion::Sadness => "sadness",
            Emotion::Anger => "anger",
            Emotion::Fear => "fear",
            Emotion::Anxiety => "anxiety",
            Emotion::Guilt => "guilt",
            Emotion::Shame => "shame",
            Emotion::Disgust => "disgust",
            Emotion::Loneliness => "loneliness",
            Emotion::Jealousy => "jealousy",
            Emotion::Frustration => "frustration",
            Emotion::Disappointment => "disappointment",
            Emotion::Boredom => "boredom",
            Emotion::Surprise => "surprise",
            Emotion::Anticipation => "anticipation",
            Emotion::Trust => "trust",
            Emotion::Curiosity => "curiosity",
            Emotion::Confusion => "confusion",
            Emotion::Empathy => "empathy",
            Emotion::Unknown => "unknown",
        }
    }

    /// The sentiment this emotion family usually carries.
    pub fn polarity(&self) -> Sentiment {
        use Emotion::*;
        match self {
            Joy | Excitement | Gratitude | Pride | Relief | Hope | Love | Contentment
            | Serenity | Awe => Sentiment::Positive,
            Sadness | Anger | Fear | Anxiety | Guilt | Shame | Disgust | Loneliness
            | Jealousy | Frustration | Disappointment | Boredom => Sentiment::Negative,
            Surprise | Anticipation | Trust | Curiosity | Confusion | Empathy | Unknown => {
                Sentiment::Neutral
            }
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == wanted)
            .ok_or_else(|| format!("unknown emotion: {}", s))
    }
}

impl Serialize for Emotion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Emotion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if normalize_label(&raw) == "unknown" {
            return Ok(Emotion::Unknown);
        }
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Output of the tone stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneResult {
    pub primary_emotion: Emotion,
    /// Open vocabulary, not restricted to [`Emotion`].
    #[serde(default)]
    pub secondary_emotions: BTreeSet<String>,
    pub sentiment: Sentiment,
    pub intensity_score: f32,
    #[serde(default)]
    pub rationale: String,
}

impl ToneResult {
    /// Stand-in used when the tone stage fails; tone never gates safety.
    pub fn degraded() -> Self {
        Self {
            primary_emotion: Emotion::Unknown,
            secondary_emotions: BTreeSet::new(),
            sentiment: Sentiment::Neutral,
            intensity_score: 0.0,
            rationale: "tone unavailable".to_string(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.primary_emotion == Emotion::Unknown
    }
}

// =============================================================================
// Turn context
// =============================================================================

/// The merged, read-only analysis of one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnContext {
    pub entity: EntityResult,
    pub intent: IntentResult,
    pub tone: ToneResult,
}

impl TurnContext {
    /// Merge the three analyzer records. Each owns disjoint fields, so the
    /// merge is a pure, order-independent combination.
    pub fn merge(entity: EntityResult, intent: IntentResult, tone: ToneResult) -> Self {
        Self {
            entity,
            intent,
            tone,
        }
    }
}

// =============================================================================
// Input validation
// =============================================================================

/// Check an utterance before any stage runs and return it trimmed.
pub fn validate_utterance(text: &str, max_chars: usize) -> Result<&str, InputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    if trimmed.chars().count() > max_chars {
        return Err(InputError::TooLong(max_chars));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_round_trip_labels() {
        for t in EntityType::ALL {
            assert_eq!(t.as_str().parse::<EntityType>().unwrap(), t);
        }
    }

    #[test]
    fn test_entity_type_lenient_parse() {
        assert_eq!(
            "topic-mental-health".parse::<EntityType>().unwrap(),
            EntityType::TopicMentalHealth
        );
        assert_eq!(
            "Safety Signal".parse::<EntityType>().unwrap(),
            EntityType::SafetySignal
        );
        assert!("LOCATION".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_always_sensitive_types() {
        let sensitive: Vec<EntityType> = EntityType::ALL
            .into_iter()
            .filter(|t| t.is_always_sensitive())
            .collect();
        assert_eq!(sensitive, vec![EntityType::Pii, EntityType::SafetySignal]);
    }

    #[test]
    fn test_intent_master_list_is_closed() {
        assert_eq!(Intent::ALL.len(), 37);
        for i in Intent::ALL {
            assert_eq!(i.as_str().parse::<Intent>().unwrap(), i);
        }
        assert!("world_domination".parse::<Intent>().is_err());
    }

    #[test]
    fn test_intent_legacy_aliases() {
        assert_eq!(
            "self_reflection".parse::<Intent>().unwrap(),
            Intent::SelfExploration
        );
        assert_eq!(
            "gratitude".parse::<Intent>().unwrap(),
            Intent::GratitudeExpression
        );
        assert_eq!(
            "Seeking Support".parse::<Intent>().unwrap(),
            Intent::SeekingComfort
        );
    }

    #[test]
    fn test_safety_critical_intents() {
        let critical: Vec<Intent> = Intent::ALL
            .into_iter()
            .filter(|i| i.is_safety_critical())
            .collect();
        assert_eq!(critical, vec![Intent::CrisisHelp, Intent::SeekingSafety]);
    }

    #[test]
    fn test_intent_categories_cover_eight_groups() {
        let categories: std::collections::HashSet<IntentCategory> =
            Intent::ALL.iter().map(|i| i.category()).collect();
        assert_eq!(categories.len(), 8);
    }

    #[test]
    fn test_emotion_unknown_not_in_analyzer_list() {
        assert!(!Emotion::ALL.contains(&Emotion::Unknown));
        assert!("unknown".parse::<Emotion>().is_err());
        let parsed: Emotion = serde_json::from_str("\"unknown\"").unwrap();
        assert_eq!(parsed, Emotion::Unknown);
    }

    #[test]
    fn test_emotion_polarity() {
        assert_eq!(Emotion::Sadness.polarity(), Sentiment::Negative);
        assert_eq!(Emotion::Joy.polarity(), Sentiment::Positive);
        assert_eq!(Emotion::Curiosity.polarity(), Sentiment::Neutral);
    }

    #[test]
    fn test_sentiment_parse() {
        assert_eq!("NEGATIVE".parse::<Sentiment>().unwrap(), Sentiment::Negative);
        assert!("meh".parse::<Sentiment>().is_err());
    }

    #[test]
    fn test_entity_deserialize_defaults() {
        let json = r#"{"text":"exam","type":"TOPIC_ACADEMIC","normalized_value":"exam","confidence_score":0.9}"#;
        let entity: Entity = serde_json::from_str(json).unwrap();
        assert_eq!(entity.entity_type, EntityType::TopicAcademic);
        assert!(!entity.is_sensitive);
        assert!(entity.coreference_target.is_none());
    }

    #[test]
    fn test_entity_rejects_unknown_type() {
        let json = r#"{"text":"Paris","type":"LOCATION","normalized_value":"Paris","confidence_score":0.9}"#;
        assert!(serde_json::from_str::<Entity>(json).is_err());
    }

    #[test]
    fn test_degraded_tone() {
        let tone = ToneResult::degraded();
        assert!(tone.is_degraded());
        assert_eq!(tone.sentiment, Sentiment::Neutral);
        assert_eq!(tone.intensity_score, 0.0);
    }

    #[test]
    fn test_turn_context_serializes_deterministically() {
        let make = || {
            let mut secondary = BTreeSet::new();
            secondary.insert(Intent::SeekingComfort);
            secondary.insert(Intent::SelfExploration);
            TurnContext::merge(
                EntityResult {
                    topic_summary: "exam stress".into(),
                    entities: vec![],
                },
                IntentResult {
                    primary_intent: Intent::Venting,
                    secondary_intents: secondary,
                    confidence_score: 0.8,
                    rationale: "r".into(),
                },
                ToneResult::degraded(),
            )
        };
        let a = serde_json::to_string(&make()).unwrap();
        let b = serde_json::to_string(&make()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_validate_utterance() {
        assert_eq!(validate_utterance("  hi  ", 10).unwrap(), "hi");
        assert!(matches!(validate_utterance("", 10), Err(InputError::Empty)));
        assert!(matches!(
            validate_utterance(" \n\t ", 10),
            Err(InputError::Empty)
        ));
        assert!(matches!(
            validate_utterance("abcdef", 5),
            Err(InputError::TooLong(5))
        ));
    }

    #[test]
    fn test_stage_safety_relevance() {
        assert!(StageKind::Entity.is_safety_relevant());
        assert!(StageKind::Intent.is_safety_relevant());
        assert!(!StageKind::Tone.is_safety_relevant());
        assert!(!StageKind::Synthesis.is_safety_relevant());
    }
}
