//! Template reply writer driven by the hidden turn brief.
//!
//! Replies are plain prose of two to five sentences. Nothing from the
//! brief is quoted verbatim except grounding titles and non-sensitive
//! topic words.

use saarthi_core::brief::SynthesisBrief;
use saarthi_core::types::{Emotion, Entity, EntityType, Intent, IntentCategory, TurnContext};

/// Which voice the reply is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Crisis,
    Safety,
    Validating,
    Practical,
    Warm,
    Neutral,
}

impl Register {
    /// Pick the register for a turn. The safety flag overrides everything.
    pub fn for_brief(brief: &SynthesisBrief) -> Self {
        let intent = brief.context.intent.primary_intent;
        if intent == Intent::SeekingSafety {
            return Register::Safety;
        }
        if brief.safety_flag {
            return Register::Crisis;
        }
        match intent {
            Intent::CelebratingSuccess | Intent::GratitudeExpression => Register::Warm,
            Intent::Venting
            | Intent::SeekingComfort
            | Intent::SeekingValidation
            | Intent::SharingFeelings
            | Intent::SeekingCompanionship
            | Intent::SelfExploration
            | Intent::SharingExperience => Register::Validating,
            other => match other.category() {
                IntentCategory::ProblemSolving
                | IntentCategory::SelfGrowth
                | IntentCategory::InformationExchange => Register::Practical,
                _ => Register::Neutral,
            },
        }
    }
}

/// Writes the user-facing reply for a brief.
#[derive(Debug, Default, Clone)]
pub struct ReplyComposer;

impl ReplyComposer {
    pub fn new() -> Self {
        Self
    }

    pub fn compose(&self, brief: &SynthesisBrief) -> String {
        let ctx = &brief.context;
        let sentences: Vec<String> = match Register::for_brief(brief) {
            Register::Crisis => crisis(ctx),
            Register::Safety => safety(),
            Register::Validating => validating(ctx, &brief.grounding),
            Register::Practical => practical(ctx, &brief.grounding),
            Register::Warm => warm(ctx),
            Register::Neutral => neutral(ctx),
        };
        sentences.join(" ")
    }
}

fn crisis(ctx: &TurnContext) -> Vec<String> {
    let mut out = vec![
        "I'm really glad you told me, and I'm so sorry you're carrying this much pain right now."
            .to_string(),
    ];
    if ctx.tone.intensity_score >= 0.7 {
        out.push("You don't have to go through this moment alone.".to_string());
    }
    out.push(
        "Please reach out to a crisis line now: in the US you can call or text 988, or contact your local helpline or emergency services."
            .to_string(),
    );
    out.push("If you can, let someone you trust know how you're feeling, and I'm here to keep talking with you.".to_string());
    out
}

fn safety() -> Vec<String> {
    vec![
        "Your safety matters most right now.".to_string(),
        "If you are in immediate danger, please call your local emergency number, such as 911 or 112, or get to a safe place."
            .to_string(),
        "You can also call or text 988 to talk with someone right away.".to_string(),
    ]
}

fn validating(ctx: &TurnContext, grounding: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    match topic_phrase(&ctx.entity.entities) {
        Some(topic) => out.push(format!(
            "I'm really sorry, it sounds like {} {} been weighing on you.",
            topic.text,
            if topic.plural { "have" } else { "has" }
        )),
        None => out.push("Thank you for telling me how you're feeling.".to_string()),
    }

    if let Some(feeling) = feeling_phrase(ctx.tone.primary_emotion) {
        if ctx.tone.intensity_score >= 0.7 {
            out.push(format!(
                "It makes complete sense to feel {} when something hits this hard.",
                feeling
            ));
        } else {
            out.push(format!("Feeling {} about this is understandable.", feeling));
        }
    } else {
        out.push("That sounds like a lot to carry.".to_string());
    }

    let self_critical = ctx.tone.secondary_emotions.contains("self-criticism")
        || matches!(ctx.tone.primary_emotion, Emotion::Shame | Emotion::Guilt);
    if self_critical {
        out.push(
            "One hard moment doesn't define your worth, and being this hard on yourself shows how much it mattered to you."
                .to_string(),
        );
    }

    if let Some(title) = grounding.first().and_then(|g| tip_title(g)) {
        out.push(format!(
            "If it would help, we could try {} together.",
            title.to_lowercase()
        ));
    }
    out.push("Do you want to tell me more about what happened?".to_string());
    out.truncate(5);
    out
}

fn practical(ctx: &TurnContext, grounding: &[String]) -> Vec<String> {
    let mut out = vec![match topic_phrase(&ctx.entity.entities) {
        Some(topic) => format!("Let's think through {} together.", topic.text),
        None => "Let's think this through together.".to_string(),
    }];
    if let Some(tip) = grounding.first() {
        out.push(format!("One thing that often helps is {}", sentence(tip)));
    } else {
        out.push("Breaking it into one small next step can make it feel more manageable.".to_string());
    }
    out.push("What feels like the most pressing part of it for you right now?".to_string());
    out
}

fn warm(ctx: &TurnContext) -> Vec<String> {
    let mut out = vec!["That's wonderful to hear!".to_string()];
    match ctx.intent.primary_intent {
        Intent::GratitudeExpression => {
            out.push("Thank you for saying that, it means a lot.".to_string())
        }
        _ => out.push("You should feel proud of what you've accomplished.".to_string()),
    }
    out.push("How are you planning to celebrate?".to_string());
    out
}

fn neutral(ctx: &TurnContext) -> Vec<String> {
    let mut out = vec!["Thanks for sharing that with me.".to_string()];
    if let Some(topic) = topic_phrase(&ctx.entity.entities) {
        out.push(format!("I'd like to hear more about {}.", topic.text));
    } else {
        out.push("I'm here and happy to keep talking.".to_string());
    }
    out
}

/// A topic phrased for use as the subject of a sentence.
#[derive(Debug, PartialEq)]
struct Topic {
    text: String,
    plural: bool,
}

/// Human phrasing of the most prominent non-sensitive topic.
fn topic_phrase(entities: &[Entity]) -> Option<Topic> {
    entities
        .iter()
        .filter(|e| !e.is_sensitive)
        .find_map(|e| match e.entity_type {
            EntityType::Relationship => Some(Topic {
                text: format!("things with your {}", e.normalized_value),
                plural: true,
            }),
            EntityType::TopicAcademic
            | EntityType::TopicWork
            | EntityType::Event
            | EntityType::TopicMentalHealth
            | EntityType::TopicPhysicalHealth
            | EntityType::Symptom => noun_topic(&e.normalized_value.to_lowercase()),
            _ => None,
        })
}

/// Turn an extracted value into a noun phrase. Verbal and adjectival
/// values get a gerund frame and no article.
fn noun_topic(value: &str) -> Option<Topic> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let bare = |text: &str| Topic {
        text: text.to_string(),
        plural: false,
    };
    let topic = match value.replace('\'', "").as_str() {
        "cant sleep" => bare("trouble sleeping"),
        "cant breathe" => bare("struggling to breathe"),
        "numb" => bare("feeling numb"),
        "sick" => bare("feeling sick"),
        "fired" => bare("getting fired"),
        "burned out" | "burnt out" => bare("the burnout"),
        v if v.starts_with("cant ") => return None,
        _ => Topic {
            text: format!("the {}", value),
            plural: is_plural(value),
        },
    };
    Some(topic)
}

/// Rough English plural check on the last word.
fn is_plural(phrase: &str) -> bool {
    let last = phrase.rsplit(' ').next().unwrap_or(phrase);
    last.len() > 3
        && last.ends_with('s')
        && !last.ends_with("ss")
        && !last.ends_with("is")
        && !last.ends_with("us")
}

fn feeling_phrase(emotion: Emotion) -> Option<&'static str> {
    let phrase = match emotion {
        Emotion::Sadness | Emotion::Disappointment => "sad and disappointed",
        Emotion::Anger | Emotion::Frustration => "frustrated",
        Emotion::Fear | Emotion::Anxiety => "anxious",
        Emotion::Guilt | Emotion::Shame => "down on yourself",
        Emotion::Loneliness => "lonely",
        Emotion::Confusion => "unsure",
        Emotion::Boredom => "stuck",
        Emotion::Jealousy | Emotion::Disgust => "upset",
        _ => return None,
    };
    Some(phrase)
}

/// Title part of a "Title: sentence" grounding digest.
fn tip_title(digest: &str) -> Option<&str> {
    digest
        .split_once(':')
        .map(|(title, _)| title.trim())
        .filter(|t| !t.is_empty())
}

/// Lower-case the first letter of a digest and end it with a period.
fn sentence(digest: &str) -> String {
    let body = digest.trim().trim_end_matches('…');
    let mut chars = body.chars();
    let mut out = match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    if !out.ends_with(['.', '!', '?']) {
        out.push('.');
    }
    out
}
