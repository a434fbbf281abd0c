//! Instruction text for each analyzer stage.
//!
//! Every instruction carries the taxonomy version, the closed label set, the
//! output schema and one worked example. Labels are rendered from the core
//! enums so the prompt and the parser cannot drift apart.

use saarthi_core::types::{
    Emotion, EntityType, Intent, IntentCategory, Sentiment, TurnContext, TAXONOMY_VERSION,
};

fn header(role: &str) -> String {
    format!(
        "Role: {}\nTaxonomy version: {}\n\
         Output a single valid JSON object and nothing else. Never address the user.\n",
        role, TAXONOMY_VERSION
    )
}

fn entity_gloss(t: EntityType) -> &'static str {
    match t {
        EntityType::Person => "a specific person's name (\"Jane Doe\", \"Dr. Jones\")",
        EntityType::Relationship => "a social role or connection (\"my mother\", \"my boss\")",
        EntityType::TopicAcademic => "school or university topics (\"exam\", \"thesis\")",
        EntityType::TopicWork => "job or career topics (\"deadline\", \"project\")",
        EntityType::Event => "a specific occurrence (\"breakup\", \"interview\")",
        EntityType::TopicMentalHealth => "mental health concepts (\"my depression\", \"anxiety\")",
        EntityType::TopicPhysicalHealth => "physical health concepts (\"headaches\", \"sleep\")",
        EntityType::Symptom => "a symptom the user describes (\"panic attacks\", \"insomnia\")",
        EntityType::Treatment => "medical or therapeutic interventions (\"therapy\", \"medication\")",
        EntityType::CopingStrategy => "non-clinical ways of managing stress (\"journaling\")",
        EntityType::EmotionExplicit => "a feeling word the user used (\"sad\", \"lonely\")",
        EntityType::Pii => "personally identifying details (emails, phone numbers, addresses)",
        EntityType::SafetySignal => "any direct or indirect mention of self-harm, harm to others, or danger",
        EntityType::Pronoun => "a pronoun to resolve (\"he\", \"she\", \"it\", \"they\")",
    }
}

fn intent_gloss(i: Intent) -> &'static str {
    use Intent::*;
    match i {
        Venting => "expressing frustration or negative feelings without seeking a solution",
        SeekingComfort => "needing reassurance, empathy or soothing",
        SeekingValidation => "wanting confirmation that feelings or experiences are valid",
        SharingFeelings => "stating emotions to be heard",
        CelebratingSuccess => "sharing good news or achievements",
        SeekingCompanionship => "expressing loneliness or a wish for connection",
        SeekingAdvice => "asking for recommendations on a personal problem",
        BrainstormingSolutions => "generating ideas to solve a problem together",
        Troubleshooting => "diagnosing and fixing a specific issue",
        Planning => "organizing steps toward a goal",
        DecisionMakingSupport => "choosing between options",
        ComparisonSeeking => "asking for pros and cons",
        FactualQuery => "asking for a specific, objective fact",
        ExplanationSeeking => "asking for a concept to be explained",
        ClarificationSeeking => "asking for a previous statement to be made clearer",
        ConfirmationSeeking => "checking an understanding",
        SelfExploration => "thinking out loud about one's own thoughts or behavior",
        LearningSkill => "asking to be taught a skill",
        GoalSetting => "formulating personal or professional objectives",
        FeedbackSeeking => "asking for critique of one's work or ideas",
        HabitFormation => "building or breaking habits",
        CreativeGeneration => "requesting a story, poem or other content",
        Roleplaying => "engaging in a fictional scenario",
        BrainstormingIdeas => "generating creative ideas",
        HumorEngagement => "jokes and funny content",
        SmallTalk => "light conversation with no deep topic",
        SharingExperience => "recounting a personal story or event",
        GratitudeExpression => "saying thank you or showing appreciation",
        PersuasionOrDebate => "arguing a point",
        GivingFeedback => "commenting on the assistant's replies",
        GivingInstruction => "telling the assistant how to behave or format replies",
        Correction => "correcting an error from a previous turn",
        ConversationManagement => "steering the conversation, e.g. changing topic",
        ProceduralQuery => "asking what the assistant can do",
        TestingBoundaries => "probing the assistant's rules or limits",
        CrisisHelp => "thoughts of self-harm or immediate, severe distress",
        SeekingSafety => "a situation of immediate physical danger",
    }
}

fn category_title(c: IntentCategory) -> &'static str {
    match c {
        IntentCategory::EmotionalSupport => "Emotional Support & Expression",
        IntentCategory::ProblemSolving => "Problem-Solving & Decision Making",
        IntentCategory::InformationExchange => "Information Exchange",
        IntentCategory::SelfGrowth => "Self-Growth & Learning",
        IntentCategory::Creative => "Creative & Entertainment",
        IntentCategory::SocialRelational => "Social & Relational",
        IntentCategory::MetaInteraction => "Meta-Interaction & System Commands",
        IntentCategory::SafetyCrisis => "Safety & Crisis",
    }
}

/// Instructions for the entity stage.
pub fn entity_instructions() -> String {
    let mut out = header("named entity recognition and coreference resolution for a support conversation.");
    out.push_str(
        "\nSteps:\n\
         1. Extract every relevant entity and classify it with exactly one type below.\n\
         2. For each pronoun, set coreference_target to the normalized_value of the EARLIER entity it refers to, or null.\n\
         3. Give each entity a normalized_value and a confidence_score between 0.0 and 1.0.\n\
         4. Set is_sensitive to true for every PII and SAFETY_SIGNAL entity.\n\
         5. Write a topic_summary of at most five words.\n\
         \nEntity types:\n",
    );
    for t in EntityType::ALL {
        out.push_str(&format!("- {}: {}\n", t.as_str(), entity_gloss(t)));
    }
    out.push_str(
        r#"
Schema:
{"topic_summary": string, "entities": [{"text": string, "type": string, "normalized_value": string, "is_sensitive": bool, "confidence_score": number, "coreference_target": string or null}]}

Example input: "My manager is giving me impossible deadlines. He is making my anxiety spike."
Example output:
{"topic_summary": "work pressure and anxiety", "entities": [
 {"text": "My manager", "type": "RELATIONSHIP", "normalized_value": "manager", "is_sensitive": false, "confidence_score": 0.95, "coreference_target": null},
 {"text": "deadlines", "type": "TOPIC_WORK", "normalized_value": "deadlines", "is_sensitive": false, "confidence_score": 1.0, "coreference_target": null},
 {"text": "He", "type": "PRONOUN", "normalized_value": "he", "is_sensitive": false, "confidence_score": 0.9, "coreference_target": "manager"},
 {"text": "anxiety", "type": "TOPIC_MENTAL_HEALTH", "normalized_value": "anxiety", "is_sensitive": false, "confidence_score": 1.0, "coreference_target": null}]}
"#,
    );
    out
}

/// Instructions for the intent stage.
pub fn intent_instructions() -> String {
    let mut out = header("intent classification for a support conversation.");
    out.push_str(
        "\nSteps:\n\
         1. Pick the single most fitting primary_intent from the master list.\n\
         2. List any less dominant goals as secondary_intents (never repeat the primary).\n\
         3. Give a confidence_score between 0.0 and 1.0 and a short rationale citing the wording.\n\
         4. Any expression of self-harm or immediate danger is crisis_help or seeking_safety, whatever else the message says.\n\
         \nMaster list:\n",
    );
    let mut current: Option<IntentCategory> = None;
    for intent in Intent::ALL {
        let category = intent.category();
        if current != Some(category) {
            out.push_str(&format!("{}:\n", category_title(category)));
            current = Some(category);
        }
        out.push_str(&format!("- {}: {}\n", intent.as_str(), intent_gloss(intent)));
    }
    out.push_str(
        r#"
Schema:
{"primary_intent": string, "secondary_intents": [string], "confidence_score": number, "rationale": string}

Example input: "I've been trying to learn guitar but I keep messing up the F chord. Any tips?"
Example output:
{"primary_intent": "learning_skill", "secondary_intents": ["seeking_advice"], "confidence_score": 0.95, "rationale": "Asks to learn a technique and explicitly asks for tips."}
"#,
    );
    out
}

/// Instructions for the tone stage.
pub fn tone_instructions() -> String {
    let mut out = header("emotion, sentiment and intensity detection for a support conversation.");
    out.push_str("\nPrimary emotions (choose exactly one):\n");
    let mut by_polarity: Vec<(Sentiment, Vec<&str>)> = vec![
        (Sentiment::Positive, Vec::new()),
        (Sentiment::Negative, Vec::new()),
        (Sentiment::Neutral, Vec::new()),
    ];
    for emotion in Emotion::ALL {
        if let Some((_, list)) = by_polarity.iter_mut().find(|(s, _)| *s == emotion.polarity()) {
            list.push(emotion.as_str());
        }
    }
    for (sentiment, list) in by_polarity {
        out.push_str(&format!("- {}: {}\n", sentiment, list.join(", ")));
    }
    out.push_str(
        r#"
secondary_emotions is open vocabulary for nuance (e.g. melancholy, annoyance).
sentiment is one of positive, neutral, negative.
intensity_score runs from 0.0 (very mild) to 1.0 (very strong); weigh repeated punctuation, ALL CAPS, emoji and word choice.
If the previous turn was a crisis, raise intensity conservatively and note the urgency in the rationale.

Schema:
{"primary_emotion": string, "secondary_emotions": [string], "sentiment": string, "intensity_score": number, "rationale": string}

Example input: "I'm a bit worried about the presentation tomorrow."
Example output:
{"primary_emotion": "anxiety", "secondary_emotions": ["fear"], "sentiment": "negative", "intensity_score": 0.4, "rationale": "'a bit worried' signals mild anxiety about a future event."}
"#,
    );
    out
}

/// Hidden context block describing the previous turn's analysis.
pub fn render_prior_context(prior: &TurnContext) -> String {
    let record = serde_json::to_string(prior).unwrap_or_default();
    format!(
        "Previous turn analysis (taxonomy v{}). Advisory only; analyze the new message on its own terms.\n{}",
        TAXONOMY_VERSION, record
    )
}
