//! Lexicon-based emotion, sentiment and intensity scoring.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use saarthi_core::types::{Emotion, Sentiment, ToneResult};

/// Emotion lexicon: word, emotion family, weight.
const LEXICON: &[(&str, Emotion, f32)] = &[
    // Sadness
    ("sad", Emotion::Sadness, 0.6),
    ("failed", Emotion::Sadness, 0.6),
    ("fail", Emotion::Sadness, 0.5),
    ("failing", Emotion::Sadness, 0.5),
    ("depressed", Emotion::Sadness, 0.8),
    ("miserable", Emotion::Sadness, 0.8),
    ("heartbroken", Emotion::Sadness, 0.8),
    ("crying", Emotion::Sadness, 0.7),
    ("cry", Emotion::Sadness, 0.6),
    ("hopeless", Emotion::Sadness, 0.8),
    ("empty", Emotion::Sadness, 0.5),
    ("lost", Emotion::Sadness, 0.4),
    ("die", Emotion::Sadness, 0.8),
    ("hurt", Emotion::Sadness, 0.5),
    ("awful", Emotion::Sadness, 0.5),
    ("terrible", Emotion::Sadness, 0.5),
    // Anger / frustration
    ("angry", Emotion::Anger, 0.7),
    ("furious", Emotion::Anger, 0.9),
    ("mad", Emotion::Anger, 0.6),
    ("hate", Emotion::Anger, 0.6),
    ("annoyed", Emotion::Frustration, 0.5),
    ("frustrated", Emotion::Frustration, 0.7),
    ("frustrating", Emotion::Frustration, 0.6),
    ("ugh", Emotion::Frustration, 0.4),
    ("stuck", Emotion::Frustration, 0.4),
    ("yelled", Emotion::Anger, 0.5),
    ("yelling", Emotion::Anger, 0.5),
    ("screamed", Emotion::Anger, 0.5),
    ("shouted", Emotion::Anger, 0.4),
    ("argued", Emotion::Frustration, 0.4),
    ("fight", Emotion::Frustration, 0.4),
    ("fought", Emotion::Frustration, 0.4),
    ("ignored", Emotion::Frustration, 0.4),
    ("ignores", Emotion::Frustration, 0.4),
    ("unfair", Emotion::Frustration, 0.5),
    // Fear / anxiety
    ("scared", Emotion::Fear, 0.7),
    ("afraid", Emotion::Fear, 0.7),
    ("terrified", Emotion::Fear, 0.9),
    ("unsafe", Emotion::Fear, 0.8),
    ("danger", Emotion::Fear, 0.8),
    ("anxious", Emotion::Anxiety, 0.7),
    ("anxiety", Emotion::Anxiety, 0.6),
    ("worried", Emotion::Anxiety, 0.5),
    ("nervous", Emotion::Anxiety, 0.5),
    ("panic", Emotion::Anxiety, 0.8),
    ("stressed", Emotion::Anxiety, 0.6),
    ("overwhelmed", Emotion::Anxiety, 0.7),
    // Self-directed
    ("guilty", Emotion::Guilt, 0.7),
    ("sorry", Emotion::Guilt, 0.3),
    ("ashamed", Emotion::Shame, 0.8),
    ("embarrassed", Emotion::Shame, 0.6),
    ("stupid", Emotion::Shame, 0.5),
    ("worthless", Emotion::Shame, 0.8),
    ("useless", Emotion::Shame, 0.6),
    ("idiot", Emotion::Shame, 0.5),
    ("disgusted", Emotion::Disgust, 0.7),
    ("gross", Emotion::Disgust, 0.4),
    ("lonely", Emotion::Loneliness, 0.8),
    ("alone", Emotion::Loneliness, 0.5),
    ("isolated", Emotion::Loneliness, 0.7),
    ("jealous", Emotion::Jealousy, 0.7),
    ("envious", Emotion::Jealousy, 0.6),
    ("disappointed", Emotion::Disappointment, 0.7),
    ("letdown", Emotion::Disappointment, 0.5),
    ("bored", Emotion::Boredom, 0.6),
    ("boring", Emotion::Boredom, 0.4),
    // Positive
    ("happy", Emotion::Joy, 0.7),
    ("glad", Emotion::Joy, 0.5),
    ("amazing", Emotion::Joy, 0.7),
    ("great", Emotion::Joy, 0.4),
    ("won", Emotion::Joy, 0.6),
    ("excited", Emotion::Excitement, 0.8),
    ("thrilled", Emotion::Excitement, 0.9),
    ("thank", Emotion::Gratitude, 0.6),
    ("thanks", Emotion::Gratitude, 0.6),
    ("grateful", Emotion::Gratitude, 0.8),
    ("appreciate", Emotion::Gratitude, 0.6),
    ("proud", Emotion::Pride, 0.8),
    ("passed", Emotion::Pride, 0.5),
    ("relieved", Emotion::Relief, 0.7),
    ("finally", Emotion::Relief, 0.3),
    ("hopeful", Emotion::Hope, 0.7),
    ("hope", Emotion::Hope, 0.4),
    ("love", Emotion::Love, 0.6),
    ("content", Emotion::Contentment, 0.5),
    ("calm", Emotion::Serenity, 0.6),
    ("peaceful", Emotion::Serenity, 0.7),
    ("awe", Emotion::Awe, 0.7),
    // Neutral / complex
    ("surprised", Emotion::Surprise, 0.6),
    ("shocked", Emotion::Surprise, 0.7),
    ("wow", Emotion::Surprise, 0.4),
    ("waiting", Emotion::Anticipation, 0.3),
    ("tomorrow", Emotion::Anticipation, 0.2),
    ("trust", Emotion::Trust, 0.5),
    ("curious", Emotion::Curiosity, 0.6),
    ("wonder", Emotion::Curiosity, 0.4),
    ("confused", Emotion::Confusion, 0.7),
    ("confusing", Emotion::Confusion, 0.5),
];

const INTENSIFIERS: &[&str] = &["so", "really", "very", "extremely", "totally", "completely"];

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z']+").expect("word regex"));

static SELF_DEPRECATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:i'?m|i\s+am)\s+(?:so\s+|such\s+an?\s+|just\s+)?(?:stupid|dumb|useless|worthless|an?\s+idiot|an?\s+failure|pathetic)\b|\bi\s+hate\s+myself\b",
    )
    .expect("self-deprecation regex")
});

static CRISIS_WORDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:end|take)\s+my\s+(?:own\s+)?life\b|\bkill(?:ing)?\s+myself\b|\bsuicid",
        r"|\bwant\s+to\s+die\b|\b(?:hurt|harm|cut)(?:ing)?\s+myself\b|\bend\s+it\s+all\b",
        r"|\bbetter\s+off\s+(?:dead|without\s+me)\b|\bno\s+reason\s+to\s+live\b",
        r"|\b(?:no\s*one|nobody)\s+would\s+(?:even\s+)?(?:miss\s+me|care|notice)\b",
        r"|\bif\s+i\s+(?:was|were)\s+(?:gone|dead)\b|\bwant\s+to\s+(?:just\s+)?disappear\b",
        r"|\bcan'?t\s+go\s+on\b",
    ))
    .expect("crisis regex")
});

/// Being shut out or dismissed by someone.
static DISMISSAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:never|doesn'?t|don'?t|won'?t)\s+(?:ever\s+)?(?:listens?|cares?|understands?)\b")
        .expect("dismissal regex")
});

const DISTRESS_EMOJI: &[char] = &['😭', '😢', '😞', '😔', '💔', '😡', '😩'];
const CELEBRATION_EMOJI: &[char] = &['🎉', '🥳', '😄', '😊', '❤'];

/// Scores tone from wording, punctuation, capitalization and emoji.
#[derive(Debug, Default)]
pub struct ToneScorer;

impl ToneScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, text: &str) -> ToneResult {
        let mut totals: BTreeMap<Emotion, f32> = BTreeMap::new();
        let mut first_seen: Vec<Emotion> = Vec::new();
        let mut cues: Vec<String> = Vec::new();
        let mut intensifiers = 0usize;
        let mut caps_words = 0usize;

        for m in WORD.find_iter(text) {
            let raw = m.as_str();
            let word = raw.to_lowercase();
            if raw.len() >= 3 && raw.chars().all(|c| c.is_ascii_uppercase()) {
                caps_words += 1;
            }
            if INTENSIFIERS.contains(&word.as_str()) {
                intensifiers += 1;
            }
            if let Some((_, emotion, weight)) = LEXICON.iter().find(|(w, _, _)| *w == word) {
                *totals.entry(*emotion).or_insert(0.0) += weight;
                if !first_seen.contains(emotion) {
                    first_seen.push(*emotion);
                }
                cues.push(format!("word '{}'", word));
            }
        }

        let crisis = CRISIS_WORDING.is_match(text);
        if crisis {
            *totals.entry(Emotion::Sadness).or_insert(0.0) += 1.0;
            if !first_seen.contains(&Emotion::Sadness) {
                first_seen.insert(0, Emotion::Sadness);
            }
            cues.push("crisis wording".to_string());
        }

        if DISMISSAL.is_match(text) {
            *totals.entry(Emotion::Frustration).or_insert(0.0) += 0.5;
            if !first_seen.contains(&Emotion::Frustration) {
                first_seen.push(Emotion::Frustration);
            }
            cues.push("dismissive phrase".to_string());
        }

        let self_deprecating = SELF_DEPRECATION.is_match(text);
        if self_deprecating {
            cues.push("self-deprecating phrase".to_string());
        }

        let exclamation_run = longest_run(text, '!');
        if exclamation_run >= 2 {
            cues.push(format!("{} exclamation marks", exclamation_run));
        }
        if caps_words > 0 {
            cues.push("capitalized words".to_string());
        }
        let distress_emoji = text.chars().any(|c| DISTRESS_EMOJI.contains(&c));
        let celebration_emoji = text.chars().any(|c| CELEBRATION_EMOJI.contains(&c));
        if distress_emoji {
            *totals.entry(Emotion::Sadness).or_insert(0.0) += 0.5;
            if !first_seen.contains(&Emotion::Sadness) {
                first_seen.push(Emotion::Sadness);
            }
            cues.push("distress emoji".to_string());
        }
        if celebration_emoji {
            *totals.entry(Emotion::Joy).or_insert(0.0) += 0.5;
            if !first_seen.contains(&Emotion::Joy) {
                first_seen.push(Emotion::Joy);
            }
            cues.push("celebration emoji".to_string());
        }

        // Highest total wins; ties go to the emotion mentioned first.
        let primary_emotion = first_seen
            .iter()
            .copied()
            .fold(None::<(Emotion, f32)>, |best, e| {
                let score = totals.get(&e).copied().unwrap_or(0.0);
                match best {
                    Some((_, b)) if b >= score => best,
                    _ => Some((e, score)),
                }
            })
            .map(|(e, _)| e)
            .unwrap_or(if text.contains('?') {
                Emotion::Curiosity
            } else {
                Emotion::Trust
            });

        let mut positive = 0.0f32;
        let mut negative = 0.0f32;
        for (emotion, weight) in &totals {
            match emotion.polarity() {
                Sentiment::Positive => positive += weight,
                Sentiment::Negative => negative += weight,
                Sentiment::Neutral => {}
            }
        }
        let sentiment = if negative > positive {
            Sentiment::Negative
        } else if positive > negative {
            Sentiment::Positive
        } else {
            Sentiment::Neutral
        };

        let lexicon_weight: f32 = totals.values().sum();
        let mut intensity = 0.1 + 0.4 * lexicon_weight.min(1.0);
        intensity += match exclamation_run {
            0 => 0.0,
            1 => 0.1,
            _ => 0.2,
        };
        intensity += (0.1 * caps_words as f32).min(0.2);
        intensity += (0.05 * intensifiers as f32).min(0.1);
        if self_deprecating {
            intensity += 0.2;
        }
        if distress_emoji || celebration_emoji {
            intensity += 0.15;
        }
        if crisis {
            intensity += 0.4;
        }

        let secondary_emotions: BTreeSet<String> = totals
            .keys()
            .filter(|e| **e != primary_emotion)
            .map(|e| e.as_str().to_string())
            .chain(self_deprecating.then(|| "self-criticism".to_string()))
            .collect();

        let rationale = if cues.is_empty() {
            "No strong emotional cues.".to_string()
        } else {
            format!("Based on {}.", cues.join(", "))
        };

        ToneResult {
            primary_emotion,
            secondary_emotions,
            sentiment,
            intensity_score: intensity.clamp(0.0, 1.0),
            rationale,
        }
    }
}

fn longest_run(text: &str, ch: char) -> usize {
    let mut best = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == ch {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}
