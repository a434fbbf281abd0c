//! Entity extraction from utterance text.

use std::collections::HashMap;

use regex::Regex;
use saarthi_core::redact::{find_pii, PiiType};
use saarthi_core::types::{Entity, EntityResult, EntityType};

/// Extracts entities across the taxonomy with lexicon regexes.
pub struct EntityExtractor {
    /// Ordered by priority: earlier rules win overlapping spans.
    rules: Vec<(EntityType, Regex, f32)>,
    person_regex: Regex,
    relationship_regex: Regex,
    pronoun_regex: Regex,
}

/// Canonical names for relationship words.
fn canonical_relationship(word: &str) -> &str {
    match word {
        "mom" | "mum" | "mommy" => "mother",
        "dad" | "daddy" => "father",
        "bf" => "boyfriend",
        "gf" => "girlfriend",
        "grandma" => "grandmother",
        "grandpa" => "grandfather",
        "coworker" => "colleague",
        other => other,
    }
}

impl EntityExtractor {
    /// Create a new entity extractor with pre-compiled regex patterns.
    pub fn new() -> Self {
        let lexicon: Vec<(EntityType, &str, f32)> = vec![
            (
                EntityType::SafetySignal,
                concat!(
                    r"(?i)\b(?:",
                    r"(?:end|take)\s+my\s+(?:own\s+)?life|kill(?:ing)?\s+myself|suicid(?:e|al)",
                    r"|(?:want|wanna|going)\s+(?:to\s+)?die|(?:hurt|harm|cut)(?:ing)?\s+myself|self[-\s]?harm",
                    r"|end\s+it\s+all|better\s+off\s+(?:dead|without\s+me)",
                    r"|no\s+(?:reason|point)\s+(?:to|in)\s+(?:live|living)",
                    r"|don'?t\s+want\s+to\s+(?:be\s+alive|live|exist|wake\s+up)",
                    r"|(?:no\s*one|nobody)\s+would\s+(?:even\s+)?miss\s+me",
                    r"|(?:no\s*one|nobody)\s+would\s+(?:even\s+)?(?:care|notice)\s+if\s+i",
                    r"|if\s+i\s+(?:was|were)\s+(?:gone|dead|not\s+(?:here|around))",
                    r"|wish\s+i\s+(?:was|were)\s+(?:dead|gone|never\s+born)",
                    r"|(?:want|wanna|wish\s+i\s+could)\s+(?:to\s+)?(?:just\s+)?disappear",
                    r"|can'?t\s+go\s+on|can'?t\s+do\s+this\s+any\s*more",
                    r"|not\s+safe|in\s+danger",
                    r")\b",
                ),
                0.95,
            ),
            (
                EntityType::Symptom,
                r"(?i)\b(?:panic\s+attacks?|insomnia|nightmares?|can'?t\s+sleep|can'?t\s+breathe|racing\s+thoughts|numb(?:ness)?|flashbacks?)\b",
                0.9,
            ),
            (
                EntityType::TopicMentalHealth,
                r"(?i)\b(?:depression|anxiety|stress|burnout|burn(?:ed|t)\s+out|trauma|ptsd|ocd|adhd|mental\s+health)\b",
                0.9,
            ),
            (
                EntityType::TopicPhysicalHealth,
                r"(?i)\b(?:headaches?|migraines?|sleep|pain|sick|illness|injury|fatigue|appetite)\b",
                0.85,
            ),
            (
                EntityType::Treatment,
                r"(?i)\b(?:therapy|therapist|medication|meds|antidepressants?|counsel(?:l)?ing|counsel(?:l)?or|psychiatrist)\b",
                0.9,
            ),
            (
                EntityType::CopingStrategy,
                r"(?i)\b(?:meditat(?:ion|ing)|journal(?:ing)?|exercis(?:e|ing)|breathing\s+exercises?|yoga|going\s+for\s+(?:a\s+)?walks?)\b",
                0.85,
            ),
            (
                EntityType::TopicAcademic,
                r"(?i)\b(?:exams?|tests?|thesis|assignments?|homework|grades?|class(?:es)?|school|college|university|semester|finals|midterms?|quiz(?:zes)?)\b",
                0.9,
            ),
            (
                EntityType::TopicWork,
                r"(?i)\b(?:job|work|deadlines?|projects?|meetings?|promotion|salary|office|career|fired|layoffs?)\b",
                0.85,
            ),
            (
                EntityType::Event,
                r"(?i)\b(?:break[-\s]?up|interview|wedding|funeral|divorce|birthday|presentation|accident|championship)\b",
                0.85,
            ),
            (
                EntityType::EmotionExplicit,
                r"(?i)\b(?:sad|lonely|happy|angry|anxious|scared|depressed|hopeless|worthless|overwhelmed|stressed|tired|ashamed|guilty|frustrated|excited|grateful|proud|stupid)\b",
                0.8,
            ),
        ];

        let rules = lexicon
            .into_iter()
            .map(|(t, pat, conf)| (t, Regex::new(pat).expect("Invalid entity regex"), conf))
            .collect();

        Self {
            rules,
            person_regex: Regex::new(r"\b(?:Mr|Mrs|Ms|Dr|Prof)\.?\s+[A-Z][a-z]+\b")
                .expect("Invalid person regex"),
            relationship_regex: Regex::new(
                r"(?i)\bmy\s+(?:best\s+friend|mom|mum|mommy|mother|dad|daddy|father|parents?|sister|brother|siblings?|boyfriend|girlfriend|bf|gf|partner|husband|wife|friends?|boss|manager|teacher|professor|roommate|son|daughter|grandma|grandmother|grandpa|grandfather|family|coworker|colleague)\b",
            )
            .expect("Invalid relationship regex"),
            pronoun_regex: Regex::new(r"(?i)\b(?:he|she|him|her|they|them|it)\b")
                .expect("Invalid pronoun regex"),
        }
    }

    /// Extract all recognized entities, in order of appearance.
    pub fn extract(&self, text: &str) -> EntityResult {
        // (start, end, entity)
        let mut spans: Vec<(usize, usize, Entity)> = Vec::new();
        let mut push = |start: usize, end: usize, entity: Entity| {
            let overlaps = spans.iter().any(|(s, e, _)| start < *e && *s < end);
            if !overlaps {
                spans.push((start, end, entity));
            }
        };

        for m in find_pii(text) {
            let normalized = match m.pii_type {
                PiiType::Email => "email address",
                PiiType::PhoneNumber => "phone number",
                PiiType::Ssn => "social security number",
                PiiType::CreditCard => "card number",
            };
            push(
                m.start,
                m.end,
                entity(&m.text, EntityType::Pii, normalized, 1.0),
            );
        }

        // Safety signals first among lexicon rules so they are never shadowed.
        for (entity_type, regex, conf) in &self.rules {
            for m in regex.find_iter(text) {
                push(
                    m.start(),
                    m.end(),
                    entity(m.as_str(), *entity_type, &m.as_str().to_lowercase(), *conf),
                );
            }
        }

        for m in self.person_regex.find_iter(text) {
            let mut e = entity(m.as_str(), EntityType::Person, m.as_str(), 0.9);
            e.is_sensitive = true;
            push(m.start(), m.end(), e);
        }

        for m in self.relationship_regex.find_iter(text) {
            let lower = m.as_str().to_lowercase();
            let word = lower.trim_start_matches("my").trim();
            let normalized = canonical_relationship(word).to_string();
            push(
                m.start(),
                m.end(),
                entity(m.as_str(), EntityType::Relationship, &normalized, 0.95),
            );
        }

        for m in self.pronoun_regex.find_iter(text) {
            push(
                m.start(),
                m.end(),
                entity(m.as_str(), EntityType::Pronoun, &m.as_str().to_lowercase(), 0.8),
            );
        }

        spans.sort_by_key(|(start, _, _)| *start);
        let mut entities: Vec<Entity> = spans.into_iter().map(|(_, _, e)| e).collect();
        resolve_pronouns(&mut entities);

        EntityResult {
            topic_summary: summarize(&entities),
            entities,
        }
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn entity(text: &str, entity_type: EntityType, normalized: &str, confidence: f32) -> Entity {
    Entity {
        text: text.to_string(),
        entity_type,
        normalized_value: normalized.to_string(),
        is_sensitive: entity_type.is_always_sensitive(),
        confidence_score: confidence,
        coreference_target: None,
    }
}

/// Point personal pronouns at the nearest earlier person or relationship and
/// "it" at the nearest earlier topic-like entity.
fn resolve_pronouns(entities: &mut [Entity]) {
    for idx in 0..entities.len() {
        if entities[idx].entity_type != EntityType::Pronoun {
            continue;
        }
        let personal = entities[idx].normalized_value != "it";
        let target = entities[..idx]
            .iter()
            .rev()
            .find(|e| {
                let is_person = matches!(
                    e.entity_type,
                    EntityType::Person | EntityType::Relationship
                );
                if personal {
                    is_person
                } else {
                    !is_person
                        && !matches!(
                            e.entity_type,
                            EntityType::Pronoun
                                | EntityType::Pii
                                | EntityType::SafetySignal
                                | EntityType::EmotionExplicit
                        )
                }
            })
            .map(|e| e.normalized_value.clone());
        entities[idx].coreference_target = target;
    }
}

/// Short topic label from the dominant entity category.
fn summarize(entities: &[Entity]) -> String {
    if entities
        .iter()
        .any(|e| e.entity_type == EntityType::SafetySignal)
    {
        return "safety concern".to_string();
    }

    let mut counts: HashMap<EntityType, usize> = HashMap::new();
    for e in entities {
        if category_label(e.entity_type).is_some() {
            *counts.entry(e.entity_type).or_insert(0) += 1;
        }
    }
    // Highest count wins; ties go to the category that appears first.
    let dominant = entities
        .iter()
        .map(|e| e.entity_type)
        .filter(|t| counts.contains_key(t))
        .fold(None::<EntityType>, |best, t| match best {
            Some(b) if counts[&b] >= counts[&t] => Some(b),
            _ => Some(t),
        });

    match dominant {
        Some(t) => {
            let label = category_label(t).unwrap_or("personal matters");
            let first = entities
                .iter()
                .find(|e| e.entity_type == t)
                .map(|e| e.normalized_value.as_str())
                .unwrap_or_default();
            format!("{} around {}", label, first)
        }
        None => "general check-in".to_string(),
    }
}

fn category_label(t: EntityType) -> Option<&'static str> {
    match t {
        EntityType::TopicAcademic => Some("academic pressure"),
        EntityType::TopicWork => Some("work stress"),
        EntityType::Event => Some("life event"),
        EntityType::Relationship | EntityType::Person => Some("relationship concerns"),
        EntityType::TopicMentalHealth | EntityType::Symptom => Some("mental health"),
        EntityType::TopicPhysicalHealth => Some("physical health"),
        EntityType::Treatment => Some("treatment"),
        EntityType::CopingStrategy => Some("coping"),
        _ => None,
    }
}
