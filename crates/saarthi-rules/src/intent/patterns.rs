//! Regex-based intent pattern matching.
//!
//! Provides pattern definitions and matching logic for mapping an utterance
//! onto the intent master list.

use regex::Regex;
use saarthi_core::types::Intent;

/// A single compiled regex pattern linked to an intent.
pub struct IntentPattern {
    pub regex: Regex,
    pub intent: Intent,
    pub base_confidence: f32,
}

/// A match result from pattern detection.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    pub intent: Intent,
    pub confidence: f32,
    pub matched_text: String,
}

/// Collection of all intent patterns, compiled once and reused.
pub struct PatternSet {
    patterns: Vec<IntentPattern>,
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::new()
    }
}

fn push_all(patterns: &mut Vec<IntentPattern>, intent: Intent, list: &[(&str, f32)]) {
    for (pat, conf) in list {
        patterns.push(IntentPattern {
            regex: Regex::new(pat).expect("Invalid intent regex"),
            intent,
            base_confidence: *conf,
        });
    }
}

impl PatternSet {
    /// Create a new PatternSet with all compiled patterns.
    pub fn new() -> Self {
        let mut patterns = Vec::new();

        // =====================================================================
        // Safety & crisis
        // =====================================================================
        push_all(
            &mut patterns,
            Intent::CrisisHelp,
            &[
                (r"(?i)\b(?:end|take)\s+my\s+(?:own\s+)?life\b", 0.98),
                (r"(?i)\bkill(?:ing)?\s+myself\b", 0.98),
                (r"(?i)\bsuicid(?:e|al)\b", 0.97),
                (r"(?i)\b(?:want|wanna|going)\s+(?:to\s+)?die\b", 0.95),
                (r"(?i)\b(?:hurt|harm|cut)(?:ing)?\s+myself\b", 0.95),
                (r"(?i)\bself[-\s]?harm", 0.95),
                (r"(?i)\bno\s+(?:reason|point)\s+(?:to|in)\s+(?:live|living)\b", 0.93),
                (r"(?i)\bbetter\s+off\s+(?:dead|without\s+me)\b", 0.93),
                (r"(?i)\bend\s+it\s+all\b", 0.93),
                (r"(?i)\bdon'?t\s+want\s+to\s+(?:be\s+alive|live|exist|wake\s+up)\b", 0.93),
                // Passive ideation.
                (r"(?i)\b(?:no\s*one|nobody)\s+would\s+(?:even\s+)?miss\s+me\b", 0.9),
                (r"(?i)\b(?:no\s*one|nobody)\s+would\s+(?:even\s+)?(?:care|notice)\s+if\s+i\b", 0.9),
                (r"(?i)\bif\s+i\s+(?:was|were)\s+(?:gone|dead|not\s+(?:here|around))\b", 0.9),
                (r"(?i)\bwish\s+i\s+(?:was|were)\s+(?:dead|gone|never\s+born)\b", 0.92),
                (r"(?i)\b(?:want|wanna|wish\s+i\s+could)\s+(?:to\s+)?(?:just\s+)?disappear\b", 0.88),
                (r"(?i)\bcan'?t\s+go\s+on\b", 0.9),
                (r"(?i)\bcan'?t\s+do\s+this\s+any\s*more\b", 0.86),
            ],
        );
        push_all(
            &mut patterns,
            Intent::SeekingSafety,
            &[
                (r"(?i)\b(?:i'?m|i\s+am|i\s+don'?t\s+feel)\s+(?:not\s+)?safe\s+(?:at\s+home|here|anymore)\b", 0.94),
                (r"(?i)\b(?:i'?m|i\s+am)\s+(?:not\s+safe|in\s+danger)\b", 0.95),
                (r"(?i)\b(?:someone|he|she|they)\s+(?:is|are|keeps?)\s+(?:following|threatening|stalking|hitting|hurting)\s+me\b", 0.94),
                (r"(?i)\b(?:he|she|they)\s+(?:hits?|beats?|threatens?)\s+me\b", 0.94),
                (r"(?i)\bafraid\s+(?:he|she|they)(?:\s+will|'ll)\s+(?:hurt|kill)\s+me\b", 0.95),
            ],
        );

        // =====================================================================
        // Emotional support & expression
        // =====================================================================
        push_all(
            &mut patterns,
            Intent::Venting,
            &[
                (r"(?i)\b(?:i'?m|i\s+am)\s+(?:so\s+|such\s+an?\s+|just\s+)?(?:stupid|dumb|useless|worthless|an?\s+idiot|an?\s+failure|pathetic)\b", 0.82),
                (r"(?i)\bi\s+(?:failed|messed\s+up|screwed\s+up|blew\s+it|ruined)\b", 0.78),
                (r"(?i)\bi\s+(?:hate|can'?t\s+stand)\b", 0.76),
                (r"(?i)\b(?:so\s+)?(?:sick|tired)\s+of\b", 0.74),
                (r"(?i)\bfed\s+up\b", 0.74),
                (r"(?i)\bugh+\b", 0.70),
                (r"(?i)\bwhy\s+does\s+(?:this|everything)\s+always\b", 0.70),
            ],
        );
        push_all(
            &mut patterns,
            Intent::SeekingComfort,
            &[
                (r"(?i)\b(?:tell|promise)\s+me\s+(?:it|things)\s+will\s+be\s+(?:ok(?:ay)?|alright|fine)\b", 0.85),
                (r"(?i)\bi\s+(?:just\s+)?need\s+(?:someone|somebody|a\s+hug|comfort)\b", 0.84),
                (r"(?i)\bplease\s+(?:help|comfort)\s+me\b", 0.72),
                (r"(?i)\bi\s+feel\s+(?:so\s+)?(?:hopeless|lost|broken|overwhelmed)\b", 0.70),
            ],
        );
        push_all(
            &mut patterns,
            Intent::SeekingValidation,
            &[
                (r"(?i)\bam\s+i\s+(?:wrong|overreacting|crazy|being\s+unreasonable)\b", 0.86),
                (r"(?i)\bis\s+it\s+(?:normal|okay|ok|wrong)\s+(?:to|that)\b", 0.84),
                (r"(?i)\bdo\s+you\s+think\s+i\s+(?:was|am)\s+(?:right|wrong)\b", 0.82),
            ],
        );
        push_all(
            &mut patterns,
            Intent::SharingFeelings,
            &[
                (r"(?i)\bi(?:'ve\s+been|\s+am|'m)\s+feeling\b", 0.66),
                (r"(?i)\bi\s+feel\b", 0.62),
            ],
        );
        push_all(
            &mut patterns,
            Intent::CelebratingSuccess,
            &[
                (r"(?i)\bi\s+(?:passed|got\s+(?:the|a)\s+(?:job|promotion|offer)|did\s+it|made\s+it|nailed\s+it)\b", 0.88),
                (r"(?i)\bwe\s+(?:actually\s+)?won\b", 0.86),
                (r"(?i)\bgreat\s+news\b", 0.80),
                (r"(?i)\bso\s+(?:proud|happy)\b", 0.70),
            ],
        );
        push_all(
            &mut patterns,
            Intent::SeekingCompanionship,
            &[
                (r"(?i)\b(?:no\s+one|nobody)\s+to\s+talk\s+to\b", 0.88),
                (r"(?i)\bkeep\s+me\s+company\b", 0.88),
                (r"(?i)\b(?:so|really|very)\s+lonely\b", 0.80),
                (r"(?i)\bcan\s+you\s+(?:just\s+)?talk\s+(?:to|with)\s+me\b", 0.82),
            ],
        );

        // =====================================================================
        // Problem-solving & decision making
        // =====================================================================
        push_all(
            &mut patterns,
            Intent::SeekingAdvice,
            &[
                (r"(?i)\bwhat\s+should\s+i\s+do\b", 0.90),
                (r"(?i)\bany\s+(?:advice|tips|suggestions)\b", 0.88),
                (r"(?i)\bhow\s+(?:do|can|should)\s+i\s+(?:cope|deal|handle|manage|get\s+over|stop)\b", 0.88),
                (r"(?i)\b(?:need|want)\s+(?:some\s+)?advice\b", 0.86),
                // Any other "how do I ...?" question.
                (r"(?i)\bhow\s+(?:do|can|should|could)\s+i\b.+\?", 0.72),
            ],
        );
        push_all(
            &mut patterns,
            Intent::BrainstormingSolutions,
            &[
                (r"(?i)\bhelp\s+me\s+(?:figure\s+out|find\s+a\s+way|solve)\b", 0.84),
                (r"(?i)\bways\s+to\s+(?:fix|solve|deal\s+with)\b", 0.80),
            ],
        );
        push_all(
            &mut patterns,
            Intent::Troubleshooting,
            &[
                (r"(?i)\b(?:isn'?t|not|stopped)\s+working\b", 0.84),
                (r"(?i)\bkeeps?\s+(?:crashing|failing|breaking)\b", 0.82),
            ],
        );
        push_all(
            &mut patterns,
            Intent::Planning,
            &[
                (r"(?i)\b(?:need|want|help\s+me)\s+to\s+plan\b", 0.88),
                (r"(?i)\bplan(?:ning)?\s+(?:my|a|the|for)\b", 0.78),
                (r"(?i)\bschedule\s+(?:my|for)\b", 0.72),
            ],
        );
        push_all(
            &mut patterns,
            Intent::DecisionMakingSupport,
            &[
                (r"(?i)\bcan'?t\s+decide\b", 0.88),
                (r"(?i)\bshould\s+i\b.+\bor\b", 0.84),
                (r"(?i)\bchoose\s+between\b", 0.86),
            ],
        );
        push_all(
            &mut patterns,
            Intent::ComparisonSeeking,
            &[
                (r"(?i)\bpros\s+and\s+cons\b", 0.90),
                (r"(?i)\bwhich\s+(?:one\s+)?is\s+better\b", 0.86),
                (r"(?i)\b\w+\s+vs\.?\s+\w+", 0.74),
            ],
        );

        // =====================================================================
        // Information exchange
        // =====================================================================
        push_all(
            &mut patterns,
            Intent::FactualQuery,
            &[
                (r"(?i)^\s*(?:what|when|where|who)\s+(?:is|are|was|were)\b.+\?", 0.74),
                (r"(?i)\bhow\s+(?:many|much|long)\b.+\?", 0.72),
            ],
        );
        push_all(
            &mut patterns,
            Intent::ExplanationSeeking,
            &[
                (r"(?i)\bexplain\b", 0.86),
                (r"(?i)\bwhat\s+does\s+.+\s+mean\b", 0.82),
                (r"(?i)\bhow\s+does\b.+\bwork\b", 0.82),
            ],
        );
        push_all(
            &mut patterns,
            Intent::ClarificationSeeking,
            &[
                (r"(?i)\bwhat\s+do\s+you\s+mean\b", 0.90),
                (r"(?i)\bcan\s+you\s+clarify\b", 0.90),
                (r"(?i)\bi\s+don'?t\s+(?:get|understand)\s+what\s+you\b", 0.86),
            ],
        );
        push_all(
            &mut patterns,
            Intent::ConfirmationSeeking,
            &[
                (r"(?i)\bis\s+that\s+(?:right|correct|true)\b", 0.86),
                (r"(?i)\bso\s+you'?re\s+saying\b", 0.84),
            ],
        );

        // =====================================================================
        // Self-growth & learning
        // =====================================================================
        push_all(
            &mut patterns,
            Intent::SelfExploration,
            &[
                (r"(?i)\bwhy\s+do\s+i\s+(?:always|keep|never)\b", 0.86),
                (r"(?i)\bi\s+(?:wonder|don'?t\s+know)\s+why\s+i\b", 0.84),
                (r"(?i)\bi\s+don'?t\s+understand\s+myself\b", 0.86),
                (r"(?i)\bi'?ve\s+been\s+thinking\s+about\s+(?:myself|who\s+i\s+am)\b", 0.80),
            ],
        );
        push_all(
            &mut patterns,
            Intent::LearningSkill,
            &[
                (r"(?i)\bteach\s+me\b", 0.88),
                (r"(?i)\b(?:trying|want)\s+to\s+learn\b", 0.86),
                (r"(?i)\bhow\s+(?:do\s+i|to)\s+(?:play|cook|code|draw|speak)\b", 0.80),
                (r"(?i)\bhow\s+(?:do|can|should|could)\s+i\s+(?:learn|study|revise|practi[cs]e|improve|get\s+better\s+at)\b", 0.84),
            ],
        );
        push_all(
            &mut patterns,
            Intent::GoalSetting,
            &[
                (r"(?i)\bmy\s+goal\s+is\b", 0.88),
                (r"(?i)\b(?:this\s+year|by\s+next\s+\w+)\s+i\s+want\s+to\b", 0.84),
                (r"(?i)\bi\s+want\s+to\s+(?:start|become|get\s+better\s+at)\b", 0.72),
            ],
        );
        push_all(
            &mut patterns,
            Intent::FeedbackSeeking,
            &[
                (r"(?i)\bwhat\s+do\s+you\s+think\s+(?:of|about)\s+my\b", 0.86),
                (r"(?i)\b(?:review|critique)\s+my\b", 0.86),
                (r"(?i)\bfeedback\s+on\s+my\b", 0.88),
            ],
        );
        push_all(
            &mut patterns,
            Intent::HabitFormation,
            &[
                (r"(?i)\b(?:build|break|form|start)\s+(?:a|the|this)?\s*habit\b", 0.88),
                (r"(?i)\bstop\s+(?:procrastinating|smoking|doomscrolling|drinking)\b", 0.86),
                (r"(?i)\bquit\s+(?:smoking|drinking|vaping)\b", 0.86),
            ],
        );

        // =====================================================================
        // Creative & entertainment
        // =====================================================================
        push_all(
            &mut patterns,
            Intent::CreativeGeneration,
            &[(r"(?i)\b(?:write|compose)\s+(?:me\s+)?an?\s+(?:poem|story|song|letter)\b", 0.90)],
        );
        push_all(
            &mut patterns,
            Intent::Roleplaying,
            &[
                (r"(?i)\bpretend\s+(?:to\s+be|you'?re)\b", 0.88),
                (r"(?i)\brole[-\s]?play\b", 0.90),
            ],
        );
        push_all(
            &mut patterns,
            Intent::BrainstormingIdeas,
            &[
                (r"(?i)\bideas\s+for\b", 0.82),
                (r"(?i)\bbrainstorm\b", 0.84),
            ],
        );
        push_all(
            &mut patterns,
            Intent::HumorEngagement,
            &[
                (r"(?i)\btell\s+me\s+a\s+joke\b", 0.92),
                (r"(?i)\b(?:haha+|lol|lmao)\b", 0.62),
            ],
        );

        // =====================================================================
        // Social & relational
        // =====================================================================
        push_all(
            &mut patterns,
            Intent::SmallTalk,
            &[
                (r"(?i)^\s*(?:hi|hello|hey|good\s+(?:morning|evening|afternoon))\b[\s!.,]*$", 0.88),
                (r"(?i)\bhow\s+are\s+you\b", 0.80),
                (r"(?i)\bwhat'?s\s+up\b", 0.76),
            ],
        );
        push_all(
            &mut patterns,
            Intent::SharingExperience,
            &[
                (r"(?i)\b(?:today|yesterday|last\s+(?:night|week))\s+i\b", 0.70),
                (r"(?i)\bso\s+this\s+(?:thing\s+)?happened\b", 0.80),
                (r"(?i)\blet\s+me\s+tell\s+you\s+about\b", 0.80),
            ],
        );
        push_all(
            &mut patterns,
            Intent::GratitudeExpression,
            &[
                (r"(?i)\bthank\s+you\b", 0.90),
                (r"(?i)\bthanks\b", 0.86),
                (r"(?i)\b(?:i'?m|i\s+am|so)\s+grateful\b", 0.84),
                (r"(?i)\bi\s+(?:really\s+)?appreciate\b", 0.84),
            ],
        );
        push_all(
            &mut patterns,
            Intent::PersuasionOrDebate,
            &[
                (r"(?i)\byou'?re\s+wrong\b", 0.84),
                (r"(?i)\bi\s+disagree\b", 0.84),
                (r"(?i)\bconvince\s+me\b", 0.86),
            ],
        );

        // =====================================================================
        // Meta-interaction
        // =====================================================================
        push_all(
            &mut patterns,
            Intent::GivingFeedback,
            &[
                (r"(?i)\byour\s+(?:answer|reply|response)s?\s+(?:was|were|is|are)\b", 0.86),
                (r"(?i)\bthat\s+(?:was|wasn'?t)\s+(?:really\s+)?helpful\b", 0.82),
            ],
        );
        push_all(
            &mut patterns,
            Intent::GivingInstruction,
            &[
                (r"(?i)\bfrom\s+now\s+on\b", 0.84),
                (r"(?i)\bkeep\s+(?:it|your\s+(?:answers|replies))\s+short\b", 0.88),
                (r"(?i)\b(?:respond|reply|answer)\s+in\b", 0.80),
            ],
        );
        push_all(
            &mut patterns,
            Intent::Correction,
            &[
                (r"(?i)^\s*(?:no,?\s+)?i\s+meant\b", 0.90),
                (r"(?i)\bthat'?s\s+not\s+what\s+i\s+said\b", 0.88),
                (r"(?i)\btypo\b", 0.74),
            ],
        );
        push_all(
            &mut patterns,
            Intent::ConversationManagement,
            &[
                (r"(?i)\bchange\s+the\s+(?:subject|topic)\b", 0.90),
                (r"(?i)\btalk\s+about\s+something\s+else\b", 0.90),
                (r"(?i)\bcan\s+we\s+go\s+back\s+to\b", 0.84),
            ],
        );
        push_all(
            &mut patterns,
            Intent::ProceduralQuery,
            &[
                (r"(?i)\bwhat\s+can\s+you\s+do\b", 0.90),
                (r"(?i)\bhow\s+do\s+i\s+use\s+(?:you|this)\b", 0.88),
                (r"(?i)\bare\s+you\s+able\s+to\b", 0.80),
            ],
        );
        push_all(
            &mut patterns,
            Intent::TestingBoundaries,
            &[
                (r"(?i)\bare\s+you\s+(?:a\s+bot|an\s+ai|human|real)\b", 0.88),
                (r"(?i)\bignore\s+(?:your|all|previous)\s+(?:rules|instructions)\b", 0.92),
                (r"(?i)\bwhat\s+are\s+your\s+rules\b", 0.86),
            ],
        );

        Self { patterns }
    }

    /// Return the best match per intent, strongest first.
    ///
    /// Safety-critical intents always sort ahead of everything else.
    pub fn detect(&self, text: &str) -> Vec<PatternMatch> {
        let mut matches: Vec<PatternMatch> = Vec::new();

        for pattern in &self.patterns {
            let Some(m) = pattern.regex.find(text) else {
                continue;
            };
            match matches.iter_mut().find(|x| x.intent == pattern.intent) {
                Some(existing) if existing.confidence >= pattern.base_confidence => {}
                Some(existing) => {
                    existing.confidence = pattern.base_confidence;
                    existing.matched_text = m.as_str().to_string();
                }
                None => matches.push(PatternMatch {
                    intent: pattern.intent,
                    confidence: pattern.base_confidence,
                    matched_text: m.as_str().to_string(),
                }),
            }
        }

        matches.sort_by(|a, b| {
            b.intent
                .is_safety_critical()
                .cmp(&a.intent.is_safety_critical())
                .then(b.confidence.total_cmp(&a.confidence))
        });
        matches
    }
}
