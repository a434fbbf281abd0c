//! Offline rule engine for Saarthi.
//!
//! Provides a [`CompletionService`](saarthi_core::CompletionService) that
//! answers every pipeline stage with lexicons and templates, plus a small
//! coping library usable as a grounding service. Lets the whole pipeline
//! run without a language model.

pub mod backend;
pub mod coping;
pub mod entity;
pub mod intent;
pub mod reply;
pub mod tone;

pub use backend::RuleBasedCompletion;
pub use coping::{CopingEntry, CopingLibrary};
pub use entity::EntityExtractor;
pub use intent::IntentClassifier;
pub use reply::{Register, ReplyComposer};
pub use tone::ToneScorer;
