//! Saarthi analysis crate - the three analyzer stages.
//!
//! Each analyzer turns one utterance into a typed record:
//! - `EntityAnalyzer`: entities, coreferences and a short topic summary
//! - `IntentAnalyzer`: primary and secondary intents from the master list
//! - `ToneAnalyzer`: primary emotion, sentiment and intensity
//!
//! Raw completion text is located, parsed and repaired before it leaves the
//! stage; anything that cannot be repaired is an `AnalysisError`.

pub mod analyzer;
pub mod entity;
pub mod error;
pub mod intent;
pub mod parse;
pub mod prompts;
pub mod tone;
pub mod validate;

pub use analyzer::{Analyzer, StageClient};
pub use entity::EntityAnalyzer;
pub use error::{AnalysisError, StageFailure};
pub use intent::IntentAnalyzer;
pub use tone::ToneAnalyzer;
