//! Turn pipeline for Saarthi.
//!
//! Fans an utterance out to the three analyzers, merges their records,
//! writes the reply and applies the safety policy. The single entry point
//! is [`Orchestrator::process_turn`].

pub mod aggregator;
pub mod error;
pub mod orchestrator;
pub mod state;
pub mod synthesizer;

pub use aggregator::Aggregator;
pub use error::{AggregationError, ChatError, SynthesisError};
pub use orchestrator::{Orchestrator, TurnOutcome};
pub use state::{validate_transition, TurnMachine, TurnState};
pub use synthesizer::Synthesizer;
