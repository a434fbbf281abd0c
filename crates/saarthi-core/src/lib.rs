pub mod brief;
pub mod completion;
pub mod config;
pub mod error;
pub mod grounding;
pub mod redact;
pub mod safety;
pub mod types;

pub use brief::SynthesisBrief;
pub use completion::{CompletionRequest, CompletionService, ScriptedCompletion, ToolKind};
pub use config::SaarthiConfig;
pub use error::{CompletionError, GroundingError, InputError, Result, SaarthiError};
pub use grounding::{GroundingService, GroundingSnippet};
pub use safety::{EscalationPolicy, LeakDetector, LeakKind, SafetyAssessment, SafetySignal};
pub use types::*;
