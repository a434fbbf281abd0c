//! The text-completion capability the pipeline delegates to.
//!
//! The pipeline treats completion as a black box: a request goes in, raw
//! text comes out, and the call may fail or hang. Timeouts are applied by
//! the caller, not by implementations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CompletionError;
use crate::types::StageKind;

/// Tools a completion call may be allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// Web or knowledge-base search used for grounding.
    Search,
}

/// One request to the completion capability.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Which stage is asking. Backends may ignore it.
    pub stage: StageKind,
    /// Role and output contract for the stage.
    pub instructions: String,
    /// The user's utterance, verbatim.
    pub input: String,
    /// Hidden context block (prior turn, merged analysis, grounding notes).
    pub context: Option<String>,
    pub tools: Vec<ToolKind>,
    pub model: Option<String>,
}

impl CompletionRequest {
    pub fn new(stage: StageKind, instructions: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            stage,
            instructions: instructions.into(),
            input: input.into(),
            context: None,
            tools: Vec::new(),
            model: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolKind>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }
}

/// Opaque text-completion service.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Produce raw text for the request.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

// =============================================================================
// Scripted implementation
// =============================================================================

/// Canned behaviour for one stage of a [`ScriptedCompletion`].
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Fail(CompletionError),
    /// Never resolves; exercises caller timeouts and cancellation.
    Hang,
}

/// Completion service that answers each stage from a fixed script.
///
/// Used for testing and development without a real model. Tracks how many
/// calls were made per stage and how many are currently in flight.
#[derive(Debug, Default)]
pub struct ScriptedCompletion {
    replies: HashMap<StageKind, ScriptedReply>,
    delay: Option<Duration>,
    calls: Mutex<Vec<StageKind>>,
    in_flight: Arc<AtomicUsize>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `stage` with `text`.
    pub fn reply(mut self, stage: StageKind, text: impl Into<String>) -> Self {
        self.replies.insert(stage, ScriptedReply::Text(text.into()));
        self
    }

    /// Fail every call for `stage` with `err`.
    pub fn fail(mut self, stage: StageKind, err: CompletionError) -> Self {
        self.replies.insert(stage, ScriptedReply::Fail(err));
        self
    }

    /// Never answer `stage`.
    pub fn hang(mut self, stage: StageKind) -> Self {
        self.replies.insert(stage, ScriptedReply::Hang);
        self
    }

    /// Sleep before answering every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Stages called so far, in call order.
    pub fn calls(&self) -> Vec<StageKind> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self, stage: StageKind) -> usize {
        self.calls().into_iter().filter(|s| *s == stage).count()
    }

    /// Calls started but not yet finished or dropped.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter when a call finishes or is dropped.
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.stage);
        }
        let _guard = InFlightGuard::enter(&self.in_flight);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.replies.get(&request.stage) {
            Some(ScriptedReply::Text(text)) => Ok(text.clone()),
            Some(ScriptedReply::Fail(err)) => Err(err.clone()),
            Some(ScriptedReply::Hang) => {
                std::future::pending::<()>().await;
                Err(CompletionError::Empty)
            }
            None => Err(CompletionError::Rejected(format!(
                "no scripted reply for {} stage",
                request.stage
            ))),
        }
    }
}
