//! Turn state machine with validated transitions.
//!
//! Idle -> Aggregating -> Synthesizing -> Done
//! Aggregating/Synthesizing -> Errored

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ChatError;

/// Lifecycle state of one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnState {
    Idle,
    Aggregating,
    Synthesizing,
    Done,
    Errored,
}

impl TurnState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnState::Idle => "idle",
            TurnState::Aggregating => "aggregating",
            TurnState::Synthesizing => "synthesizing",
            TurnState::Done => "done",
            TurnState::Errored => "errored",
        }
    }

    /// `Done` and `Errored` accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Done | TurnState::Errored)
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate that a state transition is allowed.
///
/// Valid transitions:
/// - Idle -> Aggregating
/// - Aggregating -> Synthesizing
/// - Aggregating -> Errored
/// - Synthesizing -> Done
/// - Synthesizing -> Errored
pub fn validate_transition(from: TurnState, to: TurnState) -> Result<(), ChatError> {
    let valid = matches!(
        (from, to),
        (TurnState::Idle, TurnState::Aggregating)
            | (TurnState::Aggregating, TurnState::Synthesizing)
            | (TurnState::Aggregating, TurnState::Errored)
            | (TurnState::Synthesizing, TurnState::Done)
            | (TurnState::Synthesizing, TurnState::Errored)
    );

    if valid {
        Ok(())
    } else {
        Err(ChatError::InvalidTransition { from, to })
    }
}

/// Tracks the state of a single turn.
#[derive(Debug)]
pub struct TurnMachine {
    turn_id: Uuid,
    state: TurnState,
}

impl TurnMachine {
    pub fn new(turn_id: Uuid) -> Self {
        Self {
            turn_id,
            state: TurnState::Idle,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn turn_id(&self) -> Uuid {
        self.turn_id
    }

    pub fn advance(&mut self, to: TurnState) -> Result<(), ChatError> {
        validate_transition(self.state, to)?;
        tracing::debug!(from = %self.state, to = %to, "Turn state changed");
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // Valid transitions
    // =====================================================================

    #[test]
    fn test_idle_to_aggregating() {
        assert!(validate_transition(TurnState::Idle, TurnState::Aggregating).is_ok());
    }

    #[test]
    fn test_aggregating_to_synthesizing() {
        assert!(validate_transition(TurnState::Aggregating, TurnState::Synthesizing).is_ok());
    }

    #[test]
    fn test_aggregating_to_errored() {
        assert!(validate_transition(TurnState::Aggregating, TurnState::Errored).is_ok());
    }

    #[test]
    fn test_synthesizing_to_done() {
        assert!(validate_transition(TurnState::Synthesizing, TurnState::Done).is_ok());
    }

    #[test]
    fn test_synthesizing_to_errored() {
        assert!(validate_transition(TurnState::Synthesizing, TurnState::Errored).is_ok());
    }

    // =====================================================================
    // Invalid transitions
    // =====================================================================

    #[test]
    fn test_idle_to_synthesizing_invalid() {
        assert!(validate_transition(TurnState::Idle, TurnState::Synthesizing).is_err());
    }

    #[test]
    fn test_idle_to_errored_invalid() {
        assert!(validate_transition(TurnState::Idle, TurnState::Errored).is_err());
    }

    #[test]
    fn test_aggregating_to_done_invalid() {
        assert!(validate_transition(TurnState::Aggregating, TurnState::Done).is_err());
    }

    #[test]
    fn test_terminal_states_are_absorbing() {
        let all = [
            TurnState::Idle,
            TurnState::Aggregating,
            TurnState::Synthesizing,
            TurnState::Done,
            TurnState::Errored,
        ];
        for from in [TurnState::Done, TurnState::Errored] {
            assert!(from.is_terminal());
            for to in all {
                assert!(validate_transition(from, to).is_err());
            }
        }
    }

    #[test]
    fn test_invalid_transition_error_names_states() {
        let err = validate_transition(TurnState::Done, TurnState::Idle).unwrap_err();
        match err {
            ChatError::InvalidTransition { from, to } => {
                assert_eq!(from, TurnState::Done);
                assert_eq!(to, TurnState::Idle);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    // =====================================================================
    // Machine
    // =====================================================================

    #[test]
    fn test_machine_happy_path() {
        let mut m = TurnMachine::new(Uuid::new_v4());
        assert_eq!(m.state(), TurnState::Idle);
        m.advance(TurnState::Aggregating).unwrap();
        m.advance(TurnState::Synthesizing).unwrap();
        m.advance(TurnState::Done).unwrap();
        assert!(m.advance(TurnState::Errored).is_err());
        assert_eq!(m.state(), TurnState::Done);
    }

    #[test]
    fn test_state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TurnState::Synthesizing).unwrap(),
            "\"synthesizing\""
        );
    }
}
