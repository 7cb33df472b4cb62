//! Session lifecycle state machine

use crate::error::StateMachineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a participant session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    Running,
    Finished,
    Aborted,
    Expired,
}

impl SessionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Aborted => "aborted",
            Self::Expired => "expired",
        }
    }

    /// No outgoing transitions
    #[must_use]
    pub fn is_terminal(self) -> bool {
        allowed_transitions(self).is_empty()
    }

    /// Position in the lifecycle; never decreases over a session
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::Running => 1,
            Self::Finished | Self::Aborted | Self::Expired => 2,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates a status transition.
///
/// With the `strict-debug` feature an illegal transition panics instead.
pub fn validate_transition(
    from: SessionStatus,
    to: SessionStatus,
) -> Result<(), StateMachineError> {
    if allowed(from, to) {
        Ok(())
    } else {
        #[cfg(feature = "strict-debug")]
        panic!("Illegal session transition attempted: {from:?} -> {to:?}");

        #[cfg(not(feature = "strict-debug"))]
        Err(StateMachineError::IllegalTransition { from, to })
    }
}

#[must_use]
pub fn allowed_transitions(from: SessionStatus) -> Vec<SessionStatus> {
    use SessionStatus::*;
    match from {
        NotStarted => vec![Running, Aborted, Expired],
        Running => vec![Running, Finished, Aborted, Expired],
        Finished => vec![],
        Aborted => vec![],
        Expired => vec![],
    }
}

fn allowed(from: SessionStatus, to: SessionStatus) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
