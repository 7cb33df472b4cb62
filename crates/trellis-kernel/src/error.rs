use crate::state_machine::SessionStatus;
use trellis_store::ChainError;
use trellis_tree::{HookError, TreeError, TreePath};

/// Fatal navigation failures
///
/// Rule violations never show up here; they are reported as rejected moves.
#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    StateMachine(#[from] StateMachineError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Journal(#[from] JournalError),

    /// A hook failed with something other than a validation failure
    #[error("hook failed: {0}")]
    Hook(String),

    /// Jump target does not resolve to a page
    #[error("unknown jump target '{0}'")]
    UnknownTarget(TreePath),

    /// The tree has no pages to start on
    #[error("experiment has no pages")]
    EmptyExperiment,

    /// Operation needs a running session
    #[error("session is {0}")]
    NotRunning(SessionStatus),
}

impl NavigationError {
    /// Convert a hook failure that is not a recognised validation failure
    #[must_use]
    pub fn from_hook(err: HookError) -> Self {
        match err {
            HookError::Tree(e) => Self::Tree(e),
            HookError::Fatal(message) => Self::Hook(message),
            HookError::Validation(v) => Self::Hook(v.to_string()),
        }
    }

    /// Programming-contract violations in the tree or its use
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Tree(_) | Self::UnknownTarget(_) | Self::EmptyExperiment
        )
    }

    /// Failures an operator should look at
    #[must_use]
    pub fn should_escalate(&self) -> bool {
        matches!(
            self,
            Self::Hook(_) | Self::Chain(_) | Self::Journal(JournalError::IntegrityViolation { .. })
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateMachineError {
    #[error("illegal session transition {from} -> {to}")]
    IllegalTransition {
        from: SessionStatus,
        to: SessionStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JournalError {
    /// Stored hashes no longer match the entries
    #[error("journal integrity violated at entry {seq}")]
    IntegrityViolation { seq: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_tree::ValidationError;

    #[test]
    fn hook_errors_map_to_navigation_errors() {
        let err = NavigationError::from_hook(HookError::Fatal("db down".into()));
        assert!(matches!(err, NavigationError::Hook(ref m) if m == "db down"));
        assert!(err.should_escalate());
        assert!(!err.is_structural());

        let err = NavigationError::from_hook(HookError::Tree(TreeError::RootNotAttachable));
        assert!(err.is_structural());

        let err = NavigationError::from_hook(ValidationError::message("nope").into());
        assert_eq!(err.to_string(), "hook failed: validation failed: nope");
    }

    #[test]
    fn transition_error_names_states() {
        let err = StateMachineError::IllegalTransition {
            from: SessionStatus::Finished,
            to: SessionStatus::Running,
        };
        assert_eq!(err.to_string(), "illegal session transition finished -> running");
    }
}
