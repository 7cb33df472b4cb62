//! Move requests and their outcomes

use serde::{Deserialize, Serialize};
use std::fmt;
use trellis_store::SaveOutcome;
use trellis_tree::{PathError, TreePath};

/// A navigation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Move {
    Forward,
    Backward,
    /// Jump to a page, or to the first page of a section
    Jump(TreePath),
}

impl Move {
    /// Jump to a dotted path such as `exp.main.p3`
    ///
    /// # Errors
    /// Returns the parse error of a malformed path.
    pub fn jump(path: &str) -> Result<Self, PathError> {
        Ok(Self::Jump(path.parse()?))
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Jump(_) => "jump",
        }
    }
}

/// Per-request switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveOptions {
    /// Ignore the minimum display time of the current page
    pub bypass_display_time: bool,
}

impl MoveOptions {
    #[must_use]
    pub fn bypass_display_time() -> Self {
        Self {
            bypass_display_time: true,
        }
    }
}

/// Why a move was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    SessionNotRunning,
    DirectionNotAllowed,
    JumpNotAllowed,
    MinimumDisplayTime,
    ValidationFailed,
    PageMustBeShown,
    NoPreviousPage,
    AlreadyThere,
}

impl RejectionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SessionNotRunning => "session_not_running",
            Self::DirectionNotAllowed => "direction_not_allowed",
            Self::JumpNotAllowed => "jump_not_allowed",
            Self::MinimumDisplayTime => "minimum_display_time",
            Self::ValidationFailed => "validation_failed",
            Self::PageMustBeShown => "page_must_be_shown",
            Self::NoPreviousPage => "no_previous_page",
            Self::AlreadyThere => "already_there",
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A refused move with participant-facing messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub kind: RejectionKind,
    pub messages: Vec<String>,
}

impl Rejection {
    #[must_use]
    pub fn new(kind: RejectionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            messages: vec![message.into()],
        }
    }

    #[must_use]
    pub fn with_messages(kind: RejectionKind, messages: Vec<String>) -> Self {
        Self { kind, messages }
    }
}

/// Result of a move request
#[derive(Debug)]
pub enum MoveOutcome {
    /// Position changed; `save` reports where the snapshot went
    Committed { new_position: TreePath, save: SaveOutcome },
    /// Moved past the last page
    Finished { save: SaveOutcome },
    /// Position unchanged
    Rejected(Rejection),
}

impl MoveOutcome {
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    #[must_use]
    pub fn new_position(&self) -> Option<&TreePath> {
        match self {
            Self::Committed { new_position, .. } => Some(new_position),
            _ => None,
        }
    }

    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn rejection_kind(&self) -> Option<RejectionKind> {
        self.rejection().map(|r| r.kind)
    }

    #[must_use]
    pub fn save(&self) -> Option<&SaveOutcome> {
        match self {
            Self::Committed { save, .. } | Self::Finished { save } => Some(save),
            Self::Rejected(_) => None,
        }
    }

    /// Label used in the journal
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Committed { .. } => "committed".to_string(),
            Self::Finished { .. } => "finished".to_string(),
            Self::Rejected(r) => format!("rejected:{}", r.kind),
        }
    }
}
