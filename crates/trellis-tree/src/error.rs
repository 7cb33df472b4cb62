//! Error types for experiment trees
//!
//! Structural errors ([`TreeError`]) are programming-contract violations and
//! surface immediately. Validation failures ([`ValidationError`]) are ordinary
//! outcomes that a navigator turns into rejected moves.

use crate::path::{PathError, TreePath};
use std::fmt;

/// Structural tree errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// A sibling with the same name already exists
    #[error("duplicate name '{name}' in section '{parent}'")]
    DuplicateName { name: String, parent: TreePath },

    /// An element name is already used somewhere in the tree
    #[error("duplicate element name '{name}' (already on page '{page}')")]
    DuplicateElement { name: String, page: String },

    /// Attaching would make a node its own ancestor
    #[error("attaching '{node}' below '{parent}' would create a cycle")]
    Cycle { node: String, parent: String },

    /// Node names must be usable as path segments
    #[error("invalid node name '{0}'")]
    InvalidName(String),

    /// Sections enter the tree empty; members are attached afterwards
    #[error("section '{0}' must be created without members")]
    SectionNotEmpty(String),

    /// The root node cannot be attached anywhere
    #[error("the root section cannot be attached to a parent")]
    RootNotAttachable,

    /// Node id or path does not exist
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// Node exists but is not a section
    #[error("'{0}' is not a section")]
    NotASection(String),

    /// Node exists but is not a page
    #[error("'{0}' is not a page")]
    NotAPage(String),

    /// Element is not on the page
    #[error("unknown element '{element}' on page '{page}'")]
    UnknownElement { element: String, page: String },

    /// Element does not accept input
    #[error("element '{0}' does not accept input")]
    NotAnInput(String),

    /// Page no longer accepts input
    #[error("page '{0}' is closed")]
    PageClosed(String),

    /// Malformed path
    #[error("invalid path: {0}")]
    Path(#[from] PathError),
}

/// A recognised validation failure with participant-facing messages
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    messages: Vec<String>,
}

impl ValidationError {
    /// Create from ordered messages
    #[must_use]
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }

    /// Create from a single message
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    /// Messages in reporting order
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Consume into messages
    #[must_use]
    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.messages.is_empty() {
            write!(f, "validation failed")
        } else {
            write!(f, "validation failed: {}", self.messages.join("; "))
        }
    }
}

impl std::error::Error for ValidationError {}

/// Error returned by hook implementations
#[derive(Debug, Clone, thiserror::Error)]
pub enum HookError {
    /// Recognised validation failure, the move is rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Hook broke a structural rule, e.g. appended a duplicate element
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Any other failure inside a hook
    #[error("hook failed: {0}")]
    Fatal(String),
}

impl HookError {
    /// Shorthand for a validation failure with one message
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(ValidationError::message(message))
    }

    /// Whether this is a recognised validation failure
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
