//! Trellis Tree
//!
//! The section/page tree an experiment is authored as:
//! - [`Section`]s group members and govern movement permissions
//! - [`Page`]s hold [`Element`]s and per-visit display rules
//! - [`ExperimentTree`] owns the nodes and enforces the tree invariants
//! - [`PageHooks`] / [`SectionHooks`] are the extension points an experiment fills in
//!
//! # Architecture
//!
//! ```text
//! TemplateBuilder ──build──▶ ExperimentTemplate ──instantiate──▶ ExperimentTree (one per session)
//!                                                                  │
//!                                             Section ◀── members ──┤
//!                                             Page ─── elements ────┘
//! ```

pub mod builder;
pub mod element;
pub mod error;
pub mod hooks;
pub mod page;
pub mod path;
pub mod section;
pub mod tree;

pub use builder::{ExperimentTemplate, TemplateBuilder};
pub use element::{
    AnyInput, Element, ElementKind, ElementValidation, ElementValidator, NumberInRange, OneOf,
    TextLength,
};
pub use error::{HookError, TreeError, ValidationError};
pub use hooks::{
    DefaultPageHooks, DefaultSectionHooks, HookContext, PageHooks, PageMut, SectionHooks,
    SectionMut, SessionContext,
};
pub use page::{Page, ValidationResult, Visit};
pub use path::{PathError, TreePath};
pub use section::{MoveKind, Section};
pub use tree::{ExperimentTree, Member, Node, NodeId};

/// Common imports for authoring experiments
pub mod prelude {
    pub use crate::{
        Element, ExperimentTemplate, HookContext, HookError, Page, PageHooks, PageMut, Section,
        SectionHooks, SectionMut, SessionContext, TemplateBuilder, TreePath,
    };
}
