//! Template Builder
//!
//! The primary interface for assembling an experiment before any session
//! starts. Members are registered explicitly under a named parent section;
//! the finished [`ExperimentTemplate`] is immutable and shared by all sessions.

use crate::error::TreeError;
use crate::page::Page;
use crate::path::TreePath;
use crate::section::Section;
use crate::tree::{ExperimentTree, Member, NodeId};
use rand::Rng;
use std::sync::Arc;

/// Builder for experiment templates
///
/// Usage:
/// ```rust,ignore
/// let mut builder = TemplateBuilder::new(Section::new("exp"))?;
/// builder
///     .section("exp", Section::forward_only("intro"))?
///     .page("exp.intro", Page::new("welcome"))?;
/// let template = builder.build();
/// ```
#[derive(Debug)]
pub struct TemplateBuilder {
    tree: ExperimentTree,
}

impl TemplateBuilder {
    /// Start a template with `root` as the root section
    ///
    /// # Errors
    /// [`TreeError::InvalidName`] if the root name is not a valid path segment.
    pub fn new(root: Section) -> Result<Self, TreeError> {
        if !TreePath::is_valid_segment(root.name()) {
            return Err(TreeError::InvalidName(root.name().to_string()));
        }
        Ok(Self {
            tree: ExperimentTree::new(root),
        })
    }

    /// Register a subsection under the section at `parent`
    ///
    /// # Errors
    /// Unknown parent path or any structural error of the tree.
    pub fn section(&mut self, parent: &str, section: Section) -> Result<&mut Self, TreeError> {
        self.add(parent, Member::Section(section))?;
        Ok(self)
    }

    /// Register a page under the section at `parent`
    ///
    /// # Errors
    /// Unknown parent path or any structural error of the tree.
    pub fn page(&mut self, parent: &str, page: Page) -> Result<&mut Self, TreeError> {
        self.add(parent, Member::Page(page))?;
        Ok(self)
    }

    /// Register a member and return its id
    ///
    /// # Errors
    /// Unknown parent path or any structural error of the tree.
    pub fn add(&mut self, parent: &str, member: Member) -> Result<NodeId, TreeError> {
        let path: TreePath = parent.parse()?;
        let parent = self
            .tree
            .resolve(&path)
            .ok_or_else(|| TreeError::UnknownNode(path.to_string()))?;
        let id = self.tree.insert(parent, member)?;
        tracing::debug!(path = %self.tree.path(id), "registered member");
        Ok(id)
    }

    /// Tree assembled so far
    #[must_use]
    pub fn tree(&self) -> &ExperimentTree {
        &self.tree
    }

    /// Freeze into a template
    #[must_use]
    pub fn build(self) -> ExperimentTemplate {
        ExperimentTemplate {
            tree: Arc::new(self.tree),
        }
    }
}

/// Immutable experiment definition shared by concurrent sessions
#[derive(Debug, Clone)]
pub struct ExperimentTemplate {
    tree: Arc<ExperimentTree>,
}

impl ExperimentTemplate {
    /// Template definition (never mutated)
    #[must_use]
    pub fn tree(&self) -> &ExperimentTree {
        &self.tree
    }

    /// Number of pages in the template
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.tree.pages().len()
    }

    /// Deep-copy the tree for one session and fix every traversal order
    #[must_use]
    pub fn instantiate<R: Rng + ?Sized>(&self, rng: &mut R) -> ExperimentTree {
        let mut tree = ExperimentTree::clone(&self.tree);
        tree.fix_orders(rng);
        tree
    }
}

impl From<ExperimentTree> for ExperimentTemplate {
    fn from(tree: ExperimentTree) -> Self {
        Self {
            tree: Arc::new(tree),
        }
    }
}
