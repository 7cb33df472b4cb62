//! Hook capabilities
//!
//! Pages and sections expose a fixed set of named extension points. A concrete
//! experiment supplies a strategy object implementing [`PageHooks`] or
//! [`SectionHooks`]; every method has a default, and [`DefaultPageHooks`] /
//! [`DefaultSectionHooks`] are simply implementations that keep them all.
//!
//! Hooks never reach for ambient session state: everything they may read is
//! passed in through [`SessionContext`] and [`HookContext`].

use crate::element::Element;
use crate::error::{HookError, TreeError, ValidationError};
use crate::page::Page;
use crate::path::TreePath;
use crate::section::Section;
use crate::tree::{ExperimentTree, Member, NodeId};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Per-session facts visible to hooks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub session_id: String,
    /// Condition assigned to the session, read once at start
    pub condition: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub debug: bool,
}

impl SessionContext {
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Self::default()
        }
    }
}

/// Read-only view handed to section validation hooks
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    tree: &'a ExperimentTree,
    section_id: NodeId,
    section: &'a Section,
    page_id: NodeId,
    page: &'a Page,
    session: &'a SessionContext,
}

impl<'a> HookContext<'a> {
    /// Context for `section` while `page` is displayed
    ///
    /// # Errors
    /// Returns [`TreeError::NotASection`] / [`TreeError::NotAPage`] on
    /// mismatched ids.
    pub fn new(
        tree: &'a ExperimentTree,
        section_id: NodeId,
        page_id: NodeId,
        session: &'a SessionContext,
    ) -> Result<Self, TreeError> {
        Ok(Self {
            tree,
            section_id,
            section: tree.section(section_id)?,
            page_id,
            page: tree.page(page_id)?,
            session,
        })
    }

    #[inline]
    #[must_use]
    pub fn tree(&self) -> &'a ExperimentTree {
        self.tree
    }

    #[inline]
    #[must_use]
    pub fn section(&self) -> &'a Section {
        self.section
    }

    #[inline]
    #[must_use]
    pub fn section_id(&self) -> NodeId {
        self.section_id
    }

    /// The page currently displayed
    #[inline]
    #[must_use]
    pub fn current_page(&self) -> &'a Page {
        self.page
    }

    #[inline]
    #[must_use]
    pub fn current_page_id(&self) -> NodeId {
        self.page_id
    }

    #[inline]
    #[must_use]
    pub fn session(&self) -> &'a SessionContext {
        self.session
    }

    /// Flattened data collected so far
    #[must_use]
    pub fn values(&self) -> BTreeMap<String, Value> {
        self.tree.values()
    }

    /// Validate the page currently displayed
    ///
    /// # Errors
    /// Returns [`HookError::Validation`] with the page's messages.
    pub fn validate_current_page(&self) -> Result<(), HookError> {
        self.page.validate().into_result().map_err(HookError::from)
    }

    /// Validate every page of this section's subtree that has been shown
    ///
    /// # Errors
    /// Returns [`HookError::Validation`] with all messages, in traversal order.
    pub fn validate_section(&self) -> Result<(), HookError> {
        let mut messages = Vec::new();
        for id in self.tree.all_pages(self.section_id) {
            let page = self.tree.page(id)?;
            if page.has_been_shown() {
                messages.extend(page.validate().messages().iter().cloned());
            }
        }
        if messages.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(messages).into())
        }
    }
}

/// Mutable page handle for show/hide hooks
///
/// Appending goes through the tree-wide element name registry.
#[derive(Debug)]
pub struct PageMut<'a> {
    page: &'a mut Page,
    path: &'a TreePath,
    id: NodeId,
    registry: &'a mut HashMap<String, NodeId>,
}

impl<'a> PageMut<'a> {
    pub(crate) fn new(
        page: &'a mut Page,
        path: &'a TreePath,
        id: NodeId,
        registry: &'a mut HashMap<String, NodeId>,
    ) -> Self {
        Self {
            page,
            path,
            id,
            registry,
        }
    }

    #[inline]
    #[must_use]
    pub fn page(&self) -> &Page {
        self.page
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &TreePath {
        self.path
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Append an element, checking its name tree-wide
    ///
    /// # Errors
    /// Returns [`TreeError::DuplicateElement`] if the name is taken anywhere.
    pub fn append(&mut self, element: Element) -> Result<(), TreeError> {
        if let Some(name) = element.name() {
            if self.registry.contains_key(name) {
                return Err(TreeError::DuplicateElement {
                    name: name.to_string(),
                    page: self.path.to_string(),
                });
            }
        }
        let name = element.name().map(str::to_string);
        self.page.append(element)?;
        if let Some(name) = name {
            self.registry.insert(name, self.id);
        }
        Ok(())
    }
}

/// Mutable section handle for section lifecycle hooks
#[derive(Debug)]
pub struct SectionMut<'a> {
    tree: &'a mut ExperimentTree,
    id: NodeId,
}

impl<'a> SectionMut<'a> {
    pub(crate) fn new(tree: &'a mut ExperimentTree, id: NodeId) -> Self {
        Self { tree, id }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// # Errors
    /// Returns [`TreeError::NotASection`] if the handle was built for a page.
    pub fn section(&self) -> Result<&Section, TreeError> {
        self.tree.section(self.id)
    }

    #[must_use]
    pub fn path(&self) -> &TreePath {
        self.tree.path(self.id)
    }

    #[must_use]
    pub fn tree(&self) -> &ExperimentTree {
        self.tree
    }

    /// Append a page at the end of this section
    ///
    /// # Errors
    /// Structural errors from [`ExperimentTree::insert`].
    pub fn append_page(&mut self, page: Page) -> Result<NodeId, TreeError> {
        self.tree.insert(self.id, Member::Page(page))
    }

    /// Append a subsection at the end of this section
    ///
    /// # Errors
    /// Structural errors from [`ExperimentTree::insert`].
    pub fn append_section(&mut self, section: Section) -> Result<NodeId, TreeError> {
        self.tree.insert(self.id, Member::Section(section))
    }

    /// Handle on a direct subsection, e.g. one just appended
    ///
    /// # Errors
    /// [`TreeError::UnknownNode`] when `id` is not a member of this section,
    /// [`TreeError::NotASection`] when it is a page.
    pub fn subsection(&mut self, id: NodeId) -> Result<SectionMut<'_>, TreeError> {
        if self.tree.parent(id) != Some(self.id) {
            return Err(TreeError::UnknownNode(id.to_string()));
        }
        self.tree.section_handle(id)
    }
}

/// Page extension points
pub trait PageHooks: Send + Sync + fmt::Debug {
    /// Before the page is displayed for the first time
    fn on_first_show(
        &self,
        page: &mut PageMut<'_>,
        session: &SessionContext,
    ) -> Result<(), HookError> {
        let _ = (page, session);
        Ok(())
    }

    /// Before every display of the page, after `on_first_show`
    fn on_each_show(
        &self,
        page: &mut PageMut<'_>,
        session: &SessionContext,
    ) -> Result<(), HookError> {
        let _ = (page, session);
        Ok(())
    }

    /// After the page is hidden for the first time
    fn on_first_hide(
        &self,
        page: &mut PageMut<'_>,
        session: &SessionContext,
    ) -> Result<(), HookError> {
        let _ = (page, session);
        Ok(())
    }

    /// After every hide of the page, after `on_first_hide`
    fn on_each_hide(
        &self,
        page: &mut PageMut<'_>,
        session: &SessionContext,
    ) -> Result<(), HookError> {
        let _ = (page, session);
        Ok(())
    }

    /// Page-level validation, run after element validation
    ///
    /// `Err` carries the message reported after all element messages.
    fn validate(&self, page: &Page) -> Result<(), String> {
        let _ = page;
        Ok(())
    }
}

/// Section extension points
///
/// The validation hooks decide whether a move may proceed. Returning
/// [`HookError::Validation`] rejects the move; any other error is fatal.
pub trait SectionHooks: Send + Sync + fmt::Debug {
    /// Shared default of the direction-specific hooks
    fn validate_on_move(&self, ctx: &HookContext<'_>) -> Result<(), HookError> {
        ctx.validate_current_page()
    }

    fn validate_on_forward(&self, ctx: &HookContext<'_>) -> Result<(), HookError> {
        self.validate_on_move(ctx)
    }

    fn validate_on_backward(&self, ctx: &HookContext<'_>) -> Result<(), HookError> {
        self.validate_on_move(ctx)
    }

    fn validate_on_jump(&self, ctx: &HookContext<'_>) -> Result<(), HookError> {
        self.validate_on_move(ctx)
    }

    /// Run when a forward move or jump leaves this section
    fn validate_on_leave(&self, ctx: &HookContext<'_>) -> Result<(), HookError> {
        ctx.validate_section()
    }

    /// The section is entered from outside
    fn on_enter(
        &self,
        section: &mut SectionMut<'_>,
        session: &SessionContext,
    ) -> Result<(), HookError> {
        let _ = (section, session);
        Ok(())
    }

    /// The section is left towards a page outside it
    fn on_leave(
        &self,
        section: &mut SectionMut<'_>,
        session: &SessionContext,
    ) -> Result<(), HookError> {
        let _ = (section, session);
        Ok(())
    }

    /// The section regains control from one of its subsections
    fn on_resume(
        &self,
        section: &mut SectionMut<'_>,
        session: &SessionContext,
    ) -> Result<(), HookError> {
        let _ = (section, session);
        Ok(())
    }

    /// The section passes control into one of its subsections
    fn on_hand_over(
        &self,
        section: &mut SectionMut<'_>,
        session: &SessionContext,
    ) -> Result<(), HookError> {
        let _ = (section, session);
        Ok(())
    }
}

/// Page hooks with every default kept
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPageHooks;

impl PageHooks for DefaultPageHooks {}

/// Section hooks with every default kept
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSectionHooks;

impl SectionHooks for DefaultSectionHooks {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::AnyInput;
    use crate::tree::ExperimentTree;
    use chrono::TimeZone;
    use serde_json::json;

    fn tree_with_pages() -> (ExperimentTree, NodeId, NodeId, NodeId) {
        let mut tree = ExperimentTree::new(Section::new("exp"));
        let root = tree.root();
        let p1 = tree
            .insert(
                root,
                Member::Page(
                    Page::new("p1")
                        .with_element(Element::input("q1", AnyInput).force_input())
                        .unwrap(),
                ),
            )
            .unwrap();
        let p2 = tree
            .insert(
                root,
                Member::Page(
                    Page::new("p2")
                        .with_element(Element::input("q2", AnyInput).force_input())
                        .unwrap(),
                ),
            )
            .unwrap();
        (tree, root, p1, p2)
    }

    #[test]
    fn default_validate_on_forward_validates_current_page() {
        let (tree, root, p1, _) = tree_with_pages();
        let session = SessionContext::new("s1");
        let ctx = HookContext::new(&tree, root, p1, &session).unwrap();
        let err = DefaultSectionHooks.validate_on_forward(&ctx).unwrap_err();
        match err {
            HookError::Validation(v) => assert_eq!(v.messages(), &["input required".to_string()]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn validate_section_only_checks_shown_pages() {
        let (mut tree, root, p1, _) = tree_with_pages();
        let now = chrono::Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        tree.page_mut(p1).unwrap().record_visit(now);
        tree.set_input(p1, "q1", json!("answered")).unwrap();

        let session = SessionContext::new("s1");
        let ctx = HookContext::new(&tree, root, p1, &session).unwrap();
        assert!(DefaultSectionHooks.validate_on_leave(&ctx).is_ok());
    }

    #[test]
    fn hook_context_rejects_mismatched_ids() {
        let (tree, root, p1, _) = tree_with_pages();
        let session = SessionContext::default();
        assert!(matches!(
            HookContext::new(&tree, p1, p1, &session),
            Err(TreeError::NotASection(_))
        ));
        assert!(matches!(
            HookContext::new(&tree, root, root, &session),
            Err(TreeError::NotAPage(_))
        ));
    }

    #[test]
    fn page_mut_checks_names_tree_wide() {
        let (mut tree, _, p1, _) = tree_with_pages();
        let mut handle = tree.page_handle(p1).unwrap();
        let err = handle.append(Element::input("q2", AnyInput)).unwrap_err();
        assert!(matches!(err, TreeError::DuplicateElement { .. }));
        handle.append(Element::input("q3", AnyInput)).unwrap();
        assert_eq!(handle.page().elements().len(), 2);
        assert_eq!(tree.element_page("q3"), Some(p1));
    }

    #[test]
    fn section_mut_appends_pages() {
        let (mut tree, root, _, _) = tree_with_pages();
        let mut handle = tree.section_handle(root).unwrap();
        let id = handle.append_page(Page::new("p3")).unwrap();
        assert_eq!(handle.path().to_string(), "exp");
        assert_eq!(tree.path(id).to_string(), "exp.p3");
        assert_eq!(tree.pages().len(), 3);
    }

    #[test]
    fn subsection_handle_fills_an_appended_section() {
        let (mut tree, root, p1, _) = tree_with_pages();
        let mut handle = tree.section_handle(root).unwrap();
        let block = handle.append_section(Section::new("block")).unwrap();
        handle
            .subsection(block)
            .unwrap()
            .append_page(Page::new("b1"))
            .unwrap();
        assert!(matches!(handle.subsection(p1), Err(TreeError::NotASection(_))));

        let mut inner = handle.subsection(block).unwrap();
        assert!(matches!(inner.subsection(root), Err(TreeError::UnknownNode(_))));
        assert_eq!(tree.path(tree.pages()[2]).to_string(), "exp.block.b1");
    }
}
