//! Experiment tree
//!
//! [`ExperimentTree`] is an arena owning every section and page of one
//! experiment. Nodes reference their parent by [`NodeId`]; paths are cached per
//! node and recomputed for a whole subtree whenever it is re-attached.
//!
//! # Invariants
//! - a node has at most one parent
//! - no node is its own ancestor (checked on every attach)
//! - sibling names are unique; element names are unique tree-wide

use crate::error::TreeError;
use crate::hooks::{PageMut, SectionMut};
use crate::page::Page;
use crate::path::TreePath;
use crate::section::Section;
use rand::Rng;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Index;

/// Arena index of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn from_raw(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A section member
#[derive(Debug, Clone)]
pub enum Member {
    Page(Page),
    Section(Section),
}

impl Member {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Page(p) => p.name(),
            Self::Section(s) => s.name(),
        }
    }
}

impl From<Page> for Member {
    fn from(page: Page) -> Self {
        Self::Page(page)
    }
}

impl From<Section> for Member {
    fn from(section: Section) -> Self {
        Self::Section(section)
    }
}

/// Tree node: identity and position shared by pages and sections
#[derive(Debug, Clone)]
pub struct Node {
    parent: Option<NodeId>,
    path: TreePath,
    member: Member,
}

impl Node {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.member.name()
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Cached path, root first
    #[inline]
    #[must_use]
    pub fn path(&self) -> &TreePath {
        &self.path
    }

    #[inline]
    #[must_use]
    pub fn member(&self) -> &Member {
        &self.member
    }

    #[must_use]
    pub fn as_page(&self) -> Option<&Page> {
        match &self.member {
            Member::Page(p) => Some(p),
            Member::Section(_) => None,
        }
    }

    #[must_use]
    pub fn as_section(&self) -> Option<&Section> {
        match &self.member {
            Member::Section(s) => Some(s),
            Member::Page(_) => None,
        }
    }
}

/// Strict tree of sections and pages with a section at the root
#[derive(Debug, Clone)]
pub struct ExperimentTree {
    nodes: Vec<Node>,
    root: NodeId,
    element_names: HashMap<String, NodeId>,
}

impl ExperimentTree {
    /// Create a tree holding only `root`
    #[must_use]
    pub fn new(root: Section) -> Self {
        let path = TreePath::single(root.name());
        Self {
            nodes: vec![Node {
                parent: None,
                path,
                member: Member::Section(root),
            }],
            root: NodeId(0),
            element_names: HashMap::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, detached ones included
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| TreeError::UnknownNode(id.to_string()))
    }

    /// Cached path of a node
    ///
    /// # Panics
    /// Panics if `id` was not minted by this tree.
    #[must_use]
    pub fn path(&self, id: NodeId) -> &TreePath {
        &self[id].path
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    /// # Errors
    /// [`TreeError::UnknownNode`] or [`TreeError::NotAPage`].
    pub fn page(&self, id: NodeId) -> Result<&Page, TreeError> {
        let node = self
            .get(id)
            .ok_or_else(|| TreeError::UnknownNode(id.to_string()))?;
        node.as_page()
            .ok_or_else(|| TreeError::NotAPage(node.path.to_string()))
    }

    /// # Errors
    /// [`TreeError::UnknownNode`] or [`TreeError::NotAPage`].
    pub fn page_mut(&mut self, id: NodeId) -> Result<&mut Page, TreeError> {
        let node = self.get_mut(id)?;
        match &mut node.member {
            Member::Page(p) => Ok(p),
            Member::Section(_) => Err(TreeError::NotAPage(node.path.to_string())),
        }
    }

    /// # Errors
    /// [`TreeError::UnknownNode`] or [`TreeError::NotASection`].
    pub fn section(&self, id: NodeId) -> Result<&Section, TreeError> {
        let node = self
            .get(id)
            .ok_or_else(|| TreeError::UnknownNode(id.to_string()))?;
        node.as_section()
            .ok_or_else(|| TreeError::NotASection(node.path.to_string()))
    }

    /// # Errors
    /// [`TreeError::UnknownNode`] or [`TreeError::NotASection`].
    pub fn section_mut(&mut self, id: NodeId) -> Result<&mut Section, TreeError> {
        let node = self.get_mut(id)?;
        match &mut node.member {
            Member::Section(s) => Ok(s),
            Member::Page(_) => Err(TreeError::NotASection(node.path.to_string())),
        }
    }

    /// Mutable page handle that appends through the global name registry
    ///
    /// # Errors
    /// [`TreeError::UnknownNode`] or [`TreeError::NotAPage`].
    pub fn page_handle(&mut self, id: NodeId) -> Result<PageMut<'_>, TreeError> {
        let registry = &mut self.element_names;
        let node = self
            .nodes
            .get_mut(id.0)
            .ok_or_else(|| TreeError::UnknownNode(id.to_string()))?;
        match &mut node.member {
            Member::Page(page) => Ok(PageMut::new(page, &node.path, id, registry)),
            Member::Section(_) => Err(TreeError::NotAPage(node.path.to_string())),
        }
    }

    /// Mutable section handle for lifecycle hooks
    ///
    /// # Errors
    /// [`TreeError::UnknownNode`] or [`TreeError::NotASection`].
    pub fn section_handle(&mut self, id: NodeId) -> Result<SectionMut<'_>, TreeError> {
        self.section(id)?;
        Ok(SectionMut::new(self, id))
    }

    /// Create a detached node
    ///
    /// Element names of a page are registered immediately.
    ///
    /// # Errors
    /// [`TreeError::InvalidName`], [`TreeError::SectionNotEmpty`] or
    /// [`TreeError::DuplicateElement`].
    pub fn create(&mut self, member: impl Into<Member>) -> Result<NodeId, TreeError> {
        let member = member.into();
        if !TreePath::is_valid_segment(member.name()) {
            return Err(TreeError::InvalidName(member.name().to_string()));
        }
        if let Member::Section(section) = &member {
            if !section.is_empty() {
                return Err(TreeError::SectionNotEmpty(section.name().to_string()));
            }
        }

        let id = NodeId(self.nodes.len());
        if let Member::Page(page) = &member {
            for name in page.element_names() {
                if let Some(owner) = self.element_names.get(name) {
                    return Err(TreeError::DuplicateElement {
                        name: name.to_string(),
                        page: self.path(*owner).to_string(),
                    });
                }
            }
            for name in page.element_names() {
                self.element_names.insert(name.to_string(), id);
            }
        }

        self.nodes.push(Node {
            parent: None,
            path: TreePath::single(member.name()),
            member,
        });
        Ok(id)
    }

    /// Attach `node` (and its subtree) as the last member of `parent`
    ///
    /// A node that already has a parent is moved.
    ///
    /// # Errors
    /// [`TreeError::Cycle`] if `parent` lies in `node`'s subtree,
    /// [`TreeError::DuplicateName`] on a sibling name clash.
    pub fn attach(&mut self, node: NodeId, parent: NodeId) -> Result<(), TreeError> {
        if node == self.root {
            return Err(TreeError::RootNotAttachable);
        }
        let name = self
            .get(node)
            .ok_or_else(|| TreeError::UnknownNode(node.to_string()))?
            .name()
            .to_string();
        let target = self.section(parent)?;

        if node == parent || self.is_ancestor(node, parent) {
            return Err(TreeError::Cycle {
                node: self.path(node).to_string(),
                parent: self.path(parent).to_string(),
            });
        }
        if target.member(&name).is_some() {
            return Err(TreeError::DuplicateName {
                name,
                parent: self.path(parent).clone(),
            });
        }

        if let Some(old_parent) = self.parent(node) {
            self.section_mut(old_parent)?.remove_member(&name);
        }
        self.section_mut(parent)?.insert_member(name, node);
        self.get_mut(node)?.parent = Some(parent);
        self.refresh_paths(node);
        Ok(())
    }

    /// Create `member` and attach it below `parent`
    ///
    /// # Errors
    /// Any error of [`ExperimentTree::create`] or [`ExperimentTree::attach`];
    /// the tree is left unchanged.
    pub fn insert(
        &mut self,
        parent: NodeId,
        member: impl Into<Member>,
    ) -> Result<NodeId, TreeError> {
        let id = self.create(member)?;
        if let Err(err) = self.attach(id, parent) {
            self.discard_last(id);
            return Err(err);
        }
        Ok(id)
    }

    fn discard_last(&mut self, id: NodeId) {
        if id.0 + 1 != self.nodes.len() {
            return;
        }
        if let Some(node) = self.nodes.pop() {
            if let Member::Page(page) = &node.member {
                for name in page.element_names() {
                    self.element_names.remove(name);
                }
            }
        }
    }

    fn refresh_paths(&mut self, start: NodeId) {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            let path = match node.parent {
                Some(parent) => self.path(parent).child(node.name()),
                None => TreePath::single(node.name()),
            };
            let children: Vec<NodeId> = node
                .as_section()
                .map(|s| s.members().map(|(_, m)| m).collect())
                .unwrap_or_default();
            self.nodes[id.0].path = path;
            stack.extend(children);
        }
    }

    /// Whether `ancestor` lies strictly above `node`
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Ancestor sections, nearest first
    #[must_use]
    pub fn uptree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            out.push(parent);
            current = self.parent(parent);
        }
        out
    }

    /// Nearest section containing both nodes
    #[must_use]
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let ups = self.uptree(a);
        self.uptree(b).into_iter().find(|s| ups.contains(s))
    }

    /// Resolve a path (root name first) to a node
    #[must_use]
    pub fn resolve(&self, path: &TreePath) -> Option<NodeId> {
        let mut segments = path.iter();
        if segments.next()? != self[self.root].name() {
            return None;
        }
        let mut current = self.root;
        for segment in segments {
            current = self.get(current)?.as_section()?.member(segment)?;
        }
        Some(current)
    }

    /// Pages of a subtree in traversal order
    #[must_use]
    pub fn all_pages(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_pages(id, &mut out);
        out
    }

    fn collect_pages(&self, id: NodeId, out: &mut Vec<NodeId>) {
        match self.get(id).map(Node::member) {
            Some(Member::Page(_)) => out.push(id),
            Some(Member::Section(section)) => {
                for member in section.traversal_order() {
                    self.collect_pages(*member, out);
                }
            }
            None => {}
        }
    }

    /// All attached pages in traversal order
    #[must_use]
    pub fn pages(&self) -> Vec<NodeId> {
        self.all_pages(self.root)
    }

    /// First page of a subtree in traversal order
    #[must_use]
    pub fn first_page(&self, id: NodeId) -> Option<NodeId> {
        match self.get(id)?.member() {
            Member::Page(_) => Some(id),
            Member::Section(section) => section
                .traversal_order()
                .iter()
                .find_map(|m| self.first_page(*m)),
        }
    }

    /// Last page of a subtree in traversal order
    #[must_use]
    pub fn last_page(&self, id: NodeId) -> Option<NodeId> {
        match self.get(id)?.member() {
            Member::Page(_) => Some(id),
            Member::Section(section) => section
                .traversal_order()
                .iter()
                .rev()
                .find_map(|m| self.last_page(*m)),
        }
    }

    /// Page following `page` anywhere in the tree
    ///
    /// Descends into the first page of a following subsection; empty sections
    /// are skipped.
    #[must_use]
    pub fn next_page(&self, page: NodeId) -> Option<NodeId> {
        let mut node = page;
        loop {
            let parent = self.parent(node)?;
            let section = self.section(parent).ok()?;
            let mut sibling = section.next_member(node);
            while let Some(candidate) = sibling {
                if let Some(found) = self.first_page(candidate) {
                    return Some(found);
                }
                sibling = section.next_member(candidate);
            }
            node = parent;
        }
    }

    /// Page preceding `page` anywhere in the tree
    #[must_use]
    pub fn previous_page(&self, page: NodeId) -> Option<NodeId> {
        let mut node = page;
        loop {
            let parent = self.parent(node)?;
            let section = self.section(parent).ok()?;
            let mut sibling = section.previous_member(node);
            while let Some(candidate) = sibling {
                if let Some(found) = self.last_page(candidate) {
                    return Some(found);
                }
                sibling = section.previous_member(candidate);
            }
            node = parent;
        }
    }

    /// Member following `id` in traversal order, ascending out of sections
    /// whose members are exhausted
    ///
    /// Unlike [`next_page`](Self::next_page) this stops at sections, empty
    /// or not, so a caller can enter them before looking inside.
    #[must_use]
    pub fn next_node(&self, id: NodeId) -> Option<NodeId> {
        let mut node = id;
        loop {
            let parent = self.parent(node)?;
            if let Some(next) = self.section(parent).ok()?.next_member(node) {
                return Some(next);
            }
            node = parent;
        }
    }

    /// Page owning a named element
    #[must_use]
    pub fn element_page(&self, name: &str) -> Option<NodeId> {
        self.element_names.get(name).copied()
    }

    /// Store raw input on an element of `page`
    ///
    /// # Errors
    /// [`TreeError::PageClosed`], [`TreeError::UnknownElement`] or
    /// [`TreeError::NotAnInput`].
    pub fn set_input(&mut self, page: NodeId, element: &str, raw: Value) -> Result<(), TreeError> {
        let path = self.path(page).to_string();
        let page = self.page_mut(page)?;
        if page.is_closed() {
            return Err(TreeError::PageClosed(path));
        }
        let el = page
            .element_mut(element)
            .ok_or_else(|| TreeError::UnknownElement {
                element: element.to_string(),
                page: path,
            })?;
        if el.set_raw(raw) {
            Ok(())
        } else {
            Err(TreeError::NotAnInput(element.to_string()))
        }
    }

    /// Flattened data record of all attached pages
    #[must_use]
    pub fn values(&self) -> BTreeMap<String, Value> {
        self.pages()
            .into_iter()
            .filter_map(|id| self.page(id).ok())
            .flat_map(Page::data)
            .collect()
    }

    /// Fix the traversal order of every section
    pub fn fix_orders<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for node in &mut self.nodes {
            if let Member::Section(section) = &mut node.member {
                section.fix_order(rng);
            }
        }
    }

    /// Fix the traversal order of `id` and every section below it that is
    /// still unfixed
    pub fn fix_orders_below<R: Rng + ?Sized>(&mut self, id: NodeId, rng: &mut R) {
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if let Ok(section) = self.section_mut(node) {
                section.fix_order(rng);
                stack.extend(section.traversal_order().iter().copied());
            }
        }
    }
}

impl Index<NodeId> for ExperimentTree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{AnyInput, Element};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// exp
    /// ├── intro (p1, p2)
    /// ├── empty
    /// └── main
    ///     ├── p3
    ///     └── inner (p4)
    fn sample() -> (ExperimentTree, HashMap<&'static str, NodeId>) {
        let mut tree = ExperimentTree::new(Section::new("exp"));
        let root = tree.root();
        let mut ids = HashMap::new();
        let intro = tree.insert(root, Section::new("intro")).unwrap();
        ids.insert("intro", intro);
        ids.insert("p1", tree.insert(intro, Page::new("p1")).unwrap());
        ids.insert("p2", tree.insert(intro, Page::new("p2")).unwrap());
        ids.insert("empty", tree.insert(root, Section::new("empty")).unwrap());
        let main = tree.insert(root, Section::new("main")).unwrap();
        ids.insert("main", main);
        ids.insert("p3", tree.insert(main, Page::new("p3")).unwrap());
        let inner = tree.insert(main, Section::new("inner")).unwrap();
        ids.insert("inner", inner);
        ids.insert("p4", tree.insert(inner, Page::new("p4")).unwrap());
        (tree, ids)
    }

    fn names(tree: &ExperimentTree, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|id| tree[*id].name().to_string()).collect()
    }

    #[test]
    fn paths_are_root_first() {
        let (tree, ids) = sample();
        assert_eq!(tree.path(ids["p4"]).to_string(), "exp.main.inner.p4");
        assert_eq!(tree.resolve(&"exp.main.inner.p4".parse().unwrap()), Some(ids["p4"]));
        assert_eq!(tree.resolve(&"other.main".parse().unwrap()), None);
        assert_eq!(tree.resolve(&"exp.nope".parse().unwrap()), None);
    }

    #[test]
    fn uptree_is_nearest_first() {
        let (tree, ids) = sample();
        assert_eq!(names(&tree, &tree.uptree(ids["p4"])), vec!["inner", "main", "exp"]);
        assert!(tree.uptree(tree.root()).is_empty());
    }

    #[test]
    fn traversal_skips_empty_sections() {
        let (tree, ids) = sample();
        assert_eq!(names(&tree, &tree.pages()), vec!["p1", "p2", "p3", "p4"]);
        assert_eq!(tree.next_page(ids["p2"]), Some(ids["p3"]));
        assert_eq!(tree.next_page(ids["p3"]), Some(ids["p4"]));
        assert_eq!(tree.next_page(ids["p4"]), None);
        assert_eq!(tree.previous_page(ids["p3"]), Some(ids["p2"]));
        assert_eq!(tree.previous_page(ids["p1"]), None);
        assert_eq!(tree.first_page(ids["empty"]), None);
    }

    #[test]
    fn next_node_stops_at_sections() {
        let (tree, ids) = sample();
        assert_eq!(tree.next_node(ids["p2"]), Some(ids["empty"]));
        assert_eq!(tree.next_node(ids["empty"]), Some(ids["main"]));
        assert_eq!(tree.next_node(ids["p3"]), Some(ids["inner"]));
        assert_eq!(tree.next_node(ids["p4"]), None);
        assert_eq!(tree.next_node(tree.root()), None);
    }

    #[test]
    fn orders_fixed_below_a_section_leave_the_rest_alone() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let (mut tree, ids) = sample();
        let late = tree.insert(ids["main"], Section::new("late").shuffle(true)).unwrap();
        for name in ["a", "b", "c", "d"] {
            tree.insert(late, Page::new(name)).unwrap();
        }
        tree.fix_orders_below(ids["main"], &mut StdRng::seed_from_u64(9));

        assert!(tree.section(ids["main"]).unwrap().is_order_fixed());
        assert!(tree.section(late).unwrap().is_order_fixed());
        assert!(tree.section(ids["inner"]).unwrap().is_order_fixed());
        assert!(!tree.section(ids["intro"]).unwrap().is_order_fixed());
        let mut order = names(&tree, tree.section(late).unwrap().traversal_order());
        order.sort_unstable();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn duplicate_sibling_names_are_rejected() {
        let (mut tree, ids) = sample();
        let before = tree.len();
        let err = tree.insert(ids["intro"], Page::new("p1")).unwrap_err();
        assert!(matches!(err, TreeError::DuplicateName { .. }));
        assert_eq!(tree.len(), before);
        tree.insert(ids["main"], Page::new("p1")).unwrap();
    }

    #[test]
    fn element_names_are_global() {
        let (mut tree, ids) = sample();
        let page = Page::new("q1")
            .with_element(Element::input("age", AnyInput))
            .unwrap();
        tree.insert(ids["intro"], page).unwrap();

        let clash = Page::new("q2")
            .with_element(Element::input("age", AnyInput))
            .unwrap();
        let err = tree.insert(ids["main"], clash).unwrap_err();
        assert!(matches!(err, TreeError::DuplicateElement { ref name, .. } if name == "age"));
    }

    #[test]
    fn failed_insert_releases_element_names() {
        let (mut tree, ids) = sample();
        let page = Page::new("p1")
            .with_element(Element::input("fresh", AnyInput))
            .unwrap();
        assert!(tree.insert(ids["intro"], page).is_err());
        assert_eq!(tree.element_page("fresh"), None);
    }

    #[test]
    fn attach_rejects_cycles() {
        let (mut tree, ids) = sample();
        let err = tree.attach(ids["main"], ids["inner"]).unwrap_err();
        assert!(matches!(err, TreeError::Cycle { .. }));
        let err = tree.attach(ids["main"], ids["main"]).unwrap_err();
        assert!(matches!(err, TreeError::Cycle { .. }));
        assert_eq!(tree.attach(tree.root(), ids["main"]), Err(TreeError::RootNotAttachable));
    }

    #[test]
    fn attach_moves_subtree_and_refreshes_paths() {
        let (mut tree, ids) = sample();
        tree.attach(ids["inner"], ids["intro"]).unwrap();
        assert_eq!(tree.path(ids["p4"]).to_string(), "exp.intro.inner.p4");
        assert_eq!(tree.parent(ids["inner"]), Some(ids["intro"]));
        assert!(tree.section(ids["main"]).unwrap().member("inner").is_none());
        assert_eq!(names(&tree, &tree.pages()), vec!["p1", "p2", "p4", "p3"]);
    }

    #[test]
    fn attach_to_a_page_fails() {
        let (mut tree, ids) = sample();
        let loose = tree.create(Page::new("loose")).unwrap();
        assert!(matches!(tree.attach(loose, ids["p1"]), Err(TreeError::NotASection(_))));
    }

    #[test]
    fn invalid_names_are_rejected() {
        let (mut tree, ids) = sample();
        assert!(matches!(
            tree.insert(ids["main"], Page::new("a.b")),
            Err(TreeError::InvalidName(_))
        ));
    }

    #[test]
    fn common_ancestor_of_pages() {
        let (tree, ids) = sample();
        assert_eq!(tree.common_ancestor(ids["p1"], ids["p2"]), Some(ids["intro"]));
        assert_eq!(tree.common_ancestor(ids["p3"], ids["p4"]), Some(ids["main"]));
        assert_eq!(tree.common_ancestor(ids["p1"], ids["p4"]), Some(tree.root()));
    }

    #[test]
    fn set_input_rules() {
        let (mut tree, ids) = sample();
        let page = Page::new("form")
            .with_element(Element::input("name", AnyInput))
            .unwrap()
            .with_element(Element::display_named("hint", "Type your name"))
            .unwrap();
        let form = tree.insert(ids["main"], page).unwrap();

        tree.set_input(form, "name", json!("Ada")).unwrap();
        assert_eq!(tree.values()["name"], json!("Ada"));
        assert_eq!(
            tree.set_input(form, "hint", json!("x")),
            Err(TreeError::NotAnInput("hint".into()))
        );
        assert!(matches!(
            tree.set_input(form, "missing", json!(1)),
            Err(TreeError::UnknownElement { .. })
        ));
        tree.page_mut(form).unwrap().close();
        assert!(matches!(tree.set_input(form, "name", json!("B")), Err(TreeError::PageClosed(_))));
    }
}
