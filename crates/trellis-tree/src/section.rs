//! Sections
//!
//! A [`Section`] groups pages and subsections and answers, for its *direct*
//! members, whether a requested kind of movement is permitted. Member
//! references are [`NodeId`]s into the owning [`ExperimentTree`](crate::ExperimentTree).

use crate::hooks::{DefaultSectionHooks, SectionHooks};
use crate::tree::NodeId;
use indexmap::IndexMap;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

/// Kinds of movement a section may permit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    Forward,
    Backward,
    JumpFrom,
    JumpTo,
}

/// Composite tree node with movement permissions
#[derive(Debug, Clone)]
pub struct Section {
    name: String,
    title: Option<String>,
    members: IndexMap<String, NodeId>,
    order: Vec<NodeId>,
    order_fixed: bool,
    allow_forward: bool,
    allow_backward: bool,
    allow_jumpfrom: bool,
    allow_jumpto: bool,
    shuffle: bool,
    hooks: Arc<dyn SectionHooks>,
}

impl Section {
    /// Forward and backward allowed, jumps forbidden
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            members: IndexMap::new(),
            order: Vec::new(),
            order_fixed: false,
            allow_forward: true,
            allow_backward: true,
            allow_jumpfrom: false,
            allow_jumpto: false,
            shuffle: false,
            hooks: Arc::new(DefaultSectionHooks),
        }
    }

    /// Section whose members can only be left forward
    #[must_use]
    pub fn forward_only(name: impl Into<String>) -> Self {
        Self::new(name).allow_backward(false)
    }

    /// Section allowing every kind of movement
    #[must_use]
    pub fn free(name: impl Into<String>) -> Self {
        Self::new(name).allow_jumpfrom(true).allow_jumpto(true)
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn allow_forward(mut self, value: bool) -> Self {
        self.allow_forward = value;
        self
    }

    #[must_use]
    pub fn allow_backward(mut self, value: bool) -> Self {
        self.allow_backward = value;
        self
    }

    #[must_use]
    pub fn allow_jumpfrom(mut self, value: bool) -> Self {
        self.allow_jumpfrom = value;
        self
    }

    #[must_use]
    pub fn allow_jumpto(mut self, value: bool) -> Self {
        self.allow_jumpto = value;
        self
    }

    /// Traverse members in a per-session random order
    #[must_use]
    pub fn shuffle(mut self, value: bool) -> Self {
        self.shuffle = value;
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn SectionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn is_shuffled(&self) -> bool {
        self.shuffle
    }

    #[inline]
    #[must_use]
    pub fn hooks(&self) -> &Arc<dyn SectionHooks> {
        &self.hooks
    }

    /// Whether this section permits `kind` for its direct members
    #[must_use]
    pub fn permits(&self, kind: MoveKind) -> bool {
        match kind {
            MoveKind::Forward => self.allow_forward,
            MoveKind::Backward => self.allow_backward,
            MoveKind::JumpFrom => self.allow_jumpfrom,
            MoveKind::JumpTo => self.allow_jumpto,
        }
    }

    /// Member lookup by name
    #[must_use]
    pub fn member(&self, name: &str) -> Option<NodeId> {
        self.members.get(name).copied()
    }

    /// Members in declaration order
    pub fn members(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.members.iter().map(|(name, id)| (name.as_str(), *id))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in traversal order (the fixed shuffle order if shuffled)
    #[inline]
    #[must_use]
    pub fn traversal_order(&self) -> &[NodeId] {
        &self.order
    }

    /// Member following `member` in traversal order
    #[must_use]
    pub fn next_member(&self, member: NodeId) -> Option<NodeId> {
        let pos = self.order.iter().position(|id| *id == member)?;
        self.order.get(pos + 1).copied()
    }

    /// Member preceding `member` in traversal order
    #[must_use]
    pub fn previous_member(&self, member: NodeId) -> Option<NodeId> {
        let pos = self.order.iter().position(|id| *id == member)?;
        pos.checked_sub(1).and_then(|p| self.order.get(p).copied())
    }

    /// Whether the traversal order has been fixed for the session
    #[inline]
    #[must_use]
    pub fn is_order_fixed(&self) -> bool {
        self.order_fixed
    }

    /// Fix the traversal order once; later calls are no-ops
    pub fn fix_order<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.order_fixed {
            return;
        }
        if self.shuffle {
            self.order.shuffle(rng);
        }
        self.order_fixed = true;
    }

    pub(crate) fn insert_member(&mut self, name: String, id: NodeId) {
        self.members.insert(name, id);
        self.order.push(id);
    }

    pub(crate) fn remove_member(&mut self, name: &str) -> Option<NodeId> {
        let id = self.members.shift_remove(name)?;
        self.order.retain(|m| *m != id);
        Some(id)
    }
}
