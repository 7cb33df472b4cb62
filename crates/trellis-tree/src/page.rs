//! Pages
//!
//! A [`Page`] is a leaf of the experiment tree. It owns its elements in
//! declaration order, the visit intervals recorded while it was displayed,
//! and its display rules (`must_be_shown`, `minimum_display_time`).

use crate::element::Element;
use crate::error::{TreeError, ValidationError};
use crate::hooks::{DefaultPageHooks, PageHooks};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// One display interval of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Visit {
    pub shown_at: DateTime<Utc>,
    pub hidden_at: Option<DateTime<Utc>>,
}

impl Visit {
    /// Displayed duration up to `now` (or until hidden)
    #[must_use]
    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        let end = self.hidden_at.unwrap_or(now);
        (end - self.shown_at).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Outcome of [`Page::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    /// Messages in element declaration order, page-level message last
    Invalid(Vec<String>),
}

impl ValidationResult {
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Messages (empty when valid)
    #[must_use]
    pub fn messages(&self) -> &[String] {
        match self {
            Self::Valid => &[],
            Self::Invalid(messages) => messages,
        }
    }

    /// Convert into a `Result` for hook plumbing
    pub fn into_result(self) -> Result<(), ValidationError> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(messages) => Err(ValidationError::new(messages)),
        }
    }
}

/// Leaf tree node holding elements and per-visit display rules
#[derive(Debug, Clone)]
pub struct Page {
    name: String,
    title: Option<String>,
    elements: Vec<Element>,
    must_be_shown: bool,
    minimum_display_time: Duration,
    visits: Vec<Visit>,
    closed: bool,
    hooks: Arc<dyn PageHooks>,
}

impl Page {
    /// Create an empty page with default hooks
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            elements: Vec::new(),
            must_be_shown: false,
            minimum_display_time: Duration::ZERO,
            visits: Vec::new(),
            closed: false,
            hooks: Arc::new(DefaultPageHooks),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Forbid skipping this page with a jump
    #[must_use]
    pub fn must_be_shown(mut self, value: bool) -> Self {
        self.must_be_shown = value;
        self
    }

    #[must_use]
    pub fn minimum_display_time(mut self, value: Duration) -> Self {
        self.minimum_display_time = value;
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn PageHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Builder form of [`Page::append`]
    ///
    /// # Errors
    /// Returns [`TreeError::DuplicateElement`] on a page-local name clash.
    pub fn with_element(mut self, element: Element) -> Result<Self, TreeError> {
        self.append(element)?;
        Ok(self)
    }

    /// Append an element
    ///
    /// Only page-local names are checked here; the tree checks names globally
    /// when the page is inserted or when a hook appends through
    /// [`PageMut`](crate::hooks::PageMut).
    ///
    /// # Errors
    /// Returns [`TreeError::DuplicateElement`] if the name is already on this page.
    pub fn append(&mut self, element: Element) -> Result<(), TreeError> {
        if let Some(name) = element.name() {
            if self.element(name).is_some() {
                return Err(TreeError::DuplicateElement {
                    name: name.to_string(),
                    page: self.name.clone(),
                });
            }
        }
        self.elements.push(element);
        Ok(())
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
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    #[must_use]
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name() == Some(name))
    }

    pub(crate) fn element_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.name() == Some(name))
    }

    /// Names of all named elements, in declaration order
    pub fn element_names(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(Element::name)
    }

    #[inline]
    #[must_use]
    pub fn is_must_be_shown(&self) -> bool {
        self.must_be_shown
    }

    #[inline]
    #[must_use]
    pub fn min_display_time(&self) -> Duration {
        self.minimum_display_time
    }

    #[inline]
    #[must_use]
    pub fn hooks(&self) -> &Arc<dyn PageHooks> {
        &self.hooks
    }

    #[inline]
    #[must_use]
    pub fn visits(&self) -> &[Visit] {
        &self.visits
    }

    /// Whether the page has been displayed at least once
    #[inline]
    #[must_use]
    pub fn has_been_shown(&self) -> bool {
        !self.visits.is_empty()
    }

    /// Whether the page has been hidden at least once
    #[inline]
    #[must_use]
    pub fn has_been_hidden(&self) -> bool {
        self.visits.iter().any(|v| v.hidden_at.is_some())
    }

    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Mark the page as passed; its inputs are frozen from now on
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Start a display interval
    pub fn record_visit(&mut self, timestamp: DateTime<Utc>) {
        self.visits.push(Visit {
            shown_at: timestamp,
            hidden_at: None,
        });
    }

    /// End the open display interval, if any
    pub fn record_hide(&mut self, timestamp: DateTime<Utc>) {
        if let Some(visit) = self.visits.last_mut().filter(|v| v.hidden_at.is_none()) {
            visit.hidden_at = Some(timestamp);
        }
    }

    /// Reopen the last display interval and restore the closed flag
    ///
    /// Undoes [`record_hide`](Self::record_hide) and [`close`](Self::close)
    /// for a move that was abandoned after the page was hidden.
    pub fn resume_visit(&mut self, closed: bool) {
        if let Some(visit) = self.visits.last_mut() {
            visit.hidden_at = None;
        }
        self.closed = closed;
    }

    /// Time spent on the page during the current (last) visit
    #[must_use]
    pub fn current_visit_duration(&self, now: DateTime<Utc>) -> Duration {
        self.visits
            .last()
            .map(|v| v.duration(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Total display time over all visits
    #[must_use]
    pub fn total_display_time(&self, now: DateTime<Utc>) -> Duration {
        self.visits.iter().map(|v| v.duration(now)).sum()
    }

    /// Whether the current visit satisfies `minimum_display_time`
    #[must_use]
    pub fn minimum_display_time_met(&self, now: DateTime<Utc>) -> bool {
        self.current_visit_duration(now) >= self.minimum_display_time
    }

    /// Validate input elements, then the page-level hook
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let mut messages: Vec<String> = self
            .elements
            .iter()
            .filter(|e| e.is_input())
            .map(Element::validate)
            .filter(|result| !result.ok)
            .map(|result| {
                result
                    .error_message
                    .unwrap_or_else(|| "invalid input".to_string())
            })
            .collect();

        if let Err(message) = self.hooks.validate(self) {
            messages.push(message);
        }

        if messages.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(messages)
        }
    }

    /// Collected values of every named input element
    #[must_use]
    pub fn data(&self) -> BTreeMap<String, serde_json::Value> {
        self.elements
            .iter()
            .filter(|e| e.is_input())
            .filter_map(|e| e.name().map(|name| (name.to_string(), e.value())))
            .collect()
    }
}
