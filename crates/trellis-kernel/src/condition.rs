//! Read-only condition lookup
//!
//! Assignment happens elsewhere; a session only reads the condition it was
//! given, once, when it starts.

use std::collections::HashMap;
use std::fmt;

pub trait ConditionLookup: Send + Sync + fmt::Debug {
    /// Condition already assigned to `session_id`, if any
    fn get_condition(&self, session_id: &str) -> Option<String>;
}

/// No conditions at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCondition;

impl ConditionLookup for NoCondition {
    fn get_condition(&self, _session_id: &str) -> Option<String> {
        None
    }
}

/// Same condition for every session
#[derive(Debug, Clone)]
pub struct FixedCondition(pub String);

impl FixedCondition {
    #[must_use]
    pub fn new(condition: impl Into<String>) -> Self {
        Self(condition.into())
    }
}

impl ConditionLookup for FixedCondition {
    fn get_condition(&self, _session_id: &str) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Explicit per-session assignments with an optional fallback
#[derive(Debug, Clone, Default)]
pub struct MapConditions {
    assigned: HashMap<String, String>,
    fallback: Option<String>,
}

impl MapConditions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn assign(mut self, session_id: impl Into<String>, condition: impl Into<String>) -> Self {
        self.assigned.insert(session_id.into(), condition.into());
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, condition: impl Into<String>) -> Self {
        self.fallback = Some(condition.into());
        self
    }
}

impl ConditionLookup for MapConditions {
    fn get_condition(&self, session_id: &str) -> Option<String> {
        self.assigned
            .get(session_id)
            .cloned()
            .or_else(|| self.fallback.clone())
    }
}
