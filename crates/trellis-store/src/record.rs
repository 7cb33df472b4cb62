//! Session records
//!
//! [`SessionRecord`] is the aggregate data snapshot written after every
//! committed move and every terminal transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Snapshot of one participant session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub experiment: String,
    pub condition: Option<String>,
    /// Lifecycle status label (`running`, `finished`, ...)
    pub status: String,
    /// Path of the page displayed when the record was taken
    pub current: Option<String>,
    /// Departed page paths in visit order
    pub history: Vec<String>,
    /// Flattened element values
    pub values: BTreeMap<String, Value>,
    pub started_at: Option<DateTime<Utc>>,
    pub saved_at: DateTime<Utc>,
    pub journal_len: usize,
    pub abort_reason: Option<String>,
}

impl SessionRecord {
    /// Minimal record, mostly for tests and diagnostics
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        status: impl Into<String>,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            experiment: String::new(),
            condition: None,
            status: status.into(),
            current: None,
            history: Vec::new(),
            values: BTreeMap::new(),
            started_at: None,
            saved_at,
            journal_len: 0,
            abort_reason: None,
        }
    }

    /// Pretty JSON rendering
    ///
    /// # Errors
    /// Propagates `serde_json` failures.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
