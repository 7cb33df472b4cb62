//! Hash-chained move journal
//!
//! Every move request and terminal transition of a session leaves one entry.
//! Each entry stores the hash of its predecessor, so any later edit to the
//! journal is detected by [`MoveJournal::verify_integrity`].

use crate::error::JournalError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    /// Request label (`forward`, `jump`, `abort`, ...)
    pub action: String,
    pub from: Option<String>,
    pub to: Option<String>,
    /// Outcome label (`committed`, `rejected:<kind>`, `finished`, ...)
    pub outcome: String,
    pub prev_hash: [u8; 32],
    pub hash: [u8; 32],
}

impl JournalEntry {
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MoveJournal {
    entries: Vec<JournalEntry>,
}

impl MoveJournal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, chaining it to the current head
    pub fn append(
        &mut self,
        timestamp: DateTime<Utc>,
        action: impl Into<String>,
        from: Option<String>,
        to: Option<String>,
        outcome: impl Into<String>,
    ) -> u64 {
        let seq = self.entries.len() as u64;
        let mut entry = JournalEntry {
            seq,
            timestamp,
            action: action.into(),
            from,
            to,
            outcome: outcome.into(),
            prev_hash: self.head(),
            hash: [0u8; 32],
        };
        entry.hash = compute_hash(&entry);
        self.entries.push(entry);
        seq
    }

    #[must_use]
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hash of the newest entry, zeroes when empty
    #[must_use]
    pub fn head(&self) -> [u8; 32] {
        self.entries.last().map(|e| e.hash).unwrap_or([0u8; 32])
    }

    pub fn verify_integrity(&self) -> Result<(), JournalError> {
        let mut prev = [0u8; 32];
        for e in &self.entries {
            if e.prev_hash != prev || e.hash != compute_hash(e) {
                return Err(JournalError::IntegrityViolation { seq: e.seq });
            }
            prev = e.hash;
        }
        Ok(())
    }
}

fn compute_hash(entry: &JournalEntry) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(entry.seq.to_le_bytes());
    hasher.update(entry.timestamp.timestamp_micros().to_le_bytes());
    hasher.update(entry.action.as_bytes());
    hasher.update([0]);
    for part in [&entry.from, &entry.to] {
        match part {
            Some(path) => {
                hasher.update([1]);
                hasher.update(path.as_bytes());
            }
            None => hasher.update([0]),
        }
        hasher.update([0]);
    }
    hasher.update(entry.outcome.as_bytes());
    hasher.update([0]);
    hasher.update(entry.prev_hash);
    hasher.finalize().into()
}
