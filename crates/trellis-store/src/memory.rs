//! In-memory sink

use crate::error::StorageError;
use crate::record::SessionRecord;
use crate::sink::StorageSink;
use crate::target::TargetConfig;
use async_trait::async_trait;
use parking_lot::Mutex;

/// Keeps every written record in process memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<SessionRecord>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All writes in arrival order
    #[must_use]
    pub fn records(&self) -> Vec<SessionRecord> {
        self.records.lock().clone()
    }

    /// Most recent snapshot of one session
    #[must_use]
    pub fn latest(&self, session_id: &str) -> Option<SessionRecord> {
        self.records
            .lock()
            .iter()
            .rev()
            .find(|r| r.session_id == session_id)
            .cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl StorageSink for MemorySink {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn write(
        &self,
        _target: &TargetConfig,
        record: &SessionRecord,
    ) -> Result<(), StorageError> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}
