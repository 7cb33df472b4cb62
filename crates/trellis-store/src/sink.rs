//! Storage sink trait
//!
//! A sink is the component that actually persists a [`SessionRecord`].
//! Sinks are shared between sessions, so implementations must be safe to call
//! concurrently for different session ids.

use crate::error::StorageError;
use crate::record::SessionRecord;
use crate::target::TargetConfig;
use async_trait::async_trait;
use std::fmt::Debug;

/// Persistence backend for session records
#[async_trait]
pub trait StorageSink: Send + Sync + Debug {
    /// Short label used in logs
    fn kind(&self) -> &'static str;

    /// Prepare the backend before first use
    ///
    /// Called once per chain construction. The default does nothing.
    async fn initialize(&self, _target: &TargetConfig) -> Result<(), StorageError> {
        Ok(())
    }

    /// Persist one snapshot
    ///
    /// Later snapshots of the same session supersede earlier ones.
    async fn write(
        &self,
        target: &TargetConfig,
        record: &SessionRecord,
    ) -> Result<(), StorageError>;
}
