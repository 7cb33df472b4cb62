//! Trellis Store
//!
//! Session record persistence:
//! - [`SessionRecord`] is the snapshot written after every committed move
//! - [`StorageSink`] is the backend seam, with [`MemorySink`] and [`JsonDirSink`] built in
//! - [`FallbackChain`] tries [`PersistenceTarget`]s in priority order until one accepts

pub mod chain;
pub mod error;
pub mod json_dir;
pub mod memory;
pub mod record;
pub mod sink;
pub mod target;

pub use chain::{FallbackChain, SaveOutcome, TargetFailure};
pub use error::{ChainError, StorageError};
pub use json_dir::JsonDirSink;
pub use memory::MemorySink;
pub use record::SessionRecord;
pub use sink::StorageSink;
pub use target::{PersistenceTarget, SinkConfig, TargetConfig};
