//! Persistence targets
//!
//! A [`TargetConfig`] is the serializable description of one save target; a
//! [`PersistenceTarget`] pairs it with the sink that performs the writes.

use crate::json_dir::JsonDirSink;
use crate::memory::MemorySink;
use crate::sink::StorageSink;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Built-in sink kinds selectable from configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkConfig {
    /// In-process memory
    Memory,
    /// One JSON file per session under `path`
    JsonDir { path: PathBuf },
}

/// Configuration of one persistence target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    /// Lower values are tried first
    pub priority: u32,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Fail chain construction if this target cannot initialize
    #[serde(default)]
    pub assure_initialization: bool,
    #[serde(flatten)]
    pub sink: SinkConfig,
}

fn default_active() -> bool {
    true
}

impl TargetConfig {
    /// Active in-memory target
    #[must_use]
    pub fn memory(name: impl Into<String>, priority: u32) -> Self {
        Self {
            name: name.into(),
            priority,
            active: true,
            assure_initialization: false,
            sink: SinkConfig::Memory,
        }
    }

    /// Active JSON directory target
    #[must_use]
    pub fn json_dir(name: impl Into<String>, priority: u32, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            priority,
            active: true,
            assure_initialization: false,
            sink: SinkConfig::JsonDir { path: path.into() },
        }
    }

    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    #[must_use]
    pub fn with_assure_initialization(mut self, assure: bool) -> Self {
        self.assure_initialization = assure;
        self
    }

    /// Instantiate the built-in sink this configuration names
    #[must_use]
    pub fn build_sink(&self) -> Arc<dyn StorageSink> {
        match &self.sink {
            SinkConfig::Memory => Arc::new(MemorySink::new()),
            SinkConfig::JsonDir { path } => Arc::new(JsonDirSink::new(path.clone())),
        }
    }
}

/// A configured target and its sink
#[derive(Debug, Clone)]
pub struct PersistenceTarget {
    config: TargetConfig,
    sink: Arc<dyn StorageSink>,
}

impl PersistenceTarget {
    /// Target using the built-in sink named by `config`
    #[must_use]
    pub fn from_config(config: TargetConfig) -> Self {
        let sink = config.build_sink();
        Self { config, sink }
    }

    /// Target using a caller-supplied sink
    #[must_use]
    pub fn with_sink(config: TargetConfig, sink: Arc<dyn StorageSink>) -> Self {
        Self { config, sink }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &TargetConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    #[inline]
    #[must_use]
    pub fn priority(&self) -> u32 {
        self.config.priority
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.config.active
    }

    #[inline]
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn StorageSink> {
        &self.sink
    }

    pub(crate) fn deactivate(&mut self) {
        self.config.active = false;
    }
}
