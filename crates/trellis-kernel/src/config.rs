//! Experiment and session configuration
//!
//! ```toml
//! title = "Mood study"
//! version = "1.2"
//!
//! [session]
//! timeout_secs = 3600
//! seed = 7
//!
//! [[session.persistence]]
//! name = "disk"
//! priority = 0
//! kind = "json_dir"
//! path = "data/sessions"
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use trellis_store::TargetConfig;

/// Per-session behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sessions expire this many seconds after start
    pub timeout_secs: Option<u64>,
    /// Skip the minimum display time rule for every move
    pub debug: bool,
    /// Base seed for shuffle orders
    pub seed: Option<u64>,
    pub persistence: Vec<TargetConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            debug: false,
            seed: None,
            persistence: vec![TargetConfig::memory("memory", 0)],
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replace all persistence targets
    #[must_use]
    pub fn with_targets(mut self, targets: Vec<TargetConfig>) -> Self {
        self.persistence = targets;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// # Errors
    /// [`ConfigError::Invalid`] on duplicate target names or a zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        let mut names = HashSet::new();
        for target in &self.persistence {
            if !names.insert(target.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate persistence target '{}'",
                    target.name
                )));
            }
        }
        Ok(())
    }
}

/// Top-level experiment configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub title: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_version() -> String {
    "0.1".to_string()
}

impl ExperimentConfig {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: default_version(),
            session: SessionConfig::default(),
        }
    }

    /// # Errors
    /// Parse failures and [`SessionConfig::validate`] failures.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        if config.title.trim().is_empty() {
            return Err(ConfigError::Invalid("title must not be empty".into()));
        }
        config.session.validate()?;
        Ok(config)
    }

    /// # Errors
    /// I/O failures and everything [`ExperimentConfig::from_toml_str`] reports.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_toml_str(&input)
    }
}
