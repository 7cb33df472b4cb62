//! Session factory
//!
//! An [`Experiment`] pairs a template with its configuration and the sinks
//! its persistence targets write to. Sinks are shared by every session; each
//! session gets its own tree copy, fallback chain and navigator.

use crate::clock::{Clock, SystemClock};
use crate::condition::{ConditionLookup, NoCondition};
use crate::config::{ExperimentConfig, SessionConfig};
use crate::error::NavigationError;
use crate::navigator::Navigator;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use trellis_store::{FallbackChain, PersistenceTarget, StorageSink};
use trellis_tree::ExperimentTemplate;
use uuid::Uuid;

#[derive(Debug)]
pub struct Experiment {
    title: String,
    template: ExperimentTemplate,
    config: SessionConfig,
    sinks: HashMap<String, Arc<dyn StorageSink>>,
    clock: Arc<dyn Clock>,
    conditions: Arc<dyn ConditionLookup>,
    opened: AtomicU64,
}

impl Experiment {
    #[must_use]
    pub fn new(template: ExperimentTemplate, config: SessionConfig) -> Self {
        let title = template.tree()[template.tree().root()].name().to_string();
        let sinks = config
            .persistence
            .iter()
            .map(|target| (target.name.clone(), target.build_sink()))
            .collect();
        Self {
            title,
            template,
            config,
            sinks,
            clock: Arc::new(SystemClock),
            conditions: Arc::new(NoCondition),
            opened: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn from_config(template: ExperimentTemplate, config: ExperimentConfig) -> Self {
        Self::new(template, config.session).with_title(config.title)
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Use `sink` for the target named `target` instead of the configured one
    #[must_use]
    pub fn with_sink(mut self, target: impl Into<String>, sink: Arc<dyn StorageSink>) -> Self {
        self.sinks.insert(target.into(), sink);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_conditions(mut self, conditions: Arc<dyn ConditionLookup>) -> Self {
        self.conditions = conditions;
        self
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn template(&self) -> &ExperimentTemplate {
        &self.template
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Sessions opened so far
    #[must_use]
    pub fn sessions_opened(&self) -> u64 {
        self.opened.load(Ordering::Relaxed)
    }

    /// Open a session with a fresh id
    ///
    /// # Errors
    /// [`NavigationError::Chain`] when a required target fails to initialize.
    pub async fn open_session(&self) -> Result<Navigator, NavigationError> {
        self.open_session_with_id(Uuid::new_v4().to_string()).await
    }

    /// Open a session with a caller-chosen id
    ///
    /// # Errors
    /// [`NavigationError::Chain`] when a required target fails to initialize.
    pub async fn open_session_with_id(
        &self,
        session_id: impl Into<String>,
    ) -> Result<Navigator, NavigationError> {
        let session_id = session_id.into();
        let targets = self
            .config
            .persistence
            .iter()
            .map(|target| match self.sinks.get(&target.name) {
                Some(sink) => PersistenceTarget::with_sink(target.clone(), Arc::clone(sink)),
                None => PersistenceTarget::from_config(target.clone()),
            })
            .collect();
        let chain = FallbackChain::initialize(targets).await?;

        let n = self.opened.fetch_add(1, Ordering::Relaxed);
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(n)),
            None => StdRng::from_entropy(),
        };
        let tree = self.template.instantiate(&mut rng);
        debug!(session = %session_id, n, "session opened");

        Ok(Navigator::new(session_id, tree, chain)
            .with_experiment_name(self.title.clone())
            .with_clock(Arc::clone(&self.clock))
            .with_conditions(Arc::clone(&self.conditions))
            .with_config(self.config.clone())
            .with_rng(rng))
    }
}
