//! Fallback persistence chain
//!
//! Targets are tried one at a time in ascending priority. The first target
//! that accepts a snapshot ends the attempt; later targets are not touched.

use crate::error::{ChainError, StorageError};
use crate::record::SessionRecord;
use crate::target::PersistenceTarget;
use std::collections::HashSet;
use tracing::{debug, error, warn};

/// One failed save attempt
#[derive(Debug)]
pub struct TargetFailure {
    pub target: String,
    pub error: StorageError,
}

/// Result of a save through the chain
#[derive(Debug)]
pub enum SaveOutcome {
    /// `target` accepted the record after `failures` earlier targets failed
    Saved {
        target: String,
        failures: Vec<TargetFailure>,
    },
    /// Every active target failed
    Failed { failures: Vec<TargetFailure> },
    /// Nothing to try
    NoActiveTargets,
}

impl SaveOutcome {
    /// True when the record was not stored anywhere
    #[inline]
    #[must_use]
    pub fn is_total_failure(&self) -> bool {
        !matches!(self, Self::Saved { .. })
    }

    /// Name of the target that stored the record
    #[must_use]
    pub fn saved_to(&self) -> Option<&str> {
        match self {
            Self::Saved { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Failures encountered on the way
    #[must_use]
    pub fn failures(&self) -> &[TargetFailure] {
        match self {
            Self::Saved { failures, .. } | Self::Failed { failures } => failures,
            Self::NoActiveTargets => &[],
        }
    }
}

/// Ordered persistence targets of one session
#[derive(Debug, Clone)]
pub struct FallbackChain {
    targets: Vec<PersistenceTarget>,
}

impl FallbackChain {
    /// Sort and initialize targets
    ///
    /// Active targets are initialized in priority order. A failing target with
    /// `assure_initialization` aborts construction; any other failing target is
    /// deactivated for the lifetime of the chain.
    ///
    /// # Errors
    /// [`ChainError::InitializationFailed`] or [`ChainError::DuplicateTarget`].
    pub async fn initialize(mut targets: Vec<PersistenceTarget>) -> Result<Self, ChainError> {
        let mut seen = HashSet::new();
        for target in &targets {
            if !seen.insert(target.name().to_string()) {
                return Err(ChainError::DuplicateTarget(target.name().to_string()));
            }
        }
        targets.sort_by_key(PersistenceTarget::priority);

        for target in &mut targets {
            if !target.is_active() {
                continue;
            }
            let result = target.sink().initialize(target.config()).await;
            match result {
                Ok(()) => debug!(
                    target_name = %target.name(),
                    kind = target.sink().kind(),
                    "persistence target ready"
                ),
                Err(source) if target.config().assure_initialization => {
                    error!(
                        target_name = %target.name(),
                        error = %source,
                        "required persistence target failed to initialize"
                    );
                    return Err(ChainError::InitializationFailed {
                        target: target.name().to_string(),
                        source,
                    });
                }
                Err(err) => {
                    warn!(
                        target_name = %target.name(),
                        error = %err,
                        "persistence target disabled after failed initialization"
                    );
                    target.deactivate();
                }
            }
        }

        Ok(Self { targets })
    }

    /// Chain with no targets
    #[must_use]
    pub fn empty() -> Self {
        Self { targets: Vec::new() }
    }

    #[must_use]
    pub fn targets(&self) -> &[PersistenceTarget] {
        &self.targets
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.targets.iter().filter(|t| t.is_active()).count()
    }

    /// Save through the first target that accepts the record
    pub async fn save(&self, record: &SessionRecord) -> SaveOutcome {
        let mut failures = Vec::new();
        let mut attempted = false;

        for target in self.targets.iter().filter(|t| t.is_active()) {
            attempted = true;
            match target.sink().write(target.config(), record).await {
                Ok(()) => {
                    debug!(
                        session_id = %record.session_id,
                        target_name = %target.name(),
                        skipped = failures.len(),
                        "session record saved"
                    );
                    return SaveOutcome::Saved {
                        target: target.name().to_string(),
                        failures,
                    };
                }
                Err(err) => {
                    warn!(
                        session_id = %record.session_id,
                        target_name = %target.name(),
                        error = %err,
                        "persistence target failed, trying next"
                    );
                    failures.push(TargetFailure {
                        target: target.name().to_string(),
                        error: err,
                    });
                }
            }
        }

        if !attempted {
            error!(session_id = %record.session_id, "no active persistence targets");
            return SaveOutcome::NoActiveTargets;
        }

        error!(
            session_id = %record.session_id,
            attempts = failures.len(),
            "session record could not be saved to any target"
        );
        SaveOutcome::Failed { failures }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySink;
    use crate::target::TargetConfig;
    use chrono::Utc;
    use std::sync::Arc;

    #[tokio::test]
    async fn lowest_priority_value_wins() {
        let first = Arc::new(MemorySink::new());
        let second = Arc::new(MemorySink::new());
        let chain = FallbackChain::initialize(vec![
            PersistenceTarget::with_sink(TargetConfig::memory("second", 5), second.clone()),
            PersistenceTarget::with_sink(TargetConfig::memory("first", 1), first.clone()),
        ])
        .await
        .unwrap();

        let outcome = chain.save(&SessionRecord::new("s", "running", Utc::now())).await;
        assert_eq!(outcome.saved_to(), Some("first"));
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn inactive_targets_are_skipped() {
        let sink = Arc::new(MemorySink::new());
        let chain = FallbackChain::initialize(vec![PersistenceTarget::with_sink(
            TargetConfig::memory("off", 0).with_active(false),
            sink.clone(),
        )])
        .await
        .unwrap();

        let outcome = chain.save(&SessionRecord::new("s", "running", Utc::now())).await;
        assert!(matches!(outcome, SaveOutcome::NoActiveTargets));
        assert!(outcome.is_total_failure());
        assert!(sink.is_empty());
    }

    /// Log sink shared with a test subscriber
    #[derive(Clone, Default)]
    struct Captured(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn chain_without_active_targets_logs_an_error() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let outcome = FallbackChain::empty()
            .save(&SessionRecord::new("s", "running", Utc::now()))
            .await;
        assert!(outcome.is_total_failure());

        let output = String::from_utf8(captured.0.lock().clone()).unwrap();
        let line = output
            .lines()
            .find(|line| line.contains("no active persistence targets"))
            .unwrap();
        assert!(line.contains("ERROR"), "{line}");
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let err = FallbackChain::initialize(vec![
            PersistenceTarget::from_config(TargetConfig::memory("a", 0)),
            PersistenceTarget::from_config(TargetConfig::memory("a", 1)),
        ])
        .await
        .unwrap_err();
        assert!(matches!(err, ChainError::DuplicateTarget(name) if name == "a"));
    }
}
