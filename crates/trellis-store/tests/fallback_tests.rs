use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use trellis_store::{
    ChainError, FallbackChain, JsonDirSink, MemorySink, PersistenceTarget, SaveOutcome,
    SessionRecord, StorageError, StorageSink, TargetConfig,
};

/// Sink that counts calls and fails on demand
#[derive(Debug, Default)]
struct ScriptedSink {
    fail_init: bool,
    fail_write: bool,
    init_calls: AtomicUsize,
    writes: Mutex<Vec<String>>,
}

impl ScriptedSink {
    fn failing_writes() -> Arc<Self> {
        Arc::new(Self {
            fail_write: true,
            ..Self::default()
        })
    }

    fn failing_init() -> Arc<Self> {
        Arc::new(Self {
            fail_init: true,
            ..Self::default()
        })
    }

    fn write_count(&self) -> usize {
        self.writes.lock().len()
    }
}

#[async_trait]
impl StorageSink for ScriptedSink {
    fn kind(&self) -> &'static str {
        "scripted"
    }

    async fn initialize(&self, target: &TargetConfig) -> Result<(), StorageError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(StorageError::Unavailable(format!("{} offline", target.name)));
        }
        Ok(())
    }

    async fn write(
        &self,
        target: &TargetConfig,
        record: &SessionRecord,
    ) -> Result<(), StorageError> {
        self.writes.lock().push(record.session_id.clone());
        if self.fail_write {
            return Err(StorageError::Rejected(format!("{} is full", target.name)));
        }
        Ok(())
    }
}

fn record(id: &str) -> SessionRecord {
    SessionRecord::new(id, "running", Utc::now())
}

#[tokio::test]
async fn second_target_catches_first_failure_and_third_is_untouched() {
    let first = ScriptedSink::failing_writes();
    let second = Arc::new(ScriptedSink::default());
    let third = Arc::new(ScriptedSink::default());

    let chain = FallbackChain::initialize(vec![
        PersistenceTarget::with_sink(TargetConfig::memory("third", 3), third.clone()),
        PersistenceTarget::with_sink(TargetConfig::memory("first", 1), first.clone()),
        PersistenceTarget::with_sink(TargetConfig::memory("second", 2), second.clone()),
    ])
    .await
    .unwrap();

    let outcome = chain.save(&record("abc")).await;
    match &outcome {
        SaveOutcome::Saved { target, failures } => {
            assert_eq!(target, "second");
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].target, "first");
        }
        other => panic!("expected a save, got {other:?}"),
    }
    assert_eq!(first.write_count(), 1);
    assert_eq!(second.write_count(), 1);
    assert_eq!(third.write_count(), 0);
}

#[tokio::test]
async fn all_targets_failing_is_reported_not_raised() {
    let a = ScriptedSink::failing_writes();
    let b = ScriptedSink::failing_writes();
    let chain = FallbackChain::initialize(vec![
        PersistenceTarget::with_sink(TargetConfig::memory("a", 0), a.clone()),
        PersistenceTarget::with_sink(TargetConfig::memory("b", 1), b.clone()),
    ])
    .await
    .unwrap();

    let outcome = chain.save(&record("abc")).await;
    assert!(outcome.is_total_failure());
    assert_eq!(outcome.failures().len(), 2);
    assert_eq!(a.write_count(), 1);
    assert_eq!(b.write_count(), 1);
}

#[tokio::test]
async fn optional_target_failing_init_is_disabled() {
    let flaky = ScriptedSink::failing_init();
    let backup = Arc::new(MemorySink::new());
    let chain = FallbackChain::initialize(vec![
        PersistenceTarget::with_sink(TargetConfig::memory("flaky", 0), flaky.clone()),
        PersistenceTarget::with_sink(TargetConfig::memory("backup", 1), backup.clone()),
    ])
    .await
    .unwrap();

    assert_eq!(chain.active_count(), 1);
    let outcome = chain.save(&record("abc")).await;
    assert_eq!(outcome.saved_to(), Some("backup"));
    assert!(outcome.failures().is_empty());
    assert_eq!(flaky.write_count(), 0);
    assert_eq!(backup.len(), 1);
}

#[tokio::test]
async fn required_target_failing_init_aborts_construction() {
    let flaky = ScriptedSink::failing_init();
    let err = FallbackChain::initialize(vec![PersistenceTarget::with_sink(
        TargetConfig::memory("primary", 0).with_assure_initialization(true),
        flaky.clone(),
    )])
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        ChainError::InitializationFailed { ref target, .. } if target == "primary"
    ));
    assert_eq!(flaky.init_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn inactive_targets_are_never_initialized() {
    let sink = Arc::new(ScriptedSink::default());
    FallbackChain::initialize(vec![PersistenceTarget::with_sink(
        TargetConfig::memory("off", 0).with_active(false),
        sink.clone(),
    )])
    .await
    .unwrap();
    assert_eq!(sink.init_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn json_dir_target_from_config_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions");
    let chain = FallbackChain::initialize(vec![PersistenceTarget::from_config(
        TargetConfig::json_dir("disk", 0, &path),
    )])
    .await
    .unwrap();

    let mut snapshot = record("session-7");
    snapshot.values.insert("age".into(), serde_json::json!(31));
    let outcome = chain.save(&snapshot).await;
    assert_eq!(outcome.saved_to(), Some("disk"));

    let stored = JsonDirSink::new(&path).read("session-7").await.unwrap();
    assert_eq!(stored.values.get("age"), Some(&serde_json::json!(31)));
}
