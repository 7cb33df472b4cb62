//! Testing utilities for the trellis workspace
//!
//! Shared fixtures: canned templates, recording and rejecting hooks, and
//! storage sinks that fail on demand.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use trellis_store::{SessionRecord, StorageError, StorageSink, TargetConfig};
use trellis_tree::{
    AnyInput, Element, ExperimentTemplate, HookContext, HookError, Page, PageHooks, PageMut,
    Section, SectionHooks, SectionMut, SessionContext, TemplateBuilder,
};

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// `exp` with pages `p1` (optional input `answer`) and `p2`
pub fn two_page_template() -> ExperimentTemplate {
    let mut builder = TemplateBuilder::new(Section::new("exp")).unwrap();
    builder
        .page(
            "exp",
            Page::new("p1")
                .with_element(Element::input("answer", AnyInput))
                .unwrap(),
        )
        .unwrap()
        .page("exp", Page::new("p2"))
        .unwrap();
    builder.build()
}

/// `exp` with pages `p0..p{n-1}` directly below the root section
pub fn linear_template(root: Section, pages: usize) -> ExperimentTemplate {
    let name = root.name().to_string();
    let mut builder = TemplateBuilder::new(root).unwrap();
    for i in 0..pages {
        builder.page(&name, Page::new(format!("p{i}"))).unwrap();
    }
    builder.build()
}

/// Page with a single forced input `name`
pub fn required_input_page(page: &str, name: &str) -> Page {
    Page::new(page)
        .with_element(Element::input(name, AnyInput).force_input())
        .unwrap()
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

/// Shared, ordered log of hook calls
#[derive(Debug, Clone, Default)]
pub struct HookLog(Arc<Mutex<Vec<String>>>);

impl HookLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Section hooks that log lifecycle calls and keep default validation
#[derive(Debug, Clone)]
pub struct RecordingSectionHooks {
    pub label: String,
    pub log: HookLog,
}

impl RecordingSectionHooks {
    pub fn new(label: impl Into<String>, log: &HookLog) -> Arc<Self> {
        Arc::new(Self {
            label: label.into(),
            log: log.clone(),
        })
    }
}

impl SectionHooks for RecordingSectionHooks {
    fn on_enter(
        &self,
        _section: &mut SectionMut<'_>,
        _session: &SessionContext,
    ) -> Result<(), HookError> {
        self.log.push(format!("enter:{}", self.label));
        Ok(())
    }

    fn on_leave(
        &self,
        _section: &mut SectionMut<'_>,
        _session: &SessionContext,
    ) -> Result<(), HookError> {
        self.log.push(format!("leave:{}", self.label));
        Ok(())
    }

    fn on_resume(
        &self,
        _section: &mut SectionMut<'_>,
        _session: &SessionContext,
    ) -> Result<(), HookError> {
        self.log.push(format!("resume:{}", self.label));
        Ok(())
    }

    fn on_hand_over(
        &self,
        _section: &mut SectionMut<'_>,
        _session: &SessionContext,
    ) -> Result<(), HookError> {
        self.log.push(format!("hand_over:{}", self.label));
        Ok(())
    }
}

/// Page hooks that log show/hide calls
#[derive(Debug, Clone)]
pub struct RecordingPageHooks {
    pub log: HookLog,
}

impl RecordingPageHooks {
    pub fn new(log: &HookLog) -> Arc<Self> {
        Arc::new(Self { log: log.clone() })
    }
}

impl PageHooks for RecordingPageHooks {
    fn on_first_show(
        &self,
        page: &mut PageMut<'_>,
        _session: &SessionContext,
    ) -> Result<(), HookError> {
        self.log.push(format!("first_show:{}", page.page().name()));
        Ok(())
    }

    fn on_each_show(
        &self,
        page: &mut PageMut<'_>,
        _session: &SessionContext,
    ) -> Result<(), HookError> {
        self.log.push(format!("show:{}", page.page().name()));
        Ok(())
    }

    fn on_first_hide(
        &self,
        page: &mut PageMut<'_>,
        _session: &SessionContext,
    ) -> Result<(), HookError> {
        self.log.push(format!("first_hide:{}", page.page().name()));
        Ok(())
    }

    fn on_each_hide(
        &self,
        page: &mut PageMut<'_>,
        _session: &SessionContext,
    ) -> Result<(), HookError> {
        self.log.push(format!("hide:{}", page.page().name()));
        Ok(())
    }
}

/// Page hooks that add an input element the first time the page is shown
#[derive(Debug, Clone)]
pub struct AppendInputOnShow {
    pub element: String,
}

impl PageHooks for AppendInputOnShow {
    fn on_first_show(
        &self,
        page: &mut PageMut<'_>,
        _session: &SessionContext,
    ) -> Result<(), HookError> {
        page.append(Element::input(self.element.clone(), AnyInput).force_input())?;
        Ok(())
    }
}

/// Section hooks whose every directional validation fails
#[derive(Debug, Clone)]
pub struct RejectingSectionHooks {
    pub messages: Vec<String>,
}

impl RejectingSectionHooks {
    pub fn new(message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            messages: vec![message.into()],
        })
    }
}

impl SectionHooks for RejectingSectionHooks {
    fn validate_on_move(&self, _ctx: &HookContext<'_>) -> Result<(), HookError> {
        Err(trellis_tree::ValidationError::new(self.messages.clone()).into())
    }
}

/// Section hooks that fail fatally when moving forward
#[derive(Debug, Clone)]
pub struct FatalSectionHooks {
    pub message: String,
}

impl SectionHooks for FatalSectionHooks {
    fn validate_on_forward(&self, _ctx: &HookContext<'_>) -> Result<(), HookError> {
        Err(HookError::Fatal(self.message.clone()))
    }
}

/// Section hooks whose lifecycle event `event` (`"enter"`, `"leave"`,
/// `"resume"` or `"hand_over"`) fails fatally
#[derive(Debug, Clone)]
pub struct CrashingSectionHooks {
    pub event: &'static str,
    pub message: String,
}

impl CrashingSectionHooks {
    pub fn new(event: &'static str, message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            event,
            message: message.into(),
        })
    }

    fn fire(&self, event: &str) -> Result<(), HookError> {
        if event == self.event {
            Err(HookError::Fatal(self.message.clone()))
        } else {
            Ok(())
        }
    }
}

impl SectionHooks for CrashingSectionHooks {
    fn on_enter(
        &self,
        _section: &mut SectionMut<'_>,
        _session: &SessionContext,
    ) -> Result<(), HookError> {
        self.fire("enter")
    }

    fn on_leave(
        &self,
        _section: &mut SectionMut<'_>,
        _session: &SessionContext,
    ) -> Result<(), HookError> {
        self.fire("leave")
    }

    fn on_resume(
        &self,
        _section: &mut SectionMut<'_>,
        _session: &SessionContext,
    ) -> Result<(), HookError> {
        self.fire("resume")
    }

    fn on_hand_over(
        &self,
        _section: &mut SectionMut<'_>,
        _session: &SessionContext,
    ) -> Result<(), HookError> {
        self.fire("hand_over")
    }
}

/// Section hooks that refuse to be left with the given message
#[derive(Debug, Clone)]
pub struct BlockingLeaveHooks {
    pub message: String,
}

impl SectionHooks for BlockingLeaveHooks {
    fn validate_on_leave(&self, _ctx: &HookContext<'_>) -> Result<(), HookError> {
        Err(HookError::invalid(self.message.clone()))
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Sink that fails initialization and/or writes, counting attempts
#[derive(Debug, Default)]
pub struct FlakySink {
    pub fail_init: bool,
    pub fail_write: bool,
    init_calls: AtomicUsize,
    write_calls: AtomicUsize,
    written: Mutex<Vec<SessionRecord>>,
}

impl FlakySink {
    pub fn healthy() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_writes() -> Arc<Self> {
        Arc::new(Self {
            fail_write: true,
            ..Self::default()
        })
    }

    pub fn failing_init() -> Arc<Self> {
        Arc::new(Self {
            fail_init: true,
            ..Self::default()
        })
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Records accepted by this sink
    pub fn written(&self) -> Vec<SessionRecord> {
        self.written.lock().clone()
    }
}

#[async_trait]
impl StorageSink for FlakySink {
    fn kind(&self) -> &'static str {
        "flaky"
    }

    async fn initialize(&self, target: &TargetConfig) -> Result<(), StorageError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(StorageError::Unavailable(format!("{} unreachable", target.name)));
        }
        Ok(())
    }

    async fn write(
        &self,
        target: &TargetConfig,
        record: &SessionRecord,
    ) -> Result<(), StorageError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_write {
            return Err(StorageError::Rejected(format!("{} refused the record", target.name)));
        }
        self.written.lock().push(record.clone());
        Ok(())
    }
}

/// Raw input helper
pub fn text(value: &str) -> serde_json::Value {
    serde_json::Value::String(value.to_string())
}
