//! Movement resolver
//!
//! A [`Navigator`] drives one participant session over its own copy of the
//! experiment tree. Each request is decided in a fixed order:
//!
//! 1. session timeout and status
//! 2. movement permissions of the sections involved
//! 3. destination lookup (and the must-be-shown check for jumps)
//! 4. minimum display time of the current page
//! 5. section validation hooks, then `validate_on_leave` for sections being left
//!
//! Only when every step passes is the move committed: the current page is
//! hidden, section lifecycle hooks fire, the destination is shown, and the
//! session record goes through the fallback chain. A lifecycle hook failing
//! part way puts the departed page and history back as they were.
//!
//! Forward moves stop at sections as well as pages. A section is entered
//! before its members are looked at, so members its `on_enter` hook appends
//! are traversed, and its order is fixed on that first entry.

use crate::clock::{Clock, SystemClock};
use crate::condition::{ConditionLookup, NoCondition};
use crate::config::SessionConfig;
use crate::error::{NavigationError, StateMachineError};
use crate::journal::MoveJournal;
use crate::outcome::{Move, MoveOptions, MoveOutcome, Rejection, RejectionKind};
use crate::state_machine::{validate_transition, SessionStatus};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use trellis_store::{FallbackChain, SaveOutcome, SessionRecord};
use trellis_tree::{
    ExperimentTree, HookContext, HookError, MoveKind, NodeId, SessionContext, TreeError, TreePath,
};

/// Where a move lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destination {
    /// A page, or a section whose first page is found after entering it
    Node(NodeId),
    /// Past the last page
    End,
}

#[derive(Debug, Clone, Copy)]
struct Plan {
    kind: MoveKind,
    destination: Destination,
    /// The departed page is closed on commit
    closes: bool,
}

#[derive(Debug, Clone, Copy)]
enum SectionEvent {
    Enter,
    Leave,
    Resume,
    HandOver,
}

#[derive(Debug, Clone, Copy)]
enum PageEvent {
    Show,
    Hide,
}

type Planned = Result<Plan, Rejection>;

/// Navigation state of one participant session
#[derive(Debug)]
pub struct Navigator {
    tree: ExperimentTree,
    experiment: String,
    context: SessionContext,
    status: SessionStatus,
    current: Option<NodeId>,
    history: Vec<TreePath>,
    chain: FallbackChain,
    journal: MoveJournal,
    clock: Arc<dyn Clock>,
    conditions: Arc<dyn ConditionLookup>,
    config: SessionConfig,
    abort_reason: Option<String>,
    /// Fixes the order of sections added while the session runs
    rng: StdRng,
}

impl Navigator {
    /// Session over an instantiated tree, not yet started
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        tree: ExperimentTree,
        chain: FallbackChain,
    ) -> Self {
        let experiment = tree[tree.root()].name().to_string();
        Self {
            tree,
            experiment,
            context: SessionContext::new(session_id),
            status: SessionStatus::NotStarted,
            current: None,
            history: Vec::new(),
            chain,
            journal: MoveJournal::new(),
            clock: Arc::new(SystemClock),
            conditions: Arc::new(NoCondition),
            config: SessionConfig::default(),
            abort_reason: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Random source for shuffled sections created at runtime
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
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
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Experiment label written into session records
    #[must_use]
    pub fn with_experiment_name(mut self, name: impl Into<String>) -> Self {
        self.experiment = name.into();
        self
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[inline]
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.context.session_id
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Path of the page currently displayed
    #[must_use]
    pub fn current_position(&self) -> Option<&TreePath> {
        self.current.map(|id| self.tree.path(id))
    }

    #[inline]
    #[must_use]
    pub fn current_page(&self) -> Option<NodeId> {
        self.current
    }

    /// Departed pages in order
    #[inline]
    #[must_use]
    pub fn history(&self) -> &[TreePath] {
        &self.history
    }

    #[inline]
    #[must_use]
    pub fn journal(&self) -> &MoveJournal {
        &self.journal
    }

    #[inline]
    #[must_use]
    pub fn tree(&self) -> &ExperimentTree {
        &self.tree
    }

    #[inline]
    #[must_use]
    pub fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    #[must_use]
    pub fn abort_reason(&self) -> Option<&str> {
        self.abort_reason.as_deref()
    }

    /// Current aggregate data snapshot
    #[must_use]
    pub fn record(&self) -> SessionRecord {
        SessionRecord {
            session_id: self.context.session_id.clone(),
            experiment: self.experiment.clone(),
            condition: self.context.condition.clone(),
            status: self.status.as_str().to_string(),
            current: self.current_position().map(ToString::to_string),
            history: self.history.iter().map(ToString::to_string).collect(),
            values: self.tree.values(),
            started_at: self.context.started_at,
            saved_at: self.clock.now(),
            journal_len: self.journal.len(),
            abort_reason: self.abort_reason.clone(),
        }
    }

    /// Whether the configured timeout has elapsed
    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        match (self.config.timeout(), self.context.started_at) {
            (Some(limit), Some(started)) => (self.clock.now() - started)
                .to_std()
                .map(|elapsed| elapsed >= limit)
                .unwrap_or(false),
            _ => false,
        }
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Enter the tree and show its first page
    ///
    /// The status only becomes `Running` once the entry hooks and the first
    /// page's show hooks have succeeded; after a failure the session is
    /// still unstarted.
    ///
    /// # Errors
    /// [`NavigationError::EmptyExperiment`], an illegal transition when the
    /// session was already started, or a fatal hook failure.
    pub async fn start(&mut self) -> Result<SaveOutcome, NavigationError> {
        if self.status != SessionStatus::NotStarted {
            return Err(StateMachineError::IllegalTransition {
                from: self.status,
                to: SessionStatus::Running,
            }
            .into());
        }

        let now = self.clock.now();
        self.context.condition = self.conditions.get_condition(&self.context.session_id);
        self.context.started_at = Some(now);
        self.context.debug = self.config.debug;

        let first = match self.enter_root() {
            Ok(Some(first)) => first,
            Ok(None) => {
                self.unstart();
                return Err(NavigationError::EmptyExperiment);
            }
            Err(err) => {
                self.unstart();
                error!(
                    session = %self.context.session_id,
                    error = %err,
                    "session failed to start"
                );
                return Err(err);
            }
        };
        self.current = Some(first);
        self.transition(SessionStatus::Running)?;

        let to = self.tree.path(first).to_string();
        self.journal.append(now, "start", None, Some(to.clone()), "committed");
        info!(
            session = %self.context.session_id,
            condition = ?self.context.condition,
            to = %to,
            "session started"
        );
        Ok(self.save().await)
    }

    fn enter_root(&mut self) -> Result<Option<NodeId>, NavigationError> {
        let root = self.tree.root();
        self.enter(root)?;
        let Some(first) = self.descend(root)? else {
            return Ok(None);
        };
        self.show(first)?;
        Ok(Some(first))
    }

    fn unstart(&mut self) {
        self.context.condition = None;
        self.context.started_at = None;
    }

    /// Abort the session; returns `None` if it had already ended
    pub async fn abort(&mut self, reason: impl Into<String>) -> Option<SaveOutcome> {
        let reason = reason.into();
        if self.status.is_terminal() {
            return None;
        }
        self.abort_reason = Some(reason.clone());
        self.terminate(SessionStatus::Aborted, &reason);
        Some(self.save().await)
    }

    /// Expire the session; returns `None` if it had already ended
    pub async fn expire(&mut self) -> Option<SaveOutcome> {
        if self.status.is_terminal() {
            return None;
        }
        self.terminate(SessionStatus::Expired, "timeout");
        Some(self.save().await)
    }

    fn terminate(&mut self, status: SessionStatus, reason: &str) {
        let now = self.clock.now();
        if let Some(page) = self.current.and_then(|id| self.tree.page_mut(id).ok()) {
            page.record_hide(now);
        }
        let from = self.current_position().map(ToString::to_string);
        self.status = status;
        self.journal.append(now, status.as_str(), from.clone(), None, reason);
        warn!(
            session = %self.context.session_id,
            status = %status,
            from = ?from,
            reason,
            "session ended early"
        );
    }

    fn transition(&mut self, to: SessionStatus) -> Result<(), NavigationError> {
        validate_transition(self.status, to)?;
        self.status = to;
        Ok(())
    }

    async fn save(&self) -> SaveOutcome {
        let record = self.record();
        self.chain.save(&record).await
    }

    // ---------------------------------------------------------------------
    // Input
    // ---------------------------------------------------------------------

    /// Store raw input for an element of the current page
    ///
    /// # Errors
    /// [`NavigationError::NotRunning`], or the tree's `PageClosed`,
    /// `UnknownElement` and `NotAnInput` errors.
    pub fn submit(&mut self, element: &str, raw: Value) -> Result<(), NavigationError> {
        let current = match (self.status, self.current) {
            (SessionStatus::Running, Some(id)) => id,
            (status, _) => return Err(NavigationError::NotRunning(status)),
        };
        self.tree.set_input(current, element, raw)?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Movement
    // ---------------------------------------------------------------------

    /// Request a move with default options
    ///
    /// # Errors
    /// Only fatal failures; rule violations come back as
    /// [`MoveOutcome::Rejected`].
    pub async fn request_move(&mut self, mv: Move) -> Result<MoveOutcome, NavigationError> {
        self.request_move_with(mv, MoveOptions::default()).await
    }

    /// Request a move
    ///
    /// # Errors
    /// [`NavigationError::UnknownTarget`] for unresolvable jump targets and
    /// fatal hook failures.
    pub async fn request_move_with(
        &mut self,
        mv: Move,
        options: MoveOptions,
    ) -> Result<MoveOutcome, NavigationError> {
        let mut expiry = None;
        if self.status == SessionStatus::Running && self.is_timed_out() {
            if let Some(save) = self.expire().await {
                debug!(
                    session = %self.context.session_id,
                    saved_to = ?save.saved_to(),
                    "expiry saved"
                );
                expiry = Some(match save.saved_to() {
                    Some(target) => format!("the expiry record was saved to '{target}'"),
                    None => "the expiry record could not be saved".to_string(),
                });
            }
        }

        let current = match (self.status, self.current) {
            (SessionStatus::Running, Some(id)) => id,
            (status, _) => {
                let mut rejection = Rejection::new(
                    RejectionKind::SessionNotRunning,
                    format!("the session is {status}"),
                );
                rejection.messages.extend(expiry);
                return Ok(self.reject(&mv, rejection));
            }
        };

        if let Move::Jump(path) = &mv {
            // order a runtime-added target before its first page is looked up
            if let Some(node) = self.tree.resolve(path) {
                self.tree.fix_orders_below(node, &mut self.rng);
            }
        }

        match self.plan(current, &mv, options)? {
            Ok(plan) => self.commit(current, &mv, plan).await,
            Err(rejection) => Ok(self.reject(&mv, rejection)),
        }
    }

    fn reject(&mut self, mv: &Move, rejection: Rejection) -> MoveOutcome {
        let now = self.clock.now();
        let from = self.current_position().map(ToString::to_string);
        let to = match mv {
            Move::Jump(path) => Some(path.to_string()),
            _ => None,
        };
        let outcome = MoveOutcome::Rejected(rejection);
        self.journal
            .append(now, mv.label(), from.clone(), to, outcome.label());
        debug!(
            session = %self.context.session_id,
            kind = mv.label(),
            from = ?from,
            reason = ?outcome.rejection_kind(),
            "move rejected"
        );
        outcome
    }

    fn plan(
        &self,
        current: NodeId,
        mv: &Move,
        options: MoveOptions,
    ) -> Result<Planned, NavigationError> {
        let section_id = self.parent_section(current)?;
        let section = self.tree.section(section_id)?;

        let plan = match mv {
            Move::Forward => {
                if !section.permits(MoveKind::Forward) {
                    return Ok(Err(Rejection::new(
                        RejectionKind::DirectionNotAllowed,
                        "moving forward is not allowed here",
                    )));
                }
                let destination = self
                    .tree
                    .next_node(current)
                    .map_or(Destination::End, Destination::Node);
                Plan {
                    kind: MoveKind::Forward,
                    destination,
                    closes: true,
                }
            }
            Move::Backward => {
                if !section.permits(MoveKind::Backward) {
                    return Ok(Err(Rejection::new(
                        RejectionKind::DirectionNotAllowed,
                        "moving backward is not allowed here",
                    )));
                }
                let Some(previous) = self.tree.previous_page(current) else {
                    return Ok(Err(Rejection::new(
                        RejectionKind::NoPreviousPage,
                        "this is the first page",
                    )));
                };
                Plan {
                    kind: MoveKind::Backward,
                    destination: Destination::Node(previous),
                    closes: false,
                }
            }
            Move::Jump(path) => match self.plan_jump(current, section_id, path)? {
                Ok(plan) => plan,
                Err(rejection) => return Ok(Err(rejection)),
            },
        };

        if !options.bypass_display_time && !self.config.debug {
            let page = self.tree.page(current)?;
            if !page.minimum_display_time_met(self.clock.now()) {
                let secs = page.min_display_time().as_secs_f64();
                return Ok(Err(Rejection::new(
                    RejectionKind::MinimumDisplayTime,
                    format!("please stay on this page for at least {secs} seconds"),
                )));
            }
        }

        if let Err(rejection) = self.run_validation(section_id, current, &plan)? {
            return Ok(Err(rejection));
        }
        Ok(Ok(plan))
    }

    fn plan_jump(
        &self,
        current: NodeId,
        section_id: NodeId,
        path: &TreePath,
    ) -> Result<Planned, NavigationError> {
        let node = self
            .tree
            .resolve(path)
            .ok_or_else(|| NavigationError::UnknownTarget(path.clone()))?;
        let target = self
            .tree
            .first_page(node)
            .ok_or_else(|| NavigationError::UnknownTarget(path.clone()))?;

        if target == current {
            return Ok(Err(Rejection::new(
                RejectionKind::AlreadyThere,
                "this page is already displayed",
            )));
        }
        if !self.tree.section(section_id)?.permits(MoveKind::JumpFrom) {
            return Ok(Err(Rejection::new(
                RejectionKind::JumpNotAllowed,
                "jumping away from this page is not allowed",
            )));
        }
        for gate in self.entry_gates(current, target) {
            if !self.tree.section(gate)?.permits(MoveKind::JumpTo) {
                return Ok(Err(Rejection::new(
                    RejectionKind::JumpNotAllowed,
                    format!("jumping into '{}' is not allowed", self.tree.path(gate)),
                )));
            }
        }

        let pages = self.tree.pages();
        let position = |id: NodeId| pages.iter().position(|p| *p == id);
        let (Some(from), Some(to)) = (position(current), position(target)) else {
            return Err(TreeError::UnknownNode(path.to_string()).into());
        };
        let (low, high) = if from < to { (from, to) } else { (to, from) };
        for skipped in &pages[low + 1..high] {
            let page = self.tree.page(*skipped)?;
            if page.is_must_be_shown() && !page.has_been_shown() {
                return Ok(Err(Rejection::new(
                    RejectionKind::PageMustBeShown,
                    format!("page '{}' must be shown first", self.tree.path(*skipped)),
                )));
            }
        }

        Ok(Ok(Plan {
            kind: MoveKind::JumpTo,
            destination: Destination::Node(target),
            closes: to > from,
        }))
    }

    /// Sections that must allow entry for a jump from `current` to `target`
    ///
    /// Every section above `target` strictly below the common ancestor, and
    /// always the target's own section.
    fn entry_gates(&self, current: NodeId, target: NodeId) -> Vec<NodeId> {
        let common = self.tree.common_ancestor(current, target);
        let up = self.tree.uptree(target);
        let below: Vec<NodeId> = up
            .iter()
            .copied()
            .take_while(|s| Some(*s) != common)
            .collect();
        if below.is_empty() {
            up.first().copied().into_iter().collect()
        } else {
            below
        }
    }

    /// Sections above `node`, nearest first, starting with `node` itself
    /// when it is a section
    fn enclosing(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        if self.tree.section(node).is_ok() {
            chain.push(node);
        }
        chain.extend(self.tree.uptree(node));
        chain
    }

    /// Sections a move from `from` to `destination` leaves, nearest first
    fn sections_left(&self, from: NodeId, destination: Destination) -> Vec<NodeId> {
        let up = self.enclosing(from);
        match destination {
            Destination::End => up,
            Destination::Node(target) => {
                let common = self.tree.common_ancestor(from, target);
                up.into_iter().take_while(|s| Some(*s) != common).collect()
            }
        }
    }

    fn run_validation(
        &self,
        section_id: NodeId,
        current: NodeId,
        plan: &Plan,
    ) -> Result<Result<(), Rejection>, NavigationError> {
        let ctx = HookContext::new(&self.tree, section_id, current, &self.context)?;
        let hooks = ctx.section().hooks();
        let result = match plan.kind {
            MoveKind::Forward => hooks.validate_on_forward(&ctx),
            MoveKind::Backward => hooks.validate_on_backward(&ctx),
            MoveKind::JumpFrom | MoveKind::JumpTo => hooks.validate_on_jump(&ctx),
        };
        if let Err(rejection) = validation_outcome(result)? {
            return Ok(Err(rejection));
        }

        // forward moves are checked against the page the template order
        // reaches; sections grown on entry cannot be known yet
        let towards = match plan.kind {
            MoveKind::Backward => return Ok(Ok(())),
            MoveKind::Forward => self
                .tree
                .next_page(current)
                .map_or(Destination::End, Destination::Node),
            MoveKind::JumpFrom | MoveKind::JumpTo => plan.destination,
        };
        for leaving in self.sections_left(current, towards) {
            let ctx = HookContext::new(&self.tree, leaving, current, &self.context)?;
            let result = ctx.section().hooks().validate_on_leave(&ctx);
            if let Err(rejection) = validation_outcome(result)? {
                return Ok(Err(rejection));
            }
        }
        Ok(Ok(()))
    }

    async fn commit(
        &mut self,
        current: NodeId,
        mv: &Move,
        plan: Plan,
    ) -> Result<MoveOutcome, NavigationError> {
        let now = self.clock.now();
        let from = self.tree.path(current).clone();
        let was_closed = self.tree.page(current)?.is_closed();

        let landed = match self.depart(current, now, plan) {
            Ok(landed) => landed,
            Err(err) => {
                if let Ok(page) = self.tree.page_mut(current) {
                    page.resume_visit(was_closed);
                }
                error!(
                    session = %self.context.session_id,
                    kind = mv.label(),
                    from = %from,
                    error = %err,
                    "lifecycle hook failed, move abandoned"
                );
                return Err(err);
            }
        };
        self.history.push(from.clone());

        let Some(target) = landed else {
            self.current = None;
            self.transition(SessionStatus::Finished)?;
            self.journal
                .append(now, mv.label(), Some(from.to_string()), None, "finished");
            info!(
                session = %self.context.session_id,
                kind = mv.label(),
                from = %from,
                "session finished"
            );
            let save = self.save().await;
            return Ok(MoveOutcome::Finished { save });
        };

        self.current = Some(target);
        self.transition(SessionStatus::Running)?;

        let to = self.tree.path(target).clone();
        self.journal.append(
            now,
            mv.label(),
            Some(from.to_string()),
            Some(to.to_string()),
            "committed",
        );
        info!(
            session = %self.context.session_id,
            kind = mv.label(),
            from = %from,
            to = %to,
            "move committed"
        );
        let save = self.save().await;
        Ok(MoveOutcome::Committed {
            new_position: to,
            save,
        })
    }

    /// Hide `current`, run the section hooks on the way and show the page
    /// reached; `None` when traversal ran past the last page
    fn depart(
        &mut self,
        current: NodeId,
        now: DateTime<Utc>,
        plan: Plan,
    ) -> Result<Option<NodeId>, NavigationError> {
        self.hide(current, now, plan.closes)?;
        let landed = self.traverse(current, plan.destination)?;
        if let Some(target) = landed {
            self.show(target)?;
        }
        Ok(landed)
    }

    /// Leave the sections between `from` and `destination`, enter those
    /// down to it, then descend to a page
    fn traverse(
        &mut self,
        from: NodeId,
        destination: Destination,
    ) -> Result<Option<NodeId>, NavigationError> {
        let left = self.sections_left(from, destination);
        for section in &left {
            self.section_event(*section, SectionEvent::Leave)?;
        }
        let Destination::Node(node) = destination else {
            return Ok(None);
        };

        let common = self.tree.common_ancestor(from, node);
        let mut entering: Vec<NodeId> = self
            .enclosing(node)
            .into_iter()
            .take_while(|s| Some(*s) != common)
            .collect();
        entering.reverse();

        if let Some(common) = common {
            if !left.is_empty() {
                self.section_event(common, SectionEvent::Resume)?;
            }
            if !entering.is_empty() {
                self.section_event(common, SectionEvent::HandOver)?;
            }
        }
        for section in entering {
            self.enter(section)?;
        }
        self.descend(node)
    }

    /// First page at or below an entered `node`, entering subsections on
    /// the way; a section still empty after entry is left again and
    /// traversal continues after it
    fn descend(&mut self, node: NodeId) -> Result<Option<NodeId>, NavigationError> {
        let mut cursor = node;
        loop {
            if self.tree.page(cursor).is_ok() {
                return Ok(Some(cursor));
            }
            let first = self.tree.section(cursor)?.traversal_order().first().copied();
            match first {
                Some(member) => {
                    if self.tree.section(member).is_ok() {
                        self.enter(member)?;
                    }
                    cursor = member;
                }
                None => {
                    let next = self
                        .tree
                        .next_node(cursor)
                        .map_or(Destination::End, Destination::Node);
                    return self.traverse(cursor, next);
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // Hooks
    // ---------------------------------------------------------------------

    fn parent_section(&self, page: NodeId) -> Result<NodeId, NavigationError> {
        self.tree
            .parent(page)
            .ok_or_else(|| TreeError::UnknownNode(self.tree.path(page).to_string()).into())
    }

    fn show(&mut self, page: NodeId) -> Result<(), NavigationError> {
        let now = self.clock.now();
        self.page_event(page, PageEvent::Show)?;
        self.tree.page_mut(page)?.record_visit(now);
        Ok(())
    }

    fn hide(
        &mut self,
        page: NodeId,
        now: DateTime<Utc>,
        close: bool,
    ) -> Result<(), NavigationError> {
        {
            let page = self.tree.page_mut(page)?;
            page.record_hide(now);
            if close {
                page.close();
            }
        }
        self.page_event(page, PageEvent::Hide)
    }

    fn page_event(&mut self, id: NodeId, event: PageEvent) -> Result<(), NavigationError> {
        let page = self.tree.page(id)?;
        let hooks = Arc::clone(page.hooks());
        // first show: no visit recorded yet; first hide: exactly one visit closed
        let first = match event {
            PageEvent::Show => !page.has_been_shown(),
            PageEvent::Hide => {
                page.visits().iter().filter(|v| v.hidden_at.is_some()).count() == 1
            }
        };
        let mut handle = self.tree.page_handle(id)?;
        let session = &self.context;
        let result = match event {
            PageEvent::Show => {
                let first_result = if first {
                    hooks.on_first_show(&mut handle, session)
                } else {
                    Ok(())
                };
                first_result.and_then(|()| hooks.on_each_show(&mut handle, session))
            }
            PageEvent::Hide => {
                let first_result = if first {
                    hooks.on_first_hide(&mut handle, session)
                } else {
                    Ok(())
                };
                first_result.and_then(|()| hooks.on_each_hide(&mut handle, session))
            }
        };
        result.map_err(NavigationError::from_hook)
    }

    /// Run `on_enter`, then fix the section's order if this is its first
    /// entry
    fn enter(&mut self, section: NodeId) -> Result<(), NavigationError> {
        self.section_event(section, SectionEvent::Enter)?;
        self.tree.section_mut(section)?.fix_order(&mut self.rng);
        Ok(())
    }

    fn section_event(&mut self, id: NodeId, event: SectionEvent) -> Result<(), NavigationError> {
        let hooks = Arc::clone(self.tree.section(id)?.hooks());
        debug!(
            session = %self.context.session_id,
            section = %self.tree.path(id),
            event = ?event,
            "section hook"
        );
        let mut handle = self.tree.section_handle(id)?;
        let session = &self.context;
        let result = match event {
            SectionEvent::Enter => hooks.on_enter(&mut handle, session),
            SectionEvent::Leave => hooks.on_leave(&mut handle, session),
            SectionEvent::Resume => hooks.on_resume(&mut handle, session),
            SectionEvent::HandOver => hooks.on_hand_over(&mut handle, session),
        };
        result.map_err(NavigationError::from_hook)
    }
}

/// Split a validation hook result into rejection or fatal error
fn validation_outcome(
    result: Result<(), HookError>,
) -> Result<Result<(), Rejection>, NavigationError> {
    match result {
        Ok(()) => Ok(Ok(())),
        Err(HookError::Validation(err)) => Ok(Err(Rejection::with_messages(
            RejectionKind::ValidationFailed,
            err.into_messages(),
        ))),
        Err(other) => Err(NavigationError::from_hook(other)),
    }
}
