//! Session simulator
//!
//! Key invariants checked:
//! - session status never moves backwards in the lifecycle
//! - history is append-only and grows by one per committed move
//! - a rejected move leaves position and history untouched
//! - must-be-shown pages before the current page have been shown
//! - ended sessions reject every move
//! - the move journal verifies at the end of each session

use crate::config::SessionConfig;
use crate::experiment::Experiment;
use crate::navigator::Navigator;
use crate::outcome::{Move, MoveOutcome, RejectionKind};
use crate::state_machine::SessionStatus;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::sync::Arc;
use trellis_store::{MemorySink, StorageSink, TargetConfig};
use trellis_tree::{
    Element, ExperimentTemplate, NumberInRange, OneOf, Page, Section, TemplateBuilder, TextLength,
    TreeError, TreePath,
};

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Concurrent sessions to run
    pub sessions: u64,
    /// Move requests per session before it is abandoned
    pub max_moves: usize,
    /// Chance per step that a session is aborted
    pub abort_probability: f64,
    /// Stop collecting after the first violation
    pub stop_on_first_violation: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            sessions: 32,
            max_moves: 60,
            abort_probability: 0.01,
            stop_on_first_violation: false,
        }
    }
}

/// A broken invariant
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    StatusRegressed {
        session: String,
        from: SessionStatus,
        to: SessionStatus,
    },
    HistoryRewritten {
        session: String,
    },
    RejectedMoveChangedState {
        session: String,
        kind: RejectionKind,
    },
    MustBeShownSkipped {
        session: String,
        page: String,
    },
    EndedSessionMoved {
        session: String,
    },
    JournalCorrupted {
        session: String,
    },
    Fatal {
        session: String,
        error: String,
    },
}

/// Statistics for simulation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulatorStats {
    pub sessions: u64,
    pub moves_attempted: u64,
    pub moves_committed: u64,
    pub moves_rejected: u64,
    pub sessions_finished: u64,
    pub sessions_aborted: u64,
    pub inputs_submitted: u64,
    pub inputs_refused: u64,
    pub save_failures: u64,
}

impl SimulatorStats {
    fn merge(&mut self, other: &Self) {
        self.sessions += other.sessions;
        self.moves_attempted += other.moves_attempted;
        self.moves_committed += other.moves_committed;
        self.moves_rejected += other.moves_rejected;
        self.sessions_finished += other.sessions_finished;
        self.sessions_aborted += other.sessions_aborted;
        self.inputs_submitted += other.inputs_submitted;
        self.inputs_refused += other.inputs_refused;
        self.save_failures += other.save_failures;
    }
}

/// Final report from simulator
#[derive(Debug, Clone)]
pub struct SimulatorReport {
    pub config: SimulatorConfig,
    pub stats: SimulatorStats,
    pub violations: Vec<Violation>,
    /// Records held by the in-memory sink at the end of the run
    pub records_saved: usize,
}

impl SimulatorReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Trellis Session Simulator ===\n\n");
        report.push_str(&format!("Seed: {}\n", self.config.seed));
        report.push_str(&format!("Sessions: {}\n", self.stats.sessions));
        report.push_str(&format!("Moves Attempted: {}\n", self.stats.moves_attempted));
        report.push_str(&format!("Moves Committed: {}\n", self.stats.moves_committed));
        report.push_str(&format!("Moves Rejected: {}\n", self.stats.moves_rejected));
        report.push_str(&format!("Sessions Finished: {}\n", self.stats.sessions_finished));
        report.push_str(&format!("Sessions Aborted: {}\n", self.stats.sessions_aborted));
        report.push_str(&format!(
            "Inputs Submitted/Refused: {}/{}\n",
            self.stats.inputs_submitted, self.stats.inputs_refused
        ));
        report.push_str(&format!("Save Failures: {}\n", self.stats.save_failures));
        report.push_str(&format!("Records Saved: {}\n", self.records_saved));
        report.push_str(&format!("Violations: {}\n", self.violations.len()));

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                report.push_str(&format!("{}. {:?}\n", i + 1, v));
            }
        }

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));
        report
    }
}

/// Template exercising every navigation rule
///
/// ```text
/// demo
/// ├── intro   (forward only)   welcome, consent*
/// ├── block   (free, shuffled) q1*, q2*, note
/// ├── main    (free)           attention [must be shown], rating
/// └── outro                    thanks
/// ```
///
/// # Errors
/// Only if the hard-coded tree were structurally invalid.
pub fn demo_template() -> Result<ExperimentTemplate, TreeError> {
    let mut builder = TemplateBuilder::new(Section::new("demo").with_title("Demo study"))?;
    builder
        .section("demo", Section::forward_only("intro"))?
        .section("demo", Section::free("block").shuffle(true))?
        .section("demo", Section::free("main"))?
        .section("demo", Section::new("outro"))?;

    builder
        .page(
            "demo.intro",
            Page::new("welcome").with_element(Element::display("Welcome to the study."))?,
        )?
        .page(
            "demo.intro",
            Page::new("consent")
                .with_element(Element::input("consent", OneOf::new(["yes"])).force_input())?,
        )?;

    builder
        .page(
            "demo.block",
            Page::new("q1").with_element(
                Element::input("q1", NumberInRange::new(1.0, 7.0)).force_input(),
            )?,
        )?
        .page(
            "demo.block",
            Page::new("q2").with_element(
                Element::input("q2", TextLength::new(2, Some(200))).force_input(),
            )?,
        )?
        .page(
            "demo.block",
            Page::new("note").with_element(Element::display("Halfway there."))?,
        )?;

    builder
        .page(
            "demo.main",
            Page::new("attention")
                .must_be_shown(true)
                .with_element(Element::display("Please read carefully."))?,
        )?
        .page(
            "demo.main",
            Page::new("rating").with_element(
                Element::input("rating", OneOf::new(["low", "mid", "high"])),
            )?,
        )?;

    builder.page(
        "demo.outro",
        Page::new("thanks").with_element(Element::display("Thank you!"))?,
    )?;

    Ok(builder.build())
}

fn valid_input(element: &str) -> Value {
    match element {
        "consent" => json!("yes"),
        "q1" => json!(4),
        "q2" => json!("fine, thanks"),
        "rating" => json!("mid"),
        _ => json!("ok"),
    }
}

fn invalid_input(element: &str) -> Value {
    match element {
        "q1" => json!("lots"),
        "q2" => json!("x"),
        _ => json!(""),
    }
}

/// Run the session simulator
pub async fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    let mut stats = SimulatorStats::default();
    let mut violations = Vec::new();

    let template = match demo_template() {
        Ok(t) => t,
        Err(e) => {
            violations.push(Violation::Fatal {
                session: "-".into(),
                error: e.to_string(),
            });
            return SimulatorReport {
                config,
                stats,
                violations,
                records_saved: 0,
            };
        }
    };

    let sink = Arc::new(MemorySink::new());
    let session_config = SessionConfig::new()
        .with_seed(config.seed)
        .with_targets(vec![TargetConfig::memory("memory", 0)]);
    let experiment = Experiment::new(template, session_config)
        .with_sink("memory", Arc::clone(&sink) as Arc<dyn StorageSink>);

    let all_pages: Vec<TreePath> = {
        let tree = experiment.template().tree();
        tree.pages().into_iter().map(|id| tree.path(id).clone()).collect()
    };

    // sessions are opened in order so shuffle seeds do not depend on scheduling
    let mut handles = Vec::new();
    for i in 0..config.sessions {
        let navigator = match experiment.open_session_with_id(format!("sim-{i}")).await {
            Ok(n) => n,
            Err(e) => {
                violations.push(Violation::Fatal {
                    session: format!("sim-{i}"),
                    error: e.to_string(),
                });
                continue;
            }
        };
        let rng = StdRng::seed_from_u64(config.seed.wrapping_add(i).wrapping_mul(0x9E37_79B9));
        let pages = all_pages.clone();
        let cfg = config.clone();
        handles.push(tokio::spawn(simulate_session(navigator, rng, pages, cfg)));
    }

    for result in futures::future::join_all(handles).await {
        match result {
            Ok((session_stats, session_violations)) => {
                stats.merge(&session_stats);
                violations.extend(session_violations);
            }
            Err(e) => violations.push(Violation::Fatal {
                session: "-".into(),
                error: e.to_string(),
            }),
        }
    }

    if config.stop_on_first_violation {
        violations.truncate(1);
    }

    SimulatorReport {
        config,
        stats,
        violations,
        records_saved: sink.len(),
    }
}

async fn simulate_session(
    mut nav: Navigator,
    mut rng: StdRng,
    pages: Vec<TreePath>,
    config: SimulatorConfig,
) -> (SimulatorStats, Vec<Violation>) {
    let session = nav.session_id().to_string();
    let mut stats = SimulatorStats {
        sessions: 1,
        ..SimulatorStats::default()
    };
    let mut violations = Vec::new();

    match nav.start().await {
        Ok(save) if save.is_total_failure() => stats.save_failures += 1,
        Ok(_) => {}
        Err(e) => {
            violations.push(Violation::Fatal {
                session,
                error: e.to_string(),
            });
            return (stats, violations);
        }
    }

    for _ in 0..config.max_moves {
        if nav.status().is_terminal() {
            break;
        }
        if rng.gen_bool(config.abort_probability.clamp(0.0, 1.0)) {
            nav.abort("participant left").await;
            stats.sessions_aborted += 1;
            break;
        }

        fill_inputs(&mut nav, &mut rng, &mut stats);

        let mv = match rng.gen_range(0..10) {
            0..=5 => Move::Forward,
            6 | 7 => Move::Backward,
            _ => match pages.choose(&mut rng) {
                Some(path) => Move::Jump(path.clone()),
                None => Move::Forward,
            },
        };

        let status_before = nav.status();
        let position_before = nav.current_position().cloned();
        let history_before = nav.history().to_vec();

        stats.moves_attempted += 1;
        let outcome = match nav.request_move(mv).await {
            Ok(outcome) => outcome,
            Err(e) => {
                violations.push(Violation::Fatal {
                    session: session.clone(),
                    error: e.to_string(),
                });
                break;
            }
        };

        if nav.status().rank() < status_before.rank() {
            violations.push(Violation::StatusRegressed {
                session: session.clone(),
                from: status_before,
                to: nav.status(),
            });
        }
        if !nav.history().starts_with(&history_before) {
            violations.push(Violation::HistoryRewritten {
                session: session.clone(),
            });
        }

        match &outcome {
            MoveOutcome::Rejected(rejection) => {
                stats.moves_rejected += 1;
                if nav.current_position().cloned() != position_before
                    || nav.history().len() != history_before.len()
                {
                    violations.push(Violation::RejectedMoveChangedState {
                        session: session.clone(),
                        kind: rejection.kind,
                    });
                }
            }
            MoveOutcome::Committed { save, .. } | MoveOutcome::Finished { save } => {
                stats.moves_committed += 1;
                if save.is_total_failure() {
                    stats.save_failures += 1;
                }
                if nav.history().len() != history_before.len() + 1 {
                    violations.push(Violation::HistoryRewritten {
                        session: session.clone(),
                    });
                }
                if outcome.is_finished() {
                    stats.sessions_finished += 1;
                }
            }
        }

        if let Some(page) = unshown_required_page(&nav) {
            violations.push(Violation::MustBeShownSkipped {
                session: session.clone(),
                page,
            });
        }
    }

    if nav.status().is_terminal() {
        let after_end = nav.request_move(Move::Forward).await;
        let refused = matches!(
            after_end.as_ref().map(MoveOutcome::rejection_kind),
            Ok(Some(RejectionKind::SessionNotRunning))
        );
        if !refused {
            violations.push(Violation::EndedSessionMoved {
                session: session.clone(),
            });
        }
    }

    if nav.journal().verify_integrity().is_err() {
        violations.push(Violation::JournalCorrupted { session });
    }

    (stats, violations)
}

fn fill_inputs(nav: &mut Navigator, rng: &mut StdRng, stats: &mut SimulatorStats) {
    let Some(current) = nav.current_page() else {
        return;
    };
    let names: Vec<String> = match nav.tree().page(current) {
        Ok(page) => page
            .elements()
            .iter()
            .filter(|e| e.is_input())
            .filter_map(|e| e.name().map(str::to_string))
            .collect(),
        Err(_) => return,
    };
    for name in names {
        let value = match rng.gen_range(0..10) {
            0..=6 => valid_input(&name),
            7 => invalid_input(&name),
            _ => continue,
        };
        match nav.submit(&name, value) {
            Ok(()) => stats.inputs_submitted += 1,
            Err(_) => stats.inputs_refused += 1,
        }
    }
}

/// A must-be-shown page before the current one that was never shown
fn unshown_required_page(nav: &Navigator) -> Option<String> {
    let current = nav.current_page()?;
    let tree = nav.tree();
    tree.pages()
        .into_iter()
        .take_while(|id| *id != current)
        .find(|id| {
            tree.page(*id)
                .map(|p| p.is_must_be_shown() && !p.has_been_shown())
                .unwrap_or(false)
        })
        .map(|id| tree.path(id).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_template_has_eight_pages() {
        let template = demo_template().unwrap();
        assert_eq!(template.page_count(), 8);
    }

    #[tokio::test]
    async fn small_simulation_passes() {
        let report = run_simulator(SimulatorConfig {
            sessions: 8,
            max_moves: 40,
            ..SimulatorConfig::default()
        })
        .await;
        assert!(report.passed(), "{}", report.generate_text());
        assert_eq!(report.stats.sessions, 8);
        assert!(report.stats.moves_attempted > 0);
        assert!(report.records_saved >= 8);
    }
}
