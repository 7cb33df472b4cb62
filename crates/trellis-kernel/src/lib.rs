//! Trellis Kernel
//!
//! Runs experiment trees as participant sessions:
//! - [`Navigator`] decides every move request and commits or rejects it
//! - [`Experiment`] opens sessions from one shared template
//! - [`state_machine`] guards the session lifecycle
//! - [`MoveJournal`] keeps a tamper-evident audit trail per session
//!
//! # Architecture
//!
//! ```text
//! Experiment ──open_session──▶ Navigator ──save──▶ FallbackChain ──▶ StorageSink…
//!                                 │
//!                 ExperimentTree (session copy) + hooks
//! ```

pub mod clock;
pub mod condition;
pub mod config;
pub mod error;
pub mod experiment;
pub mod journal;
pub mod logging;
pub mod navigator;
pub mod outcome;
pub mod state_machine;
pub mod test_harness;

pub use clock::{Clock, ManualClock, SystemClock};
pub use condition::{ConditionLookup, FixedCondition, MapConditions, NoCondition};
pub use config::{ExperimentConfig, SessionConfig};
pub use error::{ConfigError, JournalError, NavigationError, StateMachineError};
pub use experiment::Experiment;
pub use journal::{JournalEntry, MoveJournal};
pub use navigator::Navigator;
pub use outcome::{Move, MoveOptions, MoveOutcome, Rejection, RejectionKind};
pub use state_machine::SessionStatus;

pub use trellis_store::{SaveOutcome, SessionRecord};
pub use trellis_tree::{ExperimentTemplate, TreePath};
