//! Randomized session simulation
//!
//! Drives many concurrent sessions through a template with random moves and
//! inputs, checking navigator invariants after every step.

pub mod simulator;

pub use simulator::{
    demo_template, run_simulator, SimulatorConfig, SimulatorReport, SimulatorStats, Violation,
};
