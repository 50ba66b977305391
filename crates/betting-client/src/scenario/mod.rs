//! Scenario layer
//!
//! - `config`: JSON scenario definitions
//! - `money`: decimal-exact odds and payout arithmetic
//! - `runner`: simple, combo and error-flow scenarios with pass/fail reports

pub mod config;
pub mod money;
pub mod runner;

pub use config::{load_config, ComboBetConfig, ErrorFlowConfig, Selection, SimpleBetConfig};
pub use money::{multiply_odds, potential_winnings, to_cents, within_tolerance, BalanceOutcome};
pub use runner::{
    ComboBetReport, ErrorFlowReport, LegReport, RunnerSettings, ScenarioDetails, ScenarioKind,
    ScenarioReport, ScenarioRunner, SimpleBetReport,
};
