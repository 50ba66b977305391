//! Scenario configuration files
//!
//! Each scenario reads one JSON file from the configs directory:
//! - `simple_bet.json`
//! - `combo_bet.json`
//! - `error_flow.json`
//!
//! Ids may be written as numbers or strings; stakes and tolerances as
//! numbers or numeric strings.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::money::DEFAULT_TOLERANCE;
use crate::error::ScenarioError;
use crate::types::{
    deserialize_decimal, deserialize_id, deserialize_opt_decimal, deserialize_opt_id,
};

pub const SIMPLE_BET_FILE: &str = "simple_bet.json";
pub const COMBO_BET_FILE: &str = "combo_bet.json";
pub const ERROR_FLOW_FILE: &str = "error_flow.json";

/// Default configs directory, relative to the working directory
pub const DEFAULT_CONFIG_DIR: &str = "configs";

/// Single bet scenario
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimpleBetConfig {
    #[serde(deserialize_with = "deserialize_id")]
    pub sport_id: String,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub tournament_id: Option<String>,
    pub market_type: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub stake: Decimal,
}

/// One leg selection of a combo scenario
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Selection {
    #[serde(deserialize_with = "deserialize_id")]
    pub sport_id: String,
    pub market: String,
}

/// Combination bet scenario
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComboBetConfig {
    pub selections: Vec<Selection>,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub stake: Decimal,
    #[serde(default, deserialize_with = "deserialize_opt_decimal")]
    pub tolerance: Option<Decimal>,
}

impl ComboBetConfig {
    /// Configured tolerance, 0.01 when absent
    pub fn tolerance(&self) -> Decimal {
        self.tolerance.unwrap_or(DEFAULT_TOLERANCE)
    }
}

/// Expected-failure scenario: a sport/tournament with no fixtures and a
/// stake above the balance
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorFlowConfig {
    #[serde(deserialize_with = "deserialize_id")]
    pub sport_id: String,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub tournament_id: Option<String>,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub stake: Decimal,
}

/// Read and parse `<dir>/<file_name>`
pub fn load_config<T: DeserializeOwned>(dir: &Path, file_name: &str) -> Result<T, ScenarioError> {
    let path: PathBuf = dir.join(file_name);
    if !path.exists() {
        return Err(ScenarioError::Config(format!("config file not found: {}", path.display())));
    }

    let raw = std::fs::read_to_string(&path)
        .map_err(|e| ScenarioError::Config(format!("failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| ScenarioError::Config(format!("invalid JSON in {}: {}", path.display(), e)))
}
