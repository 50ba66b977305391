//! Sports-betting mock API client
//!
//! Layers, leaf to root:
//! - `http`: gateway over a single lazily-built reqwest client, token header handling
//! - `sports`: endpoint methods with response-shape normalization, odds resolution
//! - `scenario`: declarative scenario configs and the end-to-end runner
//!
//! # Endpoints consumed
//! - POST /auth/generate_token
//! - GET  /auth/get_user_balance
//! - GET  /sports/sports-fixtures
//! - GET  /sports/odds
//! - POST /place-bet
//! - POST /add-bet-to-combo
//! - POST /get-combo-odds
//! - POST /combo-bet-calculation
//! - POST /place-combo-bet

pub mod error;
pub mod http;
pub mod scenario;
pub mod sports;
pub mod types;

pub use error::{ClientError, ScenarioError};
pub use types::*;

/// Public mock service used when BASE_URL is not set
pub const DEFAULT_BASE_URL: &str = "https://v46fnhvrjvtlrsmnismnwhdh5y0lckdl.lambda-url.us-east-1.on.aws";

/// Per-request timeout applied by the gateway
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Overall timeout for one scenario run
pub const DEFAULT_SCENARIO_TIMEOUT_SECS: u64 = 120;

/// Fixtures probed by the odds fallback search
pub const ODDS_FALLBACK_SCAN_CAP: usize = 50;

/// Candidate fixtures probed per combo selection
pub const COMBO_CANDIDATE_CAP: usize = 20;
