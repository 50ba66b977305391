//! Sports betting endpoints
//!
//! # Components
//! - `BettingClient`: endpoint methods with response normalization
//! - `odds`: market slugs and the ordered odds-shape resolver
//! - `search`: capped first-match search over candidate fixtures

mod client;
pub mod odds;
pub mod search;

pub use client::{
    AddLegResponse, BetResponse, BettingClient, ComboOddsResponse, LegRequest, OddsLookup,
    PlaceBetRequest, BET_SOURCE, DEFAULT_SPORT_ID,
};
pub use odds::{resolve_odds, MarketSlug, OddsShape, ResolvedOdds};
pub use search::{CandidateSearch, SearchOutcome};
