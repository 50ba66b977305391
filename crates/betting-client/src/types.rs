//! Data model for the betting mock API
//!
//! # Design Principles
//! 1. Money and odds are `Decimal`, converted from the JSON text form (no f64 round trip)
//! 2. Ids arrive as numbers or strings; both normalize to `String`
//! 3. Field-name alternatives live in ordered const lists, first usable field wins
//! 4. Totals and payouts skip aliases that are zero or not numeric

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ============================================================================
// Value coercion helpers
// ============================================================================

/// Convert a JSON number or numeric string into a `Decimal`.
/// Returns None for anything else, never panics.
pub fn value_to_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)).ok()
}

/// Convert a JSON string or number into an id string. Empty strings are None.
pub fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First field of `body` (in `names` order) holding a usable value.
/// Null, empty strings and `false` count as absent.
pub fn first_field<'a>(body: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names.iter().filter_map(|name| body.get(*name)).find(|v| is_present(v))
}

/// First field in `names` order that parses as a decimal
pub fn first_decimal(body: &Value, names: &[&str]) -> Option<Decimal> {
    names.iter().find_map(|name| body.get(*name).and_then(value_to_decimal))
}

/// Like [`first_decimal`], but a zero amount also counts as absent
pub fn first_nonzero_decimal(body: &Value, names: &[&str]) -> Option<Decimal> {
    names
        .iter()
        .find_map(|name| body.get(*name).and_then(value_to_decimal).filter(|d| !d.is_zero()))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Deserialize an id given either as a JSON string or number
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;
    value_to_id(&value).ok_or_else(|| D::Error::custom(format!("expected id, got {}", value)))
}

/// Optional variant of [`deserialize_id`]; null and empty strings become None
pub fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_id))
}

/// Deserialize a decimal given either as a JSON number or numeric string
pub fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;
    value_to_decimal(&value)
        .ok_or_else(|| D::Error::custom(format!("expected decimal, got {}", value)))
}

/// Optional variant of [`deserialize_decimal`]
pub fn deserialize_opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value_to_decimal(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected decimal, got {}", value))),
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Fixture as listed by GET /sports/sports-fixtures
#[derive(Clone, Debug, Serialize)]
pub struct Fixture {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sport_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tournament_id: Option<String>,
}

impl Fixture {
    /// Build from one listing element. Scalars are taken as bare ids.
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = match value {
            Value::Object(_) => first_field(value, &["id", "fixture_id", "fixtureId"])
                .and_then(value_to_id)?,
            other => value_to_id(other)?,
        };

        Some(Self {
            id,
            sport_id: first_field(value, &["sportId", "sport_id"]).and_then(value_to_id),
            tournament_id: first_field(value, &["tournamentId", "tournament_id"])
                .and_then(value_to_id),
        })
    }
}

/// Normalize a fixture listing body into an ordered list.
///
/// Accepted shapes: `{items: [..]}`, `{value: [..]}`, a bare array, or a
/// single fixture object. Elements without an id are skipped.
pub fn fixtures_from_listing(body: &Value) -> Vec<Fixture> {
    let elements: Vec<&Value> = if let Some(items) = body.get("items").and_then(Value::as_array) {
        items.iter().collect()
    } else if let Some(items) = body.get("value").and_then(Value::as_array) {
        items.iter().collect()
    } else if let Some(items) = body.as_array() {
        items.iter().collect()
    } else {
        vec![body]
    };

    elements.into_iter().filter_map(Fixture::from_value).collect()
}

// ============================================================================
// Balance
// ============================================================================

/// Balance field names, in lookup order
pub const BALANCE_FIELDS: &[&str] = &["balance", "money", "playableBalance"];

/// User balance from GET /auth/get_user_balance
#[derive(Clone, Debug)]
pub struct Balance {
    pub balance: Option<Decimal>,
}

impl Balance {
    /// A zero balance is a real balance, so only unparseable aliases are skipped
    pub fn from_body(body: &Value) -> Self {
        Self { balance: first_decimal(body, BALANCE_FIELDS) }
    }
}

// ============================================================================
// Combination bets
// ============================================================================

/// One leg of a combination bet, as accepted by POST /add-bet-to-combo
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboLeg {
    pub bet_id: String,
    pub fixture_id: String,
    pub odd: Decimal,
    pub sport_id: String,
    pub tournament_id: String,
}

impl ComboLeg {
    /// Leg id convention used by the service: `<fixtureId>-<market>`
    pub fn bet_id_for(fixture_id: &str, market: &str) -> String {
        format!("{}-{}", fixture_id, market)
    }
}

/// Ordered legs of one in-progress combination bet.
///
/// Owned by the caller and passed into each combo step. Legs are only
/// appended by a successful add-to-combo call.
#[derive(Clone, Debug, Default)]
pub struct ComboBuffer {
    legs: Vec<ComboLeg>,
}

impl ComboBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn legs(&self) -> &[ComboLeg] {
        &self.legs
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Leg odds in insertion order
    pub fn odds(&self) -> Vec<Decimal> {
        self.legs.iter().map(|leg| leg.odd).collect()
    }

    /// Drop all legs so the buffer can start a new combination
    pub fn clear(&mut self) {
        self.legs.clear();
    }

    pub(crate) fn push(&mut self, leg: ComboLeg) {
        self.legs.push(leg);
    }

    /// `fixture` reference sent with POST /get-combo-odds (taken from the first leg)
    pub fn fixture_ref(&self) -> Option<Value> {
        self.legs.first().map(|leg| {
            json!({
                "fixtureId": leg.fixture_id,
                "sportId": leg.sport_id,
                "tournamentId": leg.tournament_id,
            })
        })
    }
}

/// Where the combined odds figure came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalOddsSource {
    /// POST /get-combo-odds reported it directly
    ComboOdds,
    /// Filled in from POST /combo-bet-calculation
    Calculation,
}

/// Total-odds field names on POST /get-combo-odds
pub const COMBO_ODDS_TOTAL_FIELDS: &[&str] = &["total_odds", "total", "odds"];

/// Coefficient field names on POST /combo-bet-calculation
pub const COMBO_CALCULATION_TOTAL_FIELDS: &[&str] = &["odd", "total_odds", "total"];

// ============================================================================
// Bet placement results
// ============================================================================

/// Ordered field-name alternatives for one kind of placement response
#[derive(Clone, Copy, Debug)]
pub struct PlacementFields {
    pub id: &'static [&'static str],
    pub winnings: &'static [&'static str],
    pub total_odds: &'static [&'static str],
}

/// POST /place-bet response fields
pub const SINGLE_BET_FIELDS: PlacementFields = PlacementFields {
    id: &["betId", "bet_id", "id"],
    winnings: &["possibleWin", "potential_winnings", "potential", "winnings"],
    total_odds: &["odd", "odds"],
};

/// POST /place-combo-bet response fields
pub const COMBO_BET_FIELDS: PlacementFields = PlacementFields {
    id: &["betId", "combo_bet_id", "id"],
    winnings: &["profit", "potential_winnings", "potential", "winnings", "possibleWin"],
    total_odds: &["odd", "total_odds", "odds"],
};

/// Normalized bet placement result
#[derive(Clone, Debug, Default, Serialize)]
pub struct BetPlacement {
    pub id: Option<String>,
    pub potential_winnings: Option<Decimal>,
    pub total_odds: Option<Decimal>,
}

impl BetPlacement {
    pub fn from_body(body: &Value, fields: &PlacementFields) -> Self {
        Self {
            id: first_field(body, fields.id).and_then(value_to_id),
            potential_winnings: first_nonzero_decimal(body, fields.winnings),
            total_odds: first_nonzero_decimal(body, fields.total_odds),
        }
    }
}
