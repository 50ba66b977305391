//! Decimal-exact arithmetic for odds, payouts and balances
//!
//! Values are rounded to two decimals half away from zero before monetary
//! comparisons.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Default absolute tolerance between computed and reported combined odds
pub const DEFAULT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Round to cents
pub fn to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Product of all odds. None on overflow; the empty product is 1.
pub fn multiply_odds(odds: &[Decimal]) -> Option<Decimal> {
    odds.iter().try_fold(Decimal::ONE, |acc, odd| acc.checked_mul(*odd))
}

/// `stake * odd`, rounded to cents
pub fn potential_winnings(stake: Decimal, odd: Decimal) -> Option<Decimal> {
    stake.checked_mul(odd).map(to_cents)
}

/// `|a - b| <= tolerance`
pub fn within_tolerance(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}

/// Balance movement after a bet, compared at cent precision
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceOutcome {
    /// Balance did not move
    Unchanged,
    /// Balance dropped by exactly the stake
    Deducted,
    /// Anything else
    Unexpected,
}

impl BalanceOutcome {
    pub fn classify(before: Decimal, after: Decimal, stake: Decimal) -> Self {
        let (before, after) = (to_cents(before), to_cents(after));
        if after == to_cents(before - stake) {
            BalanceOutcome::Deducted
        } else if after == before {
            BalanceOutcome::Unchanged
        } else {
            BalanceOutcome::Unexpected
        }
    }
}
