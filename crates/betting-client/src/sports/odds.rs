//! Market slugs and odds extraction
//!
//! The odds endpoint answers in several shapes depending on fixture and
//! market. [`OddsShape`] lists every shape we recognize; [`resolve_odds`]
//! tries them in [`SHAPE_ORDER`] and returns the first positive quote.
//!
//! # Recognized shapes, in order
//! 1. `{"odds": [{"value": 1.85}, ..]}`
//! 2. `{"value": 1.85}`
//! 3. `[{"value": 1.85}, ..]`
//! 4. `{"result": {"options": {"1": {"odds": 1.85}, ..}}}`
//! 5. `{"<slug>": {"options": {"over": {"odds": 1.85}, ..}}}`
//!
//! Option entries yield `odds`, else `profit`, else the entry itself.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};

use crate::types::value_to_decimal;

/// Canonical market identifier used as a key in odds responses
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct MarketSlug(String);

impl MarketSlug {
    pub const RESULT: &'static str = "result";
    pub const OVER_UNDER: &'static str = "over_under";
    pub const HANDICAP: &'static str = "handicap";

    /// Normalize a market name (case-insensitive).
    ///
    /// - `1x2` -> `result`
    /// - contains `over` or `under` -> `over_under`
    /// - contains `spread` or `handicap` -> `handicap`
    /// - anything else: lowercase, runs of non-alphanumerics become `_`
    /// - empty -> `result`
    pub fn normalize(market: &str) -> Self {
        let lower = market.to_lowercase();

        let slug = if lower.is_empty() || lower == "1x2" {
            Self::RESULT.to_string()
        } else if lower.contains("over") || lower.contains("under") {
            Self::OVER_UNDER.to_string()
        } else if lower.contains("spread") || lower.contains("handicap") {
            Self::HANDICAP.to_string()
        } else {
            collapse_non_alphanumeric(&lower)
        };

        MarketSlug(slug)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarketSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn collapse_non_alphanumeric(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

/// Known odds response shapes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OddsShape {
    /// Top-level `odds` array, first element's `value`
    OddsArray,
    /// Top-level `value`
    TopLevelValue,
    /// Array body, first element's `value`
    ArrayHead,
    /// `result.options`, first option
    ResultOptions,
    /// `<slug>.options`, first option
    MarketOptions,
}

/// Order in which shapes are tried
pub const SHAPE_ORDER: [OddsShape; 5] = [
    OddsShape::OddsArray,
    OddsShape::TopLevelValue,
    OddsShape::ArrayHead,
    OddsShape::ResultOptions,
    OddsShape::MarketOptions,
];

impl OddsShape {
    /// Raw JSON quote for this shape, if the body has it
    pub fn locate<'a>(self, body: &'a Value, slug: &MarketSlug) -> Option<&'a Value> {
        match self {
            OddsShape::OddsArray => {
                let first = body.get("odds")?.as_array()?.first()?;
                Some(first.get("value").unwrap_or(first))
            }
            OddsShape::TopLevelValue => body.as_object()?.get("value"),
            OddsShape::ArrayHead => body.as_array()?.first()?.get("value"),
            OddsShape::ResultOptions => first_option(body.get(MarketSlug::RESULT)?),
            OddsShape::MarketOptions => first_option(body.get(slug.as_str())?),
        }
    }
}

/// First entry of a market's `options` (map or list), reduced to its quote
fn first_option(market: &Value) -> Option<&Value> {
    let options = market.get("options")?;
    let first = match options {
        Value::Object(map) => map.values().next()?,
        Value::Array(items) => items.first()?,
        _ => return None,
    };

    ["odds", "profit"]
        .iter()
        .filter_map(|field| first.get(*field))
        .find(|v| !v.is_null())
        .or(Some(first))
}

/// A quote located in a response body
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedOdds {
    pub shape: OddsShape,
    pub value: Decimal,
    /// Quote as it appeared in the body
    pub raw: Value,
}

/// Try every known shape in order; first positive decimal wins.
/// Returns None when no shape matches, never panics.
pub fn resolve_odds(body: &Value, slug: &MarketSlug) -> Option<ResolvedOdds> {
    SHAPE_ORDER.iter().find_map(|shape| {
        let raw = shape.locate(body, slug)?;
        let value = value_to_decimal(raw).filter(|v| v.is_sign_positive() && !v.is_zero())?;
        Some(ResolvedOdds { shape: *shape, value, raw: raw.clone() })
    })
}

/// Body with `odds: [{value}]` exposed for a resolved quote.
///
/// Objects gain (or keep) the `odds` array; array bodies are wrapped as
/// `{"odds": [..], "raw": [..]}`. Unresolved bodies are returned unmodified.
pub fn normalize_odds_body(body: Value, resolved: Option<&ResolvedOdds>) -> Value {
    let Some(resolved) = resolved else {
        return body;
    };
    let odds = json!([{ "value": resolved.raw }]);

    match body {
        Value::Object(mut map) => {
            if resolved.shape != OddsShape::OddsArray {
                map.insert("odds".to_string(), odds);
            }
            Value::Object(map)
        }
        other => json!({ "odds": odds, "raw": other }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn slug(market: &str) -> MarketSlug {
        MarketSlug::normalize(market)
    }

    #[test]
    fn test_market_normalization() {
        assert_eq!(slug("1X2").as_str(), "result");
        assert_eq!(slug("1x2"), slug("1X2"));
        assert_eq!(slug("Over/Under").as_str(), "over_under");
        assert_eq!(slug("UNDER 2.5").as_str(), "over_under");
        assert_eq!(slug("Asian Handicap").as_str(), "handicap");
        assert_eq!(slug("Point Spread").as_str(), "handicap");
        assert_eq!(slug("Both Teams -- Score").as_str(), "both_teams_score");
        assert_eq!(slug("").as_str(), "result");
    }

    #[test]
    fn test_market_normalization_is_idempotent() {
        for market in ["1X2", "Over/Under", "Handicap", "Double Chance!", "correct-score"] {
            let once = slug(market);
            assert_eq!(slug(once.as_str()), once, "not idempotent for {}", market);
        }
    }

    #[test]
    fn test_each_shape_resolves() {
        let ou = slug("Over/Under");
        let cases = [
            (json!({"odds": [{"value": 1.85}]}), OddsShape::OddsArray, dec!(1.85)),
            (json!({"value": "2.05"}), OddsShape::TopLevelValue, dec!(2.05)),
            (json!([{"value": 1.5}, {"value": 9}]), OddsShape::ArrayHead, dec!(1.5)),
            (
                json!({"result": {"options": {"1": {"odds": 2.4}, "X": {"odds": 3.1}}}}),
                OddsShape::ResultOptions,
                dec!(2.4),
            ),
            (
                json!({"over_under": {"options": {"over": {"profit": 1.95}}}}),
                OddsShape::MarketOptions,
                dec!(1.95),
            ),
            (
                json!({"over_under": {"options": [1.7, 2.1]}}),
                OddsShape::MarketOptions,
                dec!(1.7),
            ),
        ];

        for (body, shape, value) in cases {
            let resolved = resolve_odds(&body, &ou).expect("shape should resolve");
            assert_eq!(resolved.shape, shape, "body {}", body);
            assert_eq!(resolved.value, value);
        }
    }

    #[test]
    fn test_result_options_precede_market_options() {
        let body = json!({
            "result": {"options": {"home": {"odds": 2.0}}},
            "over_under": {"options": {"over": {"odds": 1.8}}}
        });
        let resolved = resolve_odds(&body, &slug("Over/Under")).unwrap();
        assert_eq!(resolved.shape, OddsShape::ResultOptions);
        assert_eq!(resolved.value, dec!(2.0));
    }

    #[test]
    fn test_options_keep_service_order() {
        let body = json!({"result": {"options": {"z": {"odds": 1.1}, "a": {"odds": 9.9}}}});
        assert_eq!(resolve_odds(&body, &slug("1X2")).unwrap().value, dec!(1.1));
    }

    #[test]
    fn test_unknown_shapes_resolve_to_none() {
        let s = slug("1X2");
        for body in [
            json!({}),
            json!([]),
            json!(null),
            json!("1.85"),
            json!({"odds": []}),
            json!({"value": [{"id": 1}]}),
            json!({"value": 0}),
            json!({"result": {"options": {}}}),
            json!({"result": {"options": {"1": {"odds": "n/a"}}}}),
            json!({"handicap": {"options": {"a": {"odds": 1.9}}}}),
        ] {
            assert!(resolve_odds(&body, &s).is_none(), "unexpected match for {}", body);
        }
    }

    #[test]
    fn test_falls_through_to_later_shape() {
        let body = json!({"odds": [], "result": {"options": {"1": {"odds": 1.6}}}});
        let resolved = resolve_odds(&body, &slug("1X2")).unwrap();
        assert_eq!(resolved.shape, OddsShape::ResultOptions);
    }

    #[test]
    fn test_normalize_odds_body() {
        let body = json!({"result": {"options": {"1": {"odds": 2.4}}}});
        let resolved = resolve_odds(&body, &slug("1X2"));
        let normalized = normalize_odds_body(body, resolved.as_ref());
        assert_eq!(normalized["odds"][0]["value"], json!(2.4));
        assert!(normalized.get("result").is_some());

        let array = json!([{"value": 1.5}]);
        let resolved = resolve_odds(&array, &slug("1X2"));
        let normalized = normalize_odds_body(array, resolved.as_ref());
        assert_eq!(normalized["odds"][0]["value"], json!(1.5));
        assert_eq!(normalized["raw"][0]["value"], json!(1.5));

        let unknown = json!({"foo": 1});
        assert_eq!(normalize_odds_body(unknown.clone(), None), unknown);
    }
}
