//! Scenario runner - end-to-end flows against the betting API
//!
//! # Scenarios
//! 1. `simple_bet`: place one bet, balance drops by the stake, payout = stake x odd
//! 2. `combo_bet`: resolve one fixture per selection, add legs, reconcile the
//!    combined odds with the local product, place the combination
//! 3. `error_flow`: unknown sport/tournament lists no fixtures, an oversized
//!    stake is rejected
//!
//! Each run uses a fresh [`BettingClient`] and is strictly sequential.
//!
//! # Combination balance
//! The mock service does not consistently deduct combination stakes. A combo
//! run passes when the balance is unchanged or reduced by exactly the stake;
//! the observed outcome is recorded in the report.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::config::{
    load_config, ComboBetConfig, ErrorFlowConfig, SimpleBetConfig, COMBO_BET_FILE,
    DEFAULT_CONFIG_DIR, ERROR_FLOW_FILE, SIMPLE_BET_FILE,
};
use super::money::{multiply_odds, potential_winnings, to_cents, within_tolerance, BalanceOutcome};
use crate::error::ScenarioError;
use crate::http::{HttpGateway, Session};
use crate::sports::{BettingClient, CandidateSearch, LegRequest, PlaceBetRequest};
use crate::types::{ComboBuffer, Fixture, TotalOddsSource};
use crate::{
    COMBO_CANDIDATE_CAP, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SCENARIO_TIMEOUT_SECS,
};

/// Statuses accepted as a rejection of an oversized stake
pub const REJECTION_STATUSES: [u16; 4] = [400, 402, 403, 422];

/// Market and fixture used by the error flow's oversized bet
const ERROR_FLOW_FIXTURE: &str = "1";
const ERROR_FLOW_MARKET: &str = "1X2";

/// Runner settings
#[derive(Clone, Debug)]
pub struct RunnerSettings {
    pub base_url: String,
    pub request_timeout: Duration,
    pub scenario_timeout: Duration,
    pub config_dir: PathBuf,
}

impl RunnerSettings {
    /// Settings from environment variables, falling back to defaults
    ///
    /// Env vars:
    /// - BASE_URL
    /// - HTTP_TIMEOUT_SECS
    /// - SCENARIO_TIMEOUT_SECS
    /// - SCENARIO_CONFIG_DIR
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secs = |name: &str| std::env::var(name).ok().and_then(|v| v.parse::<u64>().ok());

        Self {
            base_url: std::env::var("BASE_URL").unwrap_or(defaults.base_url),
            request_timeout: secs("HTTP_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            scenario_timeout: secs("SCENARIO_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.scenario_timeout),
            config_dir: std::env::var("SCENARIO_CONFIG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.config_dir),
        }
    }
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            scenario_timeout: Duration::from_secs(DEFAULT_SCENARIO_TIMEOUT_SECS),
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
        }
    }
}

/// Available scenarios
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    SimpleBet,
    ComboBet,
    ErrorFlow,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 3] =
        [ScenarioKind::SimpleBet, ScenarioKind::ComboBet, ScenarioKind::ErrorFlow];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioKind::SimpleBet => "simple_bet",
            ScenarioKind::ComboBet => "combo_bet",
            ScenarioKind::ErrorFlow => "error_flow",
        }
    }

    pub fn config_file(&self) -> &'static str {
        match self {
            ScenarioKind::SimpleBet => SIMPLE_BET_FILE,
            ScenarioKind::ComboBet => COMBO_BET_FILE,
            ScenarioKind::ErrorFlow => ERROR_FLOW_FILE,
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single bet outcome
#[derive(Clone, Debug, Serialize)]
pub struct SimpleBetReport {
    pub fixture_id: String,
    pub odd: Decimal,
    pub stake: Decimal,
    pub bet_id: String,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub expected_winnings: Decimal,
    pub reported_winnings: Decimal,
}

/// One resolved combination leg
#[derive(Clone, Debug, Serialize)]
pub struct LegReport {
    pub fixture_id: String,
    pub market: String,
    /// Quote found while scanning candidates
    pub quoted_odd: Decimal,
    /// Quote re-resolved when the leg was submitted
    pub submitted_odd: Decimal,
}

/// Combination bet outcome
#[derive(Clone, Debug, Serialize)]
pub struct ComboBetReport {
    pub legs: Vec<LegReport>,
    pub product_odds: Decimal,
    pub service_total_odds: Decimal,
    pub total_odds_source: Option<TotalOddsSource>,
    pub tolerance: Decimal,
    pub bet_id: String,
    pub stake: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub balance_outcome: BalanceOutcome,
    pub expected_winnings: Decimal,
    pub reported_winnings: Decimal,
}

/// Error flow outcome
#[derive(Clone, Debug, Serialize)]
pub struct ErrorFlowReport {
    pub fixtures_found: usize,
    pub rejection_status: u16,
}

/// Per-scenario details
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum ScenarioDetails {
    SimpleBet(SimpleBetReport),
    ComboBet(ComboBetReport),
    ErrorFlow(ErrorFlowReport),
}

/// Pass/fail record for one scenario run
#[derive(Clone, Debug, Serialize)]
pub struct ScenarioReport {
    pub scenario: ScenarioKind,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ScenarioDetails>,
}

/// Drives the betting client through scenarios and checks their invariants
pub struct ScenarioRunner {
    settings: RunnerSettings,
}

impl ScenarioRunner {
    pub fn new(settings: RunnerSettings) -> Self {
        Self { settings }
    }

    /// Fresh client (and HTTP client) for one scenario
    fn client(&self) -> BettingClient {
        BettingClient::with_gateway(HttpGateway::with_timeout(
            &self.settings.base_url,
            self.settings.request_timeout,
        ))
    }

    /// Load the scenario's config and run it under the overall timeout
    pub async fn run(&self, kind: ScenarioKind) -> ScenarioReport {
        let started_at = Utc::now();
        let timer = Instant::now();
        let limit = self.settings.scenario_timeout;

        info!("=== Scenario {} ===", kind);

        let result = match tokio::time::timeout(limit, self.execute(kind)).await {
            Ok(result) => result,
            Err(_) => Err(ScenarioError::Timeout(limit.as_secs())),
        };

        let elapsed_ms = timer.elapsed().as_millis() as u64;
        match result {
            Ok(details) => {
                info!("Scenario {} PASSED in {}ms", kind, elapsed_ms);
                ScenarioReport {
                    scenario: kind,
                    passed: true,
                    error: None,
                    started_at,
                    elapsed_ms,
                    details: Some(details),
                }
            }
            Err(e) => {
                error!("Scenario {} FAILED: {}", kind, e);
                ScenarioReport {
                    scenario: kind,
                    passed: false,
                    error: Some(e.to_string()),
                    started_at,
                    elapsed_ms,
                    details: None,
                }
            }
        }
    }

    async fn execute(&self, kind: ScenarioKind) -> Result<ScenarioDetails, ScenarioError> {
        let dir = &self.settings.config_dir;
        let file = kind.config_file();

        match kind {
            ScenarioKind::SimpleBet => {
                let config: SimpleBetConfig = load_config(dir, file)?;
                self.run_simple_bet(&config).await.map(ScenarioDetails::SimpleBet)
            }
            ScenarioKind::ComboBet => {
                let config: ComboBetConfig = load_config(dir, file)?;
                self.run_combo_bet(&config).await.map(ScenarioDetails::ComboBet)
            }
            ScenarioKind::ErrorFlow => {
                let config: ErrorFlowConfig = load_config(dir, file)?;
                self.run_error_flow(&config).await.map(ScenarioDetails::ErrorFlow)
            }
        }
    }

    /// Single bet: balance drops by the stake and the payout is `round(stake * odd, 2)`
    pub async fn run_simple_bet(
        &self,
        config: &SimpleBetConfig,
    ) -> Result<SimpleBetReport, ScenarioError> {
        let client = self.client();
        let session = client.authenticate().await?;
        let balance_before = current_balance(&client, &session).await?;

        let fixture = client
            .find_fixtures(Some(&config.sport_id), config.tournament_id.as_deref())
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                error!(
                    "No fixture listed for sport {} tournament {:?}",
                    config.sport_id, config.tournament_id
                );
                ScenarioError::unresolved("fixture", format!("sport {}", config.sport_id))
            })?;

        let lookup = client.get_odds(&fixture.id, &config.market_type, None).await?;
        let odd = lookup.odd().ok_or_else(|| {
            error!(
                "No odds for fixture {} market {}: {}",
                fixture.id, config.market_type, lookup.body
            );
            ScenarioError::unresolved(
                "odds",
                format!("fixture {} market {}", fixture.id, config.market_type),
            )
        })?;
        info!("Fixture {} market {} odd {}", lookup.fixture_id, config.market_type, odd);

        let request = PlaceBetRequest::new(
            lookup.fixture_id.clone(),
            config.market_type.clone(),
            config.stake,
        )
        .sport_id(Some(config.sport_id.clone()))
        .odd(odd);
        let placed = client.place_bet(&session, &request).await?;
        if !placed.ok {
            return Err(ScenarioError::assertion("single bet accepted", "2xx", placed.status));
        }
        let bet_id = placed
            .placement
            .id
            .clone()
            .ok_or_else(|| ScenarioError::unresolved("bet id", placed.body.to_string()))?;

        let balance_after = current_balance(&client, &session).await?;
        let expected_balance = to_cents(balance_before - config.stake);
        if to_cents(balance_after) != expected_balance {
            return Err(ScenarioError::assertion(
                "balance reduced by stake",
                expected_balance,
                to_cents(balance_after),
            ));
        }

        let expected_winnings =
            potential_winnings(config.stake, odd).ok_or(ScenarioError::Overflow("winnings"))?;
        let reported_winnings = placed
            .placement
            .potential_winnings
            .ok_or_else(|| {
                ScenarioError::unresolved("potential winnings", placed.body.to_string())
            })?;
        if to_cents(reported_winnings) != expected_winnings {
            return Err(ScenarioError::assertion(
                "potential winnings = stake x odd",
                expected_winnings,
                to_cents(reported_winnings),
            ));
        }

        Ok(SimpleBetReport {
            fixture_id: lookup.fixture_id,
            odd,
            stake: config.stake,
            bet_id,
            balance_before,
            balance_after,
            expected_winnings,
            reported_winnings,
        })
    }

    /// Combination bet: per-leg resolution, add to combo, total-odds
    /// reconciliation, settlement
    pub async fn run_combo_bet(
        &self,
        config: &ComboBetConfig,
    ) -> Result<ComboBetReport, ScenarioError> {
        if config.selections.is_empty() {
            return Err(ScenarioError::unresolved("selections", "combo scenario has no selections"));
        }

        let client = self.client();
        let session = client.authenticate().await?;
        let balance_before = current_balance(&client, &session).await?;
        let tolerance = config.tolerance();

        let mut buffer = ComboBuffer::new();
        let mut legs = Vec::with_capacity(config.selections.len());

        for selection in &config.selections {
            let (fixture, quoted_odd) =
                find_fixture_with_odds(&client, &selection.sport_id, &selection.market).await?;

            let request = LegRequest::new(fixture.id.clone(), selection.market.clone())
                .sport_id(Some(selection.sport_id.clone()))
                .tournament_id(fixture.tournament_id.clone());
            let added = client.add_to_combo(&session, &mut buffer, &request).await?;
            if !added.ok {
                return Err(ScenarioError::assertion("leg added to combo", "2xx", added.status));
            }
            let leg = added
                .leg
                .ok_or_else(|| ScenarioError::unresolved("combo leg", added.body.to_string()))?;

            if !within_tolerance(quoted_odd, leg.odd, tolerance) {
                return Err(ScenarioError::assertion(
                    "leg odds drift within tolerance",
                    quoted_odd,
                    leg.odd,
                ));
            }
            if quoted_odd != leg.odd {
                warn!(
                    "Odds for {} moved from {} to {} between lookups",
                    leg.bet_id, quoted_odd, leg.odd
                );
            }

            legs.push(LegReport {
                fixture_id: leg.fixture_id,
                market: selection.market.clone(),
                quoted_odd,
                submitted_odd: leg.odd,
            });
        }

        let product_odds =
            multiply_odds(&buffer.odds()).ok_or(ScenarioError::Overflow("combined odds"))?;
        let combo = client.get_combo_odds(&session, &buffer).await?;
        let service_total_odds = combo.total_odds.ok_or_else(|| {
            error!("Combined odds missing from service response: {}", combo.body);
            ScenarioError::unresolved("combined odds", combo.body.to_string())
        })?;
        if !within_tolerance(service_total_odds, product_odds, tolerance) {
            return Err(ScenarioError::assertion(
                "combined odds = product of leg odds",
                product_odds,
                service_total_odds,
            ));
        }

        let placed = client.place_combo_bet(&session, &buffer, config.stake).await?;
        if !placed.ok {
            return Err(ScenarioError::assertion("combo bet accepted", "2xx", placed.status));
        }
        let bet_id = placed
            .placement
            .id
            .clone()
            .ok_or_else(|| ScenarioError::unresolved("combo bet id", placed.body.to_string()))?;

        let balance_after = current_balance(&client, &session).await?;
        let balance_outcome = BalanceOutcome::classify(balance_before, balance_after, config.stake);
        match balance_outcome {
            BalanceOutcome::Deducted => debug!("Combo stake deducted"),
            BalanceOutcome::Unchanged => info!("Combo stake not deducted, accepted"),
            BalanceOutcome::Unexpected => {
                return Err(ScenarioError::assertion(
                    "balance unchanged or reduced by stake",
                    format!(
                        "{} or {}",
                        to_cents(balance_before),
                        to_cents(balance_before - config.stake)
                    ),
                    to_cents(balance_after),
                ));
            }
        }

        let expected_winnings = potential_winnings(config.stake, product_odds)
            .ok_or(ScenarioError::Overflow("winnings"))?;
        let reported_winnings = placed
            .placement
            .potential_winnings
            .ok_or_else(|| {
                ScenarioError::unresolved("potential winnings", placed.body.to_string())
            })?;
        if to_cents(reported_winnings) != expected_winnings {
            return Err(ScenarioError::assertion(
                "potential winnings = stake x product",
                expected_winnings,
                to_cents(reported_winnings),
            ));
        }

        Ok(ComboBetReport {
            legs,
            product_odds,
            service_total_odds,
            total_odds_source: combo.source,
            tolerance,
            bet_id,
            stake: config.stake,
            balance_before,
            balance_after,
            balance_outcome,
            expected_winnings,
            reported_winnings,
        })
    }

    /// Expected failures: no fixtures for the configured sport/tournament and
    /// a rejected oversized stake
    pub async fn run_error_flow(
        &self,
        config: &ErrorFlowConfig,
    ) -> Result<ErrorFlowReport, ScenarioError> {
        let client = self.client();
        let session = client.authenticate().await?;

        let fixtures_found = match client
            .find_fixtures(Some(&config.sport_id), config.tournament_id.as_deref())
            .await
        {
            Ok(fixtures) => fixtures.len(),
            Err(e) => {
                info!("Fixture lookup failed as expected: {}", e);
                0
            }
        };
        if fixtures_found > 0 {
            return Err(ScenarioError::assertion(
                "no fixtures for invalid sport",
                0,
                fixtures_found,
            ));
        }

        let request = PlaceBetRequest::new(ERROR_FLOW_FIXTURE, ERROR_FLOW_MARKET, config.stake);
        let placed = client.place_bet(&session, &request).await?;
        if placed.ok {
            return Err(ScenarioError::assertion(
                "oversized stake rejected",
                "non-2xx",
                placed.status,
            ));
        }
        if !REJECTION_STATUSES.contains(&placed.status) {
            return Err(ScenarioError::assertion(
                "rejection status",
                "one of 400/402/403/422",
                placed.status,
            ));
        }

        info!("Oversized stake rejected with HTTP {}", placed.status);
        Ok(ErrorFlowReport { fixtures_found, rejection_status: placed.status })
    }
}

async fn current_balance(
    client: &BettingClient,
    session: &Session,
) -> Result<Decimal, ScenarioError> {
    client.get_balance(session).await?.balance.ok_or_else(|| {
        error!("Balance response has no balance/money/playableBalance field");
        ScenarioError::unresolved("balance", "no balance field")
    })
}

/// First of the sport's fixtures (up to [`COMBO_CANDIDATE_CAP`]) quoting the market
async fn find_fixture_with_odds(
    client: &BettingClient,
    sport_id: &str,
    market: &str,
) -> Result<(Fixture, Decimal), ScenarioError> {
    let fixtures = client.find_fixtures(Some(sport_id), None).await?;

    let outcome = CandidateSearch::new(COMBO_CANDIDATE_CAP)
        .first_match(fixtures, |fixture: Fixture| async move {
            match client.lookup_odds(&fixture.id, market, Some(sport_id)).await {
                Ok(lookup) => lookup.odd().map(|odd| (fixture, odd)),
                Err(e) => {
                    debug!("Candidate {} skipped: {}", fixture.id, e);
                    None
                }
            }
        })
        .await;

    outcome.found.ok_or_else(|| {
        error!(
            "No fixture found in sport {} with market {} ({} probed)",
            sport_id, market, outcome.probed
        );
        ScenarioError::unresolved(
            "fixture with odds",
            format!("sport {} market {}", sport_id, market),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::config::Selection;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn runner(server: &MockServer) -> ScenarioRunner {
        ScenarioRunner::new(RunnerSettings {
            base_url: server.uri(),
            request_timeout: Duration::from_secs(5),
            ..RunnerSettings::default()
        })
    }

    async fn mount(server: &MockServer, verb: &str, route: &str, status: u16, body: Value) {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mount_auth(server: &MockServer) {
        let body = json!({"token": "tok", "expires_in": 3600});
        mount(server, "POST", "/auth/generate_token", 200, body).await;
    }

    /// First balance call answers `before`, later calls `after`
    async fn mount_balances(server: &MockServer, before: Value, after: Value) {
        Mock::given(method("GET"))
            .and(path("/auth/get_user_balance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(before))
            .up_to_n_times(1)
            .mount(server)
            .await;
        mount(server, "GET", "/auth/get_user_balance", 200, after).await;
    }

    async fn mount_odds(server: &MockServer, fixture: &str, market: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path("/sports/odds"))
            .and(query_param("fixtureId", fixture))
            .and(query_param("market", market))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn simple_config() -> SimpleBetConfig {
        SimpleBetConfig {
            sport_id: "1".to_string(),
            tournament_id: None,
            market_type: "1X2".to_string(),
            stake: dec!(10),
        }
    }

    async fn simple_bet_server(after_balance: Value) -> MockServer {
        let server = MockServer::start().await;
        mount_auth(&server).await;
        mount_balances(&server, json!({"balance": "100.00"}), after_balance).await;
        mount(&server, "GET", "/sports/sports-fixtures", 200, json!({"items": [{"id": 5}]})).await;
        mount_odds(&server, "5", "1X2", json!({"value": 1.85})).await;
        let placed = json!({"betId": "B1", "possibleWin": "18.50"});
        mount(&server, "POST", "/place-bet", 200, placed).await;
        server
    }

    #[tokio::test]
    async fn test_simple_bet_passes() {
        let server = simple_bet_server(json!({"balance": "90.00"})).await;

        let report = runner(&server).run_simple_bet(&simple_config()).await.unwrap();
        assert_eq!(report.bet_id, "B1");
        assert_eq!(report.odd, dec!(1.85));
        assert_eq!(report.expected_winnings, dec!(18.50));
        assert_eq!(report.balance_after, dec!(90));
    }

    #[tokio::test]
    async fn test_simple_bet_requires_deduction() {
        let server = simple_bet_server(json!({"balance": "100.00"})).await;

        let err = runner(&server).run_simple_bet(&simple_config()).await.unwrap_err();
        assert!(matches!(err, ScenarioError::Assertion { check: "balance reduced by stake", .. }));
    }

    #[tokio::test]
    async fn test_simple_bet_without_fixtures_fails() {
        let server = MockServer::start().await;
        mount_auth(&server).await;
        mount(&server, "GET", "/auth/get_user_balance", 200, json!({"money": 100})).await;
        mount(&server, "GET", "/sports/sports-fixtures", 200, json!({"items": []})).await;

        let err = runner(&server).run_simple_bet(&simple_config()).await.unwrap_err();
        assert!(matches!(err, ScenarioError::Unresolved { what: "fixture", .. }));
    }

    #[tokio::test]
    async fn test_auth_failure_is_fatal() {
        let server = MockServer::start().await;
        mount(&server, "POST", "/auth/generate_token", 500, json!({})).await;

        let err = runner(&server).run_simple_bet(&simple_config()).await.unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Client(crate::ClientError::AuthFailed { status: 500 })
        ));
    }

    fn combo_config() -> ComboBetConfig {
        ComboBetConfig {
            selections: vec![
                Selection { sport_id: "1".to_string(), market: "1X2".to_string() },
                Selection { sport_id: "1".to_string(), market: "Over/Under".to_string() },
            ],
            stake: dec!(10),
            tolerance: None,
        }
    }

    fn result_odds(odd: Value) -> Value {
        json!({"result": {"options": {"1": {"odds": odd}}}})
    }

    /// Fixture 101 quotes 1X2 at 1.85; only fixture 102 quotes Over/Under (1.90)
    async fn combo_server(total: Value, after_balance: Value) -> MockServer {
        combo_server_with(json!(1.85), total, json!(35.15), after_balance).await
    }

    /// Same as [`combo_server`], but fixture 101 answers `resubmitted` after
    /// its first 1X2 quote
    async fn combo_server_with(
        resubmitted: Value,
        total: Value,
        profit: Value,
        after_balance: Value,
    ) -> MockServer {
        let server = MockServer::start().await;
        mount_auth(&server).await;
        mount_balances(&server, json!({"balance": 100}), after_balance).await;
        // both quote lookups of a leg are sport-scoped
        Mock::given(method("GET"))
            .and(path("/sports/odds"))
            .and(query_param_is_missing("sportId"))
            .respond_with(ResponseTemplate::new(500))
            .with_priority(1)
            .expect(0)
            .mount(&server)
            .await;
        mount(
            &server,
            "GET",
            "/sports/sports-fixtures",
            200,
            json!({"items": [{"id": 101, "tournamentId": 7}, {"id": 102, "tournamentId": 7}]}),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/sports/odds"))
            .and(query_param("fixtureId", "101"))
            .and(query_param("market", "1X2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(result_odds(json!(1.85))))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_odds(&server, "101", "1X2", result_odds(resubmitted)).await;
        mount_odds(&server, "101", "Over/Under", json!({})).await;
        mount_odds(
            &server,
            "102",
            "Over/Under",
            json!({"over_under": {"options": {"over": {"odds": 1.90}}}}),
        )
        .await;
        mount(&server, "POST", "/add-bet-to-combo", 200, json!({"status": "added"})).await;
        mount(&server, "POST", "/get-combo-odds", 200, total).await;
        mount(&server, "POST", "/place-combo-bet", 200, json!({"betId": "C1", "profit": profit}))
            .await;
        server
    }

    #[tokio::test]
    async fn test_combo_bet_tolerates_small_drift() {
        let server = combo_server_with(
            json!(1.855),
            json!({"total_odds": 3.52}),
            json!(35.25),
            json!({"balance": 90}),
        )
        .await;

        let report = runner(&server).run_combo_bet(&combo_config()).await.unwrap();

        assert_eq!(report.legs[0].quoted_odd, dec!(1.85));
        assert_eq!(report.legs[0].submitted_odd, dec!(1.855));
        assert_eq!(report.product_odds, dec!(3.5245));
        assert_eq!(report.expected_winnings, dec!(35.25));
    }

    #[tokio::test]
    async fn test_combo_bet_rejects_drift_beyond_tolerance() {
        let server = combo_server_with(
            json!(1.95),
            json!({"total_odds": 3.705}),
            json!(37.05),
            json!({"balance": 90}),
        )
        .await;

        let err = runner(&server).run_combo_bet(&combo_config()).await.unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Assertion { check: "leg odds drift within tolerance", .. }
        ));
    }

    #[tokio::test]
    async fn test_combo_bet_reconciles_and_settles() {
        let server = combo_server(json!({"total_odds": 3.52}), json!({"balance": 90})).await;

        let report = runner(&server).run_combo_bet(&combo_config()).await.unwrap();

        assert_eq!(report.legs.len(), 2);
        assert_eq!(report.legs[0].fixture_id, "101");
        assert_eq!(report.legs[1].fixture_id, "102");
        assert_eq!(report.product_odds, dec!(3.515));
        assert_eq!(report.service_total_odds, dec!(3.52));
        assert_eq!(report.expected_winnings, dec!(35.15));
        assert_eq!(report.balance_outcome, BalanceOutcome::Deducted);
    }

    #[tokio::test]
    async fn test_combo_bet_accepts_undeducted_balance() {
        let server = combo_server(json!({"total": "3.515"}), json!({"balance": 100})).await;

        let report = runner(&server).run_combo_bet(&combo_config()).await.unwrap();
        assert_eq!(report.balance_outcome, BalanceOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_combo_bet_rejects_unexpected_balance() {
        let server = combo_server(json!({"total_odds": 3.515}), json!({"balance": 95})).await;

        let err = runner(&server).run_combo_bet(&combo_config()).await.unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Assertion { check: "balance unchanged or reduced by stake", .. }
        ));
    }

    #[tokio::test]
    async fn test_combo_bet_total_outside_tolerance() {
        let server = combo_server(json!({"total_odds": 3.6}), json!({"balance": 90})).await;

        let err = runner(&server).run_combo_bet(&combo_config()).await.unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Assertion { check: "combined odds = product of leg odds", .. }
        ));
    }

    #[tokio::test]
    async fn test_combo_bet_uses_calculation_fallback() {
        let server = combo_server(json!({}), json!({"balance": 90})).await;
        mount(&server, "POST", "/combo-bet-calculation", 200, json!({"odd": 3.515})).await;

        let report = runner(&server).run_combo_bet(&combo_config()).await.unwrap();
        assert_eq!(report.total_odds_source, Some(TotalOddsSource::Calculation));
    }

    #[tokio::test]
    async fn test_combo_bet_fails_without_quoting_fixture() {
        let server = MockServer::start().await;
        mount_auth(&server).await;
        mount(&server, "GET", "/auth/get_user_balance", 200, json!({"balance": 100})).await;
        let listing = json!({"items": [{"id": 1}, {"id": 2}]});
        mount(&server, "GET", "/sports/sports-fixtures", 200, listing).await;
        mount(&server, "GET", "/sports/odds", 200, json!({"detail": "no markets"})).await;

        let err = runner(&server).run_combo_bet(&combo_config()).await.unwrap_err();
        assert!(matches!(err, ScenarioError::Unresolved { what: "fixture with odds", .. }));
    }

    fn error_config() -> ErrorFlowConfig {
        ErrorFlowConfig {
            sport_id: "999999".to_string(),
            tournament_id: Some("999999".to_string()),
            stake: dec!(100000000),
        }
    }

    #[tokio::test]
    async fn test_error_flow_passes_on_rejection() {
        let server = MockServer::start().await;
        mount_auth(&server).await;
        mount(&server, "GET", "/sports/sports-fixtures", 200, json!({"items": []})).await;
        mount(&server, "POST", "/place-bet", 402, json!({"detail": "insufficient balance"})).await;

        let report = runner(&server).run_error_flow(&error_config()).await.unwrap();
        assert_eq!(report.fixtures_found, 0);
        assert_eq!(report.rejection_status, 402);
    }

    #[tokio::test]
    async fn test_error_flow_treats_listing_error_as_no_fixtures() {
        let server = MockServer::start().await;
        mount_auth(&server).await;
        let missing = json!({"detail": "unknown sport"});
        mount(&server, "GET", "/sports/sports-fixtures", 404, missing).await;
        mount(&server, "POST", "/place-bet", 422, json!({})).await;

        let report = runner(&server).run_error_flow(&error_config()).await.unwrap();
        assert_eq!(report.rejection_status, 422);
    }

    #[tokio::test]
    async fn test_error_flow_fails_when_bet_accepted() {
        let server = MockServer::start().await;
        mount_auth(&server).await;
        mount(&server, "GET", "/sports/sports-fixtures", 200, json!([])).await;
        mount(&server, "POST", "/place-bet", 200, json!({"betId": "oops"})).await;

        let err = runner(&server).run_error_flow(&error_config()).await.unwrap_err();
        assert!(matches!(err, ScenarioError::Assertion { check: "oversized stake rejected", .. }));
    }

    #[tokio::test]
    async fn test_error_flow_rejects_unexpected_status() {
        let server = MockServer::start().await;
        mount_auth(&server).await;
        mount(&server, "GET", "/sports/sports-fixtures", 200, json!([])).await;
        mount(&server, "POST", "/place-bet", 500, json!({})).await;

        let err = runner(&server).run_error_flow(&error_config()).await.unwrap_err();
        assert!(matches!(err, ScenarioError::Assertion { check: "rejection status", .. }));
    }

    fn temp_config_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("betting-runner-{}-{}", tag, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(ERROR_FLOW_FILE),
            r#"{"sport_id": 999999, "tournament_id": 999999, "stake": 100000000}"#,
        )
        .unwrap();
        dir
    }

    #[tokio::test]
    async fn test_run_reports_pass() {
        let server = MockServer::start().await;
        mount_auth(&server).await;
        mount(&server, "GET", "/sports/sports-fixtures", 200, json!({"items": []})).await;
        mount(&server, "POST", "/place-bet", 403, json!({})).await;

        let dir = temp_config_dir("pass");
        let runner = ScenarioRunner::new(RunnerSettings {
            base_url: server.uri(),
            config_dir: dir.clone(),
            ..RunnerSettings::default()
        });

        let report = runner.run(ScenarioKind::ErrorFlow).await;
        assert!(report.passed, "{:?}", report.error);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["scenario"], "error_flow");
        assert_eq!(json["details"]["rejection_status"], 403);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_run_enforces_scenario_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/generate_token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"token": "tok"}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let dir = temp_config_dir("timeout");
        let runner = ScenarioRunner::new(RunnerSettings {
            base_url: server.uri(),
            scenario_timeout: Duration::from_millis(200),
            config_dir: dir.clone(),
            ..RunnerSettings::default()
        });

        let report = runner.run(ScenarioKind::ErrorFlow).await;
        assert!(!report.passed);
        assert!(report.error.unwrap().contains("timed out"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_run_reports_missing_config() {
        let runner = ScenarioRunner::new(RunnerSettings {
            config_dir: PathBuf::from("/nonexistent-configs"),
            ..RunnerSettings::default()
        });

        let report = runner.run(ScenarioKind::ComboBet).await;
        assert!(!report.passed);
        assert!(report.error.unwrap().contains("combo_bet.json"));
    }
}
