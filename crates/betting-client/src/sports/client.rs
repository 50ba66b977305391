//! Domain client for the betting mock API
//!
//! # Endpoints
//! - POST /auth/generate_token - Create a test session token
//! - GET /auth/get_user_balance - Balance for userId/userKey
//! - GET /sports/sports-fixtures - Fixture listing, optional sportId/tournamentId
//! - GET /sports/odds - Odds for a fixture, optional sportId/market
//! - POST /place-bet - Single bet
//! - POST /add-bet-to-combo - Add one leg to a combination
//! - POST /get-combo-odds - Combined odds for the legs so far
//! - POST /combo-bet-calculation - Coefficient calculation (fallback for combined odds)
//! - POST /place-combo-bet - Combination bet
//!
//! Combination calls take a caller-owned [`ComboBuffer`]; only a successful
//! add-to-combo appends to it.

use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::odds::{normalize_odds_body, resolve_odds, MarketSlug, ResolvedOdds};
use super::search::CandidateSearch;
use crate::error::ClientError;
use crate::http::{ApiResponse, HttpGateway, RequestOptions, Session};
use crate::types::{
    first_nonzero_decimal, fixtures_from_listing, Balance, BetPlacement, ComboBuffer,
    ComboLeg, Fixture, TotalOddsSource, COMBO_BET_FIELDS, COMBO_CALCULATION_TOTAL_FIELDS,
    COMBO_ODDS_TOTAL_FIELDS, SINGLE_BET_FIELDS,
};
use crate::ODDS_FALLBACK_SCAN_CAP;

/// Sport used when a request does not name one
pub const DEFAULT_SPORT_ID: &str = "1";

/// `source` tag sent with single bets
pub const BET_SOURCE: &str = "chatbet";

/// Odds lookup result
#[derive(Clone, Debug)]
pub struct OddsLookup {
    /// Fixture whose odds were returned (differs from the requested one after a fallback)
    pub fixture_id: String,
    pub slug: MarketSlug,
    pub resolved: Option<ResolvedOdds>,
    /// Normalized body: exposes `odds: [{value}]` when resolved, raw otherwise
    pub body: Value,
}

impl OddsLookup {
    fn new(fixture_id: &str, slug: MarketSlug, body: Value) -> Self {
        let resolved = resolve_odds(&body, &slug);
        let body = normalize_odds_body(body, resolved.as_ref());
        Self { fixture_id: fixture_id.to_string(), slug, resolved, body }
    }

    /// Resolved quote, if any shape matched
    pub fn odd(&self) -> Option<Decimal> {
        self.resolved.as_ref().map(|r| r.value)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

/// Single bet request
#[derive(Clone, Debug)]
pub struct PlaceBetRequest {
    pub fixture_id: String,
    pub market: String,
    pub stake: Decimal,
    pub sport_id: Option<String>,
    pub tournament_id: Option<String>,
    /// Looked up before sending when None
    pub odd: Option<Decimal>,
}

impl PlaceBetRequest {
    pub fn new(fixture_id: impl Into<String>, market: impl Into<String>, stake: Decimal) -> Self {
        Self {
            fixture_id: fixture_id.into(),
            market: market.into(),
            stake,
            sport_id: None,
            tournament_id: None,
            odd: None,
        }
    }

    pub fn sport_id(mut self, sport_id: Option<String>) -> Self {
        self.sport_id = sport_id;
        self
    }

    pub fn tournament_id(mut self, tournament_id: Option<String>) -> Self {
        self.tournament_id = tournament_id;
        self
    }

    pub fn odd(mut self, odd: Decimal) -> Self {
        self.odd = Some(odd);
        self
    }
}

/// Combination leg request
#[derive(Clone, Debug)]
pub struct LegRequest {
    pub fixture_id: String,
    pub market: String,
    pub sport_id: Option<String>,
    pub tournament_id: Option<String>,
    /// Re-resolved at submission time when None
    pub odd: Option<Decimal>,
}

impl LegRequest {
    pub fn new(fixture_id: impl Into<String>, market: impl Into<String>) -> Self {
        Self {
            fixture_id: fixture_id.into(),
            market: market.into(),
            sport_id: None,
            tournament_id: None,
            odd: None,
        }
    }

    pub fn sport_id(mut self, sport_id: Option<String>) -> Self {
        self.sport_id = sport_id;
        self
    }

    pub fn tournament_id(mut self, tournament_id: Option<String>) -> Self {
        self.tournament_id = tournament_id;
        self
    }
}

/// Response of POST /place-bet or POST /place-combo-bet
#[derive(Clone, Debug)]
pub struct BetResponse {
    pub status: u16,
    pub ok: bool,
    pub placement: BetPlacement,
    pub body: Value,
}

impl BetResponse {
    fn from_api(resp: ApiResponse, placement: BetPlacement) -> Self {
        Self { status: resp.status, ok: resp.ok, placement, body: resp.body }
    }
}

/// Response of POST /add-bet-to-combo
#[derive(Clone, Debug)]
pub struct AddLegResponse {
    pub status: u16,
    pub ok: bool,
    /// Leg appended to the buffer (only on success)
    pub leg: Option<ComboLeg>,
    pub body: Value,
}

/// Combined odds for the buffered legs
#[derive(Clone, Debug)]
pub struct ComboOddsResponse {
    pub status: u16,
    pub ok: bool,
    pub total_odds: Option<Decimal>,
    pub source: Option<TotalOddsSource>,
    pub body: Value,
}

/// Betting API client. Owns one gateway, hence one HTTP client.
pub struct BettingClient {
    gateway: HttpGateway,
}

impl BettingClient {
    /// Create a client for the public mock service
    pub fn new() -> Self {
        Self::with_gateway(HttpGateway::new())
    }

    /// Create a client with custom base URL
    pub fn with_base_url(base_url: &str) -> Self {
        Self::with_gateway(HttpGateway::with_base_url(base_url))
    }

    pub fn with_gateway(gateway: HttpGateway) -> Self {
        Self { gateway }
    }

    /// POST /auth/generate_token
    pub async fn authenticate(&self) -> Result<Session, ClientError> {
        let resp = self.gateway.post("/auth/generate_token", RequestOptions::new()).await?;
        if !resp.ok {
            return Err(ClientError::AuthFailed { status: resp.status });
        }

        let session = Session::from_token_body(&resp.body)
            .ok_or(ClientError::AuthFailed { status: resp.status })?;
        info!("Authenticated: {:?}", session);
        Ok(session)
    }

    /// GET /auth/get_user_balance?userId={id}&userKey={key}
    pub async fn get_balance(&self, session: &Session) -> Result<Balance, ClientError> {
        let opts = RequestOptions::new()
            .headers(session.headers())
            .query("userId", &session.user_id)
            .query("userKey", &session.user_key);

        let resp = self.gateway.get("/auth/get_user_balance", opts).await?;
        if !resp.ok {
            return Err(ClientError::EndpointFailed {
                endpoint: "get_balance",
                status: resp.status,
            });
        }

        let balance = Balance::from_body(&resp.body);
        debug!("Balance: {:?}", balance.balance);
        Ok(balance)
    }

    /// GET /sports/sports-fixtures?sportId={sport}&tournamentId={tournament}
    pub async fn find_fixtures(
        &self,
        sport_id: Option<&str>,
        tournament_id: Option<&str>,
    ) -> Result<Vec<Fixture>, ClientError> {
        let resp = self.fixture_listing(sport_id, tournament_id).await?;
        if !resp.ok {
            return Err(ClientError::EndpointFailed {
                endpoint: "find_fixtures",
                status: resp.status,
            });
        }

        let fixtures = fixtures_from_listing(&resp.body);
        debug!("Fixtures for sport {:?}: {}", sport_id, fixtures.len());
        Ok(fixtures)
    }

    async fn fixture_listing(
        &self,
        sport_id: Option<&str>,
        tournament_id: Option<&str>,
    ) -> Result<ApiResponse, ClientError> {
        let opts = RequestOptions::new()
            .query_opt("sportId", sport_id)
            .query_opt("tournamentId", tournament_id);
        self.gateway.get("/sports/sports-fixtures", opts).await
    }

    /// GET /sports/odds?fixtureId={id}&sportId={sport}&market={market}
    ///
    /// Odds for exactly this fixture, no fallback search.
    pub async fn lookup_odds(
        &self,
        fixture_id: &str,
        market: &str,
        sport_id: Option<&str>,
    ) -> Result<OddsLookup, ClientError> {
        let opts = RequestOptions::new()
            .query("fixtureId", fixture_id)
            .query_opt("sportId", sport_id)
            .query_opt("market", Some(market));

        let resp = self.gateway.get("/sports/odds", opts).await?;
        if !resp.ok {
            return Err(ClientError::EndpointFailed { endpoint: "get_odds", status: resp.status });
        }

        Ok(OddsLookup::new(fixture_id, MarketSlug::normalize(market), resp.body))
    }

    /// Odds for a fixture/market, falling back to the first listed fixture
    /// (up to [`ODDS_FALLBACK_SCAN_CAP`]) that has odds.
    ///
    /// When nothing resolves, the first lookup is returned unresolved.
    pub async fn get_odds(
        &self,
        fixture_id: &str,
        market: &str,
        sport_id: Option<&str>,
    ) -> Result<OddsLookup, ClientError> {
        let lookup = self.lookup_odds(fixture_id, market, sport_id).await?;
        if lookup.is_resolved() {
            return Ok(lookup);
        }

        debug!("No odds for fixture {} market {}, scanning fixtures", fixture_id, lookup.slug);
        match self.search_fixture_odds(&lookup.slug, sport_id).await {
            Some(found) => {
                info!(
                    "Using odds from fixture {} instead of {} for market {}",
                    found.fixture_id, fixture_id, found.slug
                );
                Ok(found)
            }
            None => Ok(lookup),
        }
    }

    /// Scan listed fixtures for the first whose odds body matches any known shape.
    /// Probe failures skip the fixture.
    async fn search_fixture_odds(
        &self,
        slug: &MarketSlug,
        sport_id: Option<&str>,
    ) -> Option<OddsLookup> {
        let listing = match self.fixture_listing(sport_id, None).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Fixture listing failed during odds fallback: {}", e);
                return None;
            }
        };
        let fixtures = fixtures_from_listing(&listing.body);

        let outcome = CandidateSearch::new(ODDS_FALLBACK_SCAN_CAP)
            .first_match(fixtures, |fixture: Fixture| async move {
                let opts = RequestOptions::new().query("fixtureId", &fixture.id);
                match self.gateway.get("/sports/odds", opts).await {
                    Ok(resp) => {
                        let lookup = OddsLookup::new(&fixture.id, slug.clone(), resp.body);
                        lookup.is_resolved().then_some(lookup)
                    }
                    Err(e) => {
                        debug!("Skipping fixture {}: {}", fixture.id, e);
                        None
                    }
                }
            })
            .await;

        debug!("Odds fallback probed {} fixture(s)", outcome.probed);
        outcome.found
    }

    /// POST /place-bet
    ///
    /// Non-success statuses are returned, not raised.
    pub async fn place_bet(
        &self,
        session: &Session,
        req: &PlaceBetRequest,
    ) -> Result<BetResponse, ClientError> {
        let odd = match req.odd {
            Some(odd) => Some(odd),
            None => {
                let sport_id = req.sport_id.as_deref();
                match self.get_odds(&req.fixture_id, &req.market, sport_id).await {
                    Ok(lookup) => lookup.odd(),
                    Err(e) => {
                        // the server validates the missing odd
                        debug!("Odds lookup before place_bet failed: {}", e);
                        None
                    }
                }
            }
        };

        let body = json!({
            "user": session.user_json(),
            "betInfo": {
                "amount": req.stake.to_string(),
                "source": BET_SOURCE,
                "betId": [{
                    "betId": ComboLeg::bet_id_for(&req.fixture_id, &req.market),
                    "fixtureId": req.fixture_id,
                    "sportId": req.sport_id.as_deref().unwrap_or(DEFAULT_SPORT_ID),
                    "tournamentId": req.tournament_id.as_deref().unwrap_or_default(),
                    "odd": odd.map(|o| o.to_string()),
                }]
            }
        });

        let opts = RequestOptions::new().headers(session.headers()).json(body);
        let resp = self.gateway.post("/place-bet", opts).await?;
        let placement = BetPlacement::from_body(&resp.body, &SINGLE_BET_FIELDS);

        info!("place_bet fixture={} stake={} -> HTTP {}", req.fixture_id, req.stake, resp.status);
        Ok(BetResponse::from_api(resp, placement))
    }

    /// POST /add-bet-to-combo
    ///
    /// The leg's odd is resolved again at submission time unless given. A leg
    /// whose odd cannot be resolved is not sent. On success the leg is
    /// appended to `buffer`.
    pub async fn add_to_combo(
        &self,
        session: &Session,
        buffer: &mut ComboBuffer,
        req: &LegRequest,
    ) -> Result<AddLegResponse, ClientError> {
        let (fixture_id, odd) = match req.odd {
            Some(odd) => (req.fixture_id.clone(), odd),
            None => self.resolve_leg_odds(req).await?,
        };

        let leg = ComboLeg {
            bet_id: ComboLeg::bet_id_for(&fixture_id, &req.market),
            fixture_id,
            odd,
            sport_id: req.sport_id.clone().unwrap_or_else(|| DEFAULT_SPORT_ID.to_string()),
            tournament_id: req.tournament_id.clone().unwrap_or_default(),
        };

        let body = json!({ "betInfo": leg, "betsAdded": [] });
        let opts = RequestOptions::new().headers(session.headers()).json(body);
        let resp = self.gateway.post("/add-bet-to-combo", opts).await?;

        info!("add_to_combo {} odd={} -> HTTP {}", leg.bet_id, leg.odd, resp.status);

        let leg = if resp.ok {
            buffer.push(leg.clone());
            Some(leg)
        } else {
            None
        };

        Ok(AddLegResponse { status: resp.status, ok: resp.ok, leg, body: resp.body })
    }

    async fn resolve_leg_odds(&self, req: &LegRequest) -> Result<(String, Decimal), ClientError> {
        let unavailable = || ClientError::OddsUnavailable {
            fixture_id: req.fixture_id.clone(),
            market: req.market.clone(),
        };

        match self.get_odds(&req.fixture_id, &req.market, req.sport_id.as_deref()).await {
            Ok(lookup) => {
                let odd = lookup.odd().ok_or_else(unavailable)?;
                Ok((lookup.fixture_id, odd))
            }
            Err(e) => {
                warn!(
                    "Odds lookup for leg {} failed ({}), scanning sport fixtures",
                    req.fixture_id, e
                );
                let fixtures = self.find_fixtures(req.sport_id.as_deref(), None).await?;
                let outcome = CandidateSearch::new(ODDS_FALLBACK_SCAN_CAP)
                    .first_match(fixtures, |fixture: Fixture| async move {
                        let lookup = self
                            .lookup_odds(&fixture.id, &req.market, req.sport_id.as_deref())
                            .await
                            .ok()?;
                        lookup.odd().map(|odd| (fixture.id, odd))
                    })
                    .await;
                outcome.found.ok_or_else(unavailable)
            }
        }
    }

    /// POST /get-combo-odds, falling back to POST /combo-bet-calculation
    /// when the response carries no total.
    pub async fn get_combo_odds(
        &self,
        session: &Session,
        buffer: &ComboBuffer,
    ) -> Result<ComboOddsResponse, ClientError> {
        let body = match buffer.fixture_ref() {
            Some(fixture) => json!({ "betInfo": buffer.legs(), "fixture": fixture }),
            None => json!({}),
        };

        let opts = RequestOptions::new().headers(session.headers()).json(body);
        let resp = self.gateway.post("/get-combo-odds", opts).await?;

        let mut total_odds =
            first_nonzero_decimal(&resp.body, COMBO_ODDS_TOTAL_FIELDS);
        let mut source = total_odds.map(|_| TotalOddsSource::ComboOdds);

        if total_odds.is_none() && !buffer.is_empty() {
            debug!("get-combo-odds returned no total, trying combo-bet-calculation");
            total_odds = self.calculate_combo_odds(session, buffer).await;
            source = total_odds.map(|_| TotalOddsSource::Calculation);
        }

        info!("Combo odds for {} leg(s): {:?} ({:?})", buffer.len(), total_odds, source);
        Ok(ComboOddsResponse {
            status: resp.status,
            ok: resp.ok,
            total_odds,
            source,
            body: resp.body,
        })
    }

    async fn calculate_combo_odds(
        &self,
        session: &Session,
        buffer: &ComboBuffer,
    ) -> Option<Decimal> {
        let body = json!({ "betsInfo": buffer.legs(), "amount": 1 });
        let opts = RequestOptions::new().headers(session.headers()).json(body);

        match self.gateway.post("/combo-bet-calculation", opts).await {
            Ok(resp) => first_nonzero_decimal(&resp.body, COMBO_CALCULATION_TOTAL_FIELDS),
            Err(e) => {
                warn!("combo-bet-calculation fallback failed: {}", e);
                None
            }
        }
    }

    /// POST /place-combo-bet with the buffered legs
    pub async fn place_combo_bet(
        &self,
        session: &Session,
        buffer: &ComboBuffer,
        stake: Decimal,
    ) -> Result<BetResponse, ClientError> {
        let body = json!({
            "betsInfo": buffer.legs(),
            "amount": decimal_to_json_number(stake),
            "user": session.user_json(),
        });

        let opts = RequestOptions::new().headers(session.headers()).json(body);
        let resp = self.gateway.post("/place-combo-bet", opts).await?;
        let placement = BetPlacement::from_body(&resp.body, &COMBO_BET_FIELDS);

        info!("place_combo_bet legs={} stake={} -> HTTP {}", buffer.len(), stake, resp.status);
        Ok(BetResponse::from_api(resp, placement))
    }
}

impl Default for BettingClient {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON number with the decimal's textual value (string if not representable)
fn decimal_to_json_number(value: Decimal) -> Value {
    value
        .normalize()
        .to_string()
        .parse::<serde_json::Number>()
        .map(Value::Number)
        .unwrap_or_else(|_| Value::String(value.to_string()))
}
