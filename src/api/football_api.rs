use crate::api::FootballDataSource;
use crate::config::{Config, DEFAULT_API_BASE};
use crate::models::{BetOdds, BookmakerOdds, Fixture, League, OutcomeOdds};
use crate::utils::rate_limiter::RateLimiter;
use crate::utils::retry::{retry, RetryConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "x-apisports-key";

/// `{ "response": [...] }` envelope used by every endpoint
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    #[serde(default = "Vec::new")]
    response: Vec<T>,
    #[serde(default)]
    errors: serde_json::Value,
}

/// One entry of the fixtures endpoint
#[derive(Debug, Deserialize)]
struct ApiFixtureItem {
    fixture: ApiFixture,
    teams: ApiTeams,
}

#[derive(Debug, Deserialize)]
struct ApiFixture {
    id: u64,
    date: String,
    #[serde(default)]
    venue: Option<ApiVenue>,
    #[serde(default)]
    status: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
struct ApiVenue {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    long: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiTeams {
    home: ApiTeam,
    away: ApiTeam,
}

#[derive(Debug, Deserialize)]
struct ApiTeam {
    name: String,
}

/// One entry of the odds endpoint
#[derive(Debug, Deserialize)]
struct ApiOddsItem {
    #[serde(default)]
    bookmakers: Vec<ApiBookmaker>,
}

#[derive(Debug, Deserialize)]
struct ApiBookmaker {
    name: String,
    #[serde(default)]
    bets: Vec<ApiBet>,
}

#[derive(Debug, Deserialize)]
struct ApiBet {
    name: String,
    #[serde(default)]
    values: Vec<ApiBetValue>,
}

/// Labels and odds are usually strings but occasionally numbers
#[derive(Debug, Deserialize)]
struct ApiBetValue {
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    odd: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
#[error("Football API returned error: {0}")]
struct UpstreamStatus(StatusCode);

fn json_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn has_errors(errors: &serde_json::Value) -> bool {
    match errors {
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
        serde_json::Value::Null => false,
        _ => true,
    }
}

/// Transport failures, rate limiting and server errors are worth retrying
fn is_transient(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        if let Some(status) = cause.downcast_ref::<UpstreamStatus>() {
            return status.0 == StatusCode::TOO_MANY_REQUESTS || status.0.is_server_error();
        }
        if let Some(e) = cause.downcast_ref::<reqwest::Error>() {
            return e.is_timeout() || e.is_connect() || e.is_request();
        }
        false
    })
}

fn into_fixture(item: ApiFixtureItem) -> Option<Fixture> {
    let kickoff = match DateTime::parse_from_rfc3339(&item.fixture.date) {
        Ok(kickoff) => kickoff.with_timezone(&Utc),
        Err(e) => {
            warn!(
                "Skipping fixture {}: unparseable kickoff '{}': {}",
                item.fixture.id, item.fixture.date, e
            );
            return None;
        }
    };

    Some(Fixture {
        id: item.fixture.id,
        home_team: item.teams.home.name,
        away_team: item.teams.away.name,
        kickoff,
        venue: item
            .fixture
            .venue
            .and_then(|v| v.name)
            .unwrap_or_else(|| "Unknown".to_string()),
        status: item
            .fixture
            .status
            .and_then(|s| s.long)
            .unwrap_or_else(|| "Scheduled".to_string()),
    })
}

fn into_bookmaker_odds(items: Vec<ApiOddsItem>) -> Vec<BookmakerOdds> {
    items
        .into_iter()
        .flat_map(|item| item.bookmakers)
        .map(|bookmaker| BookmakerOdds {
            bookmaker: bookmaker.name,
            bets: bookmaker
                .bets
                .into_iter()
                .map(|bet| BetOdds {
                    name: bet.name,
                    values: bet
                        .values
                        .iter()
                        .filter_map(|v| {
                            Some(OutcomeOdds {
                                label: json_text(&v.value)?,
                                odd: json_text(&v.odd).unwrap_or_default(),
                            })
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

/// Client for the API-Football v3 REST API
pub struct FootballApiClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    limiter: RateLimiter,
    retry: RetryConfig,
}

impl FootballApiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_API_BASE.to_string(),
            client: reqwest::Client::new(),
            limiter: RateLimiter::new(Duration::from_millis(300)),
            retry: RetryConfig::default(),
        }
    }

    /// Build a client from the loaded configuration; fails without an API key
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key,
            base_url: config.api_base_url.clone(),
            client,
            limiter: RateLimiter::new(config.rate_limit),
            retry: RetryConfig::with_max_retries(config.max_retries),
        })
    }

    async fn get_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<Vec<T>> {
        let url = format!("{}{}", self.base_url, path);
        let url = &url;
        let this = self;

        retry(&self.retry, what, is_transient, move || async move {
            this.limiter.acquire().await;
            let response = this
                .client
                .get(url)
                .header(API_KEY_HEADER, &this.api_key)
                .query(query)
                .send()
                .await
                .with_context(|| format!("Failed to send request for {}", what))?;

            let status = response.status();
            if !status.is_success() {
                return Err(UpstreamStatus(status).into());
            }

            let envelope: ApiEnvelope<T> = response
                .json()
                .await
                .with_context(|| format!("Failed to parse response for {}", what))?;
            if has_errors(&envelope.errors) {
                warn!("Football API reported errors for {}: {}", what, envelope.errors);
            }
            Ok::<_, anyhow::Error>(envelope.response)
        })
        .await
    }

    /// Fetch the fixtures of one league on one day
    pub async fn try_fetch_fixtures(&self, league: &League, date: NaiveDate) -> Result<Vec<Fixture>> {
        let mut query = vec![
            ("league", league.id.to_string()),
            ("date", date.format("%Y-%m-%d").to_string()),
        ];
        if let Some(season) = league.season {
            query.push(("season", season.to_string()));
        }

        let what = format!("fixtures of {} ({})", league.name, league.id);
        let items: Vec<ApiFixtureItem> = self.get_envelope("/fixtures", &query, &what).await?;
        debug!("{} fixtures for {} on {}", items.len(), league.name, date);

        Ok(items.into_iter().filter_map(into_fixture).collect())
    }

    /// Fetch every bookmaker's odds for one fixture
    pub async fn try_fetch_odds(&self, fixture_id: u64) -> Result<Vec<BookmakerOdds>> {
        let query = [("fixture", fixture_id.to_string())];
        let what = format!("odds of fixture {}", fixture_id);
        let items: Vec<ApiOddsItem> = self.get_envelope("/odds", &query, &what).await?;

        Ok(into_bookmaker_odds(items))
    }

    /// Check how many API requests you have remaining today
    pub async fn check_usage(&self) -> Result<()> {
        let url = format!("{}/status", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .context("Failed to fetch API status")?;

        if let Some(remaining) = response.headers().get("x-ratelimit-requests-remaining") {
            println!("API requests remaining today: {:?}", remaining);
        }

        if let Some(limit) = response.headers().get("x-ratelimit-requests-limit") {
            println!("API daily request limit: {:?}", limit);
        }

        Ok(())
    }
}

#[async_trait]
impl FootballDataSource for FootballApiClient {
    async fn fetch_fixtures(&self, league: &League, date: NaiveDate) -> Vec<Fixture> {
        match self.try_fetch_fixtures(league, date).await {
            Ok(fixtures) => fixtures,
            Err(e) => {
                warn!("Error fetching fixtures for league {}: {:#}", league.id, e);
                Vec::new()
            }
        }
    }

    async fn fetch_odds(&self, fixture_id: u64) -> Vec<BookmakerOdds> {
        match self.try_fetch_odds(fixture_id).await {
            Ok(odds) => odds,
            Err(e) => {
                warn!("Error fetching odds for fixture {}: {:#}", fixture_id, e);
                Vec::new()
            }
        }
    }
}
