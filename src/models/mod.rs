use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::utils::teams::TeamInfo;
use crate::utils::time_window::TimeWindow;
use crate::utils::tip_selector::TipSelection;

/// A league scanned for fixtures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u16>,
}

impl League {
    pub fn new(id: u32, name: &str, country: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            country: Some(country.to_string()),
            season: None,
        }
    }
}

/// The leagues scanned when no config file overrides them, in scan order
pub fn default_leagues() -> Vec<League> {
    vec![
        League::new(39, "Premier League", "England"),
        League::new(140, "La Liga", "Spain"),
        League::new(78, "Bundesliga", "Germany"),
        League::new(135, "Serie A", "Italy"),
        League::new(61, "Ligue 1", "France"),
        League::new(88, "Eredivisie", "Netherlands"),
        League::new(94, "Primeira Liga", "Portugal"),
        League::new(40, "Championship", "England"),
    ]
}

/// A scheduled match as returned by the fixtures endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub id: u64,
    pub home_team: String,
    pub away_team: String,
    pub kickoff: DateTime<Utc>,
    pub venue: String,
    pub status: String,
}

/// One outcome of a bet with its raw odd string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeOdds {
    pub label: String,
    pub odd: String,
}

/// A named betting market offered by a bookmaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetOdds {
    pub name: String,
    pub values: Vec<OutcomeOdds>,
}

/// Odds offered by a single bookmaker for one fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmakerOdds {
    pub bookmaker: String,
    pub bets: Vec<BetOdds>,
}

impl BookmakerOdds {
    pub fn bet(&self, name: &str) -> Option<&BetOdds> {
        self.bets.iter().find(|b| b.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureDetails {
    pub date: DateTime<Utc>,
    pub venue: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teams {
    pub home: String,
    pub away: String,
}

/// A tip for one fixture, the unit returned by `/tippek` and written by the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TipRecord {
    pub fixture_id: u64,
    pub league: League,
    pub fixture: FixtureDetails,
    pub teams: Teams,
    pub time_window: TimeWindow,
    #[serde(flatten)]
    pub selection: TipSelection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_team_info: Option<TeamInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_team_info: Option<TeamInfo>,
}

impl TipRecord {
    /// Format the tip as a readable string
    pub fn format(&self) -> String {
        let odds = match self.selection.odds {
            Some(odds) => format!("{:.2}", odds),
            None => "-".to_string(),
        };
        format!(
            "[{}] {} | {} vs {} | {} | Tip: {} @ {}{}",
            self.time_window,
            self.league.name,
            self.teams.home,
            self.teams.away,
            self.fixture.date.format("%Y-%m-%d %H:%M UTC"),
            self.selection.tipp_text,
            odds,
            self.selection
                .bookmaker
                .as_ref()
                .map(|b| format!(" ({})", b))
                .unwrap_or_default()
        )
    }

    /// Outcome label to odds map of the winning bet, in label order
    pub fn market(&self) -> &BTreeMap<String, f64> {
        &self.selection.market
    }
}
