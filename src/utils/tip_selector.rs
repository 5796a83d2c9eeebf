use crate::models::{BetOdds, BookmakerOdds};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const NO_ODDS_TEXT: &str = "No odds available";

/// Betting markets the selector knows how to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetType {
    #[serde(rename = "Match Winner")]
    MatchWinner,
    #[serde(rename = "Double Chance")]
    DoubleChance,
    #[serde(rename = "Over/Under 2.5")]
    OverUnder25,
    #[serde(rename = "Both Teams Score")]
    BothTeamsScore,
}

impl BetType {
    pub const DEFAULT_PRIORITY: [BetType; 4] = [
        BetType::MatchWinner,
        BetType::DoubleChance,
        BetType::OverUnder25,
        BetType::BothTeamsScore,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BetType::MatchWinner => "Match Winner",
            BetType::DoubleChance => "Double Chance",
            BetType::OverUnder25 => "Over/Under 2.5",
            BetType::BothTeamsScore => "Both Teams Score",
        }
    }

    /// Name of the bet in the odds endpoint response
    pub fn upstream_name(&self) -> &'static str {
        match self {
            BetType::OverUnder25 => "Goals Over/Under",
            other => other.name(),
        }
    }

    /// Scoreable outcomes of one bookmaker's bet, or `None` when the bet
    /// does not have the shape this market requires.
    fn outcomes(&self, bet: &BetOdds) -> Option<Vec<(String, f64)>> {
        let odd_of = |label: &str| {
            bet.values
                .iter()
                .find(|v| v.label == label)
                .and_then(|v| parse_odd(&v.odd))
        };
        let all_of = |labels: &[&str]| {
            labels
                .iter()
                .map(|label| odd_of(*label).map(|odd| (label.to_string(), odd)))
                .collect::<Option<Vec<_>>>()
        };

        match self {
            BetType::MatchWinner => {
                if bet.values.len() != 3 {
                    return None;
                }
                all_of(&["Home", "Draw", "Away"])
            }
            BetType::DoubleChance => {
                let outcomes: Vec<(String, f64)> = bet
                    .values
                    .iter()
                    .filter_map(|v| parse_odd(&v.odd).map(|odd| (v.label.clone(), odd)))
                    .collect();
                (!outcomes.is_empty()).then_some(outcomes)
            }
            BetType::OverUnder25 => all_of(&["Over 2.5", "Under 2.5"]),
            BetType::BothTeamsScore => all_of(&["Yes", "No"]),
        }
    }

    fn tipp_text(&self, label: &str) -> String {
        match self {
            BetType::DoubleChance => format!("Double Chance: {}", label),
            BetType::BothTeamsScore => format!("BTTS {}", label),
            _ => label.to_string(),
        }
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "match winner" | "match-winner" => Ok(BetType::MatchWinner),
            "double chance" | "double-chance" => Ok(BetType::DoubleChance),
            "over/under 2.5" | "goals over/under" | "over-under-2.5" => Ok(BetType::OverUnder25),
            "both teams score" | "both teams to score" | "both-teams-score" | "btts" => {
                Ok(BetType::BothTeamsScore)
            }
            _ => Err(format!("unknown bet type '{}'", s.trim())),
        }
    }
}

/// How the lowest odds are chosen across the prioritized bet types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// Lowest odds over every requested bet type; first seen wins ties
    #[default]
    GlobalMinimum,
    /// Lowest odds within the first bet type that has any valid odds
    FirstAvailable,
}

impl FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global-minimum" | "global" => Ok(SelectionPolicy::GlobalMinimum),
            "first-available" | "priority" => Ok(SelectionPolicy::FirstAvailable),
            other => Err(format!(
                "expected 'global-minimum' or 'first-available', got '{}'",
                other
            )),
        }
    }
}

/// The outcome picked for a fixture. All of `tip`, `odds` and `bet_type`
/// are `None` when no requested bet had parseable odds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TipSelection {
    pub tip: Option<String>,
    pub tipp_text: String,
    pub odds: Option<f64>,
    pub bet_type: Option<BetType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmaker: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub market: BTreeMap<String, f64>,
}

impl TipSelection {
    pub fn none() -> Self {
        Self {
            tip: None,
            tipp_text: NO_ODDS_TEXT.to_string(),
            odds: None,
            bet_type: None,
            bookmaker: None,
            market: BTreeMap::new(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.tip.is_none()
    }
}

struct Best<'a> {
    bet_type: BetType,
    bookmaker: &'a str,
    label: String,
    odds: f64,
    market: Vec<(String, f64)>,
}

/// Parse a decimal odd; blanks, non-numbers and non-positive values are rejected
pub fn parse_odd(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|odd| odd.is_finite() && *odd > 0.0)
}

fn scan_bet_type<'a>(odds: &'a [BookmakerOdds], bet_type: BetType, best: &mut Option<Best<'a>>) {
    for bookmaker in odds {
        let Some(bet) = bookmaker.bet(bet_type.upstream_name()) else {
            continue;
        };
        let Some(outcomes) = bet_type.outcomes(bet) else {
            continue;
        };
        for (label, odd) in &outcomes {
            if best.as_ref().map_or(true, |b| *odd < b.odds) {
                *best = Some(Best {
                    bet_type,
                    bookmaker: &bookmaker.bookmaker,
                    label: label.clone(),
                    odds: *odd,
                    market: outcomes.clone(),
                });
            }
        }
    }
}

/// Pick the lowest-odds outcome for one fixture
pub fn select_tip(
    odds: &[BookmakerOdds],
    bet_types: &[BetType],
    policy: SelectionPolicy,
) -> TipSelection {
    let best = match policy {
        SelectionPolicy::GlobalMinimum => {
            let mut best = None;
            for bet_type in bet_types {
                scan_bet_type(odds, *bet_type, &mut best);
            }
            best
        }
        SelectionPolicy::FirstAvailable => bet_types.iter().find_map(|bet_type| {
            let mut best = None;
            scan_bet_type(odds, *bet_type, &mut best);
            best
        }),
    };

    match best {
        Some(best) => TipSelection {
            tipp_text: best.bet_type.tipp_text(&best.label),
            tip: Some(best.label),
            odds: Some(best.odds),
            bet_type: Some(best.bet_type),
            bookmaker: Some(best.bookmaker.to_string()),
            market: best.market.into_iter().collect(),
        },
        None => TipSelection::none(),
    }
}
