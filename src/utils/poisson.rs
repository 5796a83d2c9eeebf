use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Highest goal count per side summed over when predicting
pub const DEFAULT_MAX_GOALS: u32 = 10;
/// Share of the full Kelly fraction suggested as a stake
pub const KELLY_SCALE: f64 = 0.25;

const MIN_STRENGTH: f64 = 0.2;
const MIN_LAMBDA: f64 = 0.01;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("no match results to train the model on")]
    NoMatches,
}

/// A finished match with its full-time score
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Home, Outcome::Draw, Outcome::Away];

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Home => "home",
            Outcome::Draw => "draw",
            Outcome::Away => "away",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeProbs {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
}

impl OutcomeProbs {
    pub fn of(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Home => self.home_win,
            Outcome::Draw => self.draw,
            Outcome::Away => self.away_win,
        }
    }
}

/// Decimal odds for the three match-winner outcomes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThreeWayOdds {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl ThreeWayOdds {
    pub fn of(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Home => self.home,
            Outcome::Draw => self.draw,
            Outcome::Away => self.away,
        }
    }
}

/// Attack and defence ratings relative to the league average
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamStrength {
    pub attack_home: f64,
    pub defense_home: f64,
    pub attack_away: f64,
    pub defense_away: f64,
}

impl Default for TeamStrength {
    fn default() -> Self {
        Self {
            attack_home: 1.0,
            defense_home: 1.0,
            attack_away: 1.0,
            defense_away: 1.0,
        }
    }
}

#[derive(Debug, Default)]
struct GoalTally {
    home_for: u32,
    home_against: u32,
    home_games: u32,
    away_for: u32,
    away_against: u32,
    away_games: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub probs: OutcomeProbs,
    pub lambda_home: f64,
    pub lambda_away: f64,
}

/// Independent-Poisson goal model trained on past results
#[derive(Debug, Clone)]
pub struct PoissonModel {
    pub league_avg_home: f64,
    pub league_avg_away: f64,
    pub max_goals: u32,
    teams: HashMap<String, TeamStrength>,
}

impl PoissonModel {
    pub fn train(matches: &[MatchResult]) -> Result<Self, ModelError> {
        Self::train_with_max_goals(matches, DEFAULT_MAX_GOALS)
    }

    pub fn train_with_max_goals(matches: &[MatchResult], max_goals: u32) -> Result<Self, ModelError> {
        if matches.is_empty() {
            return Err(ModelError::NoMatches);
        }

        let games = matches.len() as f64;
        let league_avg_home = matches.iter().map(|m| m.home_goals as f64).sum::<f64>() / games;
        let league_avg_away = matches.iter().map(|m| m.away_goals as f64).sum::<f64>() / games;

        let mut tallies: HashMap<&str, GoalTally> = HashMap::new();
        for m in matches {
            let home = tallies.entry(m.home_team.as_str()).or_default();
            home.home_for += m.home_goals;
            home.home_against += m.away_goals;
            home.home_games += 1;

            let away = tallies.entry(m.away_team.as_str()).or_default();
            away.away_for += m.away_goals;
            away.away_against += m.home_goals;
            away.away_games += 1;
        }

        // A league without goals on one side still divides by one
        let home_norm = if league_avg_home > 0.0 { league_avg_home } else { 1.0 };
        let away_norm = if league_avg_away > 0.0 { league_avg_away } else { 1.0 };
        let average = |goals: u32, games: u32, fallback: f64| {
            if games > 0 {
                goals as f64 / games as f64
            } else {
                fallback
            }
        };

        let teams = tallies
            .into_iter()
            .map(|(team, t)| {
                let strength = TeamStrength {
                    attack_home: (average(t.home_for, t.home_games, league_avg_home) / home_norm).max(MIN_STRENGTH),
                    defense_home: (average(t.home_against, t.home_games, league_avg_away) / away_norm)
                        .max(MIN_STRENGTH),
                    attack_away: (average(t.away_for, t.away_games, league_avg_away) / away_norm).max(MIN_STRENGTH),
                    defense_away: (average(t.away_against, t.away_games, league_avg_home) / home_norm)
                        .max(MIN_STRENGTH),
                };
                (team.to_string(), strength)
            })
            .collect::<HashMap<_, _>>();

        debug!(
            "Trained Poisson model on {} matches, {} teams (avg {:.2}-{:.2})",
            matches.len(),
            teams.len(),
            league_avg_home,
            league_avg_away
        );

        Ok(Self {
            league_avg_home,
            league_avg_away,
            max_goals,
            teams,
        })
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub fn knows(&self, team: &str) -> bool {
        self.teams.contains_key(team)
    }

    /// Ratings of a team, neutral (all 1.0) when it never appeared
    pub fn strength(&self, team: &str) -> TeamStrength {
        self.teams.get(team).copied().unwrap_or_default()
    }

    /// Outcome probabilities for `home` hosting `away`, normalised to sum to one
    pub fn predict(&self, home: &str, away: &str) -> Prediction {
        let home_strength = self.strength(home);
        let away_strength = self.strength(away);

        let lambda_home =
            (self.league_avg_home * home_strength.attack_home * away_strength.defense_away).max(MIN_LAMBDA);
        let lambda_away =
            (self.league_avg_away * away_strength.attack_away * home_strength.defense_home).max(MIN_LAMBDA);

        let (mut home_win, mut draw, mut away_win) = (0.0, 0.0, 0.0);
        for home_goals in 0..=self.max_goals {
            let p_home = poisson_pmf(lambda_home, home_goals);
            for away_goals in 0..=self.max_goals {
                let p = p_home * poisson_pmf(lambda_away, away_goals);
                match home_goals.cmp(&away_goals) {
                    std::cmp::Ordering::Greater => home_win += p,
                    std::cmp::Ordering::Equal => draw += p,
                    std::cmp::Ordering::Less => away_win += p,
                }
            }
        }

        let total = home_win + draw + away_win;
        let total = if total > 0.0 { total } else { 1.0 };

        Prediction {
            probs: OutcomeProbs {
                home_win: home_win / total,
                draw: draw / total,
                away_win: away_win / total,
            },
            lambda_home,
            lambda_away,
        }
    }
}

/// P(X = k) for X ~ Poisson(lambda), computed in log space
pub fn poisson_pmf(lambda: f64, k: u32) -> f64 {
    if lambda <= 0.0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    let log_factorial: f64 = (2..=k).map(|i| (i as f64).ln()).sum();
    (-lambda + k as f64 * lambda.ln() - log_factorial).exp()
}

/// Decimal odds with no margin: 1 / p, infinite for an impossible outcome
pub fn fair_odds(probs: &OutcomeProbs) -> ThreeWayOdds {
    let fair = |p: f64| if p > 0.0 { 1.0 / p } else { f64::INFINITY };
    ThreeWayOdds {
        home: fair(probs.home_win),
        draw: fair(probs.draw),
        away: fair(probs.away_win),
    }
}

/// The likeliest outcome; ties go to home, then draw
pub fn most_likely(probs: &OutcomeProbs) -> (Outcome, f64) {
    Outcome::ALL
        .into_iter()
        .map(|o| (o, probs.of(o)))
        .fold((Outcome::Home, probs.home_win), |best, next| {
            if next.1 > best.1 {
                next
            } else {
                best
            }
        })
}

/// Kelly criterion stake as a fraction of bankroll, never negative.
/// f = (b*p - q) / b where b = odds - 1
pub fn kelly(prob: f64, odds: f64) -> f64 {
    let b = odds - 1.0;
    if b <= 0.0 || b.is_nan() {
        return 0.0;
    }
    let p = prob.clamp(0.0, 1.0);
    let q = 1.0 - p;
    ((b * p - q) / b).max(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stake {
    pub selection: Outcome,
    pub prob: f64,
    pub odds: f64,
    pub fraction: f64,
}

/// Quarter-Kelly stakes on every outcome the market underprices, largest first
pub fn quarter_kelly_stakes(probs: &OutcomeProbs, market: &ThreeWayOdds) -> Vec<Stake> {
    let mut stakes: Vec<Stake> = Outcome::ALL
        .into_iter()
        .map(|selection| {
            let prob = probs.of(selection);
            let odds = market.of(selection);
            Stake {
                selection,
                prob,
                odds,
                fraction: kelly(prob, odds) * KELLY_SCALE,
            }
        })
        .filter(|s| s.fraction > 0.0)
        .collect();
    stakes.sort_by(|a, b| b.fraction.total_cmp(&a.fraction));
    stakes
}

/// Everything the model says about one fixture
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub home_team: String,
    pub away_team: String,
    pub probs: OutcomeProbs,
    pub fair_odds: ThreeWayOdds,
    pub tip: Outcome,
    pub tip_prob: f64,
    pub lambda_home: f64,
    pub lambda_away: f64,
    pub stakes: Vec<Stake>,
}

impl Forecast {
    pub fn format(&self) -> String {
        format!(
            "{} vs {}: home {:.1}% / draw {:.1}% / away {:.1}% | tip: {} ({:.1}%) | xG {:.2}-{:.2}",
            self.home_team,
            self.away_team,
            self.probs.home_win * 100.0,
            self.probs.draw * 100.0,
            self.probs.away_win * 100.0,
            self.tip.label(),
            self.tip_prob * 100.0,
            self.lambda_home,
            self.lambda_away
        )
    }
}

/// Train on `matches`, predict `home` vs `away` and, given market odds,
/// suggest quarter-Kelly stakes
pub fn forecast(
    matches: &[MatchResult],
    home: &str,
    away: &str,
    market: Option<&ThreeWayOdds>,
) -> Result<Forecast, ModelError> {
    let model = PoissonModel::train(matches)?;
    let prediction = model.predict(home, away);
    let (tip, tip_prob) = most_likely(&prediction.probs);

    Ok(Forecast {
        home_team: home.to_string(),
        away_team: away.to_string(),
        probs: prediction.probs,
        fair_odds: fair_odds(&prediction.probs),
        tip,
        tip_prob,
        lambda_home: prediction.lambda_home,
        lambda_away: prediction.lambda_away,
        stakes: market
            .map(|m| quarter_kelly_stakes(&prediction.probs, m))
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(home: &str, away: &str, home_goals: u32, away_goals: u32) -> MatchResult {
        MatchResult {
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_goals,
            away_goals,
        }
    }

    fn two_matches() -> Vec<MatchResult> {
        vec![result("Ajax", "PSV", 2, 0), result("PSV", "Ajax", 1, 1)]
    }

    fn sum(probs: &OutcomeProbs) -> f64 {
        probs.home_win + probs.draw + probs.away_win
    }

    #[test]
    fn test_train_requires_matches() {
        assert_eq!(PoissonModel::train(&[]).unwrap_err(), ModelError::NoMatches);
    }

    #[test]
    fn test_team_strengths() {
        let model = PoissonModel::train(&two_matches()).unwrap();
        assert!((model.league_avg_home - 1.5).abs() < 1e-9);
        assert!((model.league_avg_away - 0.5).abs() < 1e-9);
        assert_eq!(model.team_count(), 2);

        let ajax = model.strength("Ajax");
        assert!((ajax.attack_home - 2.0 / 1.5).abs() < 1e-9);
        // Conceded nothing at home: floored
        assert!((ajax.defense_home - 0.2).abs() < 1e-9);
        assert!((ajax.attack_away - 2.0).abs() < 1e-9);

        let psv = model.strength("PSV");
        assert!((psv.attack_away - 0.2).abs() < 1e-9);
        assert!((psv.defense_away - 2.0 / 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_predict_lambdas_and_normalisation() {
        let model = PoissonModel::train(&two_matches()).unwrap();
        let prediction = model.predict("Ajax", "PSV");

        assert!((prediction.lambda_home - 1.5 * (2.0 / 1.5) * (2.0 / 1.5)).abs() < 1e-9);
        assert!((prediction.lambda_away - 0.5 * 0.2 * 0.2).abs() < 1e-9);
        assert!((sum(&prediction.probs) - 1.0).abs() < 1e-9);
        assert!(prediction.probs.home_win > prediction.probs.draw);
        assert!(prediction.probs.draw > prediction.probs.away_win);
    }

    #[test]
    fn test_unknown_teams_use_league_average() {
        let model = PoissonModel::train(&two_matches()).unwrap();
        assert!(!model.knows("Feyenoord"));

        let prediction = model.predict("Feyenoord", "Twente");
        assert!((prediction.lambda_home - 1.5).abs() < 1e-9);
        assert!((prediction.lambda_away - 0.5).abs() < 1e-9);
        assert!((sum(&prediction.probs) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_goalless_league() {
        let model = PoissonModel::train(&[result("A", "B", 0, 0), result("B", "A", 0, 0)]).unwrap();
        let prediction = model.predict("A", "B");
        assert!((prediction.lambda_home - 0.01).abs() < 1e-12);
        assert!((prediction.lambda_away - 0.01).abs() < 1e-12);
        assert!((sum(&prediction.probs) - 1.0).abs() < 1e-9);
        assert!(prediction.probs.draw > 0.95);
    }

    #[test]
    fn test_poisson_pmf() {
        assert_eq!(poisson_pmf(0.0, 0), 1.0);
        assert_eq!(poisson_pmf(0.0, 2), 0.0);
        assert!((poisson_pmf(2.0, 0) - (-2.0f64).exp()).abs() < 1e-12);
        // 1.5^3 e^-1.5 / 3!
        assert!((poisson_pmf(1.5, 3) - 1.5f64.powi(3) * (-1.5f64).exp() / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_fair_odds() {
        let odds = fair_odds(&OutcomeProbs {
            home_win: 0.5,
            draw: 0.25,
            away_win: 0.25,
        });
        assert!((odds.home - 2.0).abs() < 0.01);
        assert!((odds.draw - 4.0).abs() < 0.01);

        let odds = fair_odds(&OutcomeProbs {
            home_win: 1.0,
            draw: 0.0,
            away_win: 0.0,
        });
        assert!((odds.home - 1.0).abs() < 0.01);
        assert!(odds.draw.is_infinite());
        assert!(odds.away.is_infinite());
    }

    #[test]
    fn test_most_likely() {
        let probs = OutcomeProbs {
            home_win: 0.3,
            draw: 0.25,
            away_win: 0.45,
        };
        assert_eq!(most_likely(&probs), (Outcome::Away, 0.45));

        let tied = OutcomeProbs {
            home_win: 0.4,
            draw: 0.4,
            away_win: 0.2,
        };
        assert_eq!(most_likely(&tied).0, Outcome::Home);
    }

    #[test]
    fn test_kelly() {
        // b = 1.5, (1.5 * 0.5 - 0.5) / 1.5
        assert!((kelly(0.5, 2.5) - 1.0 / 6.0).abs() < 0.0001);
        assert!((kelly(0.6, 2.0) - 0.2).abs() < 0.0001);

        // No edge, no bet
        assert_eq!(kelly(0.3, 2.0), 0.0);
        assert_eq!(kelly(0.5, 2.0), 0.0);
        // Odds that cannot pay out
        assert_eq!(kelly(0.9, 1.0), 0.0);
        assert_eq!(kelly(0.9, 0.5), 0.0);
        assert_eq!(kelly(0.9, f64::NAN), 0.0);
        // Probability clamped to [0, 1]
        assert!((kelly(1.7, 3.0) - 1.0).abs() < 0.0001);
        assert_eq!(kelly(-0.2, 3.0), 0.0);
    }

    #[test]
    fn test_quarter_kelly_stakes() {
        let probs = OutcomeProbs {
            home_win: 0.5,
            draw: 0.3,
            away_win: 0.2,
        };
        let market = ThreeWayOdds {
            home: 2.5,
            draw: 4.0,
            away: 4.0,
        };

        let stakes = quarter_kelly_stakes(&probs, &market);
        let selections: Vec<Outcome> = stakes.iter().map(|s| s.selection).collect();
        assert_eq!(selections, vec![Outcome::Home, Outcome::Draw]);
        assert!((stakes[0].fraction - 0.25 / 6.0).abs() < 0.0001);
        // b = 3, (3 * 0.3 - 0.7) / 3
        assert!((stakes[1].fraction - 0.25 * 0.2 / 3.0).abs() < 0.0001);
        assert_eq!(stakes[1].odds, 4.0);
    }

    #[test]
    fn test_forecast() {
        let market = ThreeWayOdds {
            home: 1.2,
            draw: 15.0,
            away: 40.0,
        };
        let ajax_psv = forecast(&two_matches(), "Ajax", "PSV", Some(&market)).unwrap();
        assert_eq!(ajax_psv.tip, Outcome::Home);
        assert!((ajax_psv.tip_prob - ajax_psv.probs.home_win).abs() < 1e-12);
        assert!((ajax_psv.fair_odds.home - 1.0 / ajax_psv.probs.home_win).abs() < 1e-9);
        assert!(!ajax_psv.stakes.is_empty());
        assert!(ajax_psv.stakes.iter().all(|s| s.fraction > 0.0));
        assert!(ajax_psv.format().starts_with("Ajax vs PSV: home "));

        let without_market = forecast(&two_matches(), "Ajax", "PSV", None).unwrap();
        assert!(without_market.stakes.is_empty());

        assert!(forecast(&[], "Ajax", "PSV", None).is_err());
    }
}
