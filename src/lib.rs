pub mod api;
pub mod archive;
pub mod config;
pub mod models;
pub mod server;
pub mod utils;

pub use api::*;
pub use models::*;
pub use utils::*;

use api::FootballDataSource;
use config::TipSettings;
use tracing::{debug, info};
use utils::teams::TeamDatabase;
use utils::time_window::classify;
use utils::tip_selector::{select_tip, TipSelection};
use utils::validation::TipRequest;

fn assemble_record(
    league: &League,
    fixture: Fixture,
    hour: u32,
    selection: TipSelection,
    teams: Option<&TeamDatabase>,
) -> TipRecord {
    let home_team_info = teams.and_then(|db| db.find(&fixture.home_team)).cloned();
    let away_team_info = teams.and_then(|db| db.find(&fixture.away_team)).cloned();

    TipRecord {
        fixture_id: fixture.id,
        league: league.clone(),
        fixture: FixtureDetails {
            date: fixture.kickoff,
            venue: fixture.venue,
            status: fixture.status,
        },
        teams: Teams {
            home: fixture.home_team,
            away: fixture.away_team,
        },
        time_window: classify(hour),
        selection,
        home_team_info,
        away_team_info,
    }
}

/// Scan the configured leagues in order and build up to `request.limit` tips.
///
/// Fixtures outside the requested window are skipped before their odds are
/// fetched, and no further leagues are requested once the limit is reached.
pub async fn generate_tips(
    source: &dyn FootballDataSource,
    settings: &TipSettings,
    request: &TipRequest,
    teams: Option<&TeamDatabase>,
) -> Vec<TipRecord> {
    let mut tips = Vec::new();

    'leagues: for league in &settings.leagues {
        if tips.len() >= request.limit {
            break;
        }

        let fixtures = source.fetch_fixtures(league, request.date).await;
        debug!("{}: {} fixtures on {}", league.name, fixtures.len(), request.date);

        for fixture in fixtures {
            if tips.len() >= request.limit {
                break 'leagues;
            }

            let hour = settings.hour_basis.hour_of(&fixture.kickoff);
            if !request.time_window.matches(hour) {
                debug!(
                    "Skipping fixture {} at hour {}: outside window {}",
                    fixture.id,
                    hour,
                    request.time_window.label()
                );
                continue;
            }

            let odds = source.fetch_odds(fixture.id).await;
            let selection = select_tip(&odds, &settings.bet_types, settings.policy);
            if selection.is_none() {
                debug!("No usable odds for fixture {}", fixture.id);
            }

            tips.push(assemble_record(league, fixture, hour, selection, teams));
        }
    }

    info!(
        "Generated {} tips for {} (window {})",
        tips.len(),
        request.date,
        request.time_window.label()
    );
    tips
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::teams::TeamInfo;
    use crate::utils::time_window::{classify, HourBasis, TimeWindow, WindowFilter};
    use crate::utils::tip_selector::BetType;
    use async_trait::async_trait;
    use chrono::{Local, NaiveDate, TimeZone, Timelike, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockSource {
        fixtures: HashMap<u32, Vec<Fixture>>,
        odds: HashMap<u64, Vec<BookmakerOdds>>,
        fixture_calls: Mutex<Vec<u32>>,
        odds_calls: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl FootballDataSource for MockSource {
        async fn fetch_fixtures(&self, league: &League, _date: NaiveDate) -> Vec<Fixture> {
            self.fixture_calls.lock().unwrap().push(league.id);
            self.fixtures.get(&league.id).cloned().unwrap_or_default()
        }

        async fn fetch_odds(&self, fixture_id: u64) -> Vec<BookmakerOdds> {
            self.odds_calls.lock().unwrap().push(fixture_id);
            self.odds.get(&fixture_id).cloned().unwrap_or_default()
        }
    }

    fn fixture(id: u64, hour: u32) -> Fixture {
        Fixture {
            id,
            home_team: format!("Home {}", id),
            away_team: format!("Away {}", id),
            kickoff: Utc.with_ymd_and_hms(2024, 11, 25, hour, 0, 0).unwrap(),
            venue: "Unknown".to_string(),
            status: "Not Started".to_string(),
        }
    }

    fn match_winner(home: &str, draw: &str, away: &str) -> Vec<BookmakerOdds> {
        vec![BookmakerOdds {
            bookmaker: "Bet365".to_string(),
            bets: vec![BetOdds {
                name: "Match Winner".to_string(),
                values: [("Home", home), ("Draw", draw), ("Away", away)]
                    .iter()
                    .map(|(label, odd)| OutcomeOdds {
                        label: label.to_string(),
                        odd: odd.to_string(),
                    })
                    .collect(),
            }],
        }]
    }

    fn request(window: WindowFilter, limit: usize) -> TipRequest {
        TipRequest {
            date: NaiveDate::from_ymd_opt(2024, 11, 25).unwrap(),
            time_window: window,
            limit,
        }
    }

    fn settings(league_ids: &[u32]) -> TipSettings {
        TipSettings {
            leagues: league_ids
                .iter()
                .map(|id| League::new(*id, &format!("League {}", id), "Testland"))
                .collect(),
            ..TipSettings::default()
        }
    }

    #[tokio::test]
    async fn test_stops_at_limit_across_leagues() {
        let mut source = MockSource::default();
        source.fixtures.insert(1, vec![fixture(11, 10), fixture(12, 12)]);
        source.fixtures.insert(2, vec![fixture(21, 14), fixture(22, 15)]);
        source.fixtures.insert(3, vec![fixture(31, 9)]);

        let tips = generate_tips(&source, &settings(&[1, 2, 3]), &request(WindowFilter::All, 3), None).await;

        let ids: Vec<u64> = tips.iter().map(|t| t.fixture_id).collect();
        assert_eq!(ids, vec![11, 12, 21]);
        assert_eq!(*source.fixture_calls.lock().unwrap(), vec![1, 2]);
        assert_eq!(*source.odds_calls.lock().unwrap(), vec![11, 12, 21]);
    }

    #[tokio::test]
    async fn test_window_filter_before_odds() {
        let mut source = MockSource::default();
        source.fixtures.insert(39, vec![fixture(1, 10), fixture(2, 20)]);
        source.odds.insert(1, match_winner("2.10", "3.40", "3.60"));
        source.odds.insert(2, match_winner("1.50", "4.00", "6.00"));

        let tips = generate_tips(
            &source,
            &settings(&[39]),
            &request(WindowFilter::Only(TimeWindow::Day), 6),
            None,
        )
        .await;

        assert_eq!(tips.len(), 1);
        let tip = &tips[0];
        assert_eq!(tip.fixture_id, 1);
        assert_eq!(tip.time_window, TimeWindow::Day);
        assert_eq!(tip.selection.tip.as_deref(), Some("Home"));
        assert_eq!(tip.selection.odds, Some(2.10));
        assert_eq!(tip.selection.bet_type, Some(BetType::MatchWinner));
        assert_eq!(*source.odds_calls.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_local_hour_basis_windows() {
        // Kickoffs eight hours apart always land in different buckets
        let early = fixture(1, 2);
        let late = fixture(2, 10);
        let local_window = |f: &Fixture| classify(f.kickoff.with_timezone(&Local).hour());
        let wanted = local_window(&early);
        assert_ne!(wanted, local_window(&late));

        let mut source = MockSource::default();
        source.fixtures.insert(39, vec![early.clone(), late.clone()]);
        let settings = TipSettings {
            hour_basis: HourBasis::Local,
            ..settings(&[39])
        };

        let tips = generate_tips(&source, &settings, &request(WindowFilter::Only(wanted), 6), None).await;
        assert_eq!(tips.len(), 1);
        assert_eq!(tips[0].fixture_id, 1);
        assert_eq!(tips[0].time_window, wanted);
        assert_eq!(*source.odds_calls.lock().unwrap(), vec![1]);

        let tips = generate_tips(&source, &settings, &request(WindowFilter::All, 6), None).await;
        assert_eq!(tips[0].time_window, local_window(&early));
        assert_eq!(tips[1].time_window, local_window(&late));
    }

    #[tokio::test]
    async fn test_fixture_without_odds_is_kept() {
        let mut source = MockSource::default();
        source.fixtures.insert(39, vec![fixture(5, 18)]);

        let tips = generate_tips(&source, &settings(&[39]), &request(WindowFilter::All, 6), None).await;

        assert_eq!(tips.len(), 1);
        assert!(tips[0].selection.is_none());
        assert_eq!(tips[0].selection.tipp_text, "No odds available");
        assert_eq!(tips[0].time_window, TimeWindow::Evening);
    }

    #[tokio::test]
    async fn test_attaches_team_info() {
        let mut source = MockSource::default();
        source.fixtures.insert(39, vec![fixture(7, 12)]);
        let teams = TeamDatabase::new(vec![TeamInfo::template("home 7")]);

        let tips = generate_tips(&source, &settings(&[39]), &request(WindowFilter::All, 6), Some(&teams)).await;

        assert_eq!(tips[0].home_team_info.as_ref().map(|t| t.name.as_str()), Some("home 7"));
        assert!(tips[0].away_team_info.is_none());
    }

    #[tokio::test]
    async fn test_empty_upstream() {
        let source = MockSource::default();
        let tips = generate_tips(&source, &settings(&[39, 140]), &request(WindowFilter::All, 10), None).await;
        assert!(tips.is_empty());
        assert_eq!(*source.fixture_calls.lock().unwrap(), vec![39, 140]);
    }
}
