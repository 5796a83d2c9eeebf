pub mod football_api;

use crate::models::{BookmakerOdds, Fixture, League};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Where fixtures and odds come from. Implementations are fail-soft:
/// any upstream failure is logged and yields an empty list.
#[async_trait]
pub trait FootballDataSource: Send + Sync {
    async fn fetch_fixtures(&self, league: &League, date: NaiveDate) -> Vec<Fixture>;

    async fn fetch_odds(&self, fixture_id: u64) -> Vec<BookmakerOdds>;
}
