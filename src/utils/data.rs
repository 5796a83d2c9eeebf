use crate::models::TipRecord;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Save tips to a pretty-printed JSON file
pub fn save_tips_to_json(tips: &[TipRecord], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(tips).context("Failed to serialize tips")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write tips file {}", path.display()))?;
    Ok(())
}

/// Load tips previously written by `save_tips_to_json`
pub fn load_tips_from_json(path: impl AsRef<Path>) -> Result<Vec<TipRecord>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tips file {}", path.display()))?;
    let tips: Vec<TipRecord> = serde_json::from_str(&json).context("Failed to deserialize tips")?;
    Ok(tips)
}

#[derive(Serialize)]
struct TipCsvRow<'a> {
    #[serde(rename = "Window")]
    window: &'a str,
    #[serde(rename = "League")]
    league: &'a str,
    #[serde(rename = "Kickoff (UTC)")]
    kickoff: String,
    #[serde(rename = "Home Team")]
    home_team: &'a str,
    #[serde(rename = "Away Team")]
    away_team: &'a str,
    #[serde(rename = "Bet Type")]
    bet_type: &'a str,
    #[serde(rename = "Tip")]
    tip: &'a str,
    #[serde(rename = "Odds")]
    odds: String,
    #[serde(rename = "Bookmaker")]
    bookmaker: &'a str,
    #[serde(rename = "Market")]
    market: String,
}

impl<'a> From<&'a TipRecord> for TipCsvRow<'a> {
    fn from(record: &'a TipRecord) -> Self {
        Self {
            window: record.time_window.label(),
            league: &record.league.name,
            kickoff: record.fixture.date.format("%Y-%m-%d %H:%M").to_string(),
            home_team: &record.teams.home,
            away_team: &record.teams.away,
            bet_type: record.selection.bet_type.map(|b| b.name()).unwrap_or(""),
            tip: record.selection.tip.as_deref().unwrap_or(""),
            odds: record
                .selection
                .odds
                .map(|o| format!("{:.2}", o))
                .unwrap_or_default(),
            bookmaker: record.selection.bookmaker.as_deref().unwrap_or(""),
            market: record
                .market()
                .iter()
                .map(|(label, odd)| format!("{}={:.2}", label, odd))
                .collect::<Vec<_>>()
                .join(";"),
        }
    }
}

/// Save tips to CSV, one row per fixture
pub fn save_tips_to_csv(tips: &[TipRecord], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;

    for record in tips {
        writer
            .serialize(TipCsvRow::from(record))
            .context("Failed to write CSV row")?;
    }

    writer.flush().context("Failed to flush CSV file")?;
    Ok(())
}
