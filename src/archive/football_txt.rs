use crate::archive::ArchiveRow;
use crate::utils::poisson::MatchResult;
use chrono::NaiveDate;
use regex::Regex;
use std::path::{Component, Path};

/// Parser for Football.TXT style result files:
///
/// ```text
/// Sat Sep/14 2024
///   15.00  Arsenal v Chelsea  2-1 (1-0)
///   17.30  Celtic v Rangers  3-3 a.e.t. (1-1, 2-2)
/// ```
pub struct FootballTxtParser {
    date_pattern: Regex,
    match_pattern: Regex,
    halftime_pattern: Regex,
}

impl Default for FootballTxtParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FootballTxtParser {
    pub fn new() -> Self {
        Self {
            date_pattern: Regex::new(r"^(Mon|Tue|Wed|Thu|Fri|Sat|Sun)\s+([A-Za-z]{3})/(\d{1,2})\s+(\d{4})")
                .unwrap(),
            match_pattern: Regex::new(
                r"(?i)^(\d{1,2})\.(\d{2})\s+(.+?)\s+v\s+(.+?)\s+(\d+-\d+)(?:\s+([a-z.]+))?\s*(?:\((.+?)\))?",
            )
            .unwrap(),
            halftime_pattern: Regex::new(r"^\d+-\d+$").unwrap(),
        }
    }

    /// Parse every match line; headers, rounds and other lines are skipped
    pub fn parse(&self, content: &str, league_name: &str) -> Vec<ArchiveRow> {
        let mut current_date: Option<String> = None;
        let mut rows = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(caps) = self.date_pattern.captures(line) {
                current_date = Some(match_day(&caps[2], &caps[3], &caps[4]));
                continue;
            }

            let Some(caps) = self.match_pattern.captures(line) else {
                continue;
            };

            let start = format!("{:0>2}:{}", &caps[1], &caps[2]);
            let home = caps[3].trim().to_string();
            let away = caps[4].trim().to_string();
            let score = match caps.get(6) {
                Some(extra) => format!("{} {}", &caps[5], extra.as_str()),
                None => caps[5].to_string(),
            };
            let halftime = caps
                .get(7)
                .and_then(|bracket| bracket.as_str().split(',').next())
                .map(str::trim)
                .filter(|first| self.halftime_pattern.is_match(first))
                .map(str::to_string);

            let fixture_id = match &current_date {
                Some(date) => format!("{} {} {} v {}", date, start, home, away),
                None => format!("{} {} v {}", start, home, away),
            };

            rows.push(ArchiveRow {
                fixture_id: Some(fixture_id.into()),
                league_name: league_name.to_string(),
                home,
                away,
                start_utc: None,
                start_tz_local: Some(start),
                score: Some(score.into()),
                halftime: halftime.map(Into::into),
                pick_outcome: None,
                probability: None,
                odds: None,
            });
        }

        rows
    }

    /// Finished matches with goals, for model training. Lines whose score
    /// cannot be read are skipped.
    pub fn parse_results(&self, content: &str) -> Vec<MatchResult> {
        self.parse(content, "")
            .into_iter()
            .filter_map(|row| {
                let (home_goals, away_goals) = score_goals(row.score.as_ref()?.as_str()?)?;
                Some(MatchResult {
                    home_team: row.home,
                    away_team: row.away,
                    home_goals,
                    away_goals,
                })
            })
            .collect()
    }
}

/// Goals from a score such as `2-1` or `3-3 a.e.t.`
pub fn score_goals(score: &str) -> Option<(u32, u32)> {
    let full_time = score.split_whitespace().next()?;
    let (home, away) = full_time.split_once('-')?;
    Some((home.parse().ok()?, away.parse().ok()?))
}

/// `Sep`, `14`, `2024` as `2024-09-14`, or the raw pieces if they do not form a date
fn match_day(month: &str, day: &str, year: &str) -> String {
    NaiveDate::parse_from_str(&format!("{} {} {}", day, month, year), "%d %b %Y")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| format!("{}-{}-{}", year, month, day))
}

/// League name from the directory after `europe/`, e.g.
/// `europe/northern-ireland/2024-25_nir1.txt` gives `northern ireland`
pub fn guess_league_name(path: &Path) -> Option<String> {
    let dirs: Vec<&str> = path
        .parent()?
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect();

    let europe = dirs.iter().position(|d| *d == "europe")?;
    dirs.get(europe + 1).map(|country| country.replace('-', " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = "\
= English Premier League 2024/25

» Matchday 4
  Sat Sep/14 2024
    12.30  Southampton FC v Manchester United FC  0-3 (0-2)
    15.00  Brighton & Hove Albion FC v Ipswich Town FC  0-0
    17.30  Tottenham Hotspur FC v Arsenal FC  0-1 (0-0)

  Sun Sep/15 2024
     9.00  Celtic v Rangers  3-3 a.e.t. (1-1, 2-2)
";

    #[test]
    fn test_parse_match_lines() {
        let rows = FootballTxtParser::new().parse(SAMPLE, "england");
        assert_eq!(rows.len(), 4);

        let first = &rows[0];
        assert_eq!(first.home, "Southampton FC");
        assert_eq!(first.away, "Manchester United FC");
        assert_eq!(first.start_tz_local.as_deref(), Some("12:30"));
        assert_eq!(first.score, Some(json!("0-3")));
        assert_eq!(first.halftime, Some(json!("0-2")));
        assert_eq!(first.league_name, "england");
        assert_eq!(
            first.fixture_id,
            Some(json!("2024-09-14 12:30 Southampton FC v Manchester United FC"))
        );

        assert_eq!(rows[1].home, "Brighton & Hove Albion FC");
        assert_eq!(rows[1].halftime, None);
    }

    #[test]
    fn test_extra_time_marker() {
        let rows = FootballTxtParser::new().parse(SAMPLE, "scotland");
        let last = rows.last().unwrap();
        assert_eq!(last.start_tz_local.as_deref(), Some("09:00"));
        assert_eq!(last.score, Some(json!("3-3 a.e.t.")));
        assert_eq!(last.halftime, Some(json!("1-1")));
        assert!(last.fixture_id.as_ref().unwrap().as_str().unwrap().starts_with("2024-09-15"));
    }

    #[test]
    fn test_match_before_any_date() {
        let rows = FootballTxtParser::new().parse("15.00  Ajax v PSV  1-1", "netherlands");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fixture_id, Some(json!("15:00 Ajax v PSV")));
    }

    #[test]
    fn test_parse_results() {
        let results = FootballTxtParser::new().parse_results(SAMPLE);
        assert_eq!(results.len(), 4);
        assert_eq!(
            results[0],
            MatchResult {
                home_team: "Southampton FC".to_string(),
                away_team: "Manchester United FC".to_string(),
                home_goals: 0,
                away_goals: 3,
            }
        );
        assert_eq!((results[3].home_goals, results[3].away_goals), (3, 3));
    }

    #[test]
    fn test_score_goals() {
        assert_eq!(score_goals("2-1"), Some((2, 1)));
        assert_eq!(score_goals("3-3 a.e.t."), Some((3, 3)));
        assert_eq!(score_goals("-"), None);
        assert_eq!(score_goals("99999999999-0"), None);
        assert_eq!(score_goals(""), None);
    }

    #[test]
    fn test_guess_league_name() {
        assert_eq!(
            guess_league_name(Path::new("data/europe/northern-ireland/2024-25_nir1.txt")).as_deref(),
            Some("northern ireland")
        );
        assert_eq!(guess_league_name(Path::new("data/europe/2024-25.txt")), None);
        assert_eq!(guess_league_name(Path::new("data/world/brazil/br1.txt")), None);
    }
}
