use crate::archive::{ArchiveRow, UNKNOWN_LEAGUE};
use serde_json::Value;

/// Parse an archive JSON file: a bare array of records, or one wrapped in
/// `picks` or `matches`. Any other shape has no rows.
pub fn parse_records(json: &str) -> Result<Vec<ArchiveRow>, serde_json::Error> {
    let raw: Value = serde_json::from_str(json)?;

    let records = match &raw {
        Value::Array(records) => Some(records),
        Value::Object(_) => ["picks", "matches"]
            .iter()
            .find_map(|key| raw.get(key).and_then(Value::as_array)),
        _ => None,
    };

    Ok(records
        .map(|records| records.iter().map(normalize_record).collect())
        .unwrap_or_default())
}

/// First non-null value among the JSON pointers
fn first_of<'a>(record: &'a Value, pointers: &[&str]) -> Option<&'a Value> {
    pointers
        .iter()
        .filter_map(|p| record.pointer(p))
        .find(|v| !v.is_null())
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_text(record: &Value, pointers: &[&str]) -> Option<String> {
    first_of(record, pointers).and_then(text)
}

/// Map one record of any known archive layout onto an `ArchiveRow`
pub fn normalize_record(record: &Value) -> ArchiveRow {
    ArchiveRow {
        fixture_id: first_of(record, &["/fixtureId", "/id", "/fixture_id", "/GameId"]).cloned(),
        league_name: first_text(
            record,
            &["/leagueName", "/league_name", "/league/name", "/competition/name"],
        )
        .unwrap_or_else(|| UNKNOWN_LEAGUE.to_string()),
        home: first_text(record, &["/home", "/teams/home/name", "/HomeTeam"])
            .unwrap_or_else(|| "-".to_string()),
        away: first_text(record, &["/away", "/teams/away/name", "/AwayTeam"])
            .unwrap_or_else(|| "-".to_string()),
        start_utc: first_text(record, &["/startUTC", "/date", "/fixture/date"]),
        start_tz_local: first_text(record, &["/startTzLocal", "/start_local"]),
        score: first_of(record, &["/score"]).cloned(),
        halftime: first_of(record, &["/halftime"]).cloned(),
        pick_outcome: first_of(record, &["/pickOutcome", "/tip", "/recommendation"]).cloned(),
        probability: record
            .get("probability")
            .and_then(Value::as_f64)
            .or_else(|| record.get("prob").and_then(Value::as_f64)),
        odds: first_of(record, &["/odds", "/bookmakers/0/odds"]).cloned(),
    }
}
