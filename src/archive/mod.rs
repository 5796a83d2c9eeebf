//! Read-only browsing of historical match files under the data root.

pub mod football_txt;
pub mod json_records;

use football_txt::{guess_league_name, FootballTxtParser};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio_stream::wrappers::ReadDirStream;
use tokio_stream::StreamExt;
use tracing::debug;

pub const UNKNOWN_LEAGUE: &str = "Unknown league";
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("file query param required")]
    MissingFile,
    #[error("path must be relative to the data root and must not contain '..': {0}")]
    InvalidPath(String),
    #[error("{0}")]
    InvalidQuery(String),
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl ArchiveError {
    pub fn title(&self) -> &'static str {
        match self {
            ArchiveError::MissingFile => "file query param required",
            ArchiveError::InvalidPath(_) => "invalid file path",
            ArchiveError::InvalidQuery(_) => "invalid query",
            ArchiveError::NotFound(_) => "file not found",
            ArchiveError::UnsupportedType(_) => "unsupported file type",
            ArchiveError::Read { .. } => "read failed",
            ArchiveError::Parse { .. } => "json parse failed",
        }
    }
}

/// One match from an archive file, whatever layout it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRow {
    pub fixture_id: Option<Value>,
    pub league_name: String,
    pub home: String,
    pub away: String,
    #[serde(rename = "startUTC")]
    pub start_utc: Option<String>,
    pub start_tz_local: Option<String>,
    pub score: Option<Value>,
    pub halftime: Option<Value>,
    pub pick_outcome: Option<Value>,
    pub probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odds: Option<Value>,
}

/// Query string of `/browse`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowseQuery {
    pub file: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub window: Option<String>,
    pub league: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrowsePage {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub data: Vec<ArchiveRow>,
}

/// Inclusive local clock range, `HH:MM-HH:MM` (minutes may be omitted)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockRange {
    from: u32,
    to: u32,
}

impl ClockRange {
    pub fn parse(raw: &str) -> Result<Self, ArchiveError> {
        let invalid = || ArchiveError::InvalidQuery(format!("window must be HH:MM-HH:MM, got '{}'", raw));
        let (from, to) = raw.split_once('-').ok_or_else(invalid)?;
        Ok(Self {
            from: clock_minutes(from).ok_or_else(invalid)?,
            to: clock_minutes(to).ok_or_else(invalid)?,
        })
    }

    /// Rows without a local start time are kept; unreadable times are not
    pub fn keeps(&self, row: &ArchiveRow) -> bool {
        match row.start_tz_local.as_deref() {
            None => true,
            Some(t) => clock_minutes(t).is_some_and(|m| m >= self.from && m <= self.to),
        }
    }
}

/// Minutes since midnight; `24:00` is the latest accepted time
fn clock_minutes(hm: &str) -> Option<u32> {
    let hm = hm.trim();
    let (h, m) = hm.split_once(':').unwrap_or((hm, "0"));
    let h = h.trim().parse::<u32>().ok().filter(|h| *h <= 24)?;
    let m = m.trim().parse::<u32>().ok().filter(|m| *m <= 59)?;
    if h == 24 && m > 0 {
        return None;
    }
    h.checked_mul(60)?.checked_add(m)
}

fn is_archive_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("json") | Some("txt")
    )
}

/// Join a caller-supplied relative path onto the root, refusing anything
/// that could leave it
pub fn resolve_path(root: &Path, file: &str) -> Result<PathBuf, ArchiveError> {
    let relative = Path::new(file);
    let safe = !relative.is_absolute()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !safe {
        return Err(ArchiveError::InvalidPath(file.to_string()));
    }
    Ok(root.join(relative))
}

/// Every `*.json` and `*.txt` file below `root`, relative to it and sorted.
/// A missing root has no files.
pub async fn list_files(root: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if dir == root && e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Data root {} does not exist", root.display());
                return Ok(files);
            }
            Err(source) => return Err(ArchiveError::Read { path: dir, source }),
        };

        let mut entries = ReadDirStream::new(entries);
        while let Some(entry) = entries.next().await {
            let entry = entry.map_err(|source| ArchiveError::Read {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(|source| ArchiveError::Read {
                path: path.clone(),
                source,
            })?;

            if file_type.is_dir() {
                pending.push(path);
            } else if is_archive_file(&path) {
                if let Ok(relative) = path.strip_prefix(root) {
                    files.push(relative.to_path_buf());
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

fn parse_positive(raw: Option<&str>, name: &str, default: usize) -> Result<usize, ArchiveError> {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|v| *v >= 1)
            .ok_or_else(|| ArchiveError::InvalidQuery(format!("{} must be a positive integer, got '{}'", name, raw))),
    }
}

/// Read, filter and paginate one archive file
pub async fn browse(root: &Path, query: &BrowseQuery) -> Result<BrowsePage, ArchiveError> {
    let file = query
        .file
        .as_deref()
        .filter(|f| !f.trim().is_empty())
        .ok_or(ArchiveError::MissingFile)?;
    let page = parse_positive(query.page.as_deref(), "page", 1)?;
    let limit = parse_positive(query.limit.as_deref(), "limit", DEFAULT_PAGE_SIZE)?;
    let window = query
        .window
        .as_deref()
        .filter(|w| !w.trim().is_empty())
        .map(ClockRange::parse)
        .transpose()?;

    let path = resolve_path(root, file)?;
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(ArchiveError::NotFound(file.to_string()));
    }

    let rows = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            let json = read(&path).await?;
            json_records::parse_records(&json).map_err(|source| ArchiveError::Parse {
                path: path.clone(),
                source,
            })?
        }
        Some("txt") => {
            let content = read(&path).await?;
            let league = guess_league_name(&path).unwrap_or_else(|| UNKNOWN_LEAGUE.to_string());
            FootballTxtParser::new().parse(&content, &league)
        }
        _ => return Err(ArchiveError::UnsupportedType(file.to_string())),
    };

    let league = query
        .league
        .as_deref()
        .filter(|l| !l.is_empty())
        .map(str::to_lowercase);
    let filtered: Vec<ArchiveRow> = rows
        .into_iter()
        .filter(|row| window.map_or(true, |w| w.keeps(row)))
        .filter(|row| {
            league
                .as_deref()
                .map_or(true, |q| row.league_name.to_lowercase().contains(q))
        })
        .collect();

    debug!("Browsing {}: {} matching rows", path.display(), filtered.len());

    let total = filtered.len();
    let data = filtered
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    Ok(BrowsePage {
        page,
        limit,
        total,
        data,
    })
}

async fn read(path: &Path) -> Result<String, ArchiveError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ArchiveError::Read {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fresh data root with a TXT season and a JSON pick file
    fn data_root(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("okosfoci-archive-{}-{}", std::process::id(), name));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(root.join("europe/england")).unwrap();
        std::fs::write(
            root.join("europe/england/2024-25_eng1.txt"),
            "Sat Sep/14 2024\n  12.30  Southampton v Man Utd  0-3 (0-2)\n  15.00  Fulham v West Ham  1-1\n  17.30  Spurs v Arsenal  0-1 (0-0)\n",
        )
        .unwrap();
        std::fs::write(
            root.join("picks.json"),
            r#"{"picks":[
                {"id":1,"leagueName":"Premier League","home":"A","away":"B","startTzLocal":"09:00"},
                {"id":2,"leagueName":"La Liga","home":"C","away":"D","startTzLocal":"13:00"},
                {"id":3,"leagueName":"Premier League","home":"E","away":"F"}
            ]}"#,
        )
        .unwrap();
        std::fs::write(root.join("notes.md"), "ignored").unwrap();
        std::fs::write(root.join("broken.json"), "{").unwrap();
        root
    }

    fn query(file: &str) -> BrowseQuery {
        BrowseQuery {
            file: Some(file.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_files() {
        let root = data_root("list");
        let files = list_files(&root).await.unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("broken.json"),
                PathBuf::from("europe/england/2024-25_eng1.txt"),
                PathBuf::from("picks.json"),
            ]
        );

        assert!(list_files(&root.join("missing")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_browse_txt_with_window() {
        let root = data_root("txt");
        let mut q = query("europe/england/2024-25_eng1.txt");
        q.window = Some("12:00-15:00".to_string());

        let page = browse(&root, &q).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.data[0].league_name, "england");
        assert_eq!(page.data[1].start_tz_local.as_deref(), Some("15:00"));
    }

    #[tokio::test]
    async fn test_browse_json_league_filter_and_paging() {
        let root = data_root("json");
        let mut q = query("picks.json");
        q.league = Some("premier".to_string());
        q.limit = Some("1".to_string());
        q.page = Some("2".to_string());

        let page = browse(&root, &q).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.page, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].home, "E");

        // No local time: the row survives any window
        let mut q = query("picks.json");
        q.window = Some("10:00-12:00".to_string());
        let page = browse(&root, &q).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].home, "E");
    }

    #[tokio::test]
    async fn test_browse_errors() {
        let root = data_root("errors");

        assert!(matches!(
            browse(&root, &BrowseQuery::default()).await,
            Err(ArchiveError::MissingFile)
        ));
        assert!(matches!(
            browse(&root, &query("nope.json")).await,
            Err(ArchiveError::NotFound(_))
        ));
        assert!(matches!(
            browse(&root, &query("notes.md")).await,
            Err(ArchiveError::UnsupportedType(_))
        ));
        assert!(matches!(
            browse(&root, &query("broken.json")).await,
            Err(ArchiveError::Parse { .. })
        ));
        assert!(matches!(
            browse(&root, &query("../etc/passwd")).await,
            Err(ArchiveError::InvalidPath(_))
        ));
        assert!(matches!(
            browse(&root, &query("/etc/passwd")).await,
            Err(ArchiveError::InvalidPath(_))
        ));

        let mut q = query("picks.json");
        q.page = Some("0".to_string());
        assert!(matches!(browse(&root, &q).await, Err(ArchiveError::InvalidQuery(_))));
    }

    #[test]
    fn test_clock_range() {
        let range = ClockRange::parse("8-16").unwrap();
        assert_eq!(range, ClockRange { from: 480, to: 960 });
        assert!(ClockRange::parse("evening").is_err());
        assert!(ClockRange::parse("10:00-xx").is_err());
        assert_eq!(ClockRange::parse("00:00-24:00").unwrap(), ClockRange { from: 0, to: 1440 });
    }

    #[test]
    fn test_clock_range_rejects_out_of_range_times() {
        for raw in ["99999999:00-10:00", "10:00-25:00", "10:60-11:00", "24:30-10:00", "4294967295-1"] {
            assert!(
                matches!(ClockRange::parse(raw), Err(ArchiveError::InvalidQuery(_))),
                "{} should be rejected",
                raw
            );
        }

        let range = ClockRange::parse("00:00-24:00").unwrap();
        let row = |t: &str| ArchiveRow {
            fixture_id: None,
            league_name: UNKNOWN_LEAGUE.to_string(),
            home: "-".to_string(),
            away: "-".to_string(),
            start_utc: None,
            start_tz_local: Some(t.to_string()),
            score: None,
            halftime: None,
            pick_outcome: None,
            probability: None,
            odds: None,
        };
        assert!(range.keeps(&row("23:59")));
        assert!(!range.keeps(&row("99999999:00")));
        assert!(!range.keeps(&row("12:75")));
    }

    #[tokio::test]
    async fn test_browse_huge_window_is_invalid_query() {
        let root = data_root("huge-window");
        let mut q = query("picks.json");
        q.window = Some("99999999:00-10:00".to_string());
        assert!(matches!(browse(&root, &q).await, Err(ArchiveError::InvalidQuery(_))));
    }
}
