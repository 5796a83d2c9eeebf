use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Static metadata about a club, as kept in `data/teams.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub founded: Option<u16>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
}

impl TeamInfo {
    /// Placeholder entry printed for teams missing from the database
    pub fn template(name: &str) -> Self {
        Self {
            name: name.to_string(),
            country: Some("TODO".to_string()),
            league: Some("TODO".to_string()),
            founded: None,
            venue: Some("TODO".to_string()),
            capacity: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TeamFile {
    Wrapped { teams: Vec<TeamInfo> },
    Bare(Vec<TeamInfo>),
}

#[derive(Debug, Clone, Default)]
pub struct TeamDatabase {
    teams: Vec<TeamInfo>,
}

impl TeamDatabase {
    pub fn new(teams: Vec<TeamInfo>) -> Self {
        Self { teams }
    }

    /// Load the database; a missing file yields an empty database
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Team database {} not found, using empty database", path.display());
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read team database {}", path.display()))?;
        let file: TeamFile =
            serde_json::from_str(&json).context("Failed to deserialize team database")?;

        let teams = match file {
            TeamFile::Wrapped { teams } => teams,
            TeamFile::Bare(teams) => teams,
        };
        Ok(Self { teams })
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Look a team up by exact name, then case-insensitively, then by
    /// substring in either direction
    pub fn find(&self, name: &str) -> Option<&TeamInfo> {
        if name.is_empty() {
            return None;
        }
        if let Some(team) = self.teams.iter().find(|t| t.name == name) {
            return Some(team);
        }

        let lower = name.to_lowercase();
        if let Some(team) = self.teams.iter().find(|t| t.name.to_lowercase() == lower) {
            return Some(team);
        }

        self.teams.iter().find(|t| {
            let team = t.name.to_lowercase();
            team.contains(&lower) || lower.contains(&team)
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}
