//! Process configuration, read once at startup from the environment
//! (and `.env`) plus an optional JSON config file.

use crate::models::{default_leagues, League};
use crate::utils::time_window::HourBasis;
use crate::utils::tip_selector::{BetType, SelectionPolicy};
use crate::utils::validation::LimitPolicy;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://v3.football.api-sports.io";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Football API key is missing. Set FOOTBALL_API_KEY (or X_APISPORTS_KEY)")]
    MissingApiKey,
}

/// Everything the tip pipeline needs besides the request itself
#[derive(Debug, Clone)]
pub struct TipSettings {
    pub leagues: Vec<League>,
    pub policy: SelectionPolicy,
    pub bet_types: Vec<BetType>,
    pub hour_basis: HourBasis,
}

impl Default for TipSettings {
    fn default() -> Self {
        Self {
            leagues: default_leagues(),
            policy: SelectionPolicy::default(),
            bet_types: BetType::DEFAULT_PRIORITY.to_vec(),
            hour_basis: HourBasis::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub host: String,
    pub port: u16,
    pub data_root: PathBuf,
    pub teams_db: PathBuf,
    pub rate_limit: Duration,
    pub max_retries: u32,
    pub request_timeout: Duration,
    pub limits: LimitPolicy,
    pub default_limit: usize,
    pub tips: TipSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE.to_string(),
            host: "0.0.0.0".to_string(),
            port: 8081,
            data_root: PathBuf::from("./data"),
            teams_db: PathBuf::from("data/teams.json"),
            rate_limit: Duration::from_millis(300),
            max_retries: 2,
            request_timeout: Duration::from_secs(10),
            limits: LimitPolicy::default(),
            default_limit: 6,
            tips: TipSettings::default(),
        }
    }
}

/// Shape of the optional `CONFIG_FILE`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    api_base_url: Option<String>,
    leagues: Option<Vec<League>>,
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    lookup(var)
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            v.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                var,
                reason: e.to_string(),
            })
        })
        .transpose()
}

impl Config {
    /// Load `.env`, then read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        config.api_key = lookup("FOOTBALL_API_KEY")
            .or_else(|| lookup("X_APISPORTS_KEY"))
            .filter(|k| !k.trim().is_empty());

        if let Some(path) = lookup("CONFIG_FILE").filter(|p| !p.is_empty()) {
            let file = load_config_file(PathBuf::from(path))?;
            if let Some(base) = file.api_base_url {
                config.api_base_url = base;
            }
            if let Some(leagues) = file.leagues {
                config.tips.leagues = leagues;
            }
        }
        if let Some(base) = lookup("FOOTBALL_API_BASE").filter(|b| !b.is_empty()) {
            config.api_base_url = base;
        }
        config.api_base_url = config.api_base_url.trim_end_matches('/').to_string();

        if let Some(host) = lookup("HOST").filter(|h| !h.is_empty()) {
            config.host = host;
        }
        if let Some(port) = parse_var(&lookup, "PORT")? {
            config.port = port;
        }
        if let Some(root) = lookup("DATA_ROOT").filter(|r| !r.is_empty()) {
            config.data_root = PathBuf::from(root);
        }
        if let Some(path) = lookup("TEAMS_DB").filter(|p| !p.is_empty()) {
            config.teams_db = PathBuf::from(path);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "API_RATE_LIMIT_MS")? {
            config.rate_limit = Duration::from_millis(ms);
        }
        if let Some(retries) = parse_var(&lookup, "API_MAX_RETRIES")? {
            config.max_retries = retries;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "API_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(limits) = parse_var(&lookup, "TIP_LIMITS")? {
            config.limits = limits;
        }
        if let Some(default_limit) = parse_var(&lookup, "TIP_DEFAULT_LIMIT")? {
            config.default_limit = default_limit;
        }
        if !config.limits.accepts(config.default_limit) {
            return Err(ConfigError::InvalidValue {
                var: "TIP_DEFAULT_LIMIT",
                reason: format!("{} is not an allowed limit", config.default_limit),
            });
        }
        if let Some(policy) = parse_var(&lookup, "TIP_POLICY")? {
            config.tips.policy = policy;
        }
        if let Some(basis) = parse_var(&lookup, "WINDOW_CLOCK")? {
            config.tips.hour_basis = basis;
        }
        if let Some(raw) = lookup("TIP_BET_TYPES").filter(|b| !b.trim().is_empty()) {
            config.tips.bet_types = parse_bet_types(&raw)?;
        }

        Ok(config)
    }

    /// The API key, or the error that makes tip generation impossible
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn load_config_file(path: PathBuf) -> Result<ConfigFile, ConfigError> {
    let json = match std::fs::read_to_string(&path) {
        Ok(json) => json,
        Err(source) => return Err(ConfigError::ReadFile { path, source }),
    };
    serde_json::from_str(&json).map_err(|source| ConfigError::ParseFile { path, source })
}

fn parse_bet_types(raw: &str) -> Result<Vec<BetType>, ConfigError> {
    let mut bet_types = Vec::new();
    for name in raw.split(',').filter(|n| !n.trim().is_empty()) {
        let bet_type = name.parse::<BetType>().map_err(|reason| ConfigError::InvalidValue {
            var: "TIP_BET_TYPES",
            reason,
        })?;
        if !bet_types.contains(&bet_type) {
            bet_types.push(bet_type);
        }
    }
    Ok(bet_types)
}
