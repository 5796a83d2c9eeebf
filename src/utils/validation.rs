use crate::utils::time_window::WindowFilter;
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Rejected tip request parameters
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Date must be in YYYY-MM-DD format, got '{0}'")]
    Date(String),
    #[error("{0}")]
    TimeWindow(String),
    #[error("Limit must be {expected}, got '{got}'")]
    Limit { expected: String, got: String },
}

impl ValidationError {
    /// Short error title used in JSON error bodies
    pub fn title(&self) -> &'static str {
        match self {
            ValidationError::Date(_) => "Invalid date format",
            ValidationError::TimeWindow(_) => "Invalid time window",
            ValidationError::Limit { .. } => "Invalid limit",
        }
    }
}

/// Which result counts a caller may ask for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitPolicy {
    Allowed(Vec<usize>),
    Range { min: usize, max: usize },
}

impl Default for LimitPolicy {
    fn default() -> Self {
        LimitPolicy::Allowed(vec![3, 6, 8, 10])
    }
}

impl LimitPolicy {
    pub fn accepts(&self, limit: usize) -> bool {
        match self {
            LimitPolicy::Allowed(values) => values.contains(&limit),
            LimitPolicy::Range { min, max } => (*min..=*max).contains(&limit),
        }
    }

    pub fn bounds(&self) -> (usize, usize) {
        match self {
            LimitPolicy::Allowed(values) => (
                values.iter().copied().min().unwrap_or(0),
                values.iter().copied().max().unwrap_or(0),
            ),
            LimitPolicy::Range { min, max } => (*min, *max),
        }
    }

    /// Explicitly allowed values; empty for a range
    pub fn values(&self) -> Vec<usize> {
        match self {
            LimitPolicy::Allowed(values) => values.clone(),
            LimitPolicy::Range { .. } => Vec::new(),
        }
    }

    fn describe(&self) -> String {
        match self {
            LimitPolicy::Allowed(values) => format!(
                "one of: {}",
                values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            LimitPolicy::Range { min, max } => format!("between {} and {}", min, max),
        }
    }
}

impl FromStr for LimitPolicy {
    type Err = String;

    /// `"3,6,8,10"` for an allowed set, `"1-100"` for an inclusive range
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((min, max)) = s.split_once('-') {
            let min = min.trim().parse::<usize>().map_err(|e| e.to_string())?;
            let max = max.trim().parse::<usize>().map_err(|e| e.to_string())?;
            if min == 0 || min > max {
                return Err(format!("invalid limit range {}-{}", min, max));
            }
            return Ok(LimitPolicy::Range { min, max });
        }

        let values = s
            .split(',')
            .map(|v| v.trim().parse::<usize>().map_err(|e| e.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        if values.is_empty() || values.contains(&0) {
            return Err("limit values must be positive".to_string());
        }
        Ok(LimitPolicy::Allowed(values))
    }
}

/// A validated request for tips
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TipRequest {
    pub date: NaiveDate,
    pub time_window: WindowFilter,
    pub limit: usize,
}

impl TipRequest {
    /// Validate raw parameters. Missing values fall back to `today`, `all`
    /// and `default_limit`.
    pub fn parse(
        date: Option<&str>,
        time_window: Option<&str>,
        limit: Option<&str>,
        limits: &LimitPolicy,
        default_limit: usize,
        today: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let date = match date {
            Some(raw) => parse_date(raw)?,
            None => today,
        };

        let time_window = time_window
            .unwrap_or("all")
            .parse::<WindowFilter>()
            .map_err(ValidationError::TimeWindow)?;

        let limit = match limit {
            Some(raw) => raw.trim().parse::<usize>().ok(),
            None => Some(default_limit),
        }
        .filter(|l| limits.accepts(*l))
        .ok_or_else(|| ValidationError::Limit {
            expected: limits.describe(),
            got: limit.map(str::to_string).unwrap_or_else(|| default_limit.to_string()),
        })?;

        Ok(Self {
            date,
            time_window,
            limit,
        })
    }
}

/// Parse a strict `YYYY-MM-DD` calendar date
static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap());

pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    if !DATE_SHAPE.is_match(raw) {
        return Err(ValidationError::Date(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ValidationError::Date(raw.to_string()))
}
