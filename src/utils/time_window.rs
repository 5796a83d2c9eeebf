use chrono::{DateTime, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed buckets of the day a kickoff hour falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "0-8")]
    Night,
    #[serde(rename = "8-16")]
    Day,
    #[serde(rename = "16-24")]
    Evening,
    /// Hours outside [0, 24)
    #[serde(rename = "other")]
    Other,
}

impl TimeWindow {
    /// The three real windows, in hour order
    pub const ALL: [TimeWindow; 3] = [TimeWindow::Night, TimeWindow::Day, TimeWindow::Evening];

    /// Hour range `[start, end)` covered by the window
    pub fn hours(&self) -> Option<(u32, u32)> {
        match self {
            TimeWindow::Night => Some((0, 8)),
            TimeWindow::Day => Some((8, 16)),
            TimeWindow::Evening => Some((16, 24)),
            TimeWindow::Other => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeWindow::Night => "0-8",
            TimeWindow::Day => "8-16",
            TimeWindow::Evening => "16-24",
            TimeWindow::Other => "other",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TimeWindow::Night => "00:00-08:00",
            TimeWindow::Day => "08:00-16:00",
            TimeWindow::Evening => "16:00-24:00",
            TimeWindow::Other => "outside the day",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bucket an hour of the day into its window
pub fn classify(hour: u32) -> TimeWindow {
    TimeWindow::ALL
        .into_iter()
        .find(|w| matches!(w.hours(), Some((start, end)) if hour >= start && hour < end))
        .unwrap_or(TimeWindow::Other)
}

/// The window a request asks for: every hour, or exactly one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFilter {
    All,
    Only(TimeWindow),
}

impl WindowFilter {
    pub fn matches(&self, hour: u32) -> bool {
        match self {
            WindowFilter::All => true,
            WindowFilter::Only(window) => classify(hour) == *window,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WindowFilter::All => "all",
            WindowFilter::Only(window) => window.label(),
        }
    }

    /// Every accepted request label
    pub fn labels() -> [&'static str; 4] {
        ["all", "0-8", "8-16", "16-24"]
    }
}

impl FromStr for WindowFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(WindowFilter::All),
            "0-8" => Ok(WindowFilter::Only(TimeWindow::Night)),
            "8-16" => Ok(WindowFilter::Only(TimeWindow::Day)),
            "16-24" => Ok(WindowFilter::Only(TimeWindow::Evening)),
            other => Err(format!(
                "Time window must be one of: {}, got '{}'",
                WindowFilter::labels().join(", "),
                other
            )),
        }
    }
}

impl Serialize for WindowFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Which clock the kickoff hour is read on before classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HourBasis {
    #[default]
    Utc,
    Local,
}

impl HourBasis {
    pub fn hour_of(&self, kickoff: &DateTime<Utc>) -> u32 {
        match self {
            HourBasis::Utc => kickoff.hour(),
            HourBasis::Local => kickoff.with_timezone(&Local).hour(),
        }
    }
}

impl FromStr for HourBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utc" => Ok(HourBasis::Utc),
            "local" => Ok(HourBasis::Local),
            other => Err(format!("expected 'utc' or 'local', got '{}'", other)),
        }
    }
}
