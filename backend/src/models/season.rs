//! Seasons and record selectors.
//!
//! Seasons are half-years numbered from 1: season 1 starts 2013-01-01 UTC,
//! season 2 starts 2013-07-01 UTC, and so on.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StatsError;

const FIRST_SEASON_YEAR: i32 = 2013;

/// A numbered half-year season.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Season(pub u32);

impl Season {
    pub fn new(number: u32) -> Self {
        Season(number)
    }

    pub fn number(&self) -> u32 {
        self.0
    }

    /// First instant of the season.
    pub fn start_datetime(&self) -> DateTime<Utc> {
        let extra_half_years = self.0.saturating_sub(1) as i32;
        let year = FIRST_SEASON_YEAR + extra_half_years / 2;
        let month = if extra_half_years % 2 == 1 { 7 } else { 1 };
        first_of_month(year, month)
    }

    /// Last instant of the season (one microsecond before the next one starts).
    pub fn end_datetime(&self) -> DateTime<Utc> {
        Season(self.0 + 1).start_datetime() - Duration::microseconds(1)
    }

    /// The season containing `datetime`. Instants before the first season
    /// map to season 1.
    pub fn containing(datetime: DateTime<Utc>) -> Self {
        let year_diff = datetime.year() - FIRST_SEASON_YEAR;
        let mut number = year_diff * 2 + 1;
        if datetime.month() >= 7 {
            number += 1;
        }
        Season(number.max(1) as u32)
    }

    /// Whether `datetime` falls inside this season.
    pub fn contains(&self, datetime: DateTime<Utc>) -> bool {
        datetime >= self.start_datetime() && datetime <= self.end_datetime()
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Season {}", self.0)
    }
}

fn first_of_month(year: i32, month: u32) -> DateTime<Utc> {
    // Only out of chrono's range for absurd season numbers.
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Restricts records to one season or lets all seasons through.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonSelector {
    #[default]
    All,
    Only(Season),
}

impl SeasonSelector {
    pub fn matches(&self, season: Season) -> bool {
        match self {
            SeasonSelector::All => true,
            SeasonSelector::Only(selected) => *selected == season,
        }
    }

    /// Human-readable label for chart titles.
    pub fn label(&self) -> String {
        match self {
            SeasonSelector::All => "All time".to_string(),
            SeasonSelector::Only(season) => season.to_string(),
        }
    }
}

impl FromStr for SeasonSelector {
    type Err = StatsError;

    /// Accepts `all`, `0`, `S<n>`, `season <n>` or a bare season number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_lowercase();
        if text.is_empty() || text == "all" || text == "all-time" {
            return Ok(SeasonSelector::All);
        }

        let digits = text
            .strip_prefix("season")
            .or_else(|| text.strip_prefix('s'))
            .unwrap_or(&text)
            .trim();

        let number: u32 = digits
            .parse()
            .map_err(|_| StatsError::invalid_selector(format!("Unknown season: {}", s)))?;

        if number == 0 {
            Ok(SeasonSelector::All)
        } else {
            Ok(SeasonSelector::Only(Season(number)))
        }
    }
}

/// Restricts records to one player count or lets any count through.
///
/// Range validation happens against the configured rules in the record
/// filter, since the supported range is part of the game configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerCountSelector {
    #[default]
    Any,
    Exactly(u32),
}

impl PlayerCountSelector {
    pub fn matches(&self, player_count: u32) -> bool {
        match self {
            PlayerCountSelector::Any => true,
            PlayerCountSelector::Exactly(n) => *n == player_count,
        }
    }

    pub fn label(&self) -> String {
        match self {
            PlayerCountSelector::Any => "Any".to_string(),
            PlayerCountSelector::Exactly(n) => format!("{} players", n),
        }
    }
}

impl FromStr for PlayerCountSelector {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_lowercase();
        if text.is_empty() || text == "any" || text == "all" {
            return Ok(PlayerCountSelector::Any);
        }
        text.parse::<u32>()
            .map(PlayerCountSelector::Exactly)
            .map_err(|_| StatsError::invalid_selector(format!("Unknown player count: {}", s)))
    }
}
