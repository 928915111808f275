//! Trading calendars.
//!
//! A calendar answers one question for ingestion: which sessions fall inside
//! `[start, end]`. Sessions are returned as UTC midnight instants, the way an
//! exchange calendar labels them; the aligner strips the timezone before
//! reindexing.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("invalid session range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("calendar config error: {0}")]
    Config(String),
}

/// Source of official trading sessions.
pub trait TradingCalendar {
    /// Calendar name, e.g. `NYSE`.
    fn name(&self) -> &str;

    /// All sessions in `[start, end]`, ascending.
    fn sessions_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DateTime<Utc>>, CalendarError>;
}

/// Weekday calendar minus an explicit holiday list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidayCalendar {
    name: String,
    holidays: BTreeSet<NaiveDate>,
}

#[derive(Deserialize)]
struct CalendarFile {
    name: String,
    #[serde(default)]
    holidays: Vec<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new(name: impl Into<String>, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            name: name.into(),
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Monday to Friday, no holidays.
    pub fn weekdays(name: impl Into<String>) -> Self {
        Self::new(name, std::iter::empty())
    }

    /// Parse a calendar from TOML: `name = "NYSE"` plus `holidays = ["2015-01-01", ...]`.
    pub fn from_toml(content: &str) -> Result<Self, CalendarError> {
        let file: CalendarFile = toml::from_str(content)
            .map_err(|e| CalendarError::Config(format!("parse calendar TOML: {e}")))?;
        Ok(Self::new(file.name, file.holidays))
    }

    pub fn from_file(path: &Path) -> Result<Self, CalendarError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CalendarError::Config(format!("read calendar file {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn is_session(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }
}

impl TradingCalendar for HolidayCalendar {
    fn name(&self) -> &str {
        &self.name
    }

    fn sessions_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DateTime<Utc>>, CalendarError> {
        if start > end {
            return Err(CalendarError::InvalidRange { start, end });
        }

        let mut sessions = Vec::new();
        let mut current = start;
        while current <= end {
            if self.is_session(current) {
                sessions.push(session_label(current));
            }
            current += Duration::days(1);
        }
        Ok(sessions)
    }
}

/// Session label for a date: midnight UTC.
pub fn session_label(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
