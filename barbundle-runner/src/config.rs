//! Serializable ingestion run configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use barbundle_core::calendar::{CalendarError, HolidayCalendar};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One ingestion run.
///
/// ```toml
/// bundle = "random-futures"
/// start_session = "2000-01-03"
/// end_session = "2020-12-31"
/// output_dir = "bundles/random-futures"
///
/// [futures]
/// base_path = "data"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestConfig {
    /// Registered bundle name, e.g. `random-futures` or `database`.
    pub bundle: String,

    /// First session to ingest (inclusive).
    pub start_session: NaiveDate,

    /// Last session to ingest (inclusive).
    pub end_session: NaiveDate,

    /// Bundle directory the writers populate.
    pub output_dir: PathBuf,

    #[serde(default)]
    pub show_progress: bool,

    /// Scratch directory handed to bundles. Defaults to `{output_dir}/.cache`.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    #[serde(default)]
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub futures: Option<FuturesConfig>,

    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Free-form environment passed through to bundles.
    #[serde(default)]
    pub environ: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarConfig {
    #[serde(default = "default_calendar_name")]
    pub name: String,

    #[serde(default)]
    pub holidays: Vec<NaiveDate>,

    /// Calendar TOML file; replaces `name` and `holidays` when set.
    #[serde(default)]
    pub holidays_file: Option<PathBuf>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            name: default_calendar_name(),
            holidays: Vec::new(),
            holidays_file: None,
        }
    }
}

impl CalendarConfig {
    pub fn build(&self) -> Result<HolidayCalendar, CalendarError> {
        match &self.holidays_file {
            Some(path) => HolidayCalendar::from_file(path),
            None => Ok(HolidayCalendar::new(
                self.name.clone(),
                self.holidays.iter().copied(),
            )),
        }
    }
}

/// Directory of per-contract CSV files plus the root symbol table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FuturesConfig {
    pub base_path: PathBuf,

    #[serde(default = "default_futures_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_futures_meta_path")]
    pub meta_path: PathBuf,

    /// Rows dated before this are dropped after alignment.
    #[serde(default = "default_futures_cutoff")]
    pub cutoff: NaiveDate,
}

impl FuturesConfig {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            data_dir: default_futures_data_dir(),
            meta_path: default_futures_meta_path(),
            cutoff: default_futures_cutoff(),
        }
    }

    pub fn data_path(&self) -> PathBuf {
        self.base_path.join(&self.data_dir)
    }

    pub fn root_symbols_path(&self) -> PathBuf {
        self.base_path.join(&self.meta_path)
    }
}

/// DuckDB file holding the `equity_history` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    pub path: PathBuf,

    #[serde(default = "default_exchange")]
    pub exchange: String,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            exchange: default_exchange(),
        }
    }
}

fn default_calendar_name() -> String {
    "NYSE".to_string()
}

fn default_exchange() -> String {
    "NYSE".to_string()
}

fn default_futures_data_dir() -> PathBuf {
    PathBuf::from("random_futures")
}

fn default_futures_meta_path() -> PathBuf {
    PathBuf::from("futures_meta/meta.csv")
}

fn default_futures_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

impl IngestConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bundle.trim().is_empty() {
            return Err(ConfigError::Invalid("bundle name is empty".into()));
        }
        if self.start_session > self.end_session {
            return Err(ConfigError::Invalid(format!(
                "start_session {} is after end_session {}",
                self.start_session, self.end_session
            )));
        }
        if self.futures.is_none() && self.database.is_none() {
            return Err(ConfigError::Invalid(
                "no [futures] or [database] source configured".into(),
            ));
        }
        Ok(())
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join(".cache"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
bundle = "random-futures"
start_session = "2000-01-03"
end_session = "2020-12-31"
output_dir = "bundles/random-futures"
show_progress = true

[calendar]
name = "NYSE"
holidays = ["2015-01-01", "2015-12-25"]

[futures]
base_path = "data"
cutoff = "2001-01-01"

[database]
path = "history.duckdb"

[environ]
BARBUNDLE_ROOT = "/tmp/bundles"
"#;

    #[test]
    fn parses_full_config() {
        let config = IngestConfig::from_toml(FULL).unwrap();
        assert_eq!(config.bundle, "random-futures");
        assert!(config.show_progress);
        assert_eq!(config.calendar.holidays.len(), 2);
        assert_eq!(config.environ["BARBUNDLE_ROOT"], "/tmp/bundles");

        let futures = config.futures.unwrap();
        assert_eq!(futures.data_path(), PathBuf::from("data/random_futures"));
        assert_eq!(
            futures.root_symbols_path(),
            PathBuf::from("data/futures_meta/meta.csv")
        );
        assert_eq!(futures.cutoff, NaiveDate::from_ymd_opt(2001, 1, 1).unwrap());

        assert_eq!(config.database.unwrap().exchange, "NYSE");
    }

    #[test]
    fn defaults_apply_to_minimal_config() {
        let config = IngestConfig::from_toml(
            r#"
bundle = "database"
start_session = "2015-01-02"
end_session = "2015-12-31"
output_dir = "out"

[database]
path = "history.duckdb"
"#,
        )
        .unwrap();
        assert!(!config.show_progress);
        assert_eq!(config.calendar.name, "NYSE");
        assert_eq!(config.cache_dir(), PathBuf::from("out/.cache"));
        assert!(config.futures.is_none());
    }

    #[test]
    fn futures_cutoff_defaults_to_2000() {
        let futures = FuturesConfig::new("data");
        assert_eq!(futures.cutoff, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
    }

    #[test]
    fn inverted_session_range_is_rejected() {
        let err = IngestConfig::from_toml(
            r#"
bundle = "database"
start_session = "2016-01-01"
end_session = "2015-01-01"
output_dir = "out"

[database]
path = "history.duckdb"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn config_without_sources_is_rejected() {
        let err = IngestConfig::from_toml(
            r#"
bundle = "database"
start_session = "2015-01-01"
end_session = "2015-12-31"
output_dir = "out"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn calendar_config_builds_holiday_calendar() {
        use barbundle_core::calendar::TradingCalendar;

        let config = CalendarConfig {
            name: "XCME".into(),
            holidays: vec![NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()],
            holidays_file: None,
        };
        let calendar = config.build().unwrap();
        assert_eq!(calendar.name(), "XCME");
        assert!(!calendar.is_session(NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()));
    }
}
