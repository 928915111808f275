//! The ingest contract and the registry of named bundles.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use barbundle_core::calendar::{CalendarError, TradingCalendar};
use barbundle_core::data::{DataError, IngestProgress, SilentProgress, StdoutProgress};
use barbundle_core::writer::{
    AdjustmentWriter, AssetDbWriter, DailyBarWriter, MinuteBarWriter, WriterError,
};

use crate::config::{ConfigError, IngestConfig};
use crate::equities::DatabaseBundle;
use crate::futures::RandomFuturesBundle;

/// Errors that abort an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("calendar error: {0}")]
    Calendar(#[from] CalendarError),

    #[error("writer error: {0}")]
    Writer(#[from] WriterError),

    #[error("unknown bundle '{name}' (available: {available})")]
    UnknownBundle { name: String, available: String },
}

impl IngestError {
    /// True when the run never reached the data, e.g. nothing to ingest.
    pub fn is_configuration(&self) -> bool {
        match self {
            IngestError::Config(_) | IngestError::UnknownBundle { .. } => true,
            IngestError::Data(e) => e.is_configuration(),
            _ => false,
        }
    }
}

/// Everything a bundle needs for one ingestion.
pub struct IngestContext<'a> {
    pub environ: &'a BTreeMap<String, String>,
    pub asset_db_writer: &'a mut dyn AssetDbWriter,
    pub minute_bar_writer: &'a mut dyn MinuteBarWriter,
    pub daily_bar_writer: &'a mut dyn DailyBarWriter,
    pub adjustment_writer: &'a mut dyn AdjustmentWriter,
    pub calendar: &'a dyn TradingCalendar,
    pub start_session: NaiveDate,
    pub end_session: NaiveDate,
    pub cache: &'a Path,
    pub show_progress: bool,
    pub output_dir: &'a Path,
}

impl IngestContext<'_> {
    pub fn progress(&self) -> Box<dyn IngestProgress> {
        if self.show_progress {
            Box::new(StdoutProgress)
        } else {
            Box::new(SilentProgress)
        }
    }
}

/// What a finished ingestion produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub bundle: String,
    pub instruments: usize,
    pub bars: usize,
    pub dividends: usize,
    pub data_hash: String,
}

/// A named ingestion pipeline.
pub trait Bundle {
    fn name(&self) -> &str;

    fn ingest(&self, ctx: IngestContext<'_>) -> Result<IngestReport, IngestError>;
}

/// Bundles available to a run, keyed by name.
#[derive(Default)]
pub struct BundleRegistry {
    bundles: BTreeMap<String, Box<dyn Bundle>>,
}

impl BundleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every bundle whose source section is present in `config`.
    pub fn from_config(config: &IngestConfig) -> Self {
        let mut registry = Self::new();
        if let Some(futures) = &config.futures {
            registry.register(Box::new(RandomFuturesBundle::new(futures.clone())));
        }
        if let Some(database) = &config.database {
            registry.register(Box::new(DatabaseBundle::new(database.clone())));
        }
        registry
    }

    /// Add a bundle, replacing any previous one with the same name.
    pub fn register(&mut self, bundle: Box<dyn Bundle>) {
        self.bundles.insert(bundle.name().to_string(), bundle);
    }

    pub fn get(&self, name: &str) -> Result<&dyn Bundle, IngestError> {
        self.bundles
            .get(name)
            .map(|b| b.as_ref())
            .ok_or_else(|| IngestError::UnknownBundle {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.bundles.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, FuturesConfig};

    fn config(futures: bool, database: bool) -> IngestConfig {
        IngestConfig {
            bundle: "random-futures".into(),
            start_session: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            end_session: NaiveDate::from_ymd_opt(2015, 12, 31).unwrap(),
            output_dir: "out".into(),
            show_progress: false,
            cache_dir: None,
            calendar: Default::default(),
            futures: futures.then(|| FuturesConfig::new("data")),
            database: database.then(|| DatabaseConfig::new("history.duckdb")),
            environ: BTreeMap::new(),
        }
    }

    #[test]
    fn registry_holds_configured_bundles_sorted() {
        let registry = BundleRegistry::from_config(&config(true, true));
        assert_eq!(registry.names(), vec!["database", "random-futures"]);
        assert_eq!(registry.get("database").unwrap().name(), "database");
    }

    #[test]
    fn unconfigured_bundle_is_unknown() {
        let registry = BundleRegistry::from_config(&config(true, false));
        let err = registry.get("database").err().unwrap();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("random-futures"));
    }
}
