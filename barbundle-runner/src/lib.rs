//! barbundle runner: run configuration, bundle registry and ingestion pipelines.
//!
//! This crate builds on `barbundle-core` to provide:
//! - TOML run configuration
//! - The ingest contract (`IngestContext` + `Bundle`) and a registry of named bundles
//! - The per-instrument fold that feeds bar writers lazily
//! - `random-futures` (CSV directory) and `database` (DuckDB) pipelines
//! - A run driver writing a Parquet bundle and its manifest

pub mod accumulate;
pub mod bundle;
pub mod config;
pub mod equities;
pub mod futures;
pub mod run;

pub use accumulate::{emit_bars, IngestStep, TableAccumulator};
pub use bundle::{Bundle, BundleRegistry, IngestContext, IngestError, IngestReport};
pub use config::{CalendarConfig, ConfigError, DatabaseConfig, FuturesConfig, IngestConfig};
pub use equities::{equity_step, DatabaseBundle, DATABASE};
pub use futures::{futures_step, RandomFuturesBundle, RANDOM_FUTURES};
pub use run::run_ingest;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_is_send_sync() {
        assert_send::<IngestConfig>();
        assert_sync::<IngestConfig>();
    }

    #[test]
    fn report_is_send_sync() {
        assert_send::<IngestReport>();
        assert_sync::<IngestReport>();
    }

    #[test]
    fn bundles_are_send_sync() {
        assert_send::<RandomFuturesBundle>();
        assert_sync::<RandomFuturesBundle>();
        assert_send::<DatabaseBundle>();
        assert_sync::<DatabaseBundle>();
    }
}
