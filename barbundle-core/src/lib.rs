//! barbundle core: domain types, trading calendar, sources, transforms and writers.
//!
//! This crate holds everything a bundle ingestion needs below the run level:
//! - Domain types (daily bars, raw source rows, sids, asset metadata, adjustments)
//! - Trading calendar trait and a holiday-list exchange calendar
//! - Instrument sources: a directory of futures CSV files and a DuckDB equity history
//! - Per-instrument transforms: calibration, calendar alignment, metadata, dividends
//! - Bundle writer traits with Parquet and in-memory implementations
//! - Return-window statistics over a single price file

pub mod analysis;
pub mod calendar;
pub mod data;
pub mod domain;
pub mod writer;
