//! Instrument source trait, structured error types and progress reporting.
//!
//! The `InstrumentSource` trait abstracts over where raw rows come from (a
//! directory of CSV files, a database table) so the pipelines can be driven by
//! either, and mocked in tests.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::Sid;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Nothing to ingest. This is a configuration problem rather than bad data.
    #[error("no symbols found in {location}")]
    NoInstruments { location: String },

    #[error("failed to read {location}: {reason}")]
    ReadFailed { location: String, reason: String },

    #[error("{location}: missing required column '{column}'")]
    MissingColumn { location: String, column: String },

    #[error("{location} row {row}: cannot parse {field} from '{raw}'")]
    ParseField {
        location: String,
        row: usize,
        field: String,
        raw: String,
    },

    #[error("no rows for symbol '{symbol}'")]
    EmptySeries { symbol: String },

    #[error("no trading sessions left for symbol '{symbol}' after calendar alignment")]
    NoSessions { symbol: String },

    #[error("root symbol '{root_symbol}' of '{symbol}' is not in the reference table")]
    UnknownRootSymbol { symbol: String, root_symbol: String },

    #[error("database error: {0}")]
    DuckDb(#[from] duckdb::Error),
}

impl DataError {
    /// True for errors raised because the run is misconfigured, not because an
    /// instrument's data is bad.
    pub fn is_configuration(&self) -> bool {
        matches!(self, DataError::NoInstruments { .. })
    }
}

/// A source of per-instrument raw rows.
pub trait InstrumentSource {
    type Row;

    /// Human-readable description of where the data lives.
    fn location(&self) -> String;

    /// Identifiers of every available instrument, ascending.
    fn enumerate(&self) -> Result<Vec<String>, DataError>;

    /// Raw rows for one instrument, ascending by date.
    fn load(&self, symbol: &str) -> Result<Vec<Self::Row>, DataError>;
}

/// Parse a date cell. Accepts `YYYY-MM-DD` and `YYYY/M/D`, with an optional
/// trailing time component which is discarded.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().split([' ', 'T']).next()?;
    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
}

/// Parse a numeric cell; blank cells are missing values.
pub fn parse_value(raw: &str) -> Result<f64, std::num::ParseFloatError> {
    let raw = raw.trim();
    if raw.is_empty() {
        Ok(f64::NAN)
    } else {
        raw.parse()
    }
}

/// Progress callback for a per-instrument ingestion loop.
pub trait IngestProgress {
    /// Called before an instrument is loaded.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called once an instrument's bars are ready to emit.
    fn on_complete(&self, symbol: &str, sid: Sid, bars: usize);

    /// Called after the bar writer has consumed every instrument.
    fn on_batch_complete(&self, instruments: usize, bars: usize);
}

/// Progress reporter that prints to stdout.
pub struct StdoutProgress;

impl IngestProgress for StdoutProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        println!("[{}/{}] Loading data... {symbol}", index + 1, total);
    }

    fn on_complete(&self, symbol: &str, sid: Sid, bars: usize) {
        println!("  OK: {symbol} (sid {sid}, {bars} bars)");
    }

    fn on_batch_complete(&self, instruments: usize, bars: usize) {
        println!("\nIngest complete: {instruments} instruments, {bars} bars");
    }
}

/// Progress reporter that prints nothing.
pub struct SilentProgress;

impl IngestProgress for SilentProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {}
    fn on_complete(&self, _symbol: &str, _sid: Sid, _bars: usize) {}
    fn on_batch_complete(&self, _instruments: usize, _bars: usize) {}
}
