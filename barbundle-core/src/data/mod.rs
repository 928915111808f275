//! Instrument sources and per-instrument transforms

pub mod align;
pub mod calibrate;
pub mod csv_dir;
pub mod database;
pub mod dividends;
pub mod metadata;
pub mod provider;
pub mod reference;

pub use align::{
    align_to_sessions, canonicalize, naive_sessions, off_calendar, truncate_before, SessionRow,
};
pub use calibrate::calibrate;
pub use csv_dir::FuturesDirectory;
pub use database::EquityHistoryDb;
pub use dividends::extract_dividends;
pub use metadata::{equity_metadata, future_metadata, FUTURES_TICK_SIZE};
pub use provider::{
    parse_date, DataError, IngestProgress, InstrumentSource, SilentProgress, StdoutProgress,
};
pub use reference::{RootSymbolEntry, RootSymbolTable};
