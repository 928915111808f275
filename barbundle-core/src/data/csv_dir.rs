//! Directory of per-contract futures CSV files.
//!
//! Layout: `{dir}/{SYMBOL}.csv`, one file per contract.
//!
//! CSV column contract (header row required, names case-insensitive):
//!
//! | Column            | Notes                                   |
//! |-------------------|-----------------------------------------|
//! | first column      | Date index, `YYYY-MM-DD`                |
//! | `open` .. `close` | Prices in quoted currency units         |
//! | `volume`          |                                         |
//! | `openinterest`    | Optional                                |
//! | `expiration_date` | Optional, kept as text                  |
//! | `root_symbol`     | Key into the root symbol table          |
//! | `symbol`          | Contract symbol                         |

use std::fs;
use std::path::PathBuf;

use crate::domain::FuturesRow;

use super::align::canonicalize;
use super::provider::{parse_date, parse_value, DataError, InstrumentSource};

const EXTENSION: &str = "csv";

pub struct FuturesDirectory {
    dir: PathBuf,
}

impl FuturesDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.{EXTENSION}"))
    }
}

impl InstrumentSource for FuturesDirectory {
    type Row = FuturesRow;

    fn location(&self) -> String {
        self.dir.display().to_string()
    }

    fn enumerate(&self) -> Result<Vec<String>, DataError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| DataError::ReadFailed {
            location: self.location(),
            reason: e.to_string(),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DataError::ReadFailed {
                location: self.location(),
                reason: e.to_string(),
            })?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                symbols.push(stem.to_string());
            }
        }

        if symbols.is_empty() {
            return Err(DataError::NoInstruments {
                location: self.location(),
            });
        }

        symbols.sort();
        Ok(symbols)
    }

    fn load(&self, symbol: &str) -> Result<Vec<FuturesRow>, DataError> {
        let path = self.file_path(symbol);
        let file = fs::File::open(&path).map_err(|e| DataError::ReadFailed {
            location: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let rows = parse_futures_csv(file, &path.display().to_string())?;
        if rows.is_empty() {
            return Err(DataError::EmptySeries {
                symbol: symbol.to_string(),
            });
        }
        Ok(canonicalize(rows))
    }
}

/// Parse futures rows from any reader. Row order is preserved.
pub fn parse_futures_csv<R: std::io::Read>(
    reader: R,
    location: &str,
) -> Result<Vec<FuturesRow>, DataError> {
    let read_err = |e: csv::Error| DataError::ReadFailed {
        location: location.to_string(),
        reason: e.to_string(),
    };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().map_err(read_err)?.clone();
    let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let require = |name: &str| {
        find(name).ok_or_else(|| DataError::MissingColumn {
            location: location.to_string(),
            column: name.to_string(),
        })
    };

    let open = require("open")?;
    let high = require("high")?;
    let low = require("low")?;
    let close = require("close")?;
    let volume = require("volume")?;
    let root_symbol = require("root_symbol")?;
    let symbol = require("symbol")?;
    let open_interest = find("openinterest");
    let expiration = find("expiration_date");

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(read_err)?;
        let row = i + 1;
        let cell = |idx: usize| record.get(idx).unwrap_or("");
        let text = |idx: Option<usize>| {
            idx.map(cell)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let number = |idx: usize, field: &str| {
            parse_value(cell(idx)).map_err(|_| DataError::ParseField {
                location: location.to_string(),
                row,
                field: field.to_string(),
                raw: cell(idx).to_string(),
            })
        };

        let date = parse_date(cell(0)).ok_or_else(|| DataError::ParseField {
            location: location.to_string(),
            row,
            field: "date".to_string(),
            raw: cell(0).to_string(),
        })?;

        rows.push(FuturesRow {
            date,
            open: number(open, "open")?,
            high: number(high, "high")?,
            low: number(low, "low")?,
            close: number(close, "close")?,
            volume: number(volume, "volume")?,
            open_interest: match open_interest {
                Some(idx) => number(idx, "openinterest")?,
                None => 0.0,
            },
            expiration_date: text(expiration),
            root_symbol: text(Some(root_symbol)),
            symbol: text(Some(symbol)),
        });
    }

    Ok(rows)
}
