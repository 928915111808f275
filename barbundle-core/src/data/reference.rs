//! Futures root symbol reference table (`futures_meta/meta.csv`).
//!
//! Read once per run and shared read-only by calibration and metadata.
//! The first CSV column is the integer id; the remaining columns are matched
//! by header name.

use std::io::Read;
use std::path::Path;

use crate::domain::RootSymbol;

use super::provider::{parse_value, DataError};

/// One root symbol with its exchange and minor currency adjustment factor.
#[derive(Debug, Clone, PartialEq)]
pub struct RootSymbolEntry {
    pub id: i64,
    pub root_symbol: String,
    pub exchange: String,
    /// Multiplier taking quoted prices to major currency units (0.01 for
    /// contracts quoted in cents, 1.0 otherwise).
    pub minor_fx_adj: f64,
    pub description: Option<String>,
    pub sector: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RootSymbolTable {
    entries: Vec<RootSymbolEntry>,
}

impl RootSymbolTable {
    pub fn from_path(path: &Path) -> Result<Self, DataError> {
        let file = std::fs::File::open(path).map_err(|e| DataError::ReadFailed {
            location: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_reader(file, &path.display().to_string())
    }

    pub fn from_reader<R: Read>(reader: R, location: &str) -> Result<Self, DataError> {
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

        let root_col = require("root_symbol")?;
        let exchange_col = require("exchange")?;
        let fx_col = find("minor_fx_adj");
        let description_col = find("description");
        let sector_col = find("sector");

        let mut entries = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record.map_err(read_err)?;
            let cell = |idx: usize| record.get(idx).unwrap_or("").to_string();
            let optional = |idx: Option<usize>| {
                idx.map(cell).filter(|s| !s.is_empty())
            };
            let parse_err = |field: &str, raw: String| DataError::ParseField {
                location: location.to_string(),
                row: row + 1,
                field: field.to_string(),
                raw,
            };

            let raw_id = cell(0);
            let id = raw_id
                .parse::<i64>()
                .map_err(|_| parse_err("id", raw_id.clone()))?;

            let minor_fx_adj = match fx_col.map(cell) {
                Some(raw) => {
                    let v = parse_value(&raw).map_err(|_| parse_err("minor_fx_adj", raw))?;
                    if v.is_nan() {
                        1.0
                    } else {
                        v
                    }
                }
                None => 1.0,
            };

            entries.push(RootSymbolEntry {
                id,
                root_symbol: cell(root_col),
                exchange: cell(exchange_col),
                minor_fx_adj,
                description: optional(description_col),
                sector: optional(sector_col),
            });
        }

        Ok(Self { entries })
    }

    pub fn get(&self, root_symbol: &str) -> Option<&RootSymbolEntry> {
        self.entries.iter().find(|e| e.root_symbol == root_symbol)
    }

    /// Look up an entry, reporting which instrument asked for it on failure.
    pub fn resolve(&self, symbol: &str, root_symbol: &str) -> Result<&RootSymbolEntry, DataError> {
        self.get(root_symbol)
            .ok_or_else(|| DataError::UnknownRootSymbol {
                symbol: symbol.to_string(),
                root_symbol: root_symbol.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Root symbols for the asset writer. The currency adjustment has already
    /// been applied to prices, so it is not carried.
    pub fn to_root_symbols(&self) -> Vec<RootSymbol> {
        self.entries
            .iter()
            .map(|e| RootSymbol {
                root_symbol_id: e.id,
                root_symbol: e.root_symbol.clone(),
                exchange: e.exchange.clone(),
                description: e.description.clone(),
                sector: e.sector.clone(),
            })
            .collect()
    }
}
