//! Asset metadata rows handed to the asset database writer.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::ids::Sid;

/// The auto-close date is the day after the last trade.
pub fn auto_close_date(end_date: NaiveDate) -> NaiveDate {
    end_date + Duration::days(1)
}

/// Metadata for one equity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityMetadata {
    pub sid: Sid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub auto_close_date: NaiveDate,
    pub symbol: String,
    pub exchange: String,
}

/// Metadata for one futures contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureMetadata {
    pub sid: Sid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub auto_close_date: NaiveDate,
    pub symbol: String,
    pub root_symbol: String,
    pub expiration_date: NaiveDate,
    pub notice_date: NaiveDate,
    pub tick_size: f64,
    pub exchange: String,
}

/// A futures root symbol as written to the asset database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootSymbol {
    pub root_symbol_id: i64,
    pub root_symbol: String,
    pub exchange: String,
    pub description: Option<String>,
    pub sector: Option<String>,
}
