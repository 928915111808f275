//! Bars: raw source rows and the OHLCV rows handed to bar writers.
//!
//! Missing values are carried as NaN (the same convention as a void bar) so a
//! reindexed session can be represented before forward-fill resolves it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::data::align::SessionRow;

/// Daily OHLCV bar as persisted into a bundle.
///
/// Volume is a float because source data may carry fractional or missing
/// volume; writers store it as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Intraday OHLCV bar. No pipeline in this workspace produces these; the type
/// exists so the minute writer slot of the ingest contract is typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinuteBar {
    pub dt: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// One row of a futures contract CSV file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuturesRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub open_interest: f64,
    pub expiration_date: Option<String>,
    pub root_symbol: Option<String>,
    pub symbol: Option<String>,
}

impl FuturesRow {
    /// Drop the contract columns, keeping only what the bar writer stores.
    pub fn to_daily_bar(&self) -> DailyBar {
        DailyBar {
            date: self.date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

impl SessionRow for FuturesRow {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn missing(date: NaiveDate) -> Self {
        Self {
            date,
            open: f64::NAN,
            high: f64::NAN,
            low: f64::NAN,
            close: f64::NAN,
            volume: f64::NAN,
            open_interest: f64::NAN,
            expiration_date: None,
            root_symbol: None,
            symbol: None,
        }
    }

    fn fill_from(&mut self, prev: &Self) {
        fill_nan(&mut self.open, prev.open);
        fill_nan(&mut self.high, prev.high);
        fill_nan(&mut self.low, prev.low);
        fill_nan(&mut self.close, prev.close);
        fill_nan(&mut self.volume, prev.volume);
        fill_nan(&mut self.open_interest, prev.open_interest);
        fill_none(&mut self.expiration_date, &prev.expiration_date);
        fill_none(&mut self.root_symbol, &prev.root_symbol);
        fill_none(&mut self.symbol, &prev.symbol);
    }

    // expiration_date is informational only and may be blank in source files.
    fn is_complete(&self) -> bool {
        [
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
            self.open_interest,
        ]
        .iter()
        .all(|v| !v.is_nan())
            && self.root_symbol.is_some()
            && self.symbol.is_some()
    }
}

/// One row of the equity history table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub dividend: f64,
}

impl EquityRow {
    pub fn to_daily_bar(&self) -> DailyBar {
        DailyBar {
            date: self.date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

impl SessionRow for EquityRow {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn missing(date: NaiveDate) -> Self {
        Self {
            date,
            open: f64::NAN,
            high: f64::NAN,
            low: f64::NAN,
            close: f64::NAN,
            volume: f64::NAN,
            dividend: f64::NAN,
        }
    }

    /// Prices and volume carry forward. A dividend is an event on its
    /// ex-date, so a filled session gets none.
    fn fill_from(&mut self, prev: &Self) {
        fill_nan(&mut self.open, prev.open);
        fill_nan(&mut self.high, prev.high);
        fill_nan(&mut self.low, prev.low);
        fill_nan(&mut self.close, prev.close);
        fill_nan(&mut self.volume, prev.volume);
        if self.dividend.is_nan() {
            self.dividend = 0.0;
        }
    }

    fn is_complete(&self) -> bool {
        [
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
            self.dividend,
        ]
        .iter()
        .all(|v| !v.is_nan())
    }
}

fn fill_nan(value: &mut f64, prev: f64) {
    if value.is_nan() {
        *value = prev;
    }
}

fn fill_none(value: &mut Option<String>, prev: &Option<String>) {
    if value.is_none() {
        value.clone_from(prev);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn futures_row() -> FuturesRow {
        FuturesRow {
            date: date("2015-01-02"),
            open: 100.0,
            high: 102.0,
            low: 99.0,
            close: 101.0,
            volume: 1200.0,
            open_interest: 5000.0,
            expiration_date: Some("2015-03-20".into()),
            root_symbol: Some("CL".into()),
            symbol: Some("CLH15".into()),
        }
    }

    #[test]
    fn missing_futures_row_is_incomplete() {
        assert!(!FuturesRow::missing(date("2015-01-05")).is_complete());
        assert!(futures_row().is_complete());
    }

    #[test]
    fn futures_fill_copies_every_missing_field() {
        let mut row = FuturesRow::missing(date("2015-01-05"));
        row.fill_from(&futures_row());
        assert!(row.is_complete());
        assert_eq!(row.date, date("2015-01-05"));
        assert_eq!(row.close, 101.0);
        assert_eq!(row.symbol.as_deref(), Some("CLH15"));
    }

    #[test]
    fn futures_fill_keeps_present_values() {
        let mut row = futures_row();
        row.close = 110.0;
        row.volume = f64::NAN;
        row.fill_from(&futures_row());
        assert_eq!(row.close, 110.0);
        assert_eq!(row.volume, 1200.0);
    }

    #[test]
    fn equity_fill_does_not_carry_dividend() {
        let prev = EquityRow {
            date: date("2015-01-02"),
            open: 10.0,
            high: 11.0,
            low: 9.0,
            close: 10.5,
            volume: 100.0,
            dividend: 0.25,
        };
        let mut row = EquityRow::missing(date("2015-01-05"));
        row.fill_from(&prev);
        assert!(row.is_complete());
        assert_eq!(row.close, 10.5);
        assert_eq!(row.dividend, 0.0);
    }

    #[test]
    fn daily_bar_drops_contract_columns() {
        let bar = futures_row().to_daily_bar();
        assert_eq!(bar.date, date("2015-01-02"));
        assert_eq!(bar.volume, 1200.0);
    }
}
