//! Daily-return statistics over a date window of a single price file.
//!
//! Input is a CSV with the date in the first column and a `Close` column.
//! Window bounds may be partial: `2017` means the whole year and `2017-03`
//! the whole month, so a partial start snaps to the first day of the period
//! and a partial end to the last.

use std::fs;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{parse_date, provider::parse_value};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to read {location}: {reason}")]
    Read { location: String, reason: String },

    #[error("{location}: missing column '{column}'")]
    MissingColumn { location: String, column: String },

    #[error("{location}: row {row}: cannot parse {field} from '{raw}'")]
    ParseField {
        location: String,
        row: usize,
        field: String,
        raw: String,
    },

    #[error("invalid window bound '{0}': expected YYYY, YYYY-MM or a full date")]
    InvalidBound(String),

    #[error("window start {start} is after end {end}")]
    EmptyRange { start: NaiveDate, end: NaiveDate },
}

/// A dated close price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Close {
    pub date: NaiveDate,
    pub close: f64,
}

/// Statistics of the daily percentage changes inside a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStats {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Defined (non-NaN) changes inside the window.
    pub observations: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Sample standard deviation (n - 1); needs two observations.
    pub std: Option<f64>,
}

/// Read a price file and report return statistics over `[start, end]`.
pub fn return_window_stats(
    path: impl AsRef<Path>,
    start: &str,
    end: &str,
) -> Result<ReturnStats, AnalysisError> {
    let path = path.as_ref();
    let location = path.display().to_string();
    let file = fs::File::open(path).map_err(|e| AnalysisError::Read {
        location: location.clone(),
        reason: e.to_string(),
    })?;
    let closes = load_closes(file, &location)?;
    window_stats(&closes, start, end)
}

/// Statistics over already loaded closes.
pub fn window_stats(closes: &[Close], start: &str, end: &str) -> Result<ReturnStats, AnalysisError> {
    let start = parse_bound(start)?.0;
    let end = parse_bound(end)?.1;
    if start > end {
        return Err(AnalysisError::EmptyRange { start, end });
    }

    let changes = pct_change(closes);
    let window: Vec<f64> = changes
        .iter()
        .filter(|(date, _)| *date >= start && *date <= end)
        .map(|(_, pct)| *pct)
        .filter(|pct| !pct.is_nan())
        .collect();

    Ok(ReturnStats {
        start,
        end,
        observations: window.len(),
        min: window.iter().copied().reduce(f64::min),
        max: window.iter().copied().reduce(f64::max),
        std: sample_std(&window),
    })
}

/// Parse closes from a CSV reader, returned in date order.
pub fn load_closes<R: Read>(reader: R, location: &str) -> Result<Vec<Close>, AnalysisError> {
    let read_err = |e: csv::Error| AnalysisError::Read {
        location: location.to_string(),
        reason: e.to_string(),
    };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().map_err(read_err)?.clone();
    let close_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("close"))
        .ok_or_else(|| AnalysisError::MissingColumn {
            location: location.to_string(),
            column: "Close".to_string(),
        })?;

    let mut closes = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(read_err)?;
        let parse_err = |field: &str, raw: &str| AnalysisError::ParseField {
            location: location.to_string(),
            row: i + 1,
            field: field.to_string(),
            raw: raw.to_string(),
        };

        let raw_date = record.get(0).unwrap_or("");
        let date = parse_date(raw_date).ok_or_else(|| parse_err("date", raw_date))?;
        let raw_close = record.get(close_idx).unwrap_or("");
        let close = parse_value(raw_close).map_err(|_| parse_err("Close", raw_close))?;
        closes.push(Close { date, close });
    }

    closes.sort_by_key(|c| c.date);
    Ok(closes)
}

/// `close[i] / close[i - 1] - 1`, NaN for the first row.
///
/// Missing closes are padded with the last known close first, so a gap
/// reads as a flat day and the next row compares against the padded value.
pub fn pct_change(closes: &[Close]) -> Vec<(NaiveDate, f64)> {
    let mut prev: Option<f64> = None;
    closes
        .iter()
        .map(|c| {
            let close = if c.close.is_nan() { prev } else { Some(c.close) };
            let pct = match (prev, close) {
                (Some(p), Some(c)) => c / p - 1.0,
                _ => f64::NAN,
            };
            prev = close;
            (c.date, pct)
        })
        .collect()
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}

/// First and last day covered by a bound: a full date, `YYYY-MM`/`YYYY/M`,
/// or `YYYY`.
pub fn parse_bound(raw: &str) -> Result<(NaiveDate, NaiveDate), AnalysisError> {
    let raw = raw.trim();
    let invalid = || AnalysisError::InvalidBound(raw.to_string());

    if let Some(date) = parse_date(raw) {
        return Ok((date, date));
    }

    let parts: Vec<&str> = raw.split(['-', '/']).collect();
    match parts.as_slice() {
        [year] => {
            let year: i32 = year.parse().map_err(|_| invalid())?;
            let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
            let last = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?;
            Ok((first, last))
        }
        [year, month] => {
            let year: i32 = year.parse().map_err(|_| invalid())?;
            let month: u32 = month.parse().map_err(|_| invalid())?;
            let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
            Ok((first, month_end(first)))
        }
        _ => Err(invalid()),
    }
}

fn month_end(first: NaiveDate) -> NaiveDate {
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next.map_or(first, |n| n - Duration::days(1))
}
