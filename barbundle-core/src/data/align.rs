//! Calendar alignment.
//!
//! Reindexes one instrument's rows onto the official session sequence:
//! sessions inside `[first raw date, last raw date]` become the index, sessions
//! missing from the source are forward-filled from the prior row, and rows that
//! are still incomplete after the fill (leading gaps) are dropped.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

/// A dated row that can be reindexed and forward-filled.
pub trait SessionRow: Clone {
    fn date(&self) -> NaiveDate;

    /// A row for `date` with every value missing.
    fn missing(date: NaiveDate) -> Self;

    /// Replace each missing value with the corresponding value from `prev`.
    fn fill_from(&mut self, prev: &Self);

    /// True when no value is missing.
    fn is_complete(&self) -> bool;
}

/// Strip the timezone from session labels.
pub fn naive_sessions(sessions: &[DateTime<Utc>]) -> Vec<NaiveDate> {
    sessions.iter().map(|s| s.date_naive()).collect()
}

/// Sort rows by date and drop duplicate dates, keeping the first occurrence.
pub fn canonicalize<R: SessionRow>(mut rows: Vec<R>) -> Vec<R> {
    rows.sort_by_key(|r| r.date());
    rows.dedup_by_key(|r| r.date());
    rows
}

/// Align rows to `sessions` (ascending, timezone-naive).
///
/// Expects canonical rows (see [`canonicalize`]). Raw rows dated on a
/// non-session are discarded and do not feed the forward-fill.
pub fn align_to_sessions<R: SessionRow>(rows: &[R], sessions: &[NaiveDate]) -> Vec<R> {
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return Vec::new();
    };
    let (first, last) = (first.date(), last.date());

    let by_date: HashMap<NaiveDate, &R> = rows.iter().map(|r| (r.date(), r)).collect();

    let mut aligned = Vec::new();
    let mut prev: Option<R> = None;

    for &session in sessions.iter().filter(|d| **d >= first && **d <= last) {
        let mut row = by_date
            .get(&session)
            .map(|r| (*r).clone())
            .unwrap_or_else(|| R::missing(session));

        if let Some(p) = &prev {
            row.fill_from(p);
        }
        if row.is_complete() {
            aligned.push(row.clone());
        }
        prev = Some(row);
    }

    aligned
}

/// Rows dated inside the session span that do not fall on a session.
///
/// Rows outside `[sessions.first(), sessions.last()]` are not counted; they
/// are out of range rather than off the calendar.
pub fn off_calendar<'a, R: SessionRow>(rows: &'a [R], sessions: &[NaiveDate]) -> Vec<&'a R> {
    let (Some(first), Some(last)) = (sessions.first(), sessions.last()) else {
        return Vec::new();
    };
    rows.iter()
        .filter(|r| r.date() >= *first && r.date() <= *last)
        .filter(|r| sessions.binary_search(&r.date()).is_err())
        .collect()
}

/// Keep rows dated on or after `cutoff`.
pub fn truncate_before<R: SessionRow>(rows: Vec<R>, cutoff: NaiveDate) -> Vec<R> {
    rows.into_iter().filter(|r| r.date() >= cutoff).collect()
}
