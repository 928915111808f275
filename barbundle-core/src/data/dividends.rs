//! Dividend extraction from an aligned equity series.

use crate::domain::{DividendRow, EquityRow, Sid};

/// One dividend row per session with a non-zero dividend.
pub fn extract_dividends(sid: Sid, rows: &[EquityRow]) -> Vec<DividendRow> {
    rows.iter()
        .filter(|r| r.dividend != 0.0 && !r.dividend.is_nan())
        .map(|r| DividendRow::on_ex_date(sid, r.date, r.dividend))
        .collect()
}
