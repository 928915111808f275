//! Per-instrument metadata rows built from a finalized (aligned) series.

use chrono::NaiveDate;

use crate::domain::{auto_close_date, EquityMetadata, EquityRow, FutureMetadata, FuturesRow, Sid};

use super::align::SessionRow;
use super::provider::DataError;
use super::reference::RootSymbolTable;

/// Placeholder tick size for every futures contract.
pub const FUTURES_TICK_SIZE: f64 = 0.0001;

/// First and last date of a non-empty series.
fn date_span<R: SessionRow>(rows: &[R], symbol: &str) -> Result<(NaiveDate, NaiveDate), DataError> {
    match (rows.first(), rows.last()) {
        (Some(first), Some(last)) => Ok((first.date(), last.date())),
        _ => Err(DataError::NoSessions {
            symbol: symbol.to_string(),
        }),
    }
}

pub fn equity_metadata(
    sid: Sid,
    symbol: &str,
    rows: &[EquityRow],
    exchange: &str,
) -> Result<EquityMetadata, DataError> {
    let (start_date, end_date) = date_span(rows, symbol)?;
    Ok(EquityMetadata {
        sid,
        start_date,
        end_date,
        auto_close_date: auto_close_date(end_date),
        symbol: symbol.to_string(),
        exchange: exchange.to_string(),
    })
}

/// Futures metadata. Symbol and root symbol come from the series' own first
/// row; the exchange from the reference table.
///
/// Expiration is taken as the last trading day and the notice date as the
/// auto-close date; real first-notice dates are not modelled.
pub fn future_metadata(
    sid: Sid,
    symbol: &str,
    rows: &[FuturesRow],
    table: &RootSymbolTable,
) -> Result<FutureMetadata, DataError> {
    let (start_date, end_date) = date_span(rows, symbol)?;
    let first = &rows[0];
    let contract = first.symbol.clone().unwrap_or_else(|| symbol.to_string());
    let root_symbol = first.root_symbol.clone().unwrap_or_default();
    let exchange = table.resolve(symbol, &root_symbol)?.exchange.clone();
    let ac_date = auto_close_date(end_date);

    Ok(FutureMetadata {
        sid,
        start_date,
        end_date,
        auto_close_date: ac_date,
        symbol: contract,
        root_symbol,
        expiration_date: end_date,
        notice_date: ac_date,
        tick_size: FUTURES_TICK_SIZE,
        exchange,
    })
}
