//! Futures price calibration: minor currency scaling and high/low clamping.

use crate::domain::FuturesRow;

use super::provider::DataError;
use super::reference::RootSymbolTable;

/// Scale prices to major currency units and repair inconsistent high/low.
///
/// The factor is looked up from the root symbol of the first row. Returns the
/// factor that was applied.
pub fn calibrate(
    rows: &mut [FuturesRow],
    table: &RootSymbolTable,
    symbol: &str,
) -> Result<f64, DataError> {
    let Some(first) = rows.first() else {
        return Err(DataError::EmptySeries {
            symbol: symbol.to_string(),
        });
    };
    let root_symbol = first.root_symbol.clone().unwrap_or_default();
    let factor = table.resolve(symbol, &root_symbol)?.minor_fx_adj;

    apply_minor_fx(rows, factor);
    clamp_high_low(rows);
    Ok(factor)
}

/// Multiply open, high, low and close by `factor`.
pub fn apply_minor_fx(rows: &mut [FuturesRow], factor: f64) {
    for row in rows {
        row.open *= factor;
        row.high *= factor;
        row.low *= factor;
        row.close *= factor;
    }
}

/// Widen high/low so they bracket open and close on every row.
pub fn clamp_high_low(rows: &mut [FuturesRow]) {
    for row in rows {
        let (high, low) = clamp(row.open, row.high, row.low, row.close);
        row.high = high;
        row.low = low;
    }
}

/// Close first, then open. `f64::max`/`min` ignore a NaN operand.
pub fn clamp(open: f64, high: f64, low: f64, close: f64) -> (f64, f64) {
    let high = high.max(close).max(open);
    let low = low.min(close).min(open);
    (high, low)
}
