//! Equity history stored in a DuckDB database.
//!
//! Expected table:
//!
//! ```sql
//! CREATE TABLE equity_history (
//!     ticker VARCHAR, trade_date DATE,
//!     open DOUBLE, high DOUBLE, low DOUBLE, close DOUBLE,
//!     volume DOUBLE, dividend DOUBLE
//! );
//! ```

use std::path::PathBuf;

use duckdb::{params, Connection};

use crate::domain::EquityRow;

use super::align::canonicalize;
use super::provider::{parse_date, DataError, InstrumentSource};

const SYMBOLS_SQL: &str = "SELECT DISTINCT ticker FROM equity_history ORDER BY ticker";

// Dates go through VARCHAR so DATE and TIMESTAMP columns both parse; a NULL
// dividend means none was paid.
const HISTORY_SQL: &str = "\
SELECT CAST(trade_date AS VARCHAR),
       CAST(open AS DOUBLE), CAST(high AS DOUBLE), CAST(low AS DOUBLE),
       CAST(close AS DOUBLE), CAST(volume AS DOUBLE),
       CAST(COALESCE(dividend, 0) AS DOUBLE)
FROM equity_history
WHERE ticker = ?
ORDER BY trade_date";

pub struct EquityHistoryDb {
    connection: Connection,
    path: Option<PathBuf>,
}

impl EquityHistoryDb {
    /// Open a database file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DataError> {
        let path = path.into();
        let connection = Connection::open(&path)?;
        connection.execute_batch("PRAGMA disable_progress_bar;")?;
        Ok(Self {
            connection,
            path: Some(path),
        })
    }

    /// Wrap an existing connection, e.g. an in-memory database.
    pub fn from_connection(connection: Connection) -> Self {
        Self {
            connection,
            path: None,
        }
    }
}

impl InstrumentSource for EquityHistoryDb {
    type Row = EquityRow;

    fn location(&self) -> String {
        match &self.path {
            Some(p) => format!("equity_history in {}", p.display()),
            None => "equity_history".to_string(),
        }
    }

    fn enumerate(&self) -> Result<Vec<String>, DataError> {
        let mut stmt = self.connection.prepare(SYMBOLS_SQL)?;
        let symbols = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        if symbols.is_empty() {
            return Err(DataError::NoInstruments {
                location: self.location(),
            });
        }
        Ok(symbols)
    }

    fn load(&self, symbol: &str) -> Result<Vec<EquityRow>, DataError> {
        let mut stmt = self.connection.prepare(HISTORY_SQL)?;
        let raw = stmt
            .query_map(params![symbol], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                    row.get::<_, Option<f64>>(5)?,
                    row.get::<_, Option<f64>>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if raw.is_empty() {
            return Err(DataError::EmptySeries {
                symbol: symbol.to_string(),
            });
        }

        let nan = |v: Option<f64>| v.unwrap_or(f64::NAN);
        let mut rows = Vec::with_capacity(raw.len());
        for (i, (date, open, high, low, close, volume, dividend)) in raw.into_iter().enumerate() {
            let date = parse_date(&date).ok_or_else(|| DataError::ParseField {
                location: self.location(),
                row: i + 1,
                field: "trade_date".to_string(),
                raw: date.clone(),
            })?;
            rows.push(EquityRow {
                date,
                open: nan(open),
                high: nan(high),
                low: nan(low),
                close: nan(close),
                volume: nan(volume),
                dividend: dividend.unwrap_or(0.0),
            });
        }

        Ok(canonicalize(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn db() -> EquityHistoryDb {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE equity_history (
                ticker VARCHAR, trade_date DATE,
                open DOUBLE, high DOUBLE, low DOUBLE, close DOUBLE,
                volume DOUBLE, dividend DOUBLE
            );
            INSERT INTO equity_history VALUES
                ('BBB', DATE '2015-01-02', 20, 21, 19, 20.5, 500, 0),
                ('AAA', DATE '2015-01-05', 11, 12, 10, 11.5, 900, NULL),
                ('AAA', DATE '2015-01-02', 10, 11, 9, 10.5, 1000, 0.25);",
        )
        .unwrap();
        EquityHistoryDb::from_connection(conn)
    }

    #[test]
    fn enumerates_distinct_tickers_ascending() {
        assert_eq!(db().enumerate().unwrap(), vec!["AAA", "BBB"]);
    }

    #[test]
    fn loads_rows_ordered_by_date() {
        let rows = db().load("AAA").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2015, 1, 2).unwrap());
        assert_eq!(rows[0].dividend, 0.25);
        assert_eq!(rows[1].close, 11.5);
    }

    #[test]
    fn null_dividend_reads_as_zero() {
        let rows = db().load("AAA").unwrap();
        assert_eq!(rows[1].dividend, 0.0);
    }

    #[test]
    fn unknown_ticker_is_empty_series() {
        assert!(matches!(
            db().load("ZZZ"),
            Err(DataError::EmptySeries { .. })
        ));
    }

    #[test]
    fn empty_table_is_a_configuration_error() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE equity_history (ticker VARCHAR, trade_date DATE, open DOUBLE,
             high DOUBLE, low DOUBLE, close DOUBLE, volume DOUBLE, dividend DOUBLE);",
        )
        .unwrap();
        let err = EquityHistoryDb::from_connection(conn).enumerate().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn missing_table_keeps_duckdb_source() {
        use std::error::Error;

        let source = EquityHistoryDb::from_connection(Connection::open_in_memory().unwrap());
        let err = source.enumerate().unwrap_err();
        assert!(matches!(err, DataError::DuckDb(_)));
        assert!(err.source().is_some());
    }
}
