//! `database`: equity history and dividends from a DuckDB table.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use barbundle_core::data::{
    align_to_sessions, equity_metadata, extract_dividends, naive_sessions, off_calendar,
    DataError, EquityHistoryDb, InstrumentSource,
};
use barbundle_core::domain::{EquityMetadata, EquityRow, Sid, SidAllocator};

use crate::accumulate::{emit_bars, IngestStep};
use crate::bundle::{Bundle, IngestContext, IngestError, IngestReport};
use crate::config::DatabaseConfig;

pub const DATABASE: &str = "database";

pub struct DatabaseBundle {
    config: DatabaseConfig,
}

impl DatabaseBundle {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

impl Bundle for DatabaseBundle {
    fn name(&self) -> &str {
        DATABASE
    }

    fn ingest(&self, ctx: IngestContext<'_>) -> Result<IngestReport, IngestError> {
        let db = EquityHistoryDb::open(&self.config.path)?;
        let symbols = db.enumerate()?;
        let sessions = naive_sessions(
            &ctx.calendar
                .sessions_in_range(ctx.start_session, ctx.end_session)?,
        );
        info!(
            bundle = DATABASE,
            path = %self.config.path.display(),
            tickers = symbols.len(),
            sessions = sessions.len(),
            "ingesting equities"
        );

        let progress = ctx.progress();
        let total = symbols.len();
        let mut sids = SidAllocator::new();
        let steps = symbols.iter().enumerate().map(|(i, symbol)| {
            progress.on_start(symbol, i, total);
            equity_step(&db, &sessions, &self.config.exchange, sids.next_sid(), symbol)
        });
        let (tables, summary) = emit_bars(steps, ctx.daily_bar_writer, progress.as_ref())?;

        ctx.asset_db_writer.write_equities(&tables.metadata)?;
        ctx.adjustment_writer.write(&[], &tables.dividends)?;

        Ok(IngestReport {
            bundle: DATABASE.to_string(),
            instruments: summary.instruments,
            bars: summary.bars,
            dividends: tables.dividends.len(),
            data_hash: summary.data_hash,
        })
    }
}

/// Load, align and describe one ticker, collecting its dividends.
pub fn equity_step(
    source: &impl InstrumentSource<Row = EquityRow>,
    sessions: &[NaiveDate],
    exchange: &str,
    sid: Sid,
    symbol: &str,
) -> Result<IngestStep<EquityMetadata>, DataError> {
    let rows = source.load(symbol)?;

    let dropped = off_calendar(&rows, sessions);
    if !dropped.is_empty() {
        let lost_dividends = dropped
            .iter()
            .filter(|r| r.dividend != 0.0 && !r.dividend.is_nan())
            .count();
        warn!(
            symbol,
            rows = dropped.len(),
            lost_dividends,
            "dropping rows outside the session calendar"
        );
    }

    let aligned = align_to_sessions(&rows, sessions);
    let metadata = equity_metadata(sid, symbol, &aligned, exchange)?;
    let dividends = extract_dividends(sid, &aligned);
    debug!(
        symbol,
        sid = sid.get(),
        raw = rows.len(),
        aligned = aligned.len(),
        dividends = dividends.len(),
        "ticker aligned"
    );

    Ok(IngestStep {
        sid,
        symbol: symbol.to_string(),
        bars: aligned.iter().map(EquityRow::to_daily_bar).collect(),
        metadata,
        dividends,
    })
}
