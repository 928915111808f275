//! `random-futures`: per-contract CSV files plus a root symbol table.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use barbundle_core::data::{
    align_to_sessions, calibrate, future_metadata, naive_sessions, off_calendar, truncate_before,
    DataError, FuturesDirectory, InstrumentSource, RootSymbolTable,
};
use barbundle_core::domain::{FutureMetadata, FuturesRow, Sid, SidAllocator};

use crate::accumulate::{emit_bars, IngestStep};
use crate::bundle::{Bundle, IngestContext, IngestError, IngestReport};
use crate::config::FuturesConfig;

pub const RANDOM_FUTURES: &str = "random-futures";

pub struct RandomFuturesBundle {
    config: FuturesConfig,
}

impl RandomFuturesBundle {
    pub fn new(config: FuturesConfig) -> Self {
        Self { config }
    }
}

impl Bundle for RandomFuturesBundle {
    fn name(&self) -> &str {
        RANDOM_FUTURES
    }

    fn ingest(&self, ctx: IngestContext<'_>) -> Result<IngestReport, IngestError> {
        let source = FuturesDirectory::new(self.config.data_path());
        let symbols = source.enumerate()?;
        let table = RootSymbolTable::from_path(&self.config.root_symbols_path())?;
        if table.is_empty() {
            warn!(
                path = %self.config.root_symbols_path().display(),
                "root symbol table has no entries"
            );
        }
        let sessions = naive_sessions(
            &ctx.calendar
                .sessions_in_range(ctx.start_session, ctx.end_session)?,
        );
        info!(
            bundle = RANDOM_FUTURES,
            contracts = symbols.len(),
            root_symbols = table.len(),
            sessions = sessions.len(),
            "ingesting futures"
        );

        let progress = ctx.progress();
        let total = symbols.len();
        let mut sids = SidAllocator::new();
        let steps = symbols.iter().enumerate().map(|(i, symbol)| {
            progress.on_start(symbol, i, total);
            futures_step(
                &source,
                &table,
                &sessions,
                self.config.cutoff,
                sids.next_sid(),
                symbol,
            )
        });
        let (tables, summary) = emit_bars(steps, ctx.daily_bar_writer, progress.as_ref())?;

        ctx.adjustment_writer.write(&[], &tables.dividends)?;
        ctx.asset_db_writer
            .write_futures(&tables.metadata, &table.to_root_symbols())?;

        Ok(IngestReport {
            bundle: RANDOM_FUTURES.to_string(),
            instruments: summary.instruments,
            bars: summary.bars,
            dividends: tables.dividends.len(),
            data_hash: summary.data_hash,
        })
    }
}

/// Load, calibrate, align and describe one contract.
pub fn futures_step(
    source: &impl InstrumentSource<Row = FuturesRow>,
    table: &RootSymbolTable,
    sessions: &[NaiveDate],
    cutoff: NaiveDate,
    sid: Sid,
    symbol: &str,
) -> Result<IngestStep<FutureMetadata>, DataError> {
    let mut rows = source.load(symbol)?;
    let factor = calibrate(&mut rows, table, symbol)?;

    let dropped = off_calendar(&rows, sessions).len();
    if dropped > 0 {
        warn!(symbol, rows = dropped, "dropping rows outside the session calendar");
    }

    let aligned = truncate_before(align_to_sessions(&rows, sessions), cutoff);
    let metadata = future_metadata(sid, symbol, &aligned, table)?;
    debug!(
        symbol,
        sid = sid.get(),
        minor_fx_adj = factor,
        raw = rows.len(),
        aligned = aligned.len(),
        "contract aligned"
    );

    Ok(IngestStep {
        sid,
        symbol: symbol.to_string(),
        bars: aligned.iter().map(FuturesRow::to_daily_bar).collect(),
        metadata,
        dividends: Vec::new(),
    })
}
