//! Per-instrument fold feeding the daily bar writer.
//!
//! Each instrument produces an [`IngestStep`]: its bars plus the table rows it
//! contributes. The writer pulls `(sid, bars)` pairs lazily while a
//! [`TableAccumulator`] collects the rest, so only one instrument's series is
//! held at a time.

use barbundle_core::data::{DataError, IngestProgress};
use barbundle_core::domain::{DailyBar, DividendRow, Sid};
use barbundle_core::writer::{BarWriteSummary, DailyBarWriter};

use crate::bundle::IngestError;

/// One instrument's contribution to the bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestStep<M> {
    pub sid: Sid,
    pub symbol: String,
    pub bars: Vec<DailyBar>,
    pub metadata: M,
    pub dividends: Vec<DividendRow>,
}

/// Tables built up across steps, in sid order.
#[derive(Debug, Clone, PartialEq)]
pub struct TableAccumulator<M> {
    pub metadata: Vec<M>,
    pub dividends: Vec<DividendRow>,
}

impl<M> TableAccumulator<M> {
    pub fn new() -> Self {
        Self {
            metadata: Vec::new(),
            dividends: Vec::new(),
        }
    }

    /// Keep the step's table rows and hand back what the bar writer needs.
    pub fn absorb(&mut self, step: IngestStep<M>) -> (Sid, Vec<DailyBar>) {
        self.metadata.push(step.metadata);
        self.dividends.extend(step.dividends);
        (step.sid, step.bars)
    }
}

impl<M> Default for TableAccumulator<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `steps` through `writer`.
///
/// The first failed step ends the sequence the writer sees; its error is
/// returned once the writer has finished.
pub fn emit_bars<M, I>(
    steps: I,
    writer: &mut dyn DailyBarWriter,
    progress: &dyn IngestProgress,
) -> Result<(TableAccumulator<M>, BarWriteSummary), IngestError>
where
    I: Iterator<Item = Result<IngestStep<M>, DataError>>,
{
    let mut tables = TableAccumulator::new();
    let mut failure: Option<DataError> = None;

    let summary = {
        let mut bars = steps.map_while(|step| match step {
            Ok(step) => {
                progress.on_complete(&step.symbol, step.sid, step.bars.len());
                Some(tables.absorb(step))
            }
            Err(e) => {
                failure = Some(e);
                None
            }
        });
        writer.write(&mut bars)?
    };

    if let Some(e) = failure {
        return Err(e.into());
    }
    progress.on_batch_complete(summary.instruments, summary.bars);
    Ok((tables, summary))
}
