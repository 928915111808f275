//! In-memory writers that record what they are given.

use crate::domain::{
    DailyBar, DividendRow, EquityMetadata, FutureMetadata, MinuteBar, RootSymbol, Sid, SplitRow,
};

use super::{
    AdjustmentWriter, AssetDbWriter, BarDigest, BarWriteSummary, DailyBarWriter, MinuteBarWriter,
    WriterError,
};

#[derive(Debug, Default)]
pub struct RecordingDailyBarWriter {
    pub bars: Vec<(Sid, Vec<DailyBar>)>,
    pub calls: usize,
}

impl DailyBarWriter for RecordingDailyBarWriter {
    fn write(
        &mut self,
        bars: &mut dyn Iterator<Item = (Sid, Vec<DailyBar>)>,
    ) -> Result<BarWriteSummary, WriterError> {
        self.calls += 1;
        let mut digest = BarDigest::new();
        for (sid, series) in bars {
            digest.update(sid, &series);
            self.bars.push((sid, series));
        }
        Ok(digest.finish())
    }
}

#[derive(Debug, Default)]
pub struct RecordingMinuteBarWriter {
    pub bars: Vec<(Sid, Vec<MinuteBar>)>,
    pub calls: usize,
}

impl MinuteBarWriter for RecordingMinuteBarWriter {
    fn write(
        &mut self,
        bars: &mut dyn Iterator<Item = (Sid, Vec<MinuteBar>)>,
    ) -> Result<usize, WriterError> {
        self.calls += 1;
        let before = self.bars.len();
        self.bars.extend(bars);
        Ok(self.bars.len() - before)
    }
}

#[derive(Debug, Default)]
pub struct RecordingAssetDbWriter {
    pub equities: Vec<EquityMetadata>,
    pub futures: Vec<FutureMetadata>,
    pub root_symbols: Vec<RootSymbol>,
    pub calls: usize,
}

impl AssetDbWriter for RecordingAssetDbWriter {
    fn write_equities(&mut self, equities: &[EquityMetadata]) -> Result<(), WriterError> {
        self.calls += 1;
        self.equities.extend_from_slice(equities);
        Ok(())
    }

    fn write_futures(
        &mut self,
        futures: &[FutureMetadata],
        root_symbols: &[RootSymbol],
    ) -> Result<(), WriterError> {
        self.calls += 1;
        self.futures.extend_from_slice(futures);
        self.root_symbols.extend_from_slice(root_symbols);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingAdjustmentWriter {
    pub splits: Vec<SplitRow>,
    pub dividends: Vec<DividendRow>,
    pub calls: usize,
}

impl AdjustmentWriter for RecordingAdjustmentWriter {
    fn write(&mut self, splits: &[SplitRow], dividends: &[DividendRow]) -> Result<(), WriterError> {
        self.calls += 1;
        self.splits.extend_from_slice(splits);
        self.dividends.extend_from_slice(dividends);
        Ok(())
    }
}
