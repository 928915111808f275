//! Bundle writer interfaces.
//!
//! Ingestion hands its output to four writers: daily bars (consumed lazily,
//! one instrument at a time), minute bars, asset metadata and adjustments.
//! Implementations decide the storage format; `parquet` persists a bundle
//! directory and `memory` records everything for inspection.

pub mod memory;
pub mod parquet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    DailyBar, DividendRow, EquityMetadata, FutureMetadata, MinuteBar, RootSymbol, Sid, SplitRow,
};

pub use memory::{
    RecordingAdjustmentWriter, RecordingAssetDbWriter, RecordingDailyBarWriter,
    RecordingMinuteBarWriter,
};
pub use parquet::{BundleManifest, ParquetBundle, ParquetWriters};

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("bundle I/O error: {0}")]
    Io(String),

    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("manifest error: {0}")]
    Manifest(String),
}

/// What a bar writer consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarWriteSummary {
    pub instruments: usize,
    pub bars: usize,
    /// BLAKE3 over every (sid, bar) in write order.
    pub data_hash: String,
}

/// Running digest of emitted bars, shared by writer implementations so the
/// same input yields the same summary regardless of storage.
pub struct BarDigest {
    hasher: blake3::Hasher,
    instruments: usize,
    bars: usize,
}

impl BarDigest {
    pub fn new() -> Self {
        Self {
            hasher: blake3::Hasher::new(),
            instruments: 0,
            bars: 0,
        }
    }

    pub fn update(&mut self, sid: Sid, bars: &[DailyBar]) {
        self.instruments += 1;
        self.bars += bars.len();
        self.hasher.update(&sid.get().to_le_bytes());
        for bar in bars {
            self.hasher.update(bar.date.to_string().as_bytes());
            self.hasher.update(&bar.open.to_le_bytes());
            self.hasher.update(&bar.high.to_le_bytes());
            self.hasher.update(&bar.low.to_le_bytes());
            self.hasher.update(&bar.close.to_le_bytes());
            self.hasher.update(&bar.volume.to_le_bytes());
        }
    }

    pub fn finish(self) -> BarWriteSummary {
        BarWriteSummary {
            instruments: self.instruments,
            bars: self.bars,
            data_hash: self.hasher.finalize().to_hex().to_string(),
        }
    }
}

impl Default for BarDigest {
    fn default() -> Self {
        Self::new()
    }
}

/// Persists daily bars. `bars` is pulled lazily; each item is one
/// instrument's full series.
pub trait DailyBarWriter {
    fn write(
        &mut self,
        bars: &mut dyn Iterator<Item = (Sid, Vec<DailyBar>)>,
    ) -> Result<BarWriteSummary, WriterError>;
}

/// Persists minute bars.
pub trait MinuteBarWriter {
    fn write(
        &mut self,
        bars: &mut dyn Iterator<Item = (Sid, Vec<MinuteBar>)>,
    ) -> Result<usize, WriterError>;
}

/// Persists asset metadata.
pub trait AssetDbWriter {
    fn write_equities(&mut self, equities: &[EquityMetadata]) -> Result<(), WriterError>;

    fn write_futures(
        &mut self,
        futures: &[FutureMetadata],
        root_symbols: &[RootSymbol],
    ) -> Result<(), WriterError>;
}

/// Persists splits and dividends.
pub trait AdjustmentWriter {
    fn write(&mut self, splits: &[SplitRow], dividends: &[DividendRow]) -> Result<(), WriterError>;
}
