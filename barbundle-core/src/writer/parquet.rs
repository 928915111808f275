//! Parquet bundle directory.
//!
//! Layout:
//!
//! ```text
//! {root}/daily_bars/sid={SID}.parquet
//! {root}/minute_bars/sid={SID}.parquet
//! {root}/assets/{equities,futures,root_symbols}.parquet
//! {root}/adjustments/{splits,dividends}.parquet
//! {root}/manifest.json
//! ```
//!
//! Every file is written to `.tmp` and renamed into place.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{
    DailyBar, DividendRow, EquityMetadata, FutureMetadata, MinuteBar, RootSymbol, Sid, SplitRow,
};

use super::{
    AdjustmentWriter, AssetDbWriter, BarDigest, BarWriteSummary, DailyBarWriter, MinuteBarWriter,
    WriterError,
};

const DAILY_DIR: &str = "daily_bars";
const MINUTE_DIR: &str = "minute_bars";
const ASSETS_DIR: &str = "assets";
const ADJUSTMENTS_DIR: &str = "adjustments";
const MANIFEST_FILE: &str = "manifest.json";

/// Summary of a completed ingestion, stored next to the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub bundle: String,
    pub calendar: String,
    pub start_session: NaiveDate,
    pub end_session: NaiveDate,
    pub instruments: usize,
    pub bar_count: usize,
    pub data_hash: String,
    pub ingested_at: NaiveDateTime,
}

/// A bundle directory on disk.
pub struct ParquetBundle {
    root: PathBuf,
}

/// One writer of each kind, all targeting the same bundle directory.
pub struct ParquetWriters {
    pub daily: ParquetDailyBarWriter,
    pub minute: ParquetMinuteBarWriter,
    pub assets: ParquetAssetDbWriter,
    pub adjustments: ParquetAdjustmentWriter,
}

impl ParquetBundle {
    /// Create an empty bundle directory tree under `root`.
    ///
    /// Tables and the manifest left by an earlier run are removed. Other
    /// files under `root`, such as the cache directory, are kept.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, WriterError> {
        let root = root.into();
        let manifest = root.join(MANIFEST_FILE);
        if manifest.exists() {
            fs::remove_file(&manifest)
                .map_err(|e| WriterError::Io(format!("remove {}: {e}", manifest.display())))?;
        }
        for sub in [DAILY_DIR, MINUTE_DIR, ASSETS_DIR, ADJUSTMENTS_DIR] {
            let dir = root.join(sub);
            if dir.exists() {
                debug!(dir = %dir.display(), "clearing previous bundle tables");
                fs::remove_dir_all(&dir)
                    .map_err(|e| WriterError::Io(format!("clear {}: {e}", dir.display())))?;
            }
            fs::create_dir_all(&dir)
                .map_err(|e| WriterError::Io(format!("create {}: {e}", dir.display())))?;
        }
        Ok(Self { root })
    }

    /// Open an existing bundle without touching the filesystem.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn writers(&self) -> ParquetWriters {
        ParquetWriters {
            daily: ParquetDailyBarWriter {
                dir: self.root.join(DAILY_DIR),
            },
            minute: ParquetMinuteBarWriter {
                dir: self.root.join(MINUTE_DIR),
            },
            assets: ParquetAssetDbWriter {
                dir: self.root.join(ASSETS_DIR),
            },
            adjustments: ParquetAdjustmentWriter {
                dir: self.root.join(ADJUSTMENTS_DIR),
            },
        }
    }

    pub fn write_manifest(&self, manifest: &BundleManifest) -> Result<(), WriterError> {
        let json = serde_json::to_string_pretty(manifest)
            .map_err(|e| WriterError::Manifest(format!("serialize: {e}")))?;
        let path = self.root.join(MANIFEST_FILE);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .map_err(|e| WriterError::Io(format!("write {}: {e}", tmp_path.display())))?;
        rename_into_place(&tmp_path, &path)
    }

    pub fn load_manifest(&self) -> Result<BundleManifest, WriterError> {
        let path = self.root.join(MANIFEST_FILE);
        let content = fs::read_to_string(&path)
            .map_err(|e| WriterError::Io(format!("read {}: {e}", path.display())))?;
        serde_json::from_str(&content).map_err(|e| WriterError::Manifest(format!("parse: {e}")))
    }

    /// Daily bars stored for `sid`, in date order.
    pub fn load_daily_bars(&self, sid: Sid) -> Result<Vec<DailyBar>, WriterError> {
        let df = read_parquet(&sid_path(&self.root.join(DAILY_DIR), sid))?;
        dataframe_to_daily_bars(&df)
    }

    /// Read any table by its path relative to the bundle root,
    /// e.g. `assets/futures.parquet`.
    pub fn load_table(&self, relative: impl AsRef<Path>) -> Result<DataFrame, WriterError> {
        read_parquet(&self.root.join(relative))
    }
}

pub struct ParquetDailyBarWriter {
    dir: PathBuf,
}

impl DailyBarWriter for ParquetDailyBarWriter {
    fn write(
        &mut self,
        bars: &mut dyn Iterator<Item = (Sid, Vec<DailyBar>)>,
    ) -> Result<BarWriteSummary, WriterError> {
        let mut digest = BarDigest::new();
        for (sid, series) in bars {
            let df = daily_bars_to_dataframe(&series)?;
            write_atomic(&df, &sid_path(&self.dir, sid))?;
            debug!(sid = sid.get(), bars = series.len(), "wrote daily bars");
            digest.update(sid, &series);
        }
        Ok(digest.finish())
    }
}

pub struct ParquetMinuteBarWriter {
    dir: PathBuf,
}

impl MinuteBarWriter for ParquetMinuteBarWriter {
    fn write(
        &mut self,
        bars: &mut dyn Iterator<Item = (Sid, Vec<MinuteBar>)>,
    ) -> Result<usize, WriterError> {
        let mut written = 0;
        for (sid, series) in bars {
            let df = DataFrame::new(vec![
                Column::new(
                    "dt".into(),
                    series
                        .iter()
                        .map(|b| b.dt.timestamp_millis())
                        .collect::<Vec<i64>>(),
                ),
                Column::new("open".into(), series.iter().map(|b| b.open).collect::<Vec<f64>>()),
                Column::new("high".into(), series.iter().map(|b| b.high).collect::<Vec<f64>>()),
                Column::new("low".into(), series.iter().map(|b| b.low).collect::<Vec<f64>>()),
                Column::new("close".into(), series.iter().map(|b| b.close).collect::<Vec<f64>>()),
                Column::new(
                    "volume".into(),
                    series.iter().map(|b| b.volume).collect::<Vec<f64>>(),
                ),
            ])
            .map_err(|e| WriterError::Parquet(format!("dataframe creation: {e}")))?;
            write_atomic(&df, &sid_path(&self.dir, sid))?;
            written += 1;
        }
        Ok(written)
    }
}

pub struct ParquetAssetDbWriter {
    dir: PathBuf,
}

impl AssetDbWriter for ParquetAssetDbWriter {
    fn write_equities(&mut self, equities: &[EquityMetadata]) -> Result<(), WriterError> {
        let df = DataFrame::new(vec![
            Column::new(
                "sid".into(),
                equities.iter().map(|e| e.sid.get()).collect::<Vec<u32>>(),
            ),
            date_column("start_date", equities.iter().map(|e| e.start_date))?,
            date_column("end_date", equities.iter().map(|e| e.end_date))?,
            date_column("auto_close_date", equities.iter().map(|e| e.auto_close_date))?,
            Column::new(
                "symbol".into(),
                equities.iter().map(|e| e.symbol.clone()).collect::<Vec<String>>(),
            ),
            Column::new(
                "exchange".into(),
                equities
                    .iter()
                    .map(|e| e.exchange.clone())
                    .collect::<Vec<String>>(),
            ),
        ])
        .map_err(|e| WriterError::Parquet(format!("dataframe creation: {e}")))?;
        write_atomic(&df, &self.dir.join("equities.parquet"))
    }

    fn write_futures(
        &mut self,
        futures: &[FutureMetadata],
        root_symbols: &[RootSymbol],
    ) -> Result<(), WriterError> {
        let df = DataFrame::new(vec![
            Column::new(
                "sid".into(),
                futures.iter().map(|f| f.sid.get()).collect::<Vec<u32>>(),
            ),
            date_column("start_date", futures.iter().map(|f| f.start_date))?,
            date_column("end_date", futures.iter().map(|f| f.end_date))?,
            date_column("auto_close_date", futures.iter().map(|f| f.auto_close_date))?,
            Column::new(
                "symbol".into(),
                futures.iter().map(|f| f.symbol.clone()).collect::<Vec<String>>(),
            ),
            Column::new(
                "root_symbol".into(),
                futures
                    .iter()
                    .map(|f| f.root_symbol.clone())
                    .collect::<Vec<String>>(),
            ),
            date_column("expiration_date", futures.iter().map(|f| f.expiration_date))?,
            date_column("notice_date", futures.iter().map(|f| f.notice_date))?,
            Column::new(
                "tick_size".into(),
                futures.iter().map(|f| f.tick_size).collect::<Vec<f64>>(),
            ),
            Column::new(
                "exchange".into(),
                futures
                    .iter()
                    .map(|f| f.exchange.clone())
                    .collect::<Vec<String>>(),
            ),
        ])
        .map_err(|e| WriterError::Parquet(format!("dataframe creation: {e}")))?;
        write_atomic(&df, &self.dir.join("futures.parquet"))?;

        let roots = DataFrame::new(vec![
            Column::new(
                "root_symbol_id".into(),
                root_symbols
                    .iter()
                    .map(|r| r.root_symbol_id)
                    .collect::<Vec<i64>>(),
            ),
            Column::new(
                "root_symbol".into(),
                root_symbols
                    .iter()
                    .map(|r| r.root_symbol.clone())
                    .collect::<Vec<String>>(),
            ),
            Column::new(
                "exchange".into(),
                root_symbols
                    .iter()
                    .map(|r| r.exchange.clone())
                    .collect::<Vec<String>>(),
            ),
            Column::new(
                "description".into(),
                root_symbols
                    .iter()
                    .map(|r| r.description.clone())
                    .collect::<Vec<Option<String>>>(),
            ),
            Column::new(
                "sector".into(),
                root_symbols
                    .iter()
                    .map(|r| r.sector.clone())
                    .collect::<Vec<Option<String>>>(),
            ),
        ])
        .map_err(|e| WriterError::Parquet(format!("dataframe creation: {e}")))?;
        write_atomic(&roots, &self.dir.join("root_symbols.parquet"))
    }
}

pub struct ParquetAdjustmentWriter {
    dir: PathBuf,
}

impl AdjustmentWriter for ParquetAdjustmentWriter {
    fn write(&mut self, splits: &[SplitRow], dividends: &[DividendRow]) -> Result<(), WriterError> {
        let splits_df = DataFrame::new(vec![
            Column::new(
                "sid".into(),
                splits.iter().map(|s| s.sid.get()).collect::<Vec<u32>>(),
            ),
            Column::new(
                "ratio".into(),
                splits.iter().map(|s| s.ratio).collect::<Vec<f64>>(),
            ),
            date_column("effective_date", splits.iter().map(|s| s.effective_date))?,
        ])
        .map_err(|e| WriterError::Parquet(format!("dataframe creation: {e}")))?;
        write_atomic(&splits_df, &self.dir.join("splits.parquet"))?;

        let dividends_df = DataFrame::new(vec![
            Column::new(
                "sid".into(),
                dividends.iter().map(|d| d.sid.get()).collect::<Vec<u32>>(),
            ),
            date_column("ex_date", dividends.iter().map(|d| d.ex_date))?,
            Column::new(
                "amount".into(),
                dividends.iter().map(|d| d.amount).collect::<Vec<f64>>(),
            ),
            optional_date_column("record_date", dividends.iter().map(|d| d.record_date))?,
            optional_date_column("declared_date", dividends.iter().map(|d| d.declared_date))?,
            optional_date_column("pay_date", dividends.iter().map(|d| d.pay_date))?,
        ])
        .map_err(|e| WriterError::Parquet(format!("dataframe creation: {e}")))?;
        write_atomic(&dividends_df, &self.dir.join("dividends.parquet"))
    }
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn sid_path(dir: &Path, sid: Sid) -> PathBuf {
    dir.join(format!("sid={sid}.parquet"))
}

// NaiveDate's default is 1970-01-01.
fn epoch_days(date: NaiveDate) -> i32 {
    (date - NaiveDate::default()).num_days() as i32
}

fn date_column(
    name: &str,
    dates: impl Iterator<Item = NaiveDate>,
) -> Result<Column, WriterError> {
    Column::new(name.into(), dates.map(epoch_days).collect::<Vec<i32>>())
        .cast(&DataType::Date)
        .map_err(|e| WriterError::Parquet(format!("{name} cast: {e}")))
}

fn optional_date_column(
    name: &str,
    dates: impl Iterator<Item = Option<NaiveDate>>,
) -> Result<Column, WriterError> {
    Column::new(
        name.into(),
        dates.map(|d| d.map(epoch_days)).collect::<Vec<Option<i32>>>(),
    )
    .cast(&DataType::Date)
    .map_err(|e| WriterError::Parquet(format!("{name} cast: {e}")))
}

fn daily_bars_to_dataframe(bars: &[DailyBar]) -> Result<DataFrame, WriterError> {
    DataFrame::new(vec![
        date_column("date", bars.iter().map(|b| b.date))?,
        Column::new("open".into(), bars.iter().map(|b| b.open).collect::<Vec<f64>>()),
        Column::new("high".into(), bars.iter().map(|b| b.high).collect::<Vec<f64>>()),
        Column::new("low".into(), bars.iter().map(|b| b.low).collect::<Vec<f64>>()),
        Column::new("close".into(), bars.iter().map(|b| b.close).collect::<Vec<f64>>()),
        Column::new("volume".into(), bars.iter().map(|b| b.volume).collect::<Vec<f64>>()),
    ])
    .map_err(|e| WriterError::Parquet(format!("dataframe creation: {e}")))
}

fn dataframe_to_daily_bars(df: &DataFrame) -> Result<Vec<DailyBar>, WriterError> {
    let map_err = |e: PolarsError| WriterError::Parquet(format!("column read: {e}"));
    let float = |name: &str| -> Result<Float64Chunked, WriterError> {
        Ok(df.column(name).map_err(map_err)?.f64().map_err(map_err)?.clone())
    };

    let date_ca = df
        .column("date")
        .map_err(map_err)?
        .date()
        .map_err(map_err)?
        .clone();
    let open_ca = float("open")?;
    let high_ca = float("high")?;
    let low_ca = float("low")?;
    let close_ca = float("close")?;
    let vol_ca = float("volume")?;

    let mut bars = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let days = date_ca
            .get(i)
            .ok_or_else(|| WriterError::Parquet(format!("null date at row {i}")))?;
        bars.push(DailyBar {
            date: NaiveDate::default() + Duration::days(days as i64),
            open: open_ca.get(i).unwrap_or(f64::NAN),
            high: high_ca.get(i).unwrap_or(f64::NAN),
            low: low_ca.get(i).unwrap_or(f64::NAN),
            close: close_ca.get(i).unwrap_or(f64::NAN),
            volume: vol_ca.get(i).unwrap_or(f64::NAN),
        });
    }
    Ok(bars)
}

fn write_atomic(df: &DataFrame, path: &Path) -> Result<(), WriterError> {
    let tmp_path = path.with_extension("parquet.tmp");
    let file = fs::File::create(&tmp_path)
        .map_err(|e| WriterError::Io(format!("create {}: {e}", tmp_path.display())))?;
    ParquetWriter::new(file)
        .finish(&mut df.clone())
        .map_err(|e| WriterError::Parquet(format!("write parquet: {e}")))?;
    rename_into_place(&tmp_path, path)
}

fn rename_into_place(tmp_path: &Path, path: &Path) -> Result<(), WriterError> {
    fs::rename(tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(tmp_path);
        WriterError::Io(format!("atomic rename failed: {e}"))
    })
}

fn read_parquet(path: &Path) -> Result<DataFrame, WriterError> {
    let file = fs::File::open(path)
        .map_err(|e| WriterError::Io(format!("open {}: {e}", path.display())))?;
    ParquetReader::new(file)
        .finish()
        .map_err(|e| WriterError::Parquet(format!("read: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_bars() -> Vec<DailyBar> {
        vec![
            DailyBar {
                date: date(2015, 1, 2),
                open: 10.0,
                high: 11.0,
                low: 9.5,
                close: 10.5,
                volume: 1000.0,
            },
            DailyBar {
                date: date(2015, 1, 5),
                open: 10.5,
                high: 12.0,
                low: 10.0,
                close: 11.5,
                volume: 900.0,
            },
        ]
    }

    #[test]
    fn daily_bars_round_trip_per_sid() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = ParquetBundle::create(dir.path()).unwrap();
        let mut writers = bundle.writers();

        let mut input = vec![(Sid(1), sample_bars())].into_iter();
        let summary = writers.daily.write(&mut input).unwrap();
        assert_eq!(summary.instruments, 1);
        assert_eq!(summary.bars, 2);

        let loaded = bundle.load_daily_bars(Sid(1)).unwrap();
        assert_eq!(loaded, sample_bars());
        assert!(dir.path().join("daily_bars/sid=1.parquet").exists());
        assert!(!dir.path().join("daily_bars/sid=1.parquet.tmp").exists());
    }

    #[test]
    fn recreate_drops_tables_from_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = ParquetBundle::create(dir.path()).unwrap();
        let mut input = vec![(Sid(1), sample_bars()), (Sid(2), sample_bars())].into_iter();
        bundle.writers().daily.write(&mut input).unwrap();
        fs::create_dir_all(dir.path().join(".cache")).unwrap();

        let bundle = ParquetBundle::create(dir.path()).unwrap();
        let mut input = vec![(Sid(1), sample_bars())].into_iter();
        bundle.writers().daily.write(&mut input).unwrap();

        assert!(bundle.load_daily_bars(Sid(1)).is_ok());
        assert!(bundle.load_daily_bars(Sid(2)).is_err());
        assert!(dir.path().join(".cache").exists());
    }

    #[test]
    fn summary_hash_matches_recording_writer() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = ParquetBundle::create(dir.path()).unwrap();
        let mut parquet = bundle.writers().daily;
        let mut memory = crate::writer::RecordingDailyBarWriter::default();

        let a = parquet
            .write(&mut vec![(Sid(3), sample_bars())].into_iter())
            .unwrap();
        let b = memory
            .write(&mut vec![(Sid(3), sample_bars())].into_iter())
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn futures_assets_and_root_symbols_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = ParquetBundle::create(dir.path()).unwrap();
        let mut writers = bundle.writers();

        let future = FutureMetadata {
            sid: Sid(1),
            start_date: date(2015, 1, 2),
            end_date: date(2015, 3, 20),
            auto_close_date: date(2015, 3, 21),
            symbol: "CLH15".into(),
            root_symbol: "CL".into(),
            expiration_date: date(2015, 3, 20),
            notice_date: date(2015, 3, 21),
            tick_size: 0.0001,
            exchange: "NYMEX".into(),
        };
        let root = RootSymbol {
            root_symbol_id: 0,
            root_symbol: "CL".into(),
            exchange: "NYMEX".into(),
            description: None,
            sector: Some("Energy".into()),
        };
        writers.assets.write_futures(&[future], &[root]).unwrap();

        assert_eq!(bundle.load_table("assets/futures.parquet").unwrap().height(), 1);
        assert_eq!(
            bundle
                .load_table("assets/root_symbols.parquet")
                .unwrap()
                .height(),
            1
        );
    }

    #[test]
    fn empty_adjustments_still_produce_tables() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = ParquetBundle::create(dir.path()).unwrap();
        bundle.writers().adjustments.write(&[], &[]).unwrap();

        assert_eq!(bundle.load_table("adjustments/splits.parquet").unwrap().height(), 0);
        assert_eq!(
            bundle
                .load_table("adjustments/dividends.parquet")
                .unwrap()
                .height(),
            0
        );
    }

    #[test]
    fn minute_bars_are_written_per_sid() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = ParquetBundle::create(dir.path()).unwrap();
        let bar = MinuteBar {
            dt: Utc.with_ymd_and_hms(2015, 1, 2, 14, 31, 0).unwrap(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 5.0,
        };
        let written = bundle
            .writers()
            .minute
            .write(&mut vec![(Sid(7), vec![bar])].into_iter())
            .unwrap();
        assert_eq!(written, 1);
        assert!(dir.path().join("minute_bars/sid=7.parquet").exists());
    }

    #[test]
    fn manifest_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = ParquetBundle::create(dir.path()).unwrap();
        let manifest = BundleManifest {
            bundle: "random-futures".into(),
            calendar: "NYSE".into(),
            start_session: date(2015, 1, 2),
            end_session: date(2015, 12, 31),
            instruments: 2,
            bar_count: 500,
            data_hash: "abc".into(),
            ingested_at: date(2026, 1, 1).and_hms_opt(12, 0, 0).unwrap(),
        };
        bundle.write_manifest(&manifest).unwrap();
        assert_eq!(bundle.load_manifest().unwrap(), manifest);
    }
}
