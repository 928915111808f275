//! Run driver: config in, Parquet bundle out.

use chrono::Local;
use tracing::info;

use barbundle_core::calendar::TradingCalendar;
use barbundle_core::writer::{BundleManifest, ParquetBundle};

use crate::bundle::{BundleRegistry, IngestContext, IngestError, IngestReport};
use crate::config::IngestConfig;

/// Ingest the configured bundle into `config.output_dir` and record its
/// manifest.
pub fn run_ingest(config: &IngestConfig) -> Result<IngestReport, IngestError> {
    config.validate()?;
    let calendar = config.calendar.build()?;
    let registry = BundleRegistry::from_config(config);
    let bundle = registry.get(&config.bundle)?;

    let store = ParquetBundle::create(&config.output_dir)?;
    let mut writers = store.writers();
    let cache = config.cache_dir();

    info!(
        bundle = bundle.name(),
        calendar = calendar.name(),
        start = %config.start_session,
        end = %config.end_session,
        output = %config.output_dir.display(),
        "starting ingest"
    );

    let report = bundle.ingest(IngestContext {
        environ: &config.environ,
        asset_db_writer: &mut writers.assets,
        minute_bar_writer: &mut writers.minute,
        daily_bar_writer: &mut writers.daily,
        adjustment_writer: &mut writers.adjustments,
        calendar: &calendar,
        start_session: config.start_session,
        end_session: config.end_session,
        cache: &cache,
        show_progress: config.show_progress,
        output_dir: &config.output_dir,
    })?;

    store.write_manifest(&BundleManifest {
        bundle: report.bundle.clone(),
        calendar: calendar.name().to_string(),
        start_session: config.start_session,
        end_session: config.end_session,
        instruments: report.instruments,
        bar_count: report.bars,
        data_hash: report.data_hash.clone(),
        ingested_at: Local::now().naive_local(),
    })?;

    info!(
        bundle = %report.bundle,
        instruments = report.instruments,
        bars = report.bars,
        dividends = report.dividends,
        "ingest complete"
    );
    Ok(report)
}
