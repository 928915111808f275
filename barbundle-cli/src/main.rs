//! barbundle CLI: bundle ingestion and price-file analysis.
//!
//! Commands:
//! - `ingest`: run a bundle ingestion from a TOML config file
//! - `bundles`: list the bundles a config file makes available
//! - `returns`: daily-return statistics over a date window of a CSV price file

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use barbundle_core::analysis::return_window_stats;
use barbundle_runner::{run_ingest, BundleRegistry, IngestConfig};

const DEFAULT_LOG_FILTER: &str = "barbundle=info";

#[derive(Parser)]
#[command(
    name = "barbundle",
    about = "barbundle: ingest daily market data into backtesting bundles"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a bundle described by a TOML config file.
    Ingest {
        /// Path to the run config.
        #[arg(long)]
        config: PathBuf,

        /// Bundle to ingest. Overrides the config.
        #[arg(long)]
        bundle: Option<String>,

        /// First session (YYYY-MM-DD). Overrides the config.
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last session (YYYY-MM-DD). Overrides the config.
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Bundle output directory. Overrides the config.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print per-instrument progress.
        #[arg(long, default_value_t = false)]
        show_progress: bool,
    },
    /// List bundles available under a config file.
    Bundles {
        /// Path to the run config.
        #[arg(long)]
        config: PathBuf,
    },
    /// Daily-return min, max and standard deviation over a date window.
    Returns {
        /// CSV price file with a date index and a `Close` column.
        #[arg(long)]
        file: PathBuf,

        /// Window start: YYYY, YYYY-MM or a full date (YYYY/M/D, YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// Window end: YYYY, YYYY-MM or a full date. A year means through Dec 31.
        #[arg(long)]
        end: String,
    },
}

fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest {
            config,
            bundle,
            start,
            end,
            output_dir,
            show_progress,
        } => run_ingest_cmd(&config, bundle, start, end, output_dir, show_progress),
        Commands::Bundles { config } => run_bundles(&config),
        Commands::Returns { file, start, end } => run_returns(&file, &start, &end),
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("invalid log filter")?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("failed to install logger")?;
    Ok(())
}

fn run_ingest_cmd(
    config_path: &Path,
    bundle: Option<String>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    output_dir: Option<PathBuf>,
    show_progress: bool,
) -> Result<()> {
    let mut config = IngestConfig::from_file(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    if let Some(bundle) = bundle {
        config.bundle = bundle;
    }
    if let Some(start) = start {
        config.start_session = start;
    }
    if let Some(end) = end {
        config.end_session = end;
    }
    if let Some(output_dir) = output_dir {
        config.output_dir = output_dir;
    }
    config.show_progress |= show_progress;
    debug!(?config, "resolved run config");

    let report = run_ingest(&config)
        .with_context(|| format!("ingesting bundle '{}'", config.bundle))?;

    println!("=== Ingest Summary ===");
    println!("Bundle:      {}", report.bundle);
    println!(
        "Sessions:    {} to {}",
        config.start_session, config.end_session
    );
    println!("Instruments: {}", report.instruments);
    println!("Bars:        {}", report.bars);
    println!("Dividends:   {}", report.dividends);
    println!("Data hash:   {}", report.data_hash);
    println!("Output:      {}", config.output_dir.display());
    Ok(())
}

fn run_bundles(config_path: &Path) -> Result<()> {
    let config = IngestConfig::from_file(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let registry = BundleRegistry::from_config(&config);

    let names = registry.names();
    if names.is_empty() {
        bail!("no bundles configured in {}", config_path.display());
    }
    for name in names {
        let marker = if name == config.bundle { "*" } else { " " };
        println!("{marker} {name}");
    }
    Ok(())
}

fn run_returns(file: &Path, start: &str, end: &str) -> Result<()> {
    let stats = return_window_stats(file, start, end)
        .with_context(|| format!("analysing {}", file.display()))?;

    let fmt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.6}"));

    println!("=== Daily Returns ===");
    println!("File:         {}", file.display());
    println!("Window:       {} to {}", stats.start, stats.end);
    println!("Observations: {}", stats.observations);
    println!("Min:          {}", fmt(stats.min));
    println!("Max:          {}", fmt(stats.max));
    println!("Std dev:      {}", fmt(stats.std));
    Ok(())
}
