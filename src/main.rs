//! CLI entry point for the bike-share trip statistics tool.
//!
//! Loads a year of trip partitions (files, directories or URLs), derives trip
//! lengths and prints the eight fleet and rider statistics.

use anyhow::{Context, Result};
use citibike_stats::{
    analyzers::{AnalysisReport, run_all},
    config::AnalysisConfig,
    ingest::{DefaultFetcher, IngestSummary, expand_sources, ingest},
    model::Dataset,
    snapshot::{read_snapshot, write_report_json, write_snapshot},
};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "citibike_stats")]
#[command(about = "Descriptive statistics over a year of bike-share trips", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load trip partitions and print every statistic
    Run {
        /// Partition CSV files (optionally .gz or .zip), directories of them, or URLs, in order
        #[arg(value_name = "PARTITION", required_unless_present = "from_snapshot")]
        inputs: Vec<String>,

        /// Read the enriched dataset from a snapshot instead of partitions
        #[arg(long, value_name = "FILE", conflicts_with = "inputs")]
        from_snapshot: Option<PathBuf>,

        /// Also write the enriched dataset to this snapshot file
        #[arg(long, value_name = "FILE")]
        snapshot_out: Option<PathBuf>,

        /// Write the report as JSON to this file
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,

        /// JSON file overriding the per user type time allowances
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Load trip partitions and only write the enriched snapshot
    Snapshot {
        /// Partition CSV files (optionally .gz or .zip), directories of them, or URLs, in order
        #[arg(value_name = "PARTITION", required = true)]
        inputs: Vec<String>,

        /// Snapshot file to write
        #[arg(short, long, default_value = "prepared_trips.csv")]
        output: PathBuf,
    },
}

const DEFAULT_LOG_FILE: &str = "logs/citibike_stats.log";

/// Human readable progress on stderr, full span detail as JSON in a daily
/// rolling file. The returned guard flushes the file writer on drop.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file = PathBuf::from(
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string()),
    );
    let dir = log_file.parent().unwrap_or(Path::new("logs"));
    let file_name = log_file
        .file_name()
        .unwrap_or(OsStr::new("citibike_stats.log"));
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file_name));

    let console = fmt::layer()
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_file = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(file_writer)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(console)
        .with(json_file)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing()?;

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run {
            inputs,
            from_snapshot,
            snapshot_out,
            json,
            config,
        } => run(inputs, from_snapshot, snapshot_out, json, config).await,
        Commands::Snapshot { inputs, output } => snapshot(inputs, output).await,
    };

    if let Err(e) = &outcome {
        error!(error = %e, "Run aborted");
    }
    outcome
}

/// Fetches, merges and enriches the given partitions.
async fn load(inputs: &[String]) -> Result<(Dataset, IngestSummary)> {
    let sources = expand_sources(inputs)?;
    if sources.is_empty() {
        warn!("No partitions found in the given inputs");
    }
    info!(partitions = sources.len(), "Loading trip partitions");
    Ok(ingest(Arc::new(DefaultFetcher::new()), sources).await?)
}

fn log_summary(summary: &IngestSummary) {
    info!(
        partitions = summary.partitions,
        records = summary.records,
        malformed = summary.malformed,
        "Ingestion complete"
    );
}

async fn run(
    inputs: Vec<String>,
    from_snapshot: Option<PathBuf>,
    snapshot_out: Option<PathBuf>,
    json: Option<PathBuf>,
    config: Option<String>,
) -> Result<()> {
    let config = match config {
        Some(path) => AnalysisConfig::load(&path)?,
        None => AnalysisConfig::default(),
    };

    let (dataset, summary) = match from_snapshot {
        Some(path) => {
            info!(path = %path.display(), "Loading enriched dataset from snapshot");
            let dataset = tokio::task::spawn_blocking(move || read_snapshot(&path)).await??;
            (dataset, None)
        }
        None => {
            let (dataset, summary) = load(&inputs).await?;
            log_summary(&summary);
            (dataset, Some(summary))
        }
    };

    if let Some(path) = &snapshot_out {
        write_snapshot(path, &dataset)?;
    }

    let report = tokio::task::spawn_blocking(move || run_all(&dataset, &config)).await??;

    print_report(&report);

    if let Some(path) = json {
        write_report_json(&path, &report, summary.as_ref())?;
        info!(path = %path.display(), "JSON report written");
    }
    Ok(())
}

async fn snapshot(inputs: Vec<String>, output: PathBuf) -> Result<()> {
    let (dataset, summary) = load(&inputs).await?;
    log_summary(&summary);
    write_snapshot(&output, &dataset)
        .with_context(|| format!("writing snapshot {}", output.display()))
}

fn print_report(report: &AnalysisReport) {
    for (i, (analysis, value)) in report.iter().enumerate() {
        println!("[{}] {}: {}", i + 1, analysis, value);
    }
}
