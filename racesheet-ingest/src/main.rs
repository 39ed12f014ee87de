//! racesheet-ingest - Race result reconciliation CLI
//!
//! Applies extracted leaderboard records to a JSON workbook and offers the
//! read-back operations (name recheck, race summary) on it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use racesheet_common::config::{load_config, resolve_config_source, write_toml_config, TomlConfig};
use racesheet_ingest::services::parse_extraction_response;
use racesheet_ingest::layout::MAX_RACE;
use racesheet_ingest::{IngestPipeline, MemoryStore};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for racesheet-ingest
#[derive(Parser, Debug)]
#[command(name = "racesheet-ingest")]
#[command(about = "Reconcile extracted race results into the league workbook")]
#[command(version)]
struct Args {
    /// Config file (overrides RACESHEET_CONFIG and the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// JSON workbook file
    #[arg(short, long, global = true, env = "RACESHEET_WORKBOOK")]
    workbook: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply one extraction result to the workbook
    Reconcile {
        /// Extraction JSON (Markdown fences tolerated)
        #[arg(long)]
        record: PathBuf,

        /// Current race; overrides the race number in the record
        #[arg(long, value_parser = race_parser())]
        race: Option<u32>,
    },
    /// Re-resolve driver and car names already written for a race
    Recheck {
        #[arg(long, value_parser = race_parser())]
        race: u32,
    },
    /// Print the summary of a race
    Summary {
        #[arg(long, value_parser = race_parser())]
        race: u32,
    },
    /// Write the default configuration file
    InitConfig {
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is loaded before tracing so its level can seed the filter
    let config = load_config(args.config.as_deref());
    let default_level = config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting racesheet-ingest v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = config.context("Failed to load configuration")?;
    info!(source = ?resolve_config_source(args.config.as_deref()), "Configuration loaded");

    match args.command {
        Command::InitConfig { out } => {
            write_toml_config(&TomlConfig::default(), &out)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Wrote default configuration to {}", out.display());
        }
        Command::Reconcile { record, race } => {
            let workbook = require_workbook(args.workbook.as_deref())?;
            let text = tokio::fs::read_to_string(&record)
                .await
                .with_context(|| format!("Failed to read {}", record.display()))?;
            let parsed = parse_extraction_response(&text).context("Invalid extraction record")?;

            let store = Arc::new(open_workbook(workbook).await?);
            let mut pipeline = IngestPipeline::new(store.clone(), config);
            let processed = pipeline
                .process_record(&parsed, race)
                .await
                .context("Reconciliation failed")?;
            store
                .save_file(workbook)
                .await
                .context("Failed to save workbook")?;

            println!("{}", processed.caption());
            for w in &processed.warnings {
                println!("⚠️ {}", w);
            }
        }
        Command::Recheck { race } => {
            let workbook = require_workbook(args.workbook.as_deref())?;
            let store = Arc::new(open_workbook(workbook).await?);
            let mut pipeline = IngestPipeline::new(store.clone(), config);
            let report = pipeline.recheck_race(race).await.context("Recheck failed")?;
            if !report.corrections.is_empty() {
                store
                    .save_file(workbook)
                    .await
                    .context("Failed to save workbook")?;
            }
            for line in report.lines() {
                println!("{}", line);
            }
        }
        Command::Summary { race } => {
            let workbook = require_workbook(args.workbook.as_deref())?;
            let store = Arc::new(open_workbook(workbook).await?);
            let pipeline = IngestPipeline::new(store, config);
            let summary = pipeline
                .race_summary(race)
                .await
                .context("Reading race summary failed")?;
            for line in summary.lines() {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

/// Race numbers the results sheet can address
fn race_parser() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=i64::from(MAX_RACE))
}

fn require_workbook(path: Option<&Path>) -> Result<&Path> {
    match path {
        Some(p) => Ok(p),
        None => bail!("No workbook given (use --workbook or RACESHEET_WORKBOOK)"),
    }
}

/// Load the workbook, starting empty if the file does not exist yet
async fn open_workbook(path: &Path) -> Result<MemoryStore> {
    if !path.exists() {
        warn!(path = %path.display(), "Workbook not found, starting with an empty workbook");
        return Ok(MemoryStore::new());
    }
    MemoryStore::load_file(path)
        .await
        .with_context(|| format!("Failed to load workbook {}", path.display()))
}
