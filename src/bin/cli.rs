//! whatson CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use whatson::{
    error::{AppError, Result},
    fetch::FetcherRegistry,
    models::{CalendarPeriod, Config, IngestionReport, TheatreSource},
    pipeline::{self, IngestOptions},
    storage::{LocalStorage, MemoryStorage, ShowStorage},
};

/// whatson - Theatre Show Listings
#[derive(Parser, Debug)]
#[command(
    name = "whatson",
    version,
    about = "Ingests theatre show listings and lists them by month"
)]
struct Cli {
    /// Path to storage directory containing config.toml and the show file
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape configured theatres and store their shows
    Ingest {
        /// Only ingest this theatre (even if inactive)
        #[arg(long)]
        theatre: Option<String>,

        /// Scrape and report without writing to storage
        #[arg(long)]
        dry_run: bool,
    },

    /// List months that have shows
    Months,

    /// List shows running in a month
    Shows {
        /// Month as YYYY-MM
        month: CalendarPeriod,
    },

    /// Validate configuration file
    Validate,

    /// Show storage info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Theatres to ingest, honouring an explicit `--theatre`.
fn select_sources(config: &Config, theatre: Option<&str>) -> Result<Vec<TheatreSource>> {
    let Some(name) = theatre else {
        return Ok(config.theatres.clone());
    };

    let mut source = config
        .theatre(name)
        .cloned()
        .ok_or_else(|| AppError::config(format!("unknown theatre '{name}'")))?;
    if !source.active {
        log::info!("{} is inactive, ingesting it anyway", name);
        source.active = true;
    }
    Ok(vec![source])
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path)?;
    log::debug!("Loaded configuration from {}", config_path.display());

    match cli.command {
        Command::Ingest { theatre, dry_run } => {
            config.validate()?;
            let sources = select_sources(&config, theatre.as_deref())?;
            let fetchers = FetcherRegistry::with_defaults(&config.crawler)?;
            let options = IngestOptions::from_config(&config);

            let report = if dry_run {
                log::info!("Dry run: nothing will be written");
                let storage = MemoryStorage::new();
                let report = pipeline::ingest_all(&sources, &fetchers, &storage, &options).await?;
                for show in storage.shows().await {
                    log::info!("{}", show.format("  [{theatre}] {name} ({start} to {end})"));
                }
                report
            } else {
                let storage = LocalStorage::open(&cli.storage_dir, &config.storage.file).await?;
                pipeline::ingest_all(&sources, &fetchers, &storage, &options).await?
            };

            finish_ingest(&report)?;
        }

        Command::Months => {
            let storage = LocalStorage::open(&cli.storage_dir, &config.storage.file).await?;
            let months = pipeline::available_months(&storage).await?;
            if months.is_empty() {
                log::info!("No shows stored yet.");
            }
            for month in months {
                println!("{month}");
            }
        }

        Command::Shows { month } => {
            let storage = LocalStorage::open(&cli.storage_dir, &config.storage.file).await?;
            let shows = pipeline::shows_for_month(&storage, month).await?;
            log::info!("{} shows in {}", shows.len(), month);
            for show in shows {
                println!("{}", show.format("{start}..{end}\t{theatre}\t{name}\t{link}"));
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            let fetchers = FetcherRegistry::with_defaults(&config.crawler)?;
            for theatre in &config.theatres {
                fetchers.get(&theatre.fetcher).map_err(|e| {
                    AppError::validation(format!("{}: {}", theatre.name, e))
                })?;
            }
            log::info!(
                "✓ Config OK ({} theatres, {} active)",
                config.theatres.len(),
                config.active_theatres().count()
            );
        }

        Command::Info => {
            let storage = LocalStorage::open(&cli.storage_dir, &config.storage.file).await?;
            log::info!("Storage directory: {}", cli.storage_dir.display());
            log::info!("Show file: {}", storage.file_path().display());
            log::info!("Stored shows: {}", storage.count().await?);
            let fetchers = FetcherRegistry::with_defaults(&config.crawler)?;
            log::info!("Fetchers: {}", fetchers.names().join(", "));
            for theatre in &config.theatres {
                log::info!(
                    "  {} [{}] {}",
                    theatre.name,
                    if theatre.active { "active" } else { "inactive" },
                    theatre.url
                );
            }
        }
    }

    Ok(())
}

/// Log the run summary and fail on an aborted run.
fn finish_ingest(report: &IngestionReport) -> Result<()> {
    report.log_summary();
    match &report.fatal {
        Some(fatal) if report.failed() => Err(AppError::storage(
            format!("ingestion aborted: {fatal}"),
        )),
        _ => Ok(()),
    }
}
