//! Listing Harvester main entry point
//!
//! This is the command-line interface for the listing harvester.

use anyhow::Context;
use clap::Parser;
use listing_harvester::config::{load_config_with_hash, Config};
use listing_harvester::storage::{ListingRepository, SqliteStore};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Number of sessions shown by --stats
const RECENT_SESSIONS: usize = 10;

/// Listing Harvester: incremental infinite-scroll harvesting
///
/// Scrolls an already-authenticated listing feed, extracts each listing card,
/// slows down or speeds up with the feed's loading rate, stops once the feed
/// is exhausted, and stores every listing it has not stored before.
#[derive(Parser, Debug)]
#[command(name = "listing-harvester")]
#[command(version)]
#[command(about = "Incremental infinite-scroll listing harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (environment variables apply on top)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and print the effective settings without harvesting
    #[arg(long, conflicts_with_all = ["stats", "list"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "list"])]
    stats: bool,

    /// Print the N most recently stored listings and exit
    #[arg(long, value_name = "N", conflicts_with_all = ["dry_run", "stats"])]
    list: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    match &cli.config {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file given, using defaults and environment"),
    }
    let (config, config_hash) = match load_config_with_hash(cli.config.as_deref()) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &config_hash)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(limit) = cli.list {
        handle_list(&config, limit)?;
    } else {
        handle_harvest(config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_harvester=info,warn"),
            1 => EnvFilter::new("listing_harvester=debug,info"),
            2 => EnvFilter::new("listing_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_store(config: &Config) -> anyhow::Result<SqliteStore> {
    SqliteStore::new(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open database {}", config.output.database_path))
}

/// Handles the --dry-run mode: prints the effective configuration
fn handle_dry_run(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    println!("=== Listing Harvester Dry Run ===\n");

    let harvest = &config.harvest;
    println!("Target:");
    println!("  URL: {}", config.target.url);
    println!("  Item selector: {}", config.target.item_selector);

    println!("\nLimits:");
    println!("  Max cycles: {}", harvest.max_cycles);
    println!("  Max session duration: {:?}", harvest.max_session_duration());

    println!("\nPacing:");
    println!(
        "  Delay: {:?} initial, {:?} min, {:?} max",
        harvest.initial_delay(),
        harvest.min_delay(),
        harvest.max_delay()
    );
    println!("  Settle after navigation: {:?}", harvest.settle_delay());

    println!("\nExhaustion:");
    println!(
        "  Thresholds: no-new {}, unchanged {}, scroll-stuck {}",
        harvest.max_consecutive_no_new,
        harvest.max_consecutive_unchanged_dom,
        harvest.max_consecutive_scroll_stuck
    );
    println!("  Signals required: {}", harvest.required_soft_signals);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nEffective configuration:\n");
    println!("{}", toml::to_string_pretty(config)?);

    println!("✓ Configuration is valid (hash: {})", config_hash);

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use listing_harvester::output::{load_statistics, print_statistics};

    println!("Database: {}\n", config.output.database_path);

    let store = open_store(config)?;
    let stats = load_statistics(&store, RECENT_SESSIONS)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --list mode: prints the newest stored listings
fn handle_list(config: &Config, limit: usize) -> anyhow::Result<()> {
    use listing_harvester::output::print_listings;

    let store = open_store(config)?;
    let records = store.list_listings(limit)?;
    print_listings(&records);

    Ok(())
}

/// Handles the main harvest operation
#[cfg(feature = "browser")]
async fn handle_harvest(config: Config, config_hash: String) -> anyhow::Result<()> {
    use listing_harvester::config::validate_target_config;
    use listing_harvester::driver::ChromiumDriver;
    use listing_harvester::harvester::harvest;
    use listing_harvester::output::{print_summary, session_status, session_totals};
    use listing_harvester::storage::{SessionLog, SessionStatus, SessionTotals};
    use std::sync::Arc;

    validate_target_config(&config.target)?;

    let store = Arc::new(open_store(&config)?);
    let session_id = store.begin_session(&config_hash)?;
    tracing::info!("Recorded harvest session {}", session_id);

    let driver = match ChromiumDriver::from_config(&config.browser).await {
        Ok(driver) => Arc::new(driver),
        Err(e) => {
            tracing::error!("Could not start browser session: {}", e);
            store.finish_session(
                session_id,
                SessionStatus::Failed,
                &SessionTotals::default(),
                Some(&e.to_string()),
            )?;
            return Err(e.into());
        }
    };

    let outcome = harvest(driver.clone(), store.clone(), &config).await;

    let error_message = outcome.error.as_ref().map(|e| e.to_string());
    store.finish_session(
        session_id,
        session_status(&outcome),
        &session_totals(&outcome),
        error_message.as_deref(),
    )?;

    match Arc::try_unwrap(driver) {
        Ok(driver) => driver.close().await,
        Err(_) => tracing::debug!("Browser still referenced, leaving it to shut down on exit"),
    }

    print_summary(session_id, &outcome);

    match outcome.error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Handles the main harvest operation
#[cfg(not(feature = "browser"))]
async fn handle_harvest(_config: Config, _config_hash: String) -> anyhow::Result<()> {
    anyhow::bail!(
        "this build has no browser driver; rebuild with `--features browser` to run a harvest"
    )
}
