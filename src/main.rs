use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use amplifier::config::{Config, CycleSettings};
use amplifier::db::{CheckpointStore, MemoryCheckpointStore};
use amplifier::feed::client::ApiClient;
use amplifier::feed::{Amplifier, Credentials, FeedSource};
use amplifier::pipeline::{CycleOutcome, LoaderConfig, Target};
use amplifier::scheduler;
use amplifier::target::TargetSet;

/// Amplifier: repost what an account publishes, filtered.
///
/// Watches each target account's feed and reposts items matching its
/// filter expression, exactly once, resuming from a stored checkpoint.
#[derive(Parser)]
#[command(name = "amplifier", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the checkpoint database
    Init,

    /// Validate target values and print their canonical filters
    Check {
        /// Target as <account>:<filter>, e.g. "news:and(photo,not(rt))" (repeatable)
        #[arg(long = "target", required = true)]
        targets: Vec<String>,
    },

    /// Watch targets and amplify matching items until Ctrl-C
    Run(RunArgs),

    /// Show stored checkpoints
    Status,
}

#[derive(Args)]
struct RunArgs {
    /// Target as <account>:<filter>, e.g. "news:and(photo,not(rt))" (repeatable)
    #[arg(long = "target", required = true)]
    targets: Vec<String>,

    /// Minutes between the end of one cycle and the start of the next
    #[arg(long, default_value = "10")]
    interval: u64,

    /// Minutes a single cycle may run before it is cancelled
    #[arg(long, default_value = "5")]
    timeout: u64,

    /// Minutes of history to scan for a target without a checkpoint
    #[arg(long, default_value = "60")]
    fallback: u64,

    /// Items requested per page (the API returns at most 200)
    #[arg(
        long,
        default_value = "200",
        value_parser = clap::value_parser!(u32).range(1..=200)
    )]
    page_size: u32,

    /// Maximum pages fetched per cycle
    #[arg(long, default_value = "16")]
    max_pages: u32,

    /// Keep checkpoints in memory only (every start is a cold start)
    #[arg(long)]
    ephemeral: bool,

    /// Run one cycle per target and exit
    #[arg(long)]
    once: bool,
}

impl RunArgs {
    fn settings(&self) -> CycleSettings {
        CycleSettings {
            interval: minutes(self.interval),
            timeout: minutes(self.timeout),
            loader: LoaderConfig {
                page_size: self.page_size,
                max_pages: self.max_pages,
                initial_backfill_horizon: minutes(self.fallback),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("amplifier=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing checkpoint database...");
            let config = Config::load()?;
            let table_count = init_database(&config)?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nAmplifier is ready. Next step: set the FEED_CONSUMER_* and FEED_ACCESS_* credentials in your .env file");
            println!("  (see .env.example for required variables)");
            println!("\nThen run: amplifier run --target <account>:<filter>");
        }

        Commands::Check { targets } => {
            let mut invalid = 0;
            let mut set = TargetSet::default();
            for value in &targets {
                if let Err(e) = set.add(value) {
                    println!("{} {}", "invalid".red().bold(), e);
                    invalid += 1;
                }
            }
            for spec in set.targets() {
                println!("{} @{}: {}", "ok".green().bold(), spec.account, spec.filters);
            }
            if invalid > 0 {
                anyhow::bail!("{invalid} of {} target values are invalid", targets.len());
            }
        }

        Commands::Run(args) => {
            let config = Config::load()?;
            let credentials = config.credentials()?;
            if !credentials.has_user_context() {
                warn!(
                    "Bearer token only: reposting needs the FEED_CONSUMER_* and FEED_ACCESS_* credentials"
                );
            }
            run(&config, credentials, &args).await?;
        }

        Commands::Status => {
            let config = Config::load()?;
            let store = open_database(&config)?;
            amplifier::status::show(store.as_ref(), &config.db_path).await?;
        }
    }

    Ok(())
}

async fn run(config: &Config, credentials: Credentials, args: &RunArgs) -> Result<()> {
    let settings = args.settings();

    // A bad value only drops its own target.
    let mut set = TargetSet::default();
    for value in &args.targets {
        if let Err(e) = set.add(value) {
            error!(error = %e, "Skipping target");
        }
    }
    if set.is_empty() {
        anyhow::bail!("No valid targets. Check them with `amplifier check --target ...`");
    }

    let store: Arc<dyn CheckpointStore> = if args.ephemeral {
        warn!("Ephemeral mode: checkpoints are kept in memory only");
        Arc::new(MemoryCheckpointStore::new())
    } else {
        persistent_store(config)?
    };

    let client = Arc::new(ApiClient::new(&config.api_url, credentials)?);
    let source: Arc<dyn FeedSource> = client.clone();
    let actions: Arc<dyn Amplifier> = client.clone();

    let mut targets = Vec::new();
    for spec in set.into_targets() {
        match client.resolve_account(&spec.account).await {
            Ok(account_id) => targets.push(Target {
                handle: spec.account,
                account_id,
                filters: spec.filters,
            }),
            Err(e) => error!(account = %spec.account, error = %e, "Skipping target"),
        }
    }

    let mut runners = scheduler::prepare_runners(
        targets,
        &store,
        &settings.loader,
        settings.timeout,
        source,
        actions,
    )
    .await;
    if runners.is_empty() {
        anyhow::bail!("None of the targets could be set up");
    }

    if args.once {
        let outcomes = scheduler::run_once(&mut runners).await;
        for (runner, outcome) in runners.iter().zip(&outcomes) {
            print_outcome(&runner.target().handle, outcome, runner.checkpoint());
        }
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        info!("Shutdown requested, finishing up");
        let _ = shutdown_tx.send(true);
    });

    scheduler::run_all(runners, settings.interval, shutdown_rx).await;
    Ok(())
}

fn print_outcome(handle: &str, outcome: &CycleOutcome, checkpoint: u64) {
    let summary = match outcome {
        CycleOutcome::Completed { matched, report } => format!(
            "{} matched {}, amplified {}, skipped {}",
            "done".green().bold(),
            matched,
            report.amplified(),
            report.skipped()
        ),
        CycleOutcome::LoadFailed(e) => format!("{} {}", "load failed".red().bold(), e),
        CycleOutcome::ReconcileFatal(report) => format!(
            "{} {}",
            "stopped".red().bold(),
            report.fatal_cause().unwrap_or("unknown error")
        ),
        CycleOutcome::TimedOut => "timed out".yellow().bold().to_string(),
    };
    println!("@{handle}: {summary} (checkpoint {checkpoint})");
}

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

/// Create the database if needed; returns the table count.
#[cfg(feature = "sqlite")]
fn init_database(config: &Config) -> Result<i64> {
    let conn = amplifier::db::initialize(&config.db_path)?;
    amplifier::db::schema::table_count(&conn)
}

#[cfg(not(feature = "sqlite"))]
fn init_database(_config: &Config) -> Result<i64> {
    anyhow::bail!("Built without the 'sqlite' feature. Rebuild with: cargo build --features sqlite")
}

/// The checkpoint store for `run`, created on first use.
#[cfg(feature = "sqlite")]
fn persistent_store(config: &Config) -> Result<Arc<dyn CheckpointStore>> {
    amplifier::db::initialize_sqlite(&config.db_path)
}

#[cfg(not(feature = "sqlite"))]
fn persistent_store(_config: &Config) -> Result<Arc<dyn CheckpointStore>> {
    anyhow::bail!(
        "Built without the 'sqlite' feature; pass --ephemeral or rebuild with: cargo build --features sqlite"
    )
}

/// Existing checkpoint store for `status`; `None` before `init`.
#[cfg(feature = "sqlite")]
fn open_database(config: &Config) -> Result<Option<Arc<dyn CheckpointStore>>> {
    if !amplifier::status::database_exists(&config.db_path) {
        return Ok(None);
    }
    amplifier::db::open_sqlite(&config.db_path).map(Some)
}

#[cfg(not(feature = "sqlite"))]
fn open_database(_config: &Config) -> Result<Option<Arc<dyn CheckpointStore>>> {
    Ok(None)
}
