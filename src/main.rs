use clap::{Args, Parser, Subcommand};
use lyrics_harvest::{
    BatchOrchestrator, Collector, Config, Database, HttpFetcher, PendingSelection, Processor,
    Result, run_until_signal, write_index,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "lyrics-harvest")]
#[command(version, about = "Harvest song lyrics from a paginated catalog into markdown files")]
struct Cli {
    /// JSON configuration file; built-in defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Record store path (overrides persistence.database_path)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Artifact directory (overrides process.output_dir)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Log at DEBUG level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl catalog listing pages and record every item link
    Collect(CollectArgs),
    /// Fetch pending items and write their artifacts
    Process(ProcessArgs),
    /// Process pending items in bounded, timed batches until none remain
    Batch(BatchArgs),
    /// Show record counts by status
    Stats,
    /// Move every failed record back to pending
    ResetFailed,
    /// Regenerate README.md and the SONGS_N.md list pages
    Index(IndexArgs),
}

#[derive(Args)]
struct CollectArgs {
    /// First listing page to fetch
    #[arg(long)]
    start_page: Option<u32>,

    /// Listing page to stop before
    #[arg(long)]
    max_page: Option<u32>,
}

#[derive(Args)]
struct ProcessArgs {
    /// Process at most this many pending records, in discovery order
    #[arg(long, conflicts_with = "test_sample")]
    limit: Option<u32>,

    /// Process a random sample of process.sample_size pending records
    #[arg(long)]
    test_sample: bool,
}

#[derive(Args)]
struct BatchArgs {
    /// Records per batch
    #[arg(long)]
    batch_size: Option<u32>,

    /// Stop after this many batches
    #[arg(long)]
    max_batches: Option<u32>,

    /// Per-batch time limit in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Args)]
struct IndexArgs {
    /// Directory for README.md and SONGS_N.md (overrides persistence.index_dir)
    #[arg(long)]
    index_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    exit_code(&run_until_signal(run(cli)).await)
}

/// 0 on a clean stop, 1 on any error, timeout or signal
fn exit_code(result: &Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "lyrics-harvest failed");
            ExitCode::FAILURE
        }
    }
}

/// File config (or defaults), then global flags, then subcommand flags
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(database) = &cli.database {
        config.persistence.database_path = database.clone();
    }
    if let Some(output_dir) = &cli.output_dir {
        config.process.output_dir = output_dir.clone();
    }
    apply_command_overrides(&mut config, &cli.command);
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    let db = Arc::new(Database::new(&config.persistence.database_path).await?);

    match cli.command {
        Command::Collect(_) => {
            let fetcher = Arc::new(HttpFetcher::new(config.fetch.clone())?);
            let report = Collector::new(db.clone(), fetcher, config.collect.clone())
                .run()
                .await?;
            println!(
                "Pages fetched: {}, skipped: {}; links found: {}, new items: {}, total items: {}",
                report.pages_fetched,
                report.pages_skipped,
                report.entries_found,
                report.new_items,
                report.total_items
            );
        }
        Command::Process(args) => {
            let selection = if args.test_sample {
                PendingSelection::RandomSample {
                    size: config.process.sample_size,
                }
            } else {
                PendingSelection::InsertionOrder { limit: args.limit }
            };
            let fetcher = Arc::new(HttpFetcher::new(config.fetch.clone())?);
            let report = Processor::new(db.clone(), fetcher, config.process.clone())
                .run(selection)
                .await?;
            println!(
                "Selected: {}, processed: {}, failed: {}",
                report.selected, report.processed, report.failed
            );
        }
        Command::Batch(_) => {
            let fetcher = Arc::new(HttpFetcher::new(config.fetch.clone())?);
            let processor = Processor::new(db.clone(), fetcher, config.process.clone());
            let report = BatchOrchestrator::new(db.clone(), processor, config.batch.clone())
                .run()
                .await?;
            println!(
                "Batches: {}, processed: {}, failed: {}, remaining: {} ({:?})",
                report.batches, report.processed, report.failed, report.remaining, report.stop
            );
        }
        Command::Stats => {
            let counts = db.status_counts().await?;
            println!("pending:   {}", counts.pending);
            println!("processed: {}", counts.processed);
            println!("failed:    {}", counts.failed);
            println!("total:     {}", counts.total());
        }
        Command::ResetFailed => {
            let reset = db.reset_failed().await?;
            println!("Reset {reset} failed record(s) to pending");
        }
        Command::Index(_) => {
            let report = write_index(
                &db,
                &config.persistence.index_dir,
                &config.process.output_dir,
            )
            .await?;
            println!("Indexed {} song(s) on {} page(s)", report.songs, report.pages);
        }
    }

    if let Ok(db) = Arc::try_unwrap(db) {
        db.close().await;
    }
    Ok(())
}

fn apply_command_overrides(config: &mut Config, command: &Command) {
    match command {
        Command::Collect(args) => {
            if let Some(start_page) = args.start_page {
                config.collect.start_page = start_page;
            }
            if let Some(max_page) = args.max_page {
                config.collect.max_page = max_page;
            }
        }
        Command::Batch(args) => {
            if let Some(batch_size) = args.batch_size {
                config.batch.batch_size = batch_size;
            }
            if args.max_batches.is_some() {
                config.batch.max_batches = args.max_batches;
            }
            if let Some(secs) = args.timeout_secs {
                config.batch.timeout = Duration::from_secs(secs);
            }
        }
        Command::Index(args) => {
            if let Some(index_dir) = &args.index_dir {
                config.persistence.index_dir = index_dir.clone();
            }
        }
        Command::Process(_) | Command::Stats | Command::ResetFailed => {}
    }
}
