//! honey-dl main entry point
//!
//! This is the command-line interface for the honey-dl gallery downloader.

use clap::Parser;
use honey_dl::config::{parse_json_map, read_config_with_hash, CrawlConfig};
use honey_dl::output::print_report;
use honey_dl::{Crawler, HoneyError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// honey-dl: download every image of a paginated gallery
///
/// Pages are fetched one after another by appending the navigation parameter to
/// the URL. Images on each page are downloaded concurrently into a directory named
/// after the gallery host; files that already exist are skipped.
#[derive(Parser, Debug)]
#[command(name = "honey-dl")]
#[command(version)]
#[command(about = "Download every image of a paginated gallery", long_about = None)]
struct Cli {
    /// Gallery URL to start from
    #[arg(value_name = "URL")]
    url: String,

    /// TOML file with default options; flags given here take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Add the date (from the alt attribute) to filenames
    #[arg(short = 'a', long, overrides_with = "no_add_dates")]
    add_dates: bool,

    /// Do not add dates to filenames
    #[arg(long, overrides_with = "add_dates")]
    no_add_dates: bool,

    /// Create subfolders based on the image URL path
    #[arg(short = 'c', long, overrides_with = "no_create_folders")]
    create_folders: bool,

    /// Put every file directly under the host directory
    #[arg(long, overrides_with = "create_folders")]
    no_create_folders: bool,

    /// Overwrite existing files
    #[arg(short = 'f', long, overrides_with = "no_force")]
    force: bool,

    /// Keep existing files
    #[arg(long, overrides_with = "force")]
    no_force: bool,

    /// HTTP headers as a JSON object
    #[arg(short = 'H', long, value_name = "JSON")]
    headers: Option<String>,

    /// URL parameter used to navigate between pages
    #[arg(short = 'n', long)]
    navigator: Option<String>,

    /// First page to download (0 means from the beginning)
    #[arg(long, visible_alias = "p1")]
    page_start: Option<u32>,

    /// Last page to download (0 means no limit)
    #[arg(long, visible_alias = "p2")]
    page_end: Option<u32>,

    /// Stop after this many consecutive pages of existing files (0 disables)
    #[arg(short = 'b', long)]
    break_number: Option<u32>,

    /// Proxy settings as a JSON object keyed by scheme
    #[arg(short = 'p', long, value_name = "JSON")]
    proxies: Option<String>,

    /// Number of retries per request
    #[arg(short = 'r', long)]
    retries: Option<u32>,

    /// Timeout per request in seconds
    #[arg(short = 't', long)]
    timeout: Option<u64>,

    /// Number of concurrent downloads
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Directory the host directory is created in
    #[arg(short = 'o', long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Exit code for a crawl stopped by the user
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let crawler = Crawler::new(config);
    let cancel = crawler.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted by user, finishing downloads in progress...");
            cancel.cancel();
        }
    });

    match crawler.run().await {
        Ok(report) => {
            if !cli.quiet {
                print_report(&report);
            }

            if report.termination.is_interrupted() {
                ExitCode::from(EXIT_INTERRUPTED)
            } else if report.termination.is_error() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(HoneyError::Config(e)) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("honey_dl=info,warn"),
            1 => EnvFilter::new("honey_dl=debug,info"),
            2 => EnvFilter::new("honey_dl=trace,debug"),
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

/// Assembles the crawl configuration: defaults, then the config file, then flags
fn build_config(cli: &Cli) -> anyhow::Result<CrawlConfig> {
    use anyhow::Context;

    let mut config = match &cli.config {
        Some(path) => {
            let (config, hash) = read_config_with_hash(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded from {} (hash: {})", path.display(), hash);
            config
        }
        None => CrawlConfig::default(),
    };

    config.url = cli.url.clone();

    if cli.add_dates {
        config.add_dates = true;
    } else if cli.no_add_dates {
        config.add_dates = false;
    }
    if cli.create_folders {
        config.create_folders = true;
    } else if cli.no_create_folders {
        config.create_folders = false;
    }
    if cli.force {
        config.force = true;
    } else if cli.no_force {
        config.force = false;
    }

    if let Some(headers) = &cli.headers {
        config.headers = parse_json_map("headers", headers)?;
    }
    if let Some(proxies) = &cli.proxies {
        config.proxies = parse_json_map("proxies", proxies)?;
    }
    if let Some(navigator) = &cli.navigator {
        config.navigator = navigator.clone();
    }
    if let Some(page_start) = cli.page_start {
        config.page_start = page_start;
    }
    if let Some(page_end) = cli.page_end {
        config.page_end = page_end;
    }
    if let Some(break_number) = cli.break_number {
        config.break_number = break_number;
    }
    if let Some(retries) = cli.retries {
        config.retries = retries;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout = timeout;
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(output_dir) = &cli.output_dir {
        config.output_dir = output_dir.clone();
    }

    // Report problems before anything touches the network
    honey_dl::config::validate(&config).context("Invalid configuration")?;

    Ok(config)
}
