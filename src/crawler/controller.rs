//! Pagination controller - main crawl orchestration logic
//!
//! This module contains the page loop that drives a crawl:
//! - Resolving the first page from the seed URL or the configuration
//! - Fetching and parsing one gallery page at a time
//! - Dispatching the page's downloads and waiting for all of them
//! - Deciding, from the settled page, whether to continue or stop
//!
//! Pages are strictly sequential. Page N+1's URL is only built once every
//! download of page N has a terminal outcome.

use crate::config::{resolve_start_page, validate, CrawlConfig};
use crate::crawler::dispatcher::DownloadDispatcher;
use crate::crawler::fetcher::{build_http_client, PageFetcher};
use crate::crawler::parser::parse_page_items;
use crate::output::{CrawlEvent, CrawlObserver, TracingObserver};
use crate::state::{CrawlCursor, CrawlReport, CrawlTotals, Termination};
use crate::storage::{prepare_domain_root, FileMaterializer};
use crate::url::{domain_root_name, SeedUrl};
use crate::{ConfigError, HoneyError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Gallery crawler
///
/// Owns an immutable configuration, the observer events are sent to, and the
/// token used to interrupt the crawl from outside.
pub struct Crawler {
    config: Arc<CrawlConfig>,
    observer: Arc<dyn CrawlObserver>,
    cancel: CancellationToken,
}

impl Crawler {
    /// Creates a crawler that reports through [`TracingObserver`]
    pub fn new(config: CrawlConfig) -> Self {
        Self {
            config: Arc::new(config),
            observer: Arc::new(TracingObserver),
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces the observer events are sent to
    pub fn with_observer(mut self, observer: Arc<dyn CrawlObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Uses `cancel` as the interrupt signal for this crawl
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that interrupts the crawl when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the crawl to one of its terminal states
    ///
    /// Configuration problems are returned as `Err` before any directory is
    /// created or request sent. Once the loop starts, every ending (including a
    /// gallery page that cannot be fetched) is returned as `Ok` with the
    /// matching [`Termination`].
    pub async fn run(&self) -> Result<CrawlReport, HoneyError> {
        let config = &self.config;
        validate(config)?;

        let seed = SeedUrl::parse(&config.url, &config.navigator)?;
        let start = resolve_start_page(config)?;

        let seed_url = Url::parse(&config.url)?;
        let root_name = domain_root_name(&seed_url).ok_or_else(|| {
            ConfigError::InvalidUrl(format!("Seed URL '{}' has no host", config.url))
        })?;

        let client = build_http_client(config)?;
        let root = prepare_domain_root(&config.output_dir, &root_name).await?;

        let fetcher = PageFetcher::new(client, config.retries, Arc::clone(&self.observer));
        let dispatcher = DownloadDispatcher::new(
            fetcher.clone(),
            FileMaterializer::new(root, config.create_folders, config.force),
            Arc::clone(&self.observer),
            config.workers,
            config.add_dates,
        );

        tracing::info!(
            seed = seed.base(),
            start,
            end = config.page_end,
            workers = config.workers,
            "Starting crawl"
        );

        let mut cursor = CrawlCursor::new(start);
        let mut totals = CrawlTotals::default();

        let termination = loop {
            if self.cancel.is_cancelled() {
                break Termination::Interrupted;
            }

            let page = cursor.page();
            let page_url = seed.page_url(page);
            self.observer.notify(&CrawlEvent::PageStarted {
                page,
                url: page_url.clone(),
            });

            let fetched = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break Termination::Interrupted,
                fetched = fetcher.fetch(&page_url) => fetched,
            };
            let body = match fetched {
                Ok(body) => body,
                Err(e) => break Termination::PageFetchFailed(e),
            };

            let base = Url::parse(&page_url).unwrap_or_else(|_| seed_url.clone());
            let items = parse_page_items(&body, &base);
            if items.is_empty() {
                tracing::debug!(page, "Page has no images");
                break Termination::Exhausted;
            }

            let result = dispatcher.run(page, items, &self.cancel).await;
            totals.add(&result);
            if result.interrupted || self.cancel.is_cancelled() {
                break Termination::Interrupted;
            }

            let duplicate_run = cursor.record(&result);
            tracing::debug!(
                page,
                downloaded = result.downloaded(),
                skipped = result.skipped(),
                failed = result.failed(),
                duplicate_run,
                "Page settled"
            );

            if cursor.duplicate_cutoff_reached(config.break_number) {
                break Termination::DuplicateCutoff;
            }

            if config.page_end != 0 && page >= config.page_end {
                break Termination::PageRangeComplete;
            }

            if !cursor.advance() {
                tracing::warn!(page, "No page number after this one, stopping");
                break Termination::PageRangeComplete;
            }
        };

        let report = totals.finish(termination, cursor.page());
        let event = if report.termination.is_interrupted() {
            CrawlEvent::CrawlInterrupted {
                report: report.clone(),
            }
        } else {
            CrawlEvent::CrawlCompleted {
                report: report.clone(),
            }
        };
        self.observer.notify(&event);

        Ok(report)
    }
}

/// Runs a complete crawl with the default observer
///
/// # Example
///
/// ```no_run
/// use honey_dl::config::CrawlConfig;
/// use honey_dl::crawler::crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = crawl(CrawlConfig::new("https://gallery.example.com/view?id=1")).await?;
/// println!("{} new images", report.downloaded);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: CrawlConfig) -> Result<CrawlReport, HoneyError> {
    Crawler::new(config).run().await
}
