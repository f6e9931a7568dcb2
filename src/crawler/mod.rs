//! Crawler module for gallery fetching and downloading
//!
//! This module contains the crawl engine:
//! - HTTP fetching with bounded retries
//! - Gallery page parsing
//! - Per-page download dispatch with a fixed number of workers
//! - The pagination loop that ties them together

mod controller;
mod dispatcher;
mod fetcher;
mod parser;

pub use controller::{run_crawl, Crawler};
pub use dispatcher::DownloadDispatcher;
pub use fetcher::{build_http_client, PageFetcher};
pub use parser::{canonical_date, parse_page_items, PageItem, IMAGE_SELECTOR};

use crate::config::CrawlConfig;
use crate::state::CrawlReport;
use crate::HoneyError;

/// Runs a complete crawl operation
///
/// This is the main entry point for a crawl. It will:
/// 1. Validate the configuration and resolve the first page
/// 2. Prepare the download root and its marker file
/// 3. Fetch, parse and download page after page
/// 4. Stop on an empty page, a duplicate run, the last page, a page fetch
///    failure, or an interrupt
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl ran; the report says how it ended
/// * `Err(HoneyError)` - The crawl could not start
pub async fn crawl(config: CrawlConfig) -> Result<CrawlReport, HoneyError> {
    run_crawl(config).await
}
