//! Crawl events and the observer interface
//!
//! The crawl engine never prints anything itself. It describes what is happening
//! as [`CrawlEvent`]s and hands them to a [`CrawlObserver`], which decides how (and
//! whether) to show them.

use crate::state::CrawlReport;
use crate::FetchError;
use std::fmt;
use std::path::PathBuf;

/// Why a fetch is being retried
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    Timeout,
    Transport(String),
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out"),
            Self::Transport(detail) => write!(f, "request error: {}", detail),
        }
    }
}

/// Something worth reporting that happened during a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    /// A gallery page is about to be fetched
    PageStarted { page: u32, url: String },

    /// An image was written to disk
    ItemDownloaded { filename: String, path: PathBuf },

    /// An image was already on disk and left untouched
    ItemSkipped { filename: String, path: PathBuf },

    /// An image could not be dated or written (fetch failures arrive as `FetchFailed`)
    ItemFailed { url: String, reason: String },

    /// A request failed in a retryable way and is being sent again
    FetchRetrying {
        url: String,
        attempt: u32,
        retries: u32,
        reason: RetryReason,
    },

    /// A request failed for good
    FetchFailed { error: FetchError },

    /// The crawl ended on its own (including page fetch failures)
    CrawlCompleted { report: CrawlReport },

    /// The crawl ended because the user asked it to stop
    CrawlInterrupted { report: CrawlReport },
}

/// Receiver for crawl events
///
/// Observers are shared between download tasks, so implementations must be
/// thread-safe and should return quickly.
pub trait CrawlObserver: Send + Sync {
    fn notify(&self, event: &CrawlEvent);
}

/// Default observer: one `tracing` record per event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CrawlObserver for TracingObserver {
    fn notify(&self, event: &CrawlEvent) {
        match event {
            CrawlEvent::PageStarted { page, url } => {
                tracing::info!(page, %url, "Processing page {}", page);
            }
            CrawlEvent::ItemDownloaded { filename, path } => {
                tracing::info!(path = %path.display(), "Downloaded: {}", filename);
            }
            CrawlEvent::ItemSkipped { filename, path } => {
                tracing::info!(path = %path.display(), "Skipped (already exists): {}", filename);
            }
            CrawlEvent::ItemFailed { url, reason } => {
                tracing::warn!(%url, "Failed to save image: {}", reason);
            }
            CrawlEvent::FetchRetrying {
                url,
                attempt,
                retries,
                reason,
            } => {
                tracing::warn!(%url, "{}, retrying ({}/{})", reason, attempt, retries);
            }
            CrawlEvent::FetchFailed { error } => {
                tracing::warn!("{}", error);
            }
            CrawlEvent::CrawlCompleted { report } => {
                if report.termination.is_error() {
                    tracing::error!(
                        page = report.last_page,
                        "Crawl aborted: {}",
                        report.termination
                    );
                } else {
                    tracing::info!(
                        page = report.last_page,
                        downloaded = report.downloaded,
                        skipped = report.skipped,
                        failed = report.failed,
                        "Downloading completed: {}",
                        report.termination
                    );
                }
            }
            CrawlEvent::CrawlInterrupted { report } => {
                tracing::warn!(
                    page = report.last_page,
                    downloaded = report.downloaded,
                    "Interrupted by user"
                );
            }
        }
    }
}
