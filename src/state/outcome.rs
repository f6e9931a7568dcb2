//! Per-item and per-crawl outcome types
//!
//! Every item handed to the dispatcher ends in exactly one [`DownloadOutcome`].
//! A page's outcomes are gathered into a [`PageResult`], and the way the crawl as
//! a whole ended is a [`Termination`].

use crate::{FetchError, ItemError};
use std::fmt;
use std::path::PathBuf;

/// Terminal result for one discovered image
#[derive(Debug)]
pub enum DownloadOutcome {
    /// Bytes were fetched and written to `path`
    Downloaded { path: PathBuf },

    /// `path` already existed and the crawl is not forced
    Skipped { path: PathBuf },

    /// The image could not be fetched, dated, or written
    Failed { url: String, error: ItemError },
}

impl DownloadOutcome {
    pub fn is_downloaded(&self) -> bool {
        matches!(self, Self::Downloaded { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// All outcomes for a single gallery page
///
/// `item_count` is the number of items the parser found. It equals
/// `outcomes.len()` unless the crawl was interrupted while the page was being
/// dispatched, in which case the items that were never started have no outcome.
#[derive(Debug, Default)]
pub struct PageResult {
    pub page: u32,
    pub item_count: usize,
    pub outcomes: Vec<DownloadOutcome>,
    pub interrupted: bool,
}

impl PageResult {
    pub fn downloaded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_downloaded()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    /// True when the page had no items at all
    pub fn is_empty_page(&self) -> bool {
        self.item_count == 0
    }

    /// True when the page had items and every one of them was already on disk
    pub fn all_duplicates(&self) -> bool {
        self.item_count > 0
            && self.outcomes.len() == self.item_count
            && self.outcomes.iter().all(DownloadOutcome::is_skipped)
    }
}

/// How a crawl ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// A page came back without any images
    Exhausted,

    /// `break-number` consecutive pages contained only files already on disk
    DuplicateCutoff,

    /// The configured last page was processed
    PageRangeComplete,

    /// A gallery page could not be fetched
    PageFetchFailed(FetchError),

    /// The user asked the crawl to stop
    Interrupted,
}

impl Termination {
    /// True for terminations the CLI reports as a failure
    pub fn is_error(&self) -> bool {
        matches!(self, Self::PageFetchFailed(_))
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => write!(f, "gallery exhausted"),
            Self::DuplicateCutoff => write!(f, "stopped after consecutive pages of existing files"),
            Self::PageRangeComplete => write!(f, "last requested page reached"),
            Self::PageFetchFailed(e) => write!(f, "page fetch failed: {}", e),
            Self::Interrupted => write!(f, "interrupted by user"),
        }
    }
}

/// Final report of a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub termination: Termination,

    /// Page the crawl was on when it ended
    pub last_page: u32,

    /// Pages whose items were dispatched (empty pages are not counted)
    pub pages_processed: u32,

    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Running totals kept while the crawl is in progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlTotals {
    pub pages_processed: u32,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl CrawlTotals {
    /// Adds one dispatched page to the totals
    pub fn add(&mut self, result: &PageResult) {
        self.pages_processed += 1;
        self.downloaded += result.downloaded();
        self.skipped += result.skipped();
        self.failed += result.failed();
    }

    pub fn finish(self, termination: Termination, last_page: u32) -> CrawlReport {
        CrawlReport {
            termination,
            last_page,
            pages_processed: self.pages_processed,
            downloaded: self.downloaded,
            skipped: self.skipped,
            failed: self.failed,
        }
    }
}
