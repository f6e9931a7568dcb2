//! Crawl cursor: where the crawl is and how long it has been seeing duplicates

use crate::state::PageResult;

/// Mutable crawl position, owned by the pagination controller
///
/// The cursor only changes after a page has fully settled, so the duplicate
/// counter always reflects complete pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlCursor {
    page: u32,
    duplicate_run: u32,
}

impl CrawlCursor {
    /// Creates a cursor positioned at `page` (pages start at 1)
    pub fn new(page: u32) -> Self {
        Self {
            page: page.max(1),
            duplicate_run: 0,
        }
    }

    /// Current page number
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Number of consecutive pages whose items were all already on disk
    pub fn duplicate_run(&self) -> u32 {
        self.duplicate_run
    }

    /// Folds a settled page into the duplicate counter and returns the new count
    pub fn record(&mut self, result: &PageResult) -> u32 {
        if result.all_duplicates() {
            self.duplicate_run += 1;
        } else {
            self.duplicate_run = 0;
        }
        self.duplicate_run
    }

    /// True once `threshold` consecutive duplicate pages were seen (0 disables)
    pub fn duplicate_cutoff_reached(&self, threshold: u32) -> bool {
        threshold != 0 && self.duplicate_run >= threshold
    }

    /// Moves to the next page
    ///
    /// Returns false, leaving the cursor in place, when no page number follows.
    #[must_use]
    pub fn advance(&mut self) -> bool {
        match self.page.checked_add(1) {
            Some(next) => {
                self.page = next;
                true
            }
            None => false,
        }
    }
}
