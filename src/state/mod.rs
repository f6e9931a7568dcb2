//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlCursor`: current page and consecutive-duplicate counter
//! - `DownloadOutcome` / `PageResult`: what happened to each item on a page
//! - `Termination` / `CrawlReport`: how and where the crawl ended

mod cursor;
mod outcome;

// Re-export main types
pub use cursor::CrawlCursor;
pub use outcome::{CrawlReport, CrawlTotals, DownloadOutcome, PageResult, Termination};
