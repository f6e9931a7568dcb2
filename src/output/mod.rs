//! Output module: crawl events, observers and the final report
//!
//! This module handles:
//! - The event vocabulary the crawl engine reports through
//! - The default observer that turns events into log records
//! - Printing a summary once the crawl has ended

pub mod stats;
mod traits;

pub use stats::{format_report, print_report};
pub use traits::{CrawlEvent, CrawlObserver, RetryReason, TracingObserver};
