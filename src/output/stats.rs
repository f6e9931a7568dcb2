//! Human-readable crawl report

use crate::state::{CrawlReport, Termination};

/// Formats the final report of a crawl
pub fn format_report(report: &CrawlReport) -> String {
    let headline = match &report.termination {
        Termination::Exhausted => "Downloading completed: no more images in the gallery".to_string(),
        Termination::DuplicateCutoff => {
            "Downloading completed: recent pages only contained existing files".to_string()
        }
        Termination::PageRangeComplete => {
            format!("Downloading completed: reached last page {}", report.last_page)
        }
        Termination::PageFetchFailed(e) => {
            format!("Failed to retrieve page {}: {}", report.last_page, e)
        }
        Termination::Interrupted => {
            format!("Interrupted by user on page {}", report.last_page)
        }
    };

    format!(
        "{}\n  Pages processed: {}\n  Downloaded: {}\n  Skipped: {}\n  Failed: {}",
        headline, report.pages_processed, report.downloaded, report.skipped, report.failed
    )
}

/// Prints the final report of a crawl to stdout
pub fn print_report(report: &CrawlReport) {
    println!("{}", format_report(report));
}
