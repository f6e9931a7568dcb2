//! honey-dl: a paginated image gallery downloader
//!
//! This crate walks a gallery page by page starting from a seed URL, finds the
//! thumbnail images on each page, and stores every image under a directory named
//! after the gallery host. Files that already exist are left alone unless forced,
//! which makes repeated runs cheap to reason about.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for honey-dl operations
///
/// These are the failures that prevent a crawl from starting. Once the crawl
/// loop is running, every way it can end is reported through
/// [`state::Termination`] instead.
#[derive(Debug, Error)]
pub enum HoneyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid JSON for {option}: {source}")]
    Json {
        option: &'static str,
        source: serde_json::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Last page should be bigger or equal to first page (start {start}, end {end})")]
    PageRange { start: u32, end: u32 },
}

/// Errors raised while fetching a single URL
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The server answered with something other than 200. Never retried.
    #[error("Failed to get {url}: HTTP {code}")]
    HttpStatus { url: String, code: u16 },

    /// Every attempt timed out
    #[error("Timed out after {attempts} attempt(s): {url}")]
    Timeout { url: String, attempts: u32 },

    /// Every attempt failed at the transport level (DNS, connect, TLS, ...)
    #[error("Request error after {attempts} attempt(s): {url}, {detail}")]
    Transport {
        url: String,
        attempts: u32,
        detail: String,
    },
}

/// Errors scoped to one discovered image
///
/// An item error never aborts the page; it turns into
/// [`state::DownloadOutcome::Failed`] for that item.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("Date '{raw}' does not match DD-MM-YYYY")]
    Date { raw: String },

    #[error("Image has no date attribute")]
    MissingDate,

    #[error("No filename can be derived from {url}")]
    NoFilename { url: String },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Download task failed: {0}")]
    Task(String),
}

/// Result type alias for honey-dl operations
pub type Result<T> = std::result::Result<T, HoneyError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::CrawlConfig;
pub use crawler::{crawl, Crawler};
pub use output::{CrawlEvent, CrawlObserver, TracingObserver};
pub use state::{CrawlCursor, CrawlReport, DownloadOutcome, PageResult, Termination};
