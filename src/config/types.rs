use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// User agent sent when no headers are configured
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36";

/// Everything a crawl needs to know, fixed for the lifetime of the crawl
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CrawlConfig {
    /// Gallery URL the crawl starts from
    #[serde(default)]
    pub url: String,

    /// Query parameter the gallery uses to select a page
    #[serde(default = "default_navigator")]
    pub navigator: String,

    /// First page to download (0 = unspecified, starts at 1)
    #[serde(rename = "page-start", default)]
    pub page_start: u32,

    /// Last page to download (0 = no limit)
    #[serde(rename = "page-end", default)]
    pub page_end: u32,

    /// Consecutive all-duplicate pages before giving up (0 = disabled)
    #[serde(rename = "break-number", default)]
    pub break_number: u32,

    /// Prefix filenames with the image date
    #[serde(rename = "add-dates", default = "default_true")]
    pub add_dates: bool,

    /// Nest files one folder deep, named after the image URL's parent directory
    #[serde(rename = "create-folders", default)]
    pub create_folders: bool,

    /// Overwrite files that already exist
    #[serde(default)]
    pub force: bool,

    /// Headers sent with every request
    #[serde(default = "default_headers")]
    pub headers: BTreeMap<String, String>,

    /// Proxy URLs keyed by scheme (`http`, `https` or `all`)
    #[serde(default)]
    pub proxies: BTreeMap<String, String>,

    /// Additional attempts after a timeout or transport error
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Concurrent downloads per page
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Directory the host-named download root is created in
    #[serde(rename = "output-dir", default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl CrawlConfig {
    /// Creates a configuration for `url` with every other option at its default
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Per-request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            navigator: default_navigator(),
            page_start: 0,
            page_end: 0,
            break_number: 0,
            add_dates: true,
            create_folders: false,
            force: false,
            headers: default_headers(),
            proxies: BTreeMap::new(),
            retries: default_retries(),
            timeout: default_timeout(),
            workers: default_workers(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_navigator() -> String {
    "git".to_string()
}

fn default_true() -> bool {
    true
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string())])
}

fn default_retries() -> u32 {
    5
}

fn default_timeout() -> u64 {
    5
}

fn default_workers() -> usize {
    30
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
