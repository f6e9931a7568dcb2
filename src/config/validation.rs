//! Configuration checks run before any directory is created or request sent

use crate::config::types::CrawlConfig;
use crate::url::SeedUrl;
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};
use std::collections::BTreeMap;
use url::Url;

/// Proxy keys understood by the HTTP client builder
const PROXY_SCHEMES: &[&str] = &["http", "https", "all"];

/// Validates the entire configuration
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_seed_url(&config.url)?;
    validate_navigator(&config.navigator)?;
    validate_page_range(resolve_start_page(config)?, config.page_end)?;
    validate_workers(config.workers)?;
    validate_headers(&config.headers)?;
    validate_proxies(&config.proxies)?;
    Ok(())
}

/// First page of the crawl
///
/// A page number carried by the seed URL replaces `page-start`. Page 0, from
/// either source, is crawled as page 1.
pub fn resolve_start_page(config: &CrawlConfig) -> Result<u32, ConfigError> {
    let seed = SeedUrl::parse(&config.url, &config.navigator)?;
    match seed.initial_page() {
        Some(0) => {
            tracing::debug!("Seed URL selects page 0, starting from page 1");
            Ok(1)
        }
        Some(page) => {
            tracing::debug!(page, "Starting page taken from seed URL");
            Ok(page)
        }
        None => Ok(config.page_start.max(1)),
    }
}

/// Checks that a bounded page range does not end before it starts
///
/// A start of 0 means "unspecified" and behaves like page 1; an end of 0 means
/// the range is unbounded.
fn validate_page_range(page_start: u32, page_end: u32) -> Result<(), ConfigError> {
    let start = page_start.max(1);
    if page_end != 0 && page_end < start {
        return Err(ConfigError::PageRange {
            start,
            end: page_end,
        });
    }
    Ok(())
}

fn validate_seed_url(seed: &str) -> Result<(), ConfigError> {
    if seed.is_empty() {
        return Err(ConfigError::Validation("url cannot be empty".to_string()));
    }

    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' must use http or https",
            seed
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' has no host",
            seed
        )));
    }

    Ok(())
}

fn validate_navigator(navigator: &str) -> Result<(), ConfigError> {
    if navigator.is_empty() {
        return Err(ConfigError::Validation(
            "navigator cannot be empty".to_string(),
        ));
    }

    if !navigator
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(ConfigError::Validation(format!(
            "navigator must contain only letters, digits, '_', '-' or '.', got '{}'",
            navigator
        )));
    }

    Ok(())
}

fn validate_workers(workers: usize) -> Result<(), ConfigError> {
    if workers < 1 {
        return Err(ConfigError::Validation(format!(
            "workers must be >= 1, got {}",
            workers
        )));
    }
    Ok(())
}

fn validate_headers(headers: &BTreeMap<String, String>) -> Result<(), ConfigError> {
    for (name, value) in headers {
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            ConfigError::Validation(format!("Invalid header name '{}'", name))
        })?;
        HeaderValue::from_str(value).map_err(|_| {
            ConfigError::Validation(format!("Invalid value for header '{}'", name))
        })?;
    }
    Ok(())
}

fn validate_proxies(proxies: &BTreeMap<String, String>) -> Result<(), ConfigError> {
    for (scheme, proxy) in proxies {
        if !PROXY_SCHEMES.contains(&scheme.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Unsupported proxy key '{}', expected one of: {}",
                scheme,
                PROXY_SCHEMES.join(", ")
            )));
        }

        Url::parse(proxy).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid {} proxy '{}': {}", scheme, proxy, e))
        })?;
    }
    Ok(())
}
