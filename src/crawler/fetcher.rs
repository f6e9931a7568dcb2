//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests of a crawl, for gallery pages and image
//! files alike:
//! - Building the HTTP client from the configured headers, proxies and timeout
//! - GET requests with bounded, immediate retries
//! - Error classification

use crate::config::CrawlConfig;
use crate::output::{CrawlEvent, CrawlObserver, RetryReason};
use crate::{FetchError, HoneyError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Proxy, StatusCode};
use std::sync::Arc;

/// Builds an HTTP client with the crawl's headers, proxies and timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(HoneyError)` - A header or proxy could not be used
pub fn build_http_client(config: &CrawlConfig) -> Result<Client, HoneyError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            crate::ConfigError::Validation(format!("Invalid header name '{}'", name))
        })?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            crate::ConfigError::Validation(format!("Invalid value for header '{}'", name))
        })?;
        headers.insert(name, value);
    }

    let mut builder = Client::builder()
        .default_headers(headers)
        .timeout(config.timeout())
        .gzip(true)
        .brotli(true);

    for (scheme, proxy_url) in &config.proxies {
        let proxy = match scheme.as_str() {
            "http" => Proxy::http(proxy_url)?,
            "https" => Proxy::https(proxy_url)?,
            _ => Proxy::all(proxy_url)?,
        };
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Outcome of a single request attempt
enum Attempt {
    Status(u16),
    Timeout,
    Transport { detail: String, retryable: bool },
}

impl Attempt {
    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport {
                retryable: !error.is_builder(),
                detail: error.to_string(),
            }
        }
    }
}

/// GETs URLs with the crawl's retry policy
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 200 | Return the body |
/// | Any other status | Fail immediately, no retry |
/// | Timeout | Retry immediately, up to `retries` more times |
/// | Transport error | Retry immediately, up to `retries` more times |
/// | Malformed URL | Fail immediately |
///
/// A fetch therefore makes at most `retries + 1` attempts.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
    retries: u32,
    observer: Arc<dyn CrawlObserver>,
}

impl PageFetcher {
    pub fn new(client: Client, retries: u32, observer: Arc<dyn CrawlObserver>) -> Self {
        Self {
            client,
            retries,
            observer,
        }
    }

    /// Fetches `url` and returns the response body
    ///
    /// Every retry is reported as [`CrawlEvent::FetchRetrying`], and a final
    /// failure as [`CrawlEvent::FetchFailed`] before the error is returned.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            tracing::debug!(%url, attempt, "GET");

            let (reason, retryable) = match self.try_once(url).await {
                Ok(body) => return Ok(body),
                Err(Attempt::Status(code)) => {
                    return Err(self.fail(FetchError::HttpStatus {
                        url: url.to_string(),
                        code,
                    }));
                }
                Err(Attempt::Timeout) => (RetryReason::Timeout, true),
                Err(Attempt::Transport { detail, retryable }) => {
                    (RetryReason::Transport(detail), retryable)
                }
            };

            if !retryable || attempt > self.retries {
                let error = match reason {
                    RetryReason::Timeout => FetchError::Timeout {
                        url: url.to_string(),
                        attempts: attempt,
                    },
                    RetryReason::Transport(detail) => FetchError::Transport {
                        url: url.to_string(),
                        attempts: attempt,
                        detail,
                    },
                };
                return Err(self.fail(error));
            }

            self.observer.notify(&CrawlEvent::FetchRetrying {
                url: url.to_string(),
                attempt,
                retries: self.retries,
                reason,
            });
        }
    }

    async fn try_once(&self, url: &str) -> Result<Vec<u8>, Attempt> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(Attempt::from_reqwest)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Attempt::Status(status.as_u16()));
        }

        // The body is part of the attempt: a timeout while streaming it is retried too
        let body = response.bytes().await.map_err(Attempt::from_reqwest)?;
        Ok(body.to_vec())
    }

    fn fail(&self, error: FetchError) -> FetchError {
        self.observer.notify(&CrawlEvent::FetchFailed {
            error: error.clone(),
        });
        error
    }
}
