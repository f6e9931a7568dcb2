//! Download dispatcher: bounded-concurrency processing of one page's images
//!
//! Each call to [`DownloadDispatcher::run`] creates a fresh pool of `workers`
//! permits and a task set, spawns one task per item and joins every task before
//! returning. Nothing outlives the page.

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::parser::PageItem;
use crate::output::{CrawlEvent, CrawlObserver};
use crate::state::{DownloadOutcome, PageResult};
use crate::storage::{display_name, FileMaterializer};
use crate::ItemError;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Runs the downloads of a page with a fixed number of workers
#[derive(Clone)]
pub struct DownloadDispatcher {
    fetcher: PageFetcher,
    materializer: Arc<FileMaterializer>,
    observer: Arc<dyn CrawlObserver>,
    workers: usize,
    add_dates: bool,
}

impl DownloadDispatcher {
    pub fn new(
        fetcher: PageFetcher,
        materializer: FileMaterializer,
        observer: Arc<dyn CrawlObserver>,
        workers: usize,
        add_dates: bool,
    ) -> Self {
        Self {
            fetcher,
            materializer: Arc::new(materializer),
            observer,
            workers: workers.max(1),
            add_dates,
        }
    }

    /// Downloads every item of `page` and waits for all of them
    ///
    /// Once `cancel` fires no further items are started; items already running
    /// finish normally so no file is left half written by an abort. Every item
    /// that was started contributes exactly one outcome.
    pub async fn run(
        &self,
        page: u32,
        items: Vec<PageItem>,
        cancel: &CancellationToken,
    ) -> PageResult {
        let item_count = items.len();
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        let mut interrupted = false;

        for item in items {
            let acquired = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = acquired else {
                interrupted = true;
                break;
            };

            let dispatcher = self.clone();
            tasks.spawn(async move {
                let _permit = permit;
                dispatcher.download(item).await
            });
        }

        let mut outcomes = Vec::with_capacity(item_count);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!(page, "Download task did not complete: {}", e);
                    outcomes.push(DownloadOutcome::Failed {
                        url: String::new(),
                        error: ItemError::Task(e.to_string()),
                    });
                }
            }
        }

        if interrupted {
            tracing::debug!(
                page,
                started = outcomes.len(),
                item_count,
                "Stopped dispatching on interrupt"
            );
        }

        PageResult {
            page,
            item_count,
            outcomes,
            interrupted,
        }
    }

    /// Date, fetch, then write a single item
    async fn download(&self, item: PageItem) -> DownloadOutcome {
        let date = match item.filename_date(self.add_dates) {
            Ok(date) => date,
            Err(error) => return self.failed(&item, error),
        };

        // Fetch failures were already reported by the fetcher
        let bytes = match self.fetcher.fetch(item.url.as_str()).await {
            Ok(bytes) => bytes,
            Err(error) => {
                return DownloadOutcome::Failed {
                    url: item.url.to_string(),
                    error: error.into(),
                }
            }
        };

        let outcome = self
            .materializer
            .materialize(&item.url, date.as_deref(), &bytes)
            .await;

        let filename = display_name(&item.url, date.as_deref()).unwrap_or_default();
        match &outcome {
            DownloadOutcome::Downloaded { path } => {
                self.observer.notify(&CrawlEvent::ItemDownloaded {
                    filename,
                    path: path.clone(),
                });
            }
            DownloadOutcome::Skipped { path } => {
                self.observer.notify(&CrawlEvent::ItemSkipped {
                    filename,
                    path: path.clone(),
                });
            }
            DownloadOutcome::Failed { url, error } => {
                self.observer.notify(&CrawlEvent::ItemFailed {
                    url: url.clone(),
                    reason: error.to_string(),
                });
            }
        }

        outcome
    }

    fn failed(&self, item: &PageItem, error: ItemError) -> DownloadOutcome {
        self.observer.notify(&CrawlEvent::ItemFailed {
            url: item.url.to_string(),
            reason: error.to_string(),
        });
        DownloadOutcome::Failed {
            url: item.url.to_string(),
            error,
        }
    }
}
