//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a fake gallery and check full crawls
//! end-to-end against a temporary download directory.

use honey_dl::config::CrawlConfig;
use honey_dl::crawler::{Crawler, DownloadDispatcher, PageFetcher, PageItem};
use honey_dl::output::{CrawlEvent, CrawlObserver};
use honey_dl::state::Termination;
use honey_dl::storage::FileMaterializer;
use honey_dl::url::domain_root_name;
use honey_dl::FetchError;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Observer that keeps every event for later inspection
#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<CrawlEvent>>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<CrawlEvent> {
        self.events.lock().unwrap().clone()
    }

    fn count(&self, predicate: impl Fn(&CrawlEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl CrawlObserver for RecordingObserver {
    fn notify(&self, event: &CrawlEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Observer that interrupts the crawl as soon as one image is written
struct CancelAfterFirstDownload {
    token: CancellationToken,
}

impl CrawlObserver for CancelAfterFirstDownload {
    fn notify(&self, event: &CrawlEvent) {
        if matches!(event, CrawlEvent::ItemDownloaded { .. }) {
            self.token.cancel();
        }
    }
}

/// Builds a gallery page from (alt, src) pairs
fn gallery_html(images: &[(&str, &str)]) -> String {
    let mut html = String::from("<html><head><title>Gallery</title></head><body>\n");
    for (alt, src) in images {
        html.push_str(&format!(
            "<img class=\"img-thumbnail\" alt=\"{}\" src=\"{}\">\n",
            alt, src
        ));
    }
    html.push_str("<img class=\"logo\" src=\"/static/logo.png\">\n</body></html>");
    html
}

async fn mount_page(server: &MockServer, page: u32, images: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path("/gallery"))
        .and(query_param("git", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(gallery_html(images))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, image_path: &str, bytes: &[u8]) {
    Mock::given(method("GET"))
        .and(path(image_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.to_vec()))
        .mount(server)
        .await;
}

/// Number of requests the server received for `request_path`, optionally for one page
async fn requests_for(server: &MockServer, request_path: &str, page: Option<u32>) -> usize {
    let page = page.map(|p| p.to_string());
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == request_path)
        .filter(|r| match &page {
            Some(page) => r.url.query_pairs().any(|(k, v)| k == "git" && v == page.as_str()),
            None => true,
        })
        .count()
}

fn seed_url(server: &MockServer) -> String {
    format!("{}/gallery?id=1", server.uri())
}

fn download_root(server: &MockServer, dir: &TempDir) -> PathBuf {
    let url = url::Url::parse(&server.uri()).unwrap();
    dir.path().join(domain_root_name(&url).unwrap())
}

fn test_config(seed: String, dir: &TempDir) -> CrawlConfig {
    let mut config = CrawlConfig::new(seed);
    config.output_dir = dir.path().to_path_buf();
    config.workers = 4;
    config.retries = 1;
    config
}

#[tokio::test]
async fn test_full_crawl_until_empty_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        1,
        &[("01-02-2023", "/img/a.jpg"), ("02-02-2023", "/img/b.jpg")],
    )
    .await;
    mount_page(&server, 2, &[("03-02-2023", "/img/c.jpg")]).await;
    mount_page(&server, 3, &[]).await;
    mount_image(&server, "/img/a.jpg", b"image a").await;
    mount_image(&server, "/img/b.jpg", b"image b").await;
    mount_image(&server, "/img/c.jpg", b"image c").await;

    let observer = Arc::new(RecordingObserver::default());
    let report = Crawler::new(test_config(seed_url(&server), &dir))
        .with_observer(observer.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(report.termination, Termination::Exhausted);
    assert_eq!(report.pages_processed, 2);
    assert_eq!(report.last_page, 3);
    assert_eq!(report.downloaded, 3);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.failed, 0);

    let root = download_root(&server, &dir);
    assert_eq!(
        std::fs::read(root.join("(2023-02-01) a.jpg")).unwrap(),
        b"image a"
    );
    assert_eq!(
        std::fs::read(root.join("(2023-02-03) c.jpg")).unwrap(),
        b"image c"
    );
    assert_eq!(
        std::fs::read_to_string(root.join(".gitignore")).unwrap(),
        "# Automatically created by honey-dl\n*"
    );

    // The logo on each page is not a gallery image
    assert_eq!(requests_for(&server, "/static/logo.png", None).await, 0);

    assert_eq!(
        observer.count(|e| matches!(e, CrawlEvent::PageStarted { .. })),
        3
    );
    assert_eq!(
        observer.count(|e| matches!(e, CrawlEvent::ItemDownloaded { .. })),
        3
    );
    assert!(matches!(
        observer.events().last(),
        Some(CrawlEvent::CrawlCompleted { .. })
    ));
}

#[tokio::test]
async fn test_second_run_skips_existing_files() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        1,
        &[("01-02-2023", "/img/a.jpg"), ("02-02-2023", "/img/b.jpg")],
    )
    .await;
    mount_page(&server, 2, &[]).await;
    mount_image(&server, "/img/a.jpg", b"image a").await;
    mount_image(&server, "/img/b.jpg", b"image b").await;

    let first = Crawler::new(test_config(seed_url(&server), &dir))
        .run()
        .await
        .unwrap();
    assert_eq!(first.downloaded, 2);

    let second = Crawler::new(test_config(seed_url(&server), &dir))
        .run()
        .await
        .unwrap();
    assert_eq!(second.termination, Termination::Exhausted);
    assert_eq!(second.downloaded, 0);
    assert_eq!(second.skipped, 2);

    // Existing files are only detected after the image has been fetched
    assert_eq!(requests_for(&server, "/img/a.jpg", None).await, 2);
}

#[tokio::test]
async fn test_force_rewrites_existing_files() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 1, &[("01-02-2023", "/img/a.jpg")]).await;
    mount_page(&server, 2, &[]).await;
    mount_image(&server, "/img/a.jpg", b"fresh").await;

    let root = download_root(&server, &dir);
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("(2023-02-01) a.jpg"), b"stale").unwrap();

    let mut config = test_config(seed_url(&server), &dir);
    config.force = true;
    let report = Crawler::new(config).run().await.unwrap();

    assert_eq!(report.downloaded, 1);
    assert_eq!(
        std::fs::read(root.join("(2023-02-01) a.jpg")).unwrap(),
        b"fresh"
    );
}

#[tokio::test]
async fn test_page_end_stops_after_that_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    for page in 1..=5u32 {
        let src = format!("/img/p{}.jpg", page);
        mount_page(&server, page, &[("01-01-2024", src.as_str())]).await;
        mount_image(&server, &src, b"bytes").await;
    }

    let mut config = test_config(seed_url(&server), &dir);
    config.page_end = 3;
    let report = Crawler::new(config).run().await.unwrap();

    assert_eq!(report.termination, Termination::PageRangeComplete);
    assert_eq!(report.last_page, 3);
    assert_eq!(report.pages_processed, 3);
    assert_eq!(report.downloaded, 3);
    assert_eq!(requests_for(&server, "/gallery", Some(3)).await, 1);
    assert_eq!(requests_for(&server, "/gallery", Some(4)).await, 0);
}

#[tokio::test]
async fn test_page_start_from_config() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 4, &[("01-01-2024", "/img/d.jpg")]).await;
    mount_page(&server, 5, &[]).await;
    mount_image(&server, "/img/d.jpg", b"d").await;

    let mut config = test_config(seed_url(&server), &dir);
    config.page_start = 4;
    let report = Crawler::new(config).run().await.unwrap();

    assert_eq!(report.termination, Termination::Exhausted);
    assert_eq!(report.downloaded, 1);
    assert_eq!(requests_for(&server, "/gallery", Some(1)).await, 0);
}

#[tokio::test]
async fn test_duplicate_run_cutoff() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // A gallery that keeps serving its last page for any page number
    Mock::given(method("GET"))
        .and(path("/gallery"))
        .respond_with(ResponseTemplate::new(200).set_body_string(gallery_html(&[
            ("01-01-2024", "/img/last1.jpg"),
            ("02-01-2024", "/img/last2.jpg"),
        ])))
        .mount(&server)
        .await;
    mount_image(&server, "/img/last1.jpg", b"1").await;
    mount_image(&server, "/img/last2.jpg", b"2").await;

    let mut config = test_config(seed_url(&server), &dir);
    config.break_number = 2;
    let report = Crawler::new(config).run().await.unwrap();

    assert_eq!(report.termination, Termination::DuplicateCutoff);
    assert_eq!(report.last_page, 3);
    assert_eq!(report.pages_processed, 3);
    assert_eq!(report.downloaded, 2);
    assert_eq!(report.skipped, 4);
    assert_eq!(requests_for(&server, "/gallery", Some(4)).await, 0);
}

#[tokio::test]
async fn test_failed_items_reset_duplicate_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 1, &[("01-01-2024", "/img/a.jpg")]).await;
    mount_page(&server, 2, &[("01-01-2024", "/img/a.jpg")]).await;
    // A failure on page 3 means the page did not consist only of duplicates
    mount_page(
        &server,
        3,
        &[("01-01-2024", "/img/a.jpg"), ("01-01-2024", "/img/gone.jpg")],
    )
    .await;
    mount_page(&server, 4, &[("01-01-2024", "/img/a.jpg")]).await;
    mount_page(&server, 5, &[]).await;
    mount_image(&server, "/img/a.jpg", b"a").await;

    let mut config = test_config(seed_url(&server), &dir);
    config.break_number = 2;
    let report = Crawler::new(config).run().await.unwrap();

    assert_eq!(report.termination, Termination::Exhausted);
    assert_eq!(report.last_page, 5);
    assert_eq!(report.downloaded, 1);
    assert_eq!(report.skipped, 3);
    assert_eq!(report.failed, 1);
}

#[tokio::test]
async fn test_page_fetch_failure_is_not_exhaustion() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 1, &[("01-01-2024", "/img/a.jpg")]).await;
    Mock::given(method("GET"))
        .and(path("/gallery"))
        .and(query_param("git", "2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_image(&server, "/img/a.jpg", b"a").await;

    let observer = Arc::new(RecordingObserver::default());
    let report = Crawler::new(test_config(seed_url(&server), &dir))
        .with_observer(observer.clone())
        .run()
        .await
        .unwrap();

    match &report.termination {
        Termination::PageFetchFailed(FetchError::HttpStatus { code, .. }) => {
            assert_eq!(*code, 503)
        }
        other => panic!("expected page fetch failure, got {:?}", other),
    }
    assert!(report.termination.is_error());
    assert_eq!(report.last_page, 2);
    assert_eq!(report.downloaded, 1);

    // Non-200 answers are authoritative: no retry
    assert_eq!(requests_for(&server, "/gallery", Some(2)).await, 1);
    assert_eq!(
        observer.count(|e| matches!(e, CrawlEvent::FetchFailed { .. })),
        1
    );
}

#[tokio::test]
async fn test_item_failures_do_not_abort_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        1,
        &[
            ("01-01-2024", "/img/ok.jpg"),
            ("01-01-2024", "/img/missing.jpg"),
            ("2024/01/01", "/img/baddate.jpg"),
        ],
    )
    .await;
    mount_page(&server, 2, &[]).await;
    mount_image(&server, "/img/ok.jpg", b"ok").await;
    mount_image(&server, "/img/baddate.jpg", b"never stored").await;

    let observer = Arc::new(RecordingObserver::default());
    let report = Crawler::new(test_config(seed_url(&server), &dir))
        .with_observer(observer.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(report.termination, Termination::Exhausted);
    assert_eq!(report.downloaded, 1);
    assert_eq!(report.failed, 2);

    // The malformed date fails the item before it is fetched
    assert_eq!(requests_for(&server, "/img/baddate.jpg", None).await, 0);
    assert_eq!(
        observer.count(|e| matches!(e, CrawlEvent::ItemFailed { .. })),
        1
    );
}

#[tokio::test]
async fn test_without_dates_and_with_folders() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        1,
        &[("not a date", "/img/cats/tom.jpg"), ("", "/img/dogs/rex.jpg")],
    )
    .await;
    mount_page(&server, 2, &[]).await;
    mount_image(&server, "/img/cats/tom.jpg", b"tom").await;
    mount_image(&server, "/img/dogs/rex.jpg", b"rex").await;

    let mut config = test_config(seed_url(&server), &dir);
    config.add_dates = false;
    config.create_folders = true;
    let report = Crawler::new(config).run().await.unwrap();

    assert_eq!(report.downloaded, 2);
    let root = download_root(&server, &dir);
    assert!(root.join("cats/tom.jpg").is_file());
    assert!(root.join("dogs/rex.jpg").is_file());
}

#[tokio::test]
async fn test_navigator_in_seed_url() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, 7, &[("01-01-2024", "/img/seven.jpg")]).await;
    mount_page(&server, 8, &[]).await;
    mount_image(&server, "/img/seven.jpg", b"7").await;

    let seed = format!("{}/gallery?id=1&git=7", server.uri());
    let report = Crawler::new(test_config(seed, &dir)).run().await.unwrap();

    assert_eq!(report.termination, Termination::Exhausted);
    assert_eq!(report.downloaded, 1);
    assert_eq!(report.last_page, 8);

    let gallery_requests: Vec<_> = server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == "/gallery")
        .collect();
    assert_eq!(gallery_requests.len(), 2);
    for request in gallery_requests {
        let git_terms = request.url.query_pairs().filter(|(k, _)| k == "git").count();
        assert_eq!(git_terms, 1, "navigator duplicated in {}", request.url);
        assert!(request.url.query_pairs().any(|(k, v)| k == "id" && v == "1"));
    }
}

#[tokio::test]
async fn test_interrupt_finishes_running_downloads_only() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        1,
        &[
            ("01-01-2024", "/img/1.jpg"),
            ("01-01-2024", "/img/2.jpg"),
            ("01-01-2024", "/img/3.jpg"),
        ],
    )
    .await;
    for image in ["/img/1.jpg", "/img/2.jpg", "/img/3.jpg"] {
        mount_image(&server, image, b"x").await;
    }

    let token = CancellationToken::new();
    let mut config = test_config(seed_url(&server), &dir);
    config.workers = 1;
    let report = Crawler::new(config)
        .with_cancellation(token.clone())
        .with_observer(Arc::new(CancelAfterFirstDownload { token }))
        .run()
        .await
        .unwrap();

    assert_eq!(report.termination, Termination::Interrupted);
    assert!(report.termination.is_interrupted());
    assert_eq!(report.downloaded, 1);
    assert_eq!(requests_for(&server, "/gallery", Some(2)).await, 0);
}

#[tokio::test]
async fn test_fetcher_retries_timeouts_then_gives_up() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.jpg"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let observer = Arc::new(RecordingObserver::default());
    let fetcher = PageFetcher::new(client, 2, observer.clone());

    let result = fetcher.fetch(&format!("{}/slow.jpg", server.uri())).await;

    assert!(matches!(result, Err(FetchError::Timeout { attempts: 3, .. })));
    assert_eq!(requests_for(&server, "/slow.jpg", None).await, 3);
    assert_eq!(
        observer.count(|e| matches!(e, CrawlEvent::FetchRetrying { .. })),
        2
    );
}

#[tokio::test]
async fn test_fetcher_stops_retrying_on_success() {
    let server = MockServer::start().await;
    // First attempt times out, the second one succeeds
    Mock::given(method("GET"))
        .and(path("/flaky.jpg"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
        .mount(&server)
        .await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let fetcher = PageFetcher::new(client, 5, Arc::new(RecordingObserver::default()));

    let body = fetcher
        .fetch(&format!("{}/flaky.jpg", server.uri()))
        .await
        .unwrap();

    assert_eq!(body, b"ok");
    assert_eq!(requests_for(&server, "/flaky.jpg", None).await, 2);
}

#[tokio::test]
async fn test_fetcher_does_not_retry_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = PageFetcher::new(
        reqwest::Client::new(),
        5,
        Arc::new(RecordingObserver::default()),
    );
    let result = fetcher
        .fetch(&format!("{}/missing.jpg", server.uri()))
        .await;

    assert!(matches!(
        result,
        Err(FetchError::HttpStatus { code: 404, .. })
    ));
    assert_eq!(requests_for(&server, "/missing.jpg", None).await, 1);
}

#[tokio::test]
async fn test_fetcher_retries_transport_errors() {
    // Grab a free port and close it again so connections are refused
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let observer = Arc::new(RecordingObserver::default());
    let fetcher = PageFetcher::new(reqwest::Client::new(), 3, observer.clone());
    let result = fetcher
        .fetch(&format!("http://127.0.0.1:{}/a.jpg", port))
        .await;

    assert!(matches!(
        result,
        Err(FetchError::Transport { attempts: 4, .. })
    ));
    assert_eq!(
        observer.count(|e| matches!(e, CrawlEvent::FetchRetrying { .. })),
        3
    );
}

#[tokio::test]
async fn test_dispatcher_runs_at_most_workers_downloads_at_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let delay = Duration::from_millis(300);

    Mock::given(method("GET"))
        .and(path_regex(r"^/slow/\d+\.jpg$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"slow image".to_vec())
                .set_delay(delay),
        )
        .mount(&server)
        .await;

    let items: Vec<PageItem> = (0..6)
        .map(|i| PageItem {
            raw_date: None,
            url: url::Url::parse(&format!("{}/slow/{}.jpg", server.uri(), i)).unwrap(),
        })
        .collect();

    let observer = Arc::new(RecordingObserver::default());
    let fetcher = PageFetcher::new(reqwest::Client::new(), 0, observer.clone());
    let dispatcher = DownloadDispatcher::new(
        fetcher,
        FileMaterializer::new(dir.path(), false, false),
        observer.clone(),
        2,
        false,
    );

    let started = Instant::now();
    let result = dispatcher.run(1, items, &CancellationToken::new()).await;
    let elapsed = started.elapsed();

    assert_eq!(result.item_count, 6);
    assert_eq!(result.outcomes.len(), result.item_count);
    assert_eq!(result.downloaded(), 6);
    assert!(!result.interrupted);

    // Two slots for six delayed responses means three rounds, not one and not six
    assert!(elapsed >= delay * 3, "finished too fast: {:?}", elapsed);
    assert!(elapsed < delay * 5, "downloads did not overlap: {:?}", elapsed);
    assert_eq!(requests_for(&server, "/slow/0.jpg", None).await, 1);
}
