use crate::error::{Result, ScanError};
use crate::labels::{self, DiscoveredLink};
use crate::result::{CrawlResult, PageVisit};
use reqwest::Client;
use scraper::Html;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
pub type PageCallback = Arc<dyn Fn(PageVisit) + Send + Sync>;

/// Upper bound on distinct URLs queued per crawl.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

const MAX_REDIRECTS: usize = 5;

/// A URL waiting to be fetched, with the provenance it was discovered through.
#[derive(Debug, Clone)]
struct QueuedPage {
    url: String,
    depth: usize,
    parent_url: String,
    link_text: String,
}

type WorkerQueues = Arc<Vec<Mutex<VecDeque<QueuedPage>>>>;

/// Crawls a single host, following `a[href]` links breadth-first.
pub struct Crawler {
    visited: Arc<Mutex<HashSet<String>>>,
    results: Arc<Mutex<Vec<CrawlResult>>>,
    max_depth: Option<usize>,
    max_pages: usize,
    timeout_secs: u64,
    progress_callback: Option<ProgressCallback>,
    page_callback: Option<PageCallback>,
}

impl Crawler {
    pub fn new() -> Self {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            visited: Arc::new(Mutex::new(HashSet::new())),
            results: Arc::new(Mutex::new(Vec::new())),
            max_depth: None,
            max_pages: DEFAULT_MAX_PAGES,
            timeout_secs,
            progress_callback: None,
            page_callback: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Invoked once for every successfully fetched HTML page.
    pub fn with_page_callback(mut self, callback: PageCallback) -> Self {
        self.page_callback = Some(callback);
        self
    }

    /// Redirects are followed only while they stay on `host`.
    fn build_client(&self, host: &str) -> Result<Client> {
        let host = host.to_string();
        let policy = reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if attempt.url().host_str() != Some(host.as_str()) {
                debug!("Not following off-host redirect to {}", attempt.url());
                attempt.stop()
            } else {
                attempt.follow()
            }
        });

        let client = Client::builder()
            .user_agent(concat!("sitetree/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(self.timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(policy)
            .build()?;
        Ok(client)
    }

    /// Crawl everything reachable from `start_url` on the same host.
    ///
    /// With a single worker pages are fetched, and reported to the page
    /// callback, in breadth-first discovery order.
    pub async fn crawl(&self, start_url: &str, workers: usize) -> Result<Vec<CrawlResult>> {
        let workers = workers.max(1);
        info!("Starting crawl of {} with {} workers", start_url, workers);

        let parsed_url = Url::parse(start_url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", start_url, e)))?;
        let host = parsed_url
            .host_str()
            .ok_or_else(|| ScanError::InvalidUrl(format!("{} has no host", start_url)))?
            .to_string();
        let start_url = parsed_url.to_string();
        let client = self.build_client(&host)?;

        {
            let mut visited = self.visited.lock().await;
            visited.insert(start_url.clone());
        }

        let worker_queues: WorkerQueues = Arc::new((0..workers).map(|_| Mutex::new(VecDeque::new())).collect());
        let in_flight = Arc::new(AtomicUsize::new(0));

        {
            let mut queue = worker_queues[0].lock().await;
            queue.push_back(QueuedPage {
                url: start_url,
                depth: 0,
                parent_url: String::new(),
                link_text: String::new(),
            });
        }

        let mut worker_handles = Vec::with_capacity(workers);

        for worker_id in 0..workers {
            let client = client.clone();
            let host = host.clone();
            let progress_cb = self.progress_callback.clone();
            let page_cb = self.page_callback.clone();
            let max_depth = self.max_depth;
            let max_pages = self.max_pages;
            let visited = self.visited.clone();
            let results = self.results.clone();
            let worker_queues = worker_queues.clone();
            let in_flight = in_flight.clone();

            let handle = tokio::spawn(async move {
                debug!("Worker {} started", worker_id);

                loop {
                    let Some(page) = Self::take_work(worker_id, &worker_queues, &in_flight).await else {
                        if in_flight.load(Ordering::SeqCst) == 0 && Self::all_queues_empty(&worker_queues).await {
                            break;
                        }
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        continue;
                    };

                    if let Some(ref callback) = progress_cb {
                        callback(worker_id, page.url.clone());
                    }

                    match Self::fetch_page(&client, &page, &host).await {
                        Ok((crawl_result, visit, links)) => {
                            if crawl_result.url != page.url {
                                debug!("{} redirected to {}", page.url, crawl_result.url);
                                visited.lock().await.insert(crawl_result.url.clone());
                            }
                            let source = QueuedPage {
                                url: crawl_result.url.clone(),
                                ..page.clone()
                            };
                            if let (Some(visit), Some(callback)) = (visit, &page_cb) {
                                callback(visit);
                            }
                            results.lock().await.push(crawl_result);

                            let follow = max_depth.is_none_or(|limit| page.depth + 1 < limit);
                            if follow {
                                Self::enqueue_links(
                                    worker_id,
                                    &source,
                                    links,
                                    &visited,
                                    &worker_queues,
                                    max_pages,
                                )
                                .await;
                            }
                        }
                        Err(e) => {
                            warn!("Crawl error for {}: {}", page.url, e);
                        }
                    }

                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }

                debug!("Worker {} finished", worker_id);
            });

            worker_handles.push(handle);
        }

        for outcome in futures::future::join_all(worker_handles).await {
            outcome?;
        }

        let results = self.results.lock().await;
        info!("Crawl complete. Visited {} pages", results.len());
        Ok(results.clone())
    }

    /// Queue unseen links round-robin across all workers, up to the page cap.
    async fn enqueue_links(
        worker_id: usize,
        page: &QueuedPage,
        links: Vec<DiscoveredLink>,
        visited: &Mutex<HashSet<String>>,
        worker_queues: &WorkerQueues,
        max_pages: usize,
    ) {
        let num_workers = worker_queues.len();
        let mut target_worker = worker_id;

        for link in links {
            let should_queue = {
                let mut visited = visited.lock().await;
                if visited.len() >= max_pages {
                    debug!("Page cap of {} reached, not queuing {}", max_pages, link.url);
                    false
                } else {
                    visited.insert(link.url.clone())
                }
            };

            if should_queue {
                debug!("[Worker {}] Queuing {} to worker {}", worker_id, link.url, target_worker);
                let mut queue = worker_queues[target_worker].lock().await;
                queue.push_back(QueuedPage {
                    url: link.url,
                    depth: page.depth + 1,
                    parent_url: page.url.clone(),
                    link_text: link.text,
                });
                drop(queue);
                target_worker = (target_worker + 1) % num_workers;
            }
        }
    }

    /// Pop from our own queue first, then steal from the others. Work is
    /// counted as in flight before the queue lock is released.
    async fn take_work(worker_id: usize, worker_queues: &WorkerQueues, in_flight: &AtomicUsize) -> Option<QueuedPage> {
        let num_workers = worker_queues.len();
        for offset in 0..num_workers {
            let mut queue = worker_queues[(worker_id + offset) % num_workers].lock().await;
            if let Some(page) = queue.pop_front() {
                in_flight.fetch_add(1, Ordering::SeqCst);
                return Some(page);
            }
        }
        None
    }

    async fn all_queues_empty(worker_queues: &WorkerQueues) -> bool {
        for queue in worker_queues.iter() {
            if !queue.lock().await.is_empty() {
                return false;
            }
        }
        true
    }

    async fn fetch_page(
        client: &Client,
        page: &QueuedPage,
        host: &str,
    ) -> Result<(CrawlResult, Option<PageVisit>, Vec<DiscoveredLink>)> {
        debug!("Fetching {}", page.url);

        let start = Instant::now();
        let response = client.get(&page.url).send().await?;
        let response_time = start.elapsed();

        let final_url = response.url().to_string();
        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut result = CrawlResult::new(final_url.clone(), page.parent_url.clone());
        result.status_code = status_code;
        result.content_type = content_type;
        result.response_time = response_time;

        if !result.is_success() || !result.is_html() {
            debug!("Not following {} (status {}, type {:?})", page.url, status_code, result.content_type);
            return Ok((result, None, Vec::new()));
        }

        let body = response.text().await?;
        // relative links resolve against where we ended up, not where we asked
        let (title, links) = Self::parse_page(&body, &final_url, host)?;

        result.links_found = links.iter().map(|l| l.url.clone()).collect();
        result.title = title.clone();

        let visit = PageVisit::new(
            final_url,
            page.parent_url.clone(),
            vec![title.unwrap_or_default(), page.link_text.clone()],
        );

        Ok((result, Some(visit), links))
    }

    fn parse_page(body: &str, url: &str, host: &str) -> Result<(Option<String>, Vec<DiscoveredLink>)> {
        let document = Html::parse_document(body);
        let title = labels::extract_title(&document)?;
        let links = labels::extract_links(&document, url, host)?;
        Ok((title, links))
    }

    pub async fn get_results(&self) -> Vec<CrawlResult> {
        self.results.lock().await.clone()
    }

    pub async fn get_visited_count(&self) -> usize {
        self.visited.lock().await.len()
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    async fn mount_html(server: &MockServer, route: &str, html: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"))
            .mount(server)
            .await;
    }

    fn recording_callback() -> (PageCallback, Arc<StdMutex<Vec<PageVisit>>>) {
        let visits = Arc::new(StdMutex::new(Vec::new()));
        let visits_clone = visits.clone();
        let callback: PageCallback = Arc::new(move |visit| {
            visits_clone.lock().unwrap().push(visit);
        });
        (callback, visits)
    }

    /// Test basic link discovery and provenance
    #[tokio::test]
    async fn test_link_discovery_reports_parents() {
        let mock_server = MockServer::start().await;
        let base = mock_server.uri();

        mount_html(
            &mock_server,
            "/",
            format!(
                r#"<html><head><title>Home</title></head><body>
                    <a href="{base}/page1">Page 1</a>
                    <a href="/page2">Page 2</a>
                </body></html>"#
            ),
        )
        .await;
        mount_html(
            &mock_server,
            "/page1",
            "<html><head><title>First</title></head><body><a href=\"/page1/deep\">Deep</a></body></html>".into(),
        )
        .await;
        mount_html(&mock_server, "/page2", "<html><head><title>Second</title></head></html>".into()).await;
        mount_html(&mock_server, "/page1/deep", "<html><head><title>Deep</title></head></html>".into()).await;

        let (callback, visits) = recording_callback();
        let crawler = Crawler::new().with_page_callback(callback);
        let results = crawler.crawl(&base, 1).await.unwrap();

        assert_eq!(results.len(), 4);

        let visits = visits.lock().unwrap();
        let root = format!("{}/", base);
        let expected = vec![
            PageVisit::new(root.clone(), "", vec!["Home".into(), "".into()]),
            PageVisit::new(format!("{base}/page1"), root.clone(), vec!["First".into(), "Page 1".into()]),
            PageVisit::new(format!("{base}/page2"), root.clone(), vec!["Second".into(), "Page 2".into()]),
            PageVisit::new(format!("{base}/page1/deep"), format!("{base}/page1"), vec!["Deep".into(), "Deep".into()]),
        ];
        assert_eq!(*visits, expected);
    }

    #[tokio::test]
    async fn test_each_url_visited_once() {
        let mock_server = MockServer::start().await;
        let base = mock_server.uri();

        mount_html(&mock_server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#.into()).await;
        mount_html(&mock_server, "/a", r#"<a href="/b">B again</a><a href="/">Home</a>"#.into()).await;
        mount_html(&mock_server, "/b", r#"<a href="/a">A again</a>"#.into()).await;

        let (callback, visits) = recording_callback();
        let crawler = Crawler::new().with_page_callback(callback);
        crawler.crawl(&base, 1).await.unwrap();

        assert_eq!(visits.lock().unwrap().len(), 3);
        assert_eq!(crawler.get_visited_count().await, 3);
    }

    #[tokio::test]
    async fn test_non_html_and_errors_produce_no_visits() {
        let mock_server = MockServer::start().await;
        let base = mock_server.uri();

        mount_html(
            &mock_server,
            "/",
            r#"<a href="/data.json">Data</a><a href="/missing">Missing</a>"#.into(),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/data.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("{\"a\": \"<a href='/hidden'>x</a>\"}", "application/json"),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let (callback, visits) = recording_callback();
        let crawler = Crawler::new().with_page_callback(callback);
        let results = crawler.crawl(&base, 1).await.unwrap();

        assert_eq!(results.len(), 3);
        let visits = visits.lock().unwrap();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].parent_url, "");
    }

    #[tokio::test]
    async fn test_max_depth_limits_following() {
        let mock_server = MockServer::start().await;
        let base = mock_server.uri();

        mount_html(&mock_server, "/", r#"<a href="/one">One</a>"#.into()).await;
        mount_html(&mock_server, "/one", r#"<a href="/two">Two</a>"#.into()).await;
        mount_html(&mock_server, "/two", "<p>end</p>".into()).await;

        let crawler = Crawler::new().with_max_depth(2);
        let results = crawler.crawl(&base, 1).await.unwrap();

        let urls: Vec<_> = results.iter().map(|r| r.url.clone()).collect();
        assert_eq!(urls, vec![format!("{base}/"), format!("{base}/one")]);
    }

    #[tokio::test]
    async fn test_max_pages_caps_queue() {
        let mock_server = MockServer::start().await;
        let base = mock_server.uri();

        let mut root_html = String::new();
        for i in 1..=10 {
            root_html.push_str(&format!(r#"<a href="/page{i}">Page {i}</a>"#));
            mount_html(&mock_server, &format!("/page{i}"), "<p>leaf</p>".into()).await;
        }
        mount_html(&mock_server, "/", root_html).await;

        let crawler = Crawler::new().with_max_pages(4);
        let results = crawler.crawl(&base, 1).await.unwrap();

        assert_eq!(results.len(), 4);
    }

    #[tokio::test]
    async fn test_multiple_workers_visit_everything() {
        let mock_server = MockServer::start().await;
        let base = mock_server.uri();

        let mut root_html = String::from("<html><body>");
        for i in 1..=12 {
            root_html.push_str(&format!(r#"<a href="/page{i}">Page {i}</a>"#));
            mount_html(
                &mock_server,
                &format!("/page{i}"),
                format!(r#"<a href="/page{i}/sub">Sub</a>"#),
            )
            .await;
            mount_html(&mock_server, &format!("/page{i}/sub"), "<p>end</p>".into()).await;
        }
        root_html.push_str("</body></html>");
        mount_html(&mock_server, "/", root_html).await;

        let (callback, visits) = recording_callback();
        let crawler = Crawler::new().with_page_callback(callback);
        let results = crawler.crawl(&base, 4).await.unwrap();

        assert_eq!(results.len(), 25);
        assert_eq!(visits.lock().unwrap().len(), 25);
    }

    #[tokio::test]
    async fn test_links_resolve_against_redirect_target() {
        let mock_server = MockServer::start().await;
        let base = mock_server.uri();

        mount_html(&mock_server, "/", r#"<a href="/docs">Docs</a>"#.into()).await;
        Mock::given(method("GET"))
            .and(path("/docs"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", format!("{base}/docs/").as_str()))
            .mount(&mock_server)
            .await;
        mount_html(
            &mock_server,
            "/docs/",
            r#"<html><head><title>Docs</title></head><body><a href="intro">Intro</a></body></html>"#.into(),
        )
        .await;
        mount_html(&mock_server, "/docs/intro", "<title>Intro</title>".into()).await;

        let (callback, visits) = recording_callback();
        let crawler = Crawler::new().with_page_callback(callback);
        crawler.crawl(&base, 1).await.unwrap();

        let visits = visits.lock().unwrap();
        let urls: Vec<_> = visits.iter().map(|v| v.url.clone()).collect();
        assert_eq!(urls, vec![format!("{base}/"), format!("{base}/docs/"), format!("{base}/docs/intro")]);
        assert_eq!(visits[1].parent_url, format!("{base}/"));
        assert_eq!(visits[2].parent_url, format!("{base}/docs/"));
    }

    #[tokio::test]
    async fn test_off_host_redirect_not_followed() {
        let mock_server = MockServer::start().await;
        let other_server = MockServer::start().await;
        let base = mock_server.uri();
        // another loopback server under a different host name
        let elsewhere = other_server.uri().replace("127.0.0.1", "localhost");

        mount_html(&mock_server, "/", r#"<a href="/out">Out</a>"#.into()).await;
        Mock::given(method("GET"))
            .and(path("/out"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", format!("{elsewhere}/landing").as_str()))
            .mount(&mock_server)
            .await;
        mount_html(&other_server, "/landing", "<title>Elsewhere</title>".into()).await;

        let (callback, visits) = recording_callback();
        let crawler = Crawler::new().with_page_callback(callback);
        let results = crawler.crawl(&base, 1).await.unwrap();

        let visits = visits.lock().unwrap();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].url, format!("{base}/"));

        let out = results.iter().find(|r| r.url == format!("{base}/out")).unwrap();
        assert_eq!(out.status_code, 302);
        assert!(other_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_start_url() {
        let crawler = Crawler::new();
        let err = crawler.crawl("not a url", 1).await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidUrl(_)));
    }
}
