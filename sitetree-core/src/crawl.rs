use crate::error::{Result, TreeError};
use crate::graph::{Graph, GraphBuilder};
use crate::page::PageRecord;
use sitetree_scanner::crawler::DEFAULT_MAX_PAGES;
use sitetree_scanner::{Crawler, PageCallback, PageVisit, ProgressCallback};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use url::Url;

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Concurrent fetch workers; one keeps discovery order deterministic.
    pub workers: usize,
    pub max_pages: usize,
    /// Levels of pages to fetch, counting the start page as one; `None` is unbounded.
    pub max_crawl_depth: Option<usize>,
    pub timeout_secs: u64,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            max_pages: DEFAULT_MAX_PAGES,
            max_crawl_depth: None,
            timeout_secs: 10,
        }
    }
}

/// Crawl `start_url` and build the page graph from every visited page.
///
/// Pages are linked into the graph as the crawler reports them. The builder
/// sits behind a mutex so concurrent workers add pages one at a time.
pub async fn crawl_site(
    start_url: &Url,
    options: &CrawlOptions,
    progress_callback: Option<ProgressCallback>,
) -> Result<Graph> {
    info!("building graph for {}", start_url);

    let builder = Arc::new(Mutex::new(GraphBuilder::new()));
    let poisoned = Arc::new(AtomicBool::new(false));
    let builder_clone = builder.clone();
    let poisoned_clone = poisoned.clone();
    let page_callback: PageCallback =
        Arc::new(move |visit: PageVisit| record_page(&builder_clone, &poisoned_clone, visit));

    let mut crawler = Crawler::with_timeout(options.timeout_secs)
        .with_max_pages(options.max_pages)
        .with_page_callback(page_callback);
    if let Some(depth) = options.max_crawl_depth {
        crawler = crawler.with_max_depth(depth);
    }
    if let Some(callback) = progress_callback {
        crawler = crawler.with_progress_callback(callback);
    }

    let results = crawler.crawl(start_url.as_str(), options.workers).await?;
    drop(crawler);

    let builder = take_builder(builder, &poisoned)?;

    info!("crawled {} urls into {} nodes", results.len(), builder.len());
    builder.finish(start_url.as_str())
}

fn record_page(builder: &Mutex<GraphBuilder>, poisoned: &AtomicBool, visit: PageVisit) {
    match builder.lock() {
        Ok(mut builder) => {
            builder.add_page(PageRecord::from(visit));
        }
        Err(_) => {
            warn!("graph builder lock poisoned, dropping page {}", visit.url);
            poisoned.store(true, Ordering::SeqCst);
        }
    }
}

/// Reclaim the builder once the crawler has let go of it. Fails if any page
/// was dropped to a poisoned lock.
fn take_builder(builder: Arc<Mutex<GraphBuilder>>, poisoned: &AtomicBool) -> Result<GraphBuilder> {
    if poisoned.load(Ordering::SeqCst) {
        return Err(TreeError::Config("graph builder lock poisoned, pages were dropped".to_string()));
    }
    Arc::try_unwrap(builder)
        .map_err(|_| TreeError::Config("graph builder still shared after crawl".to_string()))?
        .into_inner()
        .map_err(|_| TreeError::Config("graph builder lock poisoned".to_string()))
}

/// Parse a caller-supplied start URL.
pub fn parse_start_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| TreeError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(TreeError::InvalidUrl(format!("{}: expected an http(s) URL with a host", raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poison(builder: &Arc<Mutex<GraphBuilder>>) {
        let builder = builder.clone();
        let _ = std::thread::spawn(move || {
            let _guard = builder.lock().unwrap();
            panic!("poisoning the builder");
        })
        .join();
    }

    #[test]
    fn test_record_page_adds_to_builder() {
        let builder = Arc::new(Mutex::new(GraphBuilder::new()));
        let poisoned = AtomicBool::new(false);

        record_page(&builder, &poisoned, PageVisit::new("https://example.com/", "", vec!["Home".into()]));

        let builder = take_builder(builder, &poisoned).unwrap();
        assert_eq!(builder.get("https://example.com/").unwrap().record.label, "Home");
    }

    #[test]
    fn test_poisoned_builder_fails_crawl() {
        let builder = Arc::new(Mutex::new(GraphBuilder::new()));
        let poisoned = AtomicBool::new(false);
        poison(&builder);

        record_page(&builder, &poisoned, PageVisit::new("https://example.com/", "", vec![]));
        assert!(poisoned.load(Ordering::SeqCst));

        let err = take_builder(builder, &poisoned).unwrap_err();
        assert!(matches!(err, TreeError::Config(msg) if msg.contains("pages were dropped")));
    }

    #[test]
    fn test_shared_builder_is_an_error() {
        let builder = Arc::new(Mutex::new(GraphBuilder::new()));
        let _still_held = builder.clone();
        let poisoned = AtomicBool::new(false);

        assert!(matches!(take_builder(builder, &poisoned), Err(TreeError::Config(_))));
    }
}
