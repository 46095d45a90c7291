use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of fetching a single URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub url: String,
    pub parent_url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub response_time: Duration,
    pub links_found: Vec<String>,
    pub title: Option<String>,
}

impl CrawlResult {
    pub fn new(url: String, parent_url: String) -> Self {
        Self {
            url,
            parent_url,
            status_code: 0,
            content_type: None,
            response_time: Duration::from_secs(0),
            links_found: Vec::new(),
            title: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_html(&self) -> bool {
        self.content_type
            .as_ref()
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false)
    }
}

/// A successfully visited HTML page, reported once per URL.
///
/// `labels` holds the candidate display labels in priority order: the page
/// title first, then the text of the anchor the page was reached through.
/// `parent_url` is empty for the start page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageVisit {
    pub url: String,
    pub parent_url: String,
    pub labels: Vec<String>,
}

impl PageVisit {
    pub fn new(url: impl Into<String>, parent_url: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            url: url.into(),
            parent_url: parent_url.into(),
            labels,
        }
    }
}
