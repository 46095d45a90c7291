//! Label and link extraction from HTML documents.

use crate::error::{Result, ScanError};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A same-document hyperlink, resolved to an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLink {
    pub url: String,
    pub text: String,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScanError::ParseError(format!("selector '{}': {}", css, e)))
}

/// Collapse runs of whitespace and trim.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    normalize_text(&element.text().collect::<String>())
}

/// Text of the first `<title>` element, if any.
pub fn extract_title(document: &Html) -> Result<Option<String>> {
    let title_selector = selector("title")?;
    Ok(document.select(&title_selector).next().map(element_text))
}

/// All `a[href]` links that resolve to an absolute URL on `host`.
pub fn extract_links(document: &Html, current_url: &str, host: &str) -> Result<Vec<DiscoveredLink>> {
    let link_selector = selector("a[href]")?;
    let mut links = Vec::new();

    for element in document.select(&link_selector) {
        if let Some(href) = element.value().attr("href")
            && let Some(absolute_url) = resolve_url(current_url, href)
        {
            if is_same_host(&absolute_url, host) {
                links.push(DiscoveredLink {
                    url: absolute_url,
                    text: element_text(element),
                });
            } else {
                tracing::debug!("Skipping off-host link {}", absolute_url);
            }
        }
    }

    Ok(links)
}

/// Resolve `href` against `base`, dropping the fragment.
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let base_url = Url::parse(base).ok()?;
    let mut resolved = base_url.join(href).ok()?;
    resolved.set_fragment(None);

    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

pub fn is_same_host(url: &str, host: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.eq_ignore_ascii_case(host)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title_trims_whitespace() {
        let doc = Html::parse_document("<html><head><title>\n  Home   Page\n</title></head></html>");
        assert_eq!(extract_title(&doc).unwrap(), Some("Home Page".to_string()));
    }

    #[test]
    fn test_extract_title_missing() {
        let doc = Html::parse_document("<html><body>no title</body></html>");
        assert_eq!(extract_title(&doc).unwrap(), None);
    }

    #[test]
    fn test_extract_links_keeps_same_host_only() {
        let doc = Html::parse_document(
            r#"<a href="/about">About <b>us</b></a>
               <a href="https://other.org/x">Elsewhere</a>
               <a href="mailto:me@example.com">Mail</a>
               <a href="contact#form">Contact</a>"#,
        );
        let links = extract_links(&doc, "https://example.com/index.html", "example.com").unwrap();
        assert_eq!(
            links,
            vec![
                DiscoveredLink {
                    url: "https://example.com/about".to_string(),
                    text: "About us".to_string(),
                },
                DiscoveredLink {
                    url: "https://example.com/contact".to_string(),
                    text: "Contact".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_resolve_url_skips_fragments_and_schemes() {
        assert_eq!(resolve_url("https://example.com/", "#top"), None);
        assert_eq!(resolve_url("https://example.com/", "javascript:void(0)"), None);
        assert_eq!(resolve_url("https://example.com/", "ftp://example.com/file"), None);
        assert_eq!(
            resolve_url("https://example.com/a/", "../b?x=1#frag"),
            Some("https://example.com/b?x=1".to_string())
        );
    }

    #[test]
    fn test_is_same_host_is_exact() {
        assert!(is_same_host("https://example.com/a", "example.com"));
        assert!(is_same_host("https://EXAMPLE.com/a", "example.com"));
        assert!(!is_same_host("https://api.example.com/a", "example.com"));
        assert!(!is_same_host("not a url", "example.com"));
    }
}
