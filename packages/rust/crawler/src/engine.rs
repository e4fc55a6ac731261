//! Bounded, same-host web crawler.
//!
//! The crawler performs a FIFO traversal from a set of start URLs, stays on a
//! single host, never visits more than `max_pages` URLs, and yields pages
//! lazily as a stream so callers can persist them while the crawl proceeds.

use std::collections::{HashSet, VecDeque};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::Stream;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use magedocs_markdown::html_to_text;
use magedocs_shared::{DocsError, Result};

use crate::http::{FetchOptions, HttpClient};

/// Default minimum content length (characters) for a page to be yielded.
pub const DEFAULT_MIN_CONTENT_LENGTH: usize = 80;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A page that passed the transform and length filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlPage {
    pub url: String,
    pub title: String,
    pub content: String,
}

/// Everything a transform gets to look at for one fetched page.
pub struct PageContext<'a> {
    pub url: &'a str,
    pub html: &'a str,
    pub document: &'a Html,
}

/// Maps a fetched page to a [`CrawlPage`], or `None` to skip it.
pub type PageTransform = Arc<dyn Fn(&PageContext<'_>) -> Option<CrawlPage> + Send + Sync>;

/// Parameters for a single crawl.
#[derive(Clone)]
pub struct CrawlOptions {
    pub start_urls: Vec<String>,
    /// `host` or `host:port` that discovered links must match.
    pub allowed_host: String,
    pub max_pages: usize,
    pub min_content_length: usize,
    /// Custom page mapping; [`default_transform`] when `None`.
    pub transform: Option<PageTransform>,
    /// Pause before every fetch after the first.
    pub request_delay: Option<Duration>,
}

impl CrawlOptions {
    /// Options for crawling the host of `start_url` with default filtering.
    pub fn for_start_url(start_url: &str, max_pages: usize) -> Result<Self> {
        Ok(Self {
            start_urls: vec![start_url.to_string()],
            allowed_host: allowed_host_for(start_url)?,
            max_pages,
            min_content_length: DEFAULT_MIN_CONTENT_LENGTH,
            transform: None,
            request_delay: None,
        })
    }
}

impl std::fmt::Debug for CrawlOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrawlOptions")
            .field("start_urls", &self.start_urls)
            .field("allowed_host", &self.allowed_host)
            .field("max_pages", &self.max_pages)
            .field("min_content_length", &self.min_content_length)
            .field("transform", &self.transform.as_ref().map(|_| "custom"))
            .field("request_delay", &self.request_delay)
            .finish()
    }
}

/// Title from the first `h1`, else `<title>`, else the URL; content from the normalizer.
pub fn default_transform(page: &PageContext<'_>) -> Option<CrawlPage> {
    Some(CrawlPage {
        url: page.url.to_string(),
        title: page_title(page.document, page.url),
        content: html_to_text(page.html),
    })
}

/// First non-empty `h1` text, else `<title>`, else `fallback`.
pub fn page_title(document: &Html, fallback: &str) -> String {
    ["h1", "title"]
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|t| !t.is_empty())
        })
        .unwrap_or_else(|| fallback.to_string())
}

/// `host[:port]` of a URL, the form links are compared against.
pub fn allowed_host_for(url: &str) -> Result<String> {
    let parsed =
        Url::parse(url).map_err(|e| DocsError::config(format!("invalid URL {url:?}: {e}")))?;
    host_with_port(&parsed)
        .ok_or_else(|| DocsError::config(format!("URL {url:?} has no host")))
}

fn host_with_port(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Frontier
// ---------------------------------------------------------------------------

/// FIFO queue plus visited/queued sets, bounded by `max_pages`.
#[derive(Debug)]
struct Frontier {
    queue: VecDeque<Url>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    max_pages: usize,
}

impl Frontier {
    fn new(start_urls: &[String], max_pages: usize) -> Self {
        let mut frontier = Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            max_pages,
        };
        for raw in start_urls {
            match Url::parse(raw) {
                Ok(mut url) => {
                    url.set_fragment(None);
                    if frontier.queued.insert(url.to_string()) {
                        frontier.queue.push_back(url);
                    }
                }
                Err(e) => warn!(url = %raw, error = %e, "ignoring invalid start URL"),
            }
        }
        frontier
    }

    /// Pop the next unvisited URL and mark it visited.
    fn next(&mut self) -> Option<Url> {
        while self.visited.len() < self.max_pages {
            let url = self.queue.pop_front()?;
            let key = url.to_string();
            self.queued.remove(&key);
            if self.visited.insert(key) {
                return Some(url);
            }
        }
        None
    }

    /// Enqueue a discovered URL if it is new and the budget allows.
    fn offer(&mut self, url: Url) -> bool {
        let key = url.to_string();
        if self.visited.contains(&key) || self.queued.contains(&key) {
            return false;
        }
        if self.queue.len() + self.visited.len() >= self.max_pages {
            return false;
        }
        self.queued.insert(key);
        self.queue.push_back(url);
        true
    }

    fn visited(&self) -> usize {
        self.visited.len()
    }
}

// ---------------------------------------------------------------------------
// SiteCrawler
// ---------------------------------------------------------------------------

/// Crawls one documentation site through a shared [`HttpClient`].
#[derive(Debug, Clone)]
pub struct SiteCrawler {
    http: HttpClient,
    fetch: FetchOptions,
}

impl SiteCrawler {
    pub fn new(http: HttpClient, fetch: FetchOptions) -> Self {
        Self { http, fetch }
    }

    /// Crawl lazily: pages are fetched only as the stream is polled.
    ///
    /// Fetch failures are logged and skipped; the stream itself never errors.
    pub fn crawl(
        &self,
        options: CrawlOptions,
    ) -> Pin<Box<dyn Stream<Item = CrawlPage> + Send + '_>> {
        Box::pin(stream! {
            let mut frontier = Frontier::new(&options.start_urls, options.max_pages);
            let mut yielded = 0usize;
            let mut first = true;

            info!(
                host = %options.allowed_host,
                max_pages = options.max_pages,
                start_urls = ?options.start_urls,
                "starting crawl"
            );

            while let Some(url) = frontier.next() {
                if !first {
                    if let Some(delay) = options.request_delay {
                        tokio::time::sleep(delay).await;
                    }
                }
                first = false;

                let html = match self.http.get(url.as_str(), &self.fetch).await {
                    Ok(html) => html,
                    Err(e) => {
                        warn!(%url, error = %e, "failed to fetch page");
                        continue;
                    }
                };

                let (page, links) = process_page(&url, &html, &options);
                for link in links {
                    frontier.offer(link);
                }

                if let Some(page) = page {
                    yielded += 1;
                    yield page;
                }
            }

            info!(
                host = %options.allowed_host,
                visited = frontier.visited(),
                yielded,
                "crawl completed"
            );
        })
    }
}

/// Parse, transform and extract links; the parsed document never outlives this call.
fn process_page(url: &Url, html: &str, options: &CrawlOptions) -> (Option<CrawlPage>, Vec<Url>) {
    let document = Html::parse_document(html);
    let ctx = PageContext {
        url: url.as_str(),
        html,
        document: &document,
    };

    let page = match &options.transform {
        Some(transform) => transform(&ctx),
        None => default_transform(&ctx),
    }
    .filter(|page| {
        let long_enough = page.content.chars().count() >= options.min_content_length;
        if !long_enough {
            debug!(%url, len = page.content.len(), "page below minimum length");
        }
        long_enough
    });

    let links = extract_links(&document, url)
        .into_iter()
        .filter(|link| host_with_port(link).as_deref() == Some(options.allowed_host.as_str()))
        .collect();

    (page, links)
}

/// Extract all http(s) links from a document, resolved against the page URL.
fn extract_links(doc: &Html, base_url: &Url) -> Vec<Url> {
    let Ok(link_sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let mut links = Vec::new();

    for el in doc.select(&link_sel) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let href = href.trim();

        // Skip anchors, javascript:, mailto:
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
        {
            continue;
        }

        if let Ok(mut resolved) = base_url.join(href) {
            if resolved.scheme() != "http" && resolved.scheme() != "https" {
                continue;
            }
            resolved.set_fragment(None);
            links.push(resolved);
        }
    }

    links
}
