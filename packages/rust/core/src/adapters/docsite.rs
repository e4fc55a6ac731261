use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use scraper::Selector;

use magedocs_crawler::{
    CrawlOptions, CrawlPage, DEFAULT_MIN_CONTENT_LENGTH, PageContext, PageTransform, SiteCrawler,
    allowed_host_for, page_title,
};
use magedocs_markdown::{element_text, html_to_text};
use magedocs_shared::{RawDocument, Result, SourceId};

use super::{DocumentStream, SourceAdapter};

/// Crawls a documentation website from a single start URL, staying on its host.
pub struct DocSiteAdapter {
    source: SourceId,
    description: String,
    crawler: SiteCrawler,
    start_url: String,
    allowed_host: String,
    max_pages: usize,
    min_content_length: usize,
    request_delay: Option<Duration>,
}

impl DocSiteAdapter {
    pub fn new(
        source: SourceId,
        crawler: SiteCrawler,
        start_url: &str,
        max_pages: usize,
    ) -> Result<Self> {
        Ok(Self {
            source,
            description: format!("{source} site crawl ({start_url})"),
            crawler,
            start_url: start_url.to_string(),
            allowed_host: allowed_host_for(start_url)?,
            max_pages,
            min_content_length: DEFAULT_MIN_CONTENT_LENGTH,
            request_delay: None,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_min_content_length(mut self, min: usize) -> Self {
        self.min_content_length = min;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = (!delay.is_zero()).then_some(delay);
        self
    }

    fn options(&self) -> CrawlOptions {
        CrawlOptions {
            start_urls: vec![self.start_url.clone()],
            allowed_host: self.allowed_host.clone(),
            max_pages: self.max_pages,
            min_content_length: self.min_content_length,
            transform: Some(main_landmark_transform()),
            request_delay: self.request_delay,
        }
    }
}

/// Title as usual; content from the `main` landmark when it has text, else the whole page.
fn main_landmark_transform() -> PageTransform {
    Arc::new(|page: &PageContext<'_>| {
        let main_text = Selector::parse("main").ok().and_then(|selector| {
            page.document
                .select(&selector)
                .next()
                .map(element_text)
                .filter(|text| !text.is_empty())
        });

        Some(CrawlPage {
            url: page.url.to_string(),
            title: page_title(page.document, page.url),
            content: main_text.unwrap_or_else(|| html_to_text(page.html)),
        })
    })
}

impl SourceAdapter for DocSiteAdapter {
    fn id(&self) -> SourceId {
        self.source
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn fetch_documents(&self) -> DocumentStream<'_> {
        let source = self.source;
        Box::pin(
            self.crawler
                .crawl(self.options())
                .map(move |page| RawDocument::fetched_now(source, page.url, page.title, page.content)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use magedocs_crawler::{FetchOptions, HttpClient};
    use wiremock::matchers::path;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn crawler() -> SiteCrawler {
        let http = HttpClient::new("magedocs-test", Duration::from_secs(5)).unwrap();
        let fetch = FetchOptions {
            retries: 0,
            backoff: Duration::from_millis(1),
            headers: Vec::new(),
        };
        SiteCrawler::new(http, fetch)
    }

    #[tokio::test]
    async fn yields_main_landmark_documents() {
        let server = MockServer::start().await;
        let home = r#"<html><head><title>Hyvä Docs</title></head><body>
            <nav>Navigation sidebar with many many links to other pages of the documentation site</nav>
            <main><h1>Getting started</h1><p>Install the Hyvä theme with composer and enable the
            module, then configure the storefront to use it as the default theme.</p>
            <a href="/themes">Themes</a></main></body></html>"#;
        let themes = r#"<html><head><title>Themes</title></head><body>
            <p>Themes are built with Tailwind CSS and Alpine.js. Child themes inherit templates
            from the parent and override them file by file.</p></body></html>"#;

        Mock::given(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(home))
            .mount(&server)
            .await;
        Mock::given(path("/themes"))
            .respond_with(ResponseTemplate::new(200).set_body_string(themes))
            .mount(&server)
            .await;

        let adapter = DocSiteAdapter::new(SourceId::Hyva, crawler(), &server.uri(), 10).unwrap();
        let docs: Vec<RawDocument> = adapter.fetch_documents().collect().await;

        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d.source == SourceId::Hyva));

        assert_eq!(docs[0].title, "Getting started");
        assert!(docs[0].content.starts_with("Getting started Install the Hyvä theme"));
        assert!(!docs[0].content.contains("Navigation sidebar"));

        // No <main> and no <h1>: whole page text and <title>
        assert_eq!(docs[1].title, "Themes");
        assert!(docs[1].content.contains("Tailwind CSS"));
    }

    #[test]
    fn rejects_start_url_without_host() {
        assert!(DocSiteAdapter::new(SourceId::Hyva, crawler(), "not-a-url", 10).is_err());
    }
}
