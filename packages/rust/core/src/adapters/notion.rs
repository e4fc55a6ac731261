use std::collections::HashSet;

use async_stream::stream;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use magedocs_crawler::{FetchOptions, HttpClient};
use magedocs_markdown::{element_text, html_to_text, slugify};
use magedocs_shared::{RawDocument, SourceId};

use super::{DocumentStream, SourceAdapter};

const DEFAULT_SECTION_TITLE: &str = "Satoshi Theme";
const DEFAULT_SECTION_SLUG: &str = "overview";

/// Blocks walked in document order; headings open new sections.
const WALKED_BLOCKS: &[&str] = &["h1", "h2", "h3", "p", "ul", "ol", "pre"];

/// One heading-delimited slice of a Notion page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionSection {
    pub title: String,
    pub slug: String,
    pub content: String,
}

/// Splits a published Notion page into one document per section.
pub struct NotionExportAdapter {
    source: SourceId,
    description: String,
    http: HttpClient,
    fetch: FetchOptions,
    page_url: String,
}

impl NotionExportAdapter {
    pub fn new(source: SourceId, http: HttpClient, fetch: FetchOptions, page_url: &str) -> Self {
        Self {
            source,
            description: format!("{source} Notion export"),
            http,
            fetch,
            page_url: page_url.to_string(),
        }
    }

    fn section_url(&self, slug: &str) -> String {
        format!("{}#{slug}", self.page_url)
    }
}

impl SourceAdapter for NotionExportAdapter {
    fn id(&self) -> SourceId {
        self.source
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn fetch_documents(&self) -> DocumentStream<'_> {
        Box::pin(stream! {
            let html = match self.http.get(&self.page_url, &self.fetch).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(source = %self.source, url = %self.page_url, error = %e, "failed to fetch Notion page");
                    return;
                }
            };

            let sections = split_sections(&html);
            info!(source = %self.source, sections = sections.len(), "Notion page split");

            for section in sections {
                yield RawDocument::fetched_now(
                    self.source,
                    self.section_url(&section.slug),
                    section.title,
                    section.content,
                );
            }
        })
    }
}

/// Split a Notion page into heading-delimited sections.
///
/// The content root is `[data-root]`, else `main`, else `body`. Blocks nested
/// inside another walked block belong to their outer block. Text before the
/// first heading forms the default `overview` section; an empty heading keeps
/// the previous title. Slugs are unique within the page: a repeated heading
/// gets `-2`, `-3`, ... appended.
pub fn split_sections(html: &str) -> Vec<NotionSection> {
    let doc = Html::parse_document(html);
    let root = ["[data-root]", "main", "body"]
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| doc.select(&selector).next())
        .unwrap_or_else(|| doc.root_element());

    let Ok(blocks) = Selector::parse(&WALKED_BLOCKS.join(", ")) else {
        return Vec::new();
    };

    let mut sections = SectionList::default();
    let mut title = DEFAULT_SECTION_TITLE.to_string();
    let mut slug = DEFAULT_SECTION_SLUG.to_string();
    let mut buffer: Vec<String> = Vec::new();

    for block in root.select(&blocks) {
        if is_nested_block(block, root) {
            continue;
        }

        let name = block.value().name();
        if matches!(name, "h1" | "h2" | "h3") {
            sections.flush(&title, &slug, &mut buffer);
            let heading = element_text(block);
            if !heading.is_empty() {
                title = heading;
            }
            slug = slugify(&title);
        } else {
            buffer.push(block.html());
        }
    }
    sections.flush(&title, &slug, &mut buffer);

    sections.sections
}

fn is_nested_block(block: ElementRef<'_>, root: ElementRef<'_>) -> bool {
    block
        .ancestors()
        .take_while(|node| node.id() != root.id())
        .filter_map(ElementRef::wrap)
        .any(|el| WALKED_BLOCKS.contains(&el.value().name()))
}

/// Emitted sections plus the slugs already handed out.
#[derive(Default)]
struct SectionList {
    sections: Vec<NotionSection>,
    slugs: HashSet<String>,
}

impl SectionList {
    fn flush(&mut self, title: &str, slug: &str, buffer: &mut Vec<String>) {
        if buffer.is_empty() {
            return;
        }
        let content = html_to_text(&buffer.join("\n"));
        buffer.clear();
        if content.is_empty() {
            debug!(title, slug, "section has no text, skipped");
            return;
        }
        let slug = self.claim_slug(slug);
        self.sections.push(NotionSection {
            title: title.to_string(),
            slug,
            content,
        });
    }

    fn claim_slug(&mut self, base: &str) -> String {
        let base = if base.is_empty() { "section" } else { base };
        let mut candidate = base.to_string();
        let mut n = 2;
        while !self.slugs.insert(candidate.clone()) {
            candidate = format!("{base}-{n}");
            n += 1;
        }
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use magedocs_shared::UpsertStatus;
    use magedocs_storage::DocumentStore;
    use std::time::Duration;
    use wiremock::matchers::path;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><body>
        <nav><p>Sidebar entry</p></nav>
        <div data-root="true">
            <p>Satoshi is a Hyvä based theme.</p>
            <h2>Installation</h2>
            <p>Require the package with composer.</p>
            <ul><li><p>Enable the module</p></li><li>Run setup:upgrade</li></ul>
            <h2>  </h2>
            <pre>bin/magento cache:flush</pre>
            <h3>Colors &amp; Fonts</h3>
            <p>Configured in tailwind.config.js</p>
            <h3>Empty section</h3>
        </div>
    </body></html>"#;

    #[test]
    fn splits_on_headings() {
        let sections = split_sections(PAGE);
        assert_eq!(sections.len(), 4);

        assert_eq!(sections[0].title, "Satoshi Theme");
        assert_eq!(sections[0].slug, "overview");
        assert_eq!(sections[0].content, "Satoshi is a Hyvä based theme.");

        assert_eq!(sections[1].title, "Installation");
        assert_eq!(sections[1].slug, "installation");
        // The <p> inside the list item is not emitted twice
        assert_eq!(
            sections[1].content,
            "Require the package with composer. Enable the module Run setup:upgrade"
        );

        // Blank heading keeps the previous title but not the anchor
        assert_eq!(sections[2].title, "Installation");
        assert_eq!(sections[2].slug, "installation-2");
        assert_eq!(sections[2].content, "bin/magento cache:flush");

        assert_eq!(sections[3].title, "Colors & Fonts");
        assert_eq!(sections[3].slug, "colors-fonts");
        assert!(!sections.iter().any(|s| s.content.contains("Sidebar")));
    }

    #[test]
    fn falls_back_to_main_then_body() {
        let with_main = "<body><p>outside</p><main><h1>Intro</h1><p>inside main</p></main></body>";
        let sections = split_sections(with_main);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Intro");
        assert_eq!(sections[0].content, "inside main");

        let body_only = "<body><p>just body text</p></body>";
        let sections = split_sections(body_only);
        assert_eq!(sections[0].slug, "overview");
        assert_eq!(sections[0].content, "just body text");
    }

    #[test]
    fn repeated_headings_get_distinct_slugs() {
        let page = r#"<main>
            <h2>Usage</h2><p>first usage block</p>
            <h2>Usage</h2><p>second usage block</p>
            <h2>Usage</h2><p>third usage block</p>
            <h2>!!!</h2><p>punctuation only heading</p>
        </main>"#;
        let slugs: Vec<String> = split_sections(page).into_iter().map(|s| s.slug).collect();
        assert_eq!(slugs, vec!["usage", "usage-2", "usage-3", "section"]);
    }

    #[tokio::test]
    async fn unchanged_page_is_skipped_on_second_upsert() {
        let server = MockServer::start().await;
        let page = r#"<main>
            <h2>Usage</h2><p>first usage block</p>
            <h2>Usage</h2><p>second usage block</p>
            <h2> </h2><p>after a blank heading</p>
        </main>"#;
        Mock::given(path("/satoshi"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;

        let http = HttpClient::new("magedocs-test", Duration::from_secs(5)).unwrap();
        let adapter = NotionExportAdapter::new(
            SourceId::Satoshi,
            http,
            FetchOptions::default(),
            &format!("{}/satoshi", server.uri()),
        );
        let tmp = std::env::temp_dir().join(format!("magedocs_notion_{}.db", uuid::Uuid::now_v7()));
        let store = DocumentStore::open(&tmp).await.unwrap();

        for expected in [UpsertStatus::Inserted, UpsertStatus::Skipped] {
            let docs: Vec<RawDocument> = adapter.fetch_documents().collect().await;
            assert_eq!(docs.len(), 3);
            for doc in &docs {
                let outcome = store.upsert(doc).await.unwrap();
                assert_eq!(outcome.status, expected, "{}", doc.url);
            }
        }

        let counts = store.count_by_source().await.unwrap();
        assert_eq!(counts[&SourceId::Satoshi], 3);
    }

    #[tokio::test]
    async fn documents_point_at_section_anchors() {
        let server = MockServer::start().await;
        Mock::given(path("/satoshi"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let http = HttpClient::new("magedocs-test", Duration::from_secs(5)).unwrap();
        let adapter = NotionExportAdapter::new(
            SourceId::Satoshi,
            http,
            FetchOptions::default(),
            &format!("{}/satoshi", server.uri()),
        );
        let docs: Vec<RawDocument> = adapter.fetch_documents().collect().await;

        assert_eq!(docs.len(), 4);
        assert_eq!(docs[0].url, format!("{}/satoshi#overview", server.uri()));
        assert_eq!(docs[3].url, format!("{}/satoshi#colors-fonts", server.uri()));
        assert!(docs.iter().all(|d| d.source == SourceId::Satoshi));
    }

    #[tokio::test]
    async fn fetch_failure_yields_nothing() {
        let server = MockServer::start().await;
        Mock::given(path("/satoshi"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let http = HttpClient::new("magedocs-test", Duration::from_secs(5)).unwrap();
        let adapter = NotionExportAdapter::new(
            SourceId::Satoshi,
            http,
            FetchOptions::default(),
            &format!("{}/satoshi", server.uri()),
        );
        assert_eq!(adapter.fetch_documents().count().await, 0);
    }
}
