//! Transport-independent tool operations over the document store.
//!
//! Every operation returns a serializable response that also knows how to
//! render itself as the plain text shown to the caller.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use magedocs_core::{Indexer, SilentObserver};
use magedocs_shared::{
    Document, DocsError, IndexingResult, Result, SearchHit, SourceFilter, SourceId,
};
use magedocs_storage::DocumentStore;

use crate::topics::{TOPIC_RESULT_LIMIT, Topic, find_topic};

pub const MIN_QUERY_CHARS: usize = 2;
pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const MAX_SEARCH_LIMIT: usize = 50;

/// Argument-less refresh shortcut exposed as its own tool.
#[derive(Debug, Clone, Copy)]
pub struct UpdateShortcut {
    pub name: &'static str,
    pub title: &'static str,
    pub sources: &'static [SourceId],
}

pub static UPDATE_SHORTCUTS: &[UpdateShortcut] = &[
    UpdateShortcut {
        name: "mcp_update_all",
        title: "MCP update all",
        sources: &SourceId::ALL,
    },
    UpdateShortcut {
        name: "mcp_update_hyva",
        title: "MCP update Hyva",
        sources: &[SourceId::Hyva],
    },
    UpdateShortcut {
        name: "mcp_update_satoshi",
        title: "MCP update Satoshi",
        sources: &[SourceId::Satoshi],
    },
    UpdateShortcut {
        name: "mcp_update_mageos",
        title: "MCP update Mageos",
        sources: &[SourceId::Mageos],
    },
];

pub fn find_shortcut(name: &str) -> Option<&'static UpdateShortcut> {
    UPDATE_SHORTCUTS.iter().find(|s| s.name == name)
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub source: String,
    pub limit: usize,
    pub results: Vec<SearchHit>,
}

impl SearchResponse {
    /// Numbered list of `N. [source] title`, URL and snippet, or a no-results line.
    pub fn render(&self) -> String {
        if self.results.is_empty() {
            return format!("No results for: {}", self.query);
        }
        self.results
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                format!(
                    "{}. [{}] {}\n{}\n{}",
                    i + 1,
                    hit.source,
                    hit.title,
                    hit.url,
                    hit.snippet
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Full text of a stored document with a short header block.
pub fn render_document(doc: &Document) -> String {
    format!(
        "# {}\nSource: {}\nURL: {}\nLast fetched: {}\n\n{}",
        doc.title,
        doc.source,
        doc.url,
        doc.last_fetched.to_rfc3339(),
        doc.content
    )
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub counts: BTreeMap<SourceId, u64>,
    pub db_path: PathBuf,
    pub indexing: bool,
}

impl StatusReport {
    pub fn render(&self) -> String {
        let mut lines = vec!["Indexed documents:".to_string()];
        lines.extend(
            self.counts
                .iter()
                .map(|(source, count)| format!("{source}: {count}")),
        );
        lines.push(format!("Database: {}", self.db_path.display()));
        if self.indexing {
            lines.push("Indexing in progress".to_string());
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub results: Vec<IndexingResult>,
}

impl RefreshReport {
    /// `"<heading> Results: <pretty json>"`.
    pub fn render(&self, heading: &str) -> String {
        let json = serde_json::to_string_pretty(&self.results).unwrap_or_default();
        format!("{heading} Results: {json}")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicResponse {
    #[serde(skip)]
    pub title: &'static str,
    pub topic: &'static str,
    pub source: SourceId,
    pub query: &'static str,
    pub results: Vec<SearchHit>,
}

impl TopicResponse {
    pub fn render(&self) -> String {
        let mut text = format!(
            "Topic: {}\nSource: {}\nQuery: {}\n\n",
            self.title, self.source, self.query
        );
        if self.results.is_empty() {
            text.push_str("No indexed results.");
        } else {
            let lines: Vec<String> = self
                .results
                .iter()
                .map(|hit| format!("- ({}) {} → {}", hit.id, hit.title, hit.url))
                .collect();
            text.push_str(&lines.join("\n"));
        }
        text
    }
}

// ---------------------------------------------------------------------------
// DocsTools
// ---------------------------------------------------------------------------

/// Read and refresh operations shared by the MCP server and the CLI.
pub struct DocsTools {
    store: Arc<DocumentStore>,
    indexer: Option<Arc<Indexer>>,
    db_path: PathBuf,
}

impl DocsTools {
    /// Read-only tools; refresh operations report themselves unavailable.
    pub fn new(store: Arc<DocumentStore>, db_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            indexer: None,
            db_path: db_path.into(),
        }
    }

    pub fn with_indexer(mut self, indexer: Arc<Indexer>) -> Self {
        self.indexer = Some(indexer);
        self
    }

    pub fn can_refresh(&self) -> bool {
        self.indexer.is_some()
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Ranked full-text search requiring every query term. The query is
    /// validated before the store is touched.
    pub async fn search_docs(
        &self,
        query: &str,
        source: SourceFilter,
        limit: Option<usize>,
    ) -> Result<SearchResponse> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Err(DocsError::validation(format!(
                "query must be at least {MIN_QUERY_CHARS} characters"
            )));
        }
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        if !(1..=MAX_SEARCH_LIMIT).contains(&limit) {
            return Err(DocsError::validation(format!(
                "limit must be between 1 and {MAX_SEARCH_LIMIT}, got {limit}"
            )));
        }

        let results = self.store.search(query, source, limit).await?;
        debug!(query, %source, limit, hits = results.len(), "search_docs");
        Ok(SearchResponse {
            query: query.to_string(),
            source: source.to_string(),
            limit,
            results,
        })
    }

    pub async fn get_doc(&self, id: i64) -> Result<Document> {
        if id <= 0 {
            return Err(DocsError::validation("id must be a positive integer"));
        }
        self.store
            .get_document(id)
            .await?
            .ok_or_else(|| DocsError::NotFound(format!("Document {id} not found")))
    }

    pub async fn docs_status(&self) -> Result<StatusReport> {
        Ok(StatusReport {
            counts: self.store.count_by_source().await?,
            db_path: self.db_path.clone(),
            indexing: self.indexer.as_ref().is_some_and(|i| i.is_running()),
        })
    }

    /// Re-index a subset of sources (all when `None`). Waits for any running refresh.
    pub async fn refresh_docs(&self, sources: Option<&[SourceId]>) -> Result<RefreshReport> {
        let indexer = self.indexer.as_ref().ok_or_else(|| {
            DocsError::validation("refresh is unavailable: server started without an indexer")
        })?;
        if sources.is_some_and(|s| s.is_empty() || s.len() > SourceId::ALL.len()) {
            return Err(DocsError::validation(format!(
                "sources must list between 1 and {} entries",
                SourceId::ALL.len()
            )));
        }

        info!(
            sources = ?sources.map(|s| s.iter().map(SourceId::as_str).collect::<Vec<_>>()),
            "refresh requested"
        );
        let results = indexer.run(sources, &SilentObserver).await;
        Ok(RefreshReport { results })
    }

    pub async fn run_shortcut(&self, shortcut: &UpdateShortcut) -> Result<RefreshReport> {
        self.refresh_docs(Some(shortcut.sources)).await
    }

    /// Top hits of a curated topic within its own source. Any query term may match.
    pub async fn topic(&self, name: &str) -> Result<TopicResponse> {
        let topic: &'static Topic =
            find_topic(name).ok_or_else(|| DocsError::NotFound(format!("topic {name}")))?;
        let results = self
            .store
            .search_any(
                topic.query,
                SourceFilter::Only(topic.source),
                TOPIC_RESULT_LIMIT,
            )
            .await?;
        Ok(TopicResponse {
            title: topic.title,
            topic: topic.name,
            source: topic.source,
            query: topic.query,
            results,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use magedocs_core::{AdapterRegistry, DocumentStream, SourceAdapter};
    use magedocs_shared::RawDocument;
    use uuid::Uuid;

    pub async fn temp_store() -> (Arc<DocumentStore>, PathBuf) {
        let path = std::env::temp_dir().join(format!("magedocs_mcp_{}.db", Uuid::now_v7()));
        let store = DocumentStore::open(&path).await.expect("open test db");
        (Arc::new(store), path)
    }

    pub fn doc(source: SourceId, url: &str, title: &str, content: &str) -> RawDocument {
        RawDocument::fetched_now(source, url, title, content)
    }

    /// Store seeded with one document per source.
    pub async fn seeded_tools() -> DocsTools {
        let (store, path) = temp_store().await;
        for raw in [
            doc(
                SourceId::Mageos,
                "https://devdocs.mage-os.org/docs/cli",
                "CLI commands reference",
                "Run bin/magento cache:flush after deploying static content.",
            ),
            doc(
                SourceId::Hyva,
                "https://docs.hyva.io/tailwind",
                "Tailwind configuration",
                "Hyva Tailwind config lives in web/tailwind/tailwind.config.js with a safelist.",
            ),
            doc(
                SourceId::Satoshi,
                "https://scandiweb.notion.site/satoshi#installation",
                "Installation",
                "Install Satoshi with composer on top of Hyva.",
            ),
        ] {
            store.upsert(&raw).await.expect("seed document");
        }
        DocsTools::new(store, path)
    }

    /// Adapter yielding one fixed document.
    pub struct OneDocAdapter(pub SourceId);

    impl SourceAdapter for OneDocAdapter {
        fn id(&self) -> SourceId {
            self.0
        }

        fn description(&self) -> &str {
            "single test document"
        }

        fn fetch_documents(&self) -> DocumentStream<'_> {
            let raw = doc(
                self.0,
                &format!("https://example.test/{}", self.0),
                "Fresh page",
                "freshly indexed body text",
            );
            Box::pin(futures::stream::iter(vec![raw]))
        }
    }

    pub async fn refreshable_tools() -> DocsTools {
        let (store, path) = temp_store().await;
        let registry = AdapterRegistry::new(
            SourceId::ALL
                .iter()
                .map(|s| Box::new(OneDocAdapter(*s)) as Box<dyn SourceAdapter>)
                .collect(),
        );
        let indexer = Arc::new(Indexer::new(store.clone(), registry));
        DocsTools::new(store, path).with_indexer(indexer)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[tokio::test]
    async fn search_finds_term_and_renders_list() {
        let tools = seeded_tools().await;
        let response = tools
            .search_docs("  tailwind  ", SourceFilter::All, None)
            .await
            .unwrap();

        assert_eq!(response.query, "tailwind");
        assert_eq!(response.limit, DEFAULT_SEARCH_LIMIT);
        assert_eq!(response.source, "all");
        assert_eq!(response.results.len(), 1);

        let text = response.render();
        assert!(text.starts_with("1. [hyva] Tailwind configuration\nhttps://docs.hyva.io/tailwind\n"));
    }

    #[tokio::test]
    async fn multi_term_query_requires_every_term() {
        let tools = seeded_tools().await;
        let hits = tools
            .search_docs("composer satoshi", SourceFilter::All, None)
            .await
            .unwrap()
            .results;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://scandiweb.notion.site/satoshi#installation");

        let hits = tools
            .search_docs("composer tailwind", SourceFilter::All, None)
            .await
            .unwrap()
            .results;
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn short_query_is_rejected() {
        let tools = seeded_tools().await;
        let err = tools
            .search_docs(" a ", SourceFilter::All, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DocsError::Validation { .. }));
    }

    #[tokio::test]
    async fn limit_out_of_range_is_rejected() {
        let tools = seeded_tools().await;
        for limit in [0, 51] {
            let err = tools
                .search_docs("composer", SourceFilter::All, Some(limit))
                .await
                .unwrap_err();
            assert!(matches!(err, DocsError::Validation { .. }), "limit {limit}");
        }
    }

    #[tokio::test]
    async fn source_filter_and_empty_results() {
        let tools = seeded_tools().await;
        let response = tools
            .search_docs("composer", SourceFilter::Only(SourceId::Mageos), Some(5))
            .await
            .unwrap();
        assert!(response.results.is_empty());
        assert_eq!(response.render(), "No results for: composer");
    }

    #[tokio::test]
    async fn get_doc_renders_header_and_reports_missing() {
        let tools = seeded_tools().await;
        let hit = tools
            .search_docs("satoshi", SourceFilter::All, None)
            .await
            .unwrap()
            .results
            .remove(0);

        let doc = tools.get_doc(hit.id).await.unwrap();
        let text = render_document(&doc);
        assert!(text.starts_with("# Installation\nSource: satoshi\nURL: https://scandiweb.notion.site/satoshi#installation\nLast fetched: "));
        assert!(text.ends_with("\n\nInstall Satoshi with composer on top of Hyva."));

        let err = tools.get_doc(9999).await.unwrap_err();
        assert!(matches!(err, DocsError::NotFound(_)));
        assert!(err.to_string().contains("Document 9999 not found"));
    }

    #[tokio::test]
    async fn status_on_empty_store_is_zero_filled() {
        let (store, path) = temp_store().await;
        let tools = DocsTools::new(store, &path);
        let report = tools.docs_status().await.unwrap();

        assert_eq!(report.counts.len(), 3);
        assert!(report.counts.values().all(|c| *c == 0));
        let text = report.render();
        assert!(text.starts_with("Indexed documents:\nmageos: 0\nhyva: 0\nsatoshi: 0\nDatabase: "));
    }

    #[tokio::test]
    async fn refresh_requires_indexer() {
        let tools = seeded_tools().await;
        assert!(!tools.can_refresh());
        let err = tools.refresh_docs(None).await.unwrap_err();
        assert!(matches!(err, DocsError::Validation { .. }));
    }

    #[tokio::test]
    async fn refresh_runs_subset_and_validates_size() {
        let tools = refreshable_tools().await;

        let err = tools.refresh_docs(Some(&[])).await.unwrap_err();
        assert!(matches!(err, DocsError::Validation { .. }));

        let report = tools.refresh_docs(Some(&[SourceId::Hyva])).await.unwrap();
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].inserted, 1);
        assert!(report.render("Reindex triggered.").starts_with("Reindex triggered. Results: ["));

        let status = tools.docs_status().await.unwrap();
        assert_eq!(status.counts[&SourceId::Hyva], 1);
        assert_eq!(status.counts[&SourceId::Mageos], 0);
    }

    #[tokio::test]
    async fn shortcut_covers_its_sources() {
        let tools = refreshable_tools().await;
        let all = find_shortcut("mcp_update_all").unwrap();
        let report = tools.run_shortcut(all).await.unwrap();
        let sources: Vec<SourceId> = report.results.iter().map(|r| r.source).collect();
        assert_eq!(sources, SourceId::ALL.to_vec());

        let satoshi = find_shortcut("mcp_update_satoshi").unwrap();
        assert_eq!(satoshi.sources, &[SourceId::Satoshi]);
    }

    #[tokio::test]
    async fn topic_searches_its_own_source() {
        let tools = seeded_tools().await;

        let response = tools.topic("hyva_tailwind_configuration").await.unwrap();
        assert_eq!(response.source, SourceId::Hyva);
        assert_eq!(response.results.len(), 1);
        let text = response.render();
        assert!(text.starts_with("Topic: Hyvä Tailwind configuration\nSource: hyva\nQuery: Hyva Tailwind config purge safelist\n\n"));
        assert!(text.contains("Tailwind configuration → https://docs.hyva.io/tailwind"));

        let (store, path) = temp_store().await;
        let empty = DocsTools::new(store, path)
            .topic("satoshi_upgrade_path")
            .await
            .unwrap();
        assert!(empty.render().ends_with("\n\nNo indexed results."));

        assert!(tools.topic("nope").await.is_err());
    }
}
