//! Source adapters: one per documentation source, each producing a lazy
//! stream of [`RawDocument`]s.
//!
//! - [`DocSiteAdapter`]: crawls a documentation website
//! - [`GitHubTreeAdapter`]: markdown files from a GitHub repository tree
//! - [`NotionExportAdapter`]: one public Notion page split into sections
//! - [`ChainAdapter`]: several adapters feeding one logical source

mod docsite;
mod github;
mod notion;

use std::pin::Pin;

use futures::{Stream, StreamExt};

use magedocs_crawler::{FetchOptions, HttpClient, SiteCrawler};
use magedocs_shared::{AppConfig, RawDocument, Result, SourceId};

pub use docsite::DocSiteAdapter;
pub use github::{GitHubTreeAdapter, GithubRepo, path_title};
pub use notion::{NotionExportAdapter, NotionSection, split_sections};

/// Lazy, finite sequence of documents produced by an adapter.
pub type DocumentStream<'a> = Pin<Box<dyn Stream<Item = RawDocument> + Send + 'a>>;

/// Produces the documents of one source.
///
/// Implementations swallow per-page failures (logging them) so that a
/// broken page never ends the stream early.
pub trait SourceAdapter: Send + Sync {
    /// The source every yielded document belongs to.
    fn id(&self) -> SourceId;

    /// Human-readable description for progress output.
    fn description(&self) -> &str;

    fn fetch_documents(&self) -> DocumentStream<'_>;
}

// ---------------------------------------------------------------------------
// ChainAdapter
// ---------------------------------------------------------------------------

/// Runs several adapters one after another under a single source id.
pub struct ChainAdapter {
    id: SourceId,
    description: String,
    parts: Vec<Box<dyn SourceAdapter>>,
}

impl ChainAdapter {
    pub fn new(
        id: SourceId,
        description: impl Into<String>,
        parts: Vec<Box<dyn SourceAdapter>>,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            parts,
        }
    }
}

impl SourceAdapter for ChainAdapter {
    fn id(&self) -> SourceId {
        self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn fetch_documents(&self) -> DocumentStream<'_> {
        Box::pin(futures::stream::iter(self.parts.iter()).flat_map(|part| part.fetch_documents()))
    }
}

// ---------------------------------------------------------------------------
// AdapterRegistry
// ---------------------------------------------------------------------------

/// Fixed-order lookup from [`SourceId`] to its adapter.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    /// Build a registry from explicit adapters (order is preserved).
    pub fn new(adapters: Vec<Box<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    /// Build the standard mageos, hyva, satoshi adapters from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let http = HttpClient::from_config(&config.http)?;
        let fetch = FetchOptions::from_config(&config.http);
        let crawler = SiteCrawler::new(http.clone(), fetch.clone());
        let delay = std::time::Duration::from_millis(config.crawl.request_delay_ms);
        let github_fetch = match config.github.token() {
            Some(token) => fetch.clone().with_header("authorization", format!("Bearer {token}")),
            None => fetch.clone(),
        };

        let mageos = ChainAdapter::new(
            SourceId::Mageos,
            "MageOS DevDocs (site + GitHub)",
            vec![
                Box::new(
                    DocSiteAdapter::new(
                        SourceId::Mageos,
                        crawler.clone(),
                        &config.mageos.site_url,
                        config.mageos.max_pages,
                    )?
                    .with_min_content_length(config.mageos.min_content_length)
                    .with_request_delay(delay),
                ),
                Box::new(GitHubTreeAdapter::new(
                    SourceId::Mageos,
                    http.clone(),
                    github_fetch.clone(),
                    &config.github,
                    GithubRepo::new(
                        &config.mageos.repo_owner,
                        &config.mageos.repo_name,
                        &config.mageos.branch,
                    ),
                    &config.mageos.include_dirs,
                )),
            ],
        );

        let hyva = DocSiteAdapter::new(
            SourceId::Hyva,
            crawler,
            &config.hyva.start_url,
            config.hyva.max_pages,
        )?
        .with_description("Hyvä Docs crawler")
        .with_min_content_length(config.hyva.min_content_length)
        .with_request_delay(delay);

        let mut satoshi_parts: Vec<Box<dyn SourceAdapter>> = vec![Box::new(
            NotionExportAdapter::new(
                SourceId::Satoshi,
                http.clone(),
                fetch,
                &config.satoshi.notion_url,
            ),
        )];
        if let Some(repo) = config.satoshi.github_repo.as_deref() {
            satoshi_parts.push(Box::new(GitHubTreeAdapter::new(
                SourceId::Satoshi,
                http,
                github_fetch,
                &config.github,
                GithubRepo::parse(repo, &config.satoshi.github_branch)?,
                &config.satoshi.include_paths,
            )));
        }
        let satoshi = ChainAdapter::new(
            SourceId::Satoshi,
            "Satoshi Hyvä Theme (Notion + GitHub)",
            satoshi_parts,
        );

        Ok(Self::new(vec![
            Box::new(mageos),
            Box::new(hyva),
            Box::new(satoshi),
        ]))
    }

    pub fn get(&self, source: SourceId) -> Option<&dyn SourceAdapter> {
        self.adapters
            .iter()
            .find(|a| a.id() == source)
            .map(|a| a.as_ref())
    }

    /// Adapters enabled by `sources` (all when `None`), in registry order.
    pub fn select(&self, sources: Option<&[SourceId]>) -> Vec<&dyn SourceAdapter> {
        self.adapters
            .iter()
            .filter(|a| sources.is_none_or(|s| s.contains(&a.id())))
            .map(|a| a.as_ref())
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Adapter yielding a fixed list of documents.
    pub struct StaticAdapter {
        pub id: SourceId,
        pub docs: Vec<RawDocument>,
    }

    impl StaticAdapter {
        pub fn new(id: SourceId, urls: &[&str]) -> Self {
            let docs = urls
                .iter()
                .map(|url| {
                    RawDocument::fetched_now(id, *url, format!("Title of {url}"), format!("body {url}"))
                })
                .collect();
            Self { id, docs }
        }
    }

    impl SourceAdapter for StaticAdapter {
        fn id(&self) -> SourceId {
            self.id
        }

        fn description(&self) -> &str {
            "static test documents"
        }

        fn fetch_documents(&self) -> DocumentStream<'_> {
            Box::pin(futures::stream::iter(self.docs.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::StaticAdapter;
    use super::*;

    #[tokio::test]
    async fn chain_yields_parts_in_order() {
        let chain = ChainAdapter::new(
            SourceId::Mageos,
            "site + repo",
            vec![
                Box::new(StaticAdapter::new(SourceId::Mageos, &["https://a/1", "https://a/2"])),
                Box::new(StaticAdapter::new(SourceId::Mageos, &["https://b/1"])),
            ],
        );

        let urls: Vec<String> = chain.fetch_documents().map(|d| d.url).collect().await;
        assert_eq!(urls, vec!["https://a/1", "https://a/2", "https://b/1"]);
    }

    #[test]
    fn registry_selects_in_fixed_order() {
        let registry = AdapterRegistry::new(vec![
            Box::new(StaticAdapter::new(SourceId::Mageos, &[])),
            Box::new(StaticAdapter::new(SourceId::Hyva, &[])),
            Box::new(StaticAdapter::new(SourceId::Satoshi, &[])),
        ]);

        let all: Vec<SourceId> = registry.select(None).iter().map(|a| a.id()).collect();
        assert_eq!(all, SourceId::ALL.to_vec());

        let some: Vec<SourceId> = registry
            .select(Some(&[SourceId::Satoshi, SourceId::Mageos]))
            .iter()
            .map(|a| a.id())
            .collect();
        assert_eq!(some, vec![SourceId::Mageos, SourceId::Satoshi]);

        assert!(registry.get(SourceId::Hyva).is_some());
    }

    #[test]
    fn default_config_builds_registry() {
        let registry = AdapterRegistry::from_config(&AppConfig::default()).unwrap();
        let ids: Vec<SourceId> = registry.select(None).iter().map(|a| a.id()).collect();
        assert_eq!(ids, SourceId::ALL.to_vec());
        assert_eq!(
            registry.get(SourceId::Hyva).unwrap().description(),
            "Hyvä Docs crawler"
        );
    }
}
