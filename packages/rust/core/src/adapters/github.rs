use async_stream::stream;
use serde::Deserialize;
use tracing::{debug, info, warn};

use magedocs_crawler::{FetchOptions, HttpClient};
use magedocs_markdown::{markdown_title, markdown_to_text};
use magedocs_shared::{DocsError, GithubConfig, RawDocument, Result, SourceId};

use super::{DocumentStream, SourceAdapter};

/// `owner/name@branch` coordinates of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubRepo {
    pub owner: String,
    pub name: String,
    pub branch: String,
}

impl GithubRepo {
    pub fn new(owner: &str, name: &str, branch: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            branch: branch.to_string(),
        }
    }

    /// Parse `owner/name`.
    pub fn parse(value: &str, branch: &str) -> Result<Self> {
        match value.trim().split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::new(owner, name, branch))
            }
            _ => Err(DocsError::config(format!(
                "invalid GitHub repository {value:?}: expected owner/name"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GitTree {
    tree: Vec<TreeEntry>,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Indexes markdown files of one repository through the git trees API.
pub struct GitHubTreeAdapter {
    source: SourceId,
    description: String,
    http: HttpClient,
    fetch: FetchOptions,
    repo: GithubRepo,
    /// Allowed path prefixes, slashes trimmed.
    include: Vec<String>,
    api_base: String,
    raw_base: String,
    web_base: String,
}

impl GitHubTreeAdapter {
    pub fn new(
        source: SourceId,
        http: HttpClient,
        fetch: FetchOptions,
        endpoints: &GithubConfig,
        repo: GithubRepo,
        include: &[String],
    ) -> Self {
        let include = include
            .iter()
            .map(|p| p.trim().trim_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self {
            source,
            description: format!("{source} GitHub {}/{}", repo.owner, repo.name),
            http,
            fetch,
            repo,
            include,
            api_base: endpoints.api_base.trim_end_matches('/').to_string(),
            raw_base: endpoints.raw_base.trim_end_matches('/').to_string(),
            web_base: endpoints.web_base.trim_end_matches('/').to_string(),
        }
    }

    fn tree_url(&self) -> String {
        let GithubRepo { owner, name, branch } = &self.repo;
        format!(
            "{}/repos/{owner}/{name}/git/trees/{branch}?recursive=1",
            self.api_base
        )
    }

    fn raw_url(&self, path: &str) -> String {
        let GithubRepo { owner, name, branch } = &self.repo;
        format!("{}/{owner}/{name}/{branch}/{path}", self.raw_base)
    }

    fn blob_url(&self, path: &str) -> String {
        let GithubRepo { owner, name, branch } = &self.repo;
        format!("{}/{owner}/{name}/blob/{branch}/{path}", self.web_base)
    }

    /// Markdown blob inside one of the allowed prefixes. An empty allow-list admits every file.
    fn wants(&self, entry: &TreeEntry) -> bool {
        entry.kind == "blob"
            && entry.path.ends_with(".md")
            && (self.include.is_empty()
                || self.include.iter().any(|prefix| {
                    entry.path == *prefix
                        || entry
                            .path
                            .strip_prefix(prefix.as_str())
                            .is_some_and(|rest| rest.starts_with('/'))
                }))
    }
}

/// Fallback title for a file without an H1: `guides/setup.md` → `guides → setup.md`.
pub fn path_title(path: &str) -> String {
    path.replace('/', " → ")
}

impl SourceAdapter for GitHubTreeAdapter {
    fn id(&self) -> SourceId {
        self.source
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn fetch_documents(&self) -> DocumentStream<'_> {
        Box::pin(stream! {
            let tree_url = self.tree_url();
            let tree: GitTree = match self.http.get_json(&tree_url, &self.fetch).await {
                Ok(tree) => tree,
                Err(e) => {
                    warn!(source = %self.source, url = %tree_url, error = %e, "failed to load repository tree");
                    return;
                }
            };

            let paths: Vec<String> = tree
                .tree
                .into_iter()
                .filter(|entry| self.wants(entry))
                .map(|entry| entry.path)
                .collect();
            info!(
                source = %self.source,
                repo = %format!("{}/{}", self.repo.owner, self.repo.name),
                files = paths.len(),
                "repository tree loaded"
            );

            for path in paths {
                let markdown = match self.http.get(&self.raw_url(&path), &self.fetch).await {
                    Ok(body) => body,
                    Err(e) => {
                        warn!(source = %self.source, %path, error = %e, "failed to fetch markdown file");
                        continue;
                    }
                };

                debug!(%path, bytes = markdown.len(), "fetched markdown file");
                let title = markdown_title(&markdown).unwrap_or_else(|| path_title(&path));
                let content = markdown_to_text(&markdown);
                yield RawDocument::fetched_now(self.source, self.blob_url(&path), title, content);
            }
        })
    }
}
