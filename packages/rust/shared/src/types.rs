//! Core domain types for magedocs.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DocsError;

// ---------------------------------------------------------------------------
// SourceId
// ---------------------------------------------------------------------------

/// One of the fixed documentation sources the indexer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    /// MageOS DevDocs (site + GitHub repository).
    Mageos,
    /// Hyvä Docs site.
    Hyva,
    /// Satoshi Hyvä theme (Notion export + GitHub repository).
    Satoshi,
}

impl SourceId {
    /// Every known source, in indexing order.
    pub const ALL: [SourceId; 3] = [SourceId::Mageos, SourceId::Hyva, SourceId::Satoshi];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mageos => "mageos",
            Self::Hyva => "hyva",
            Self::Satoshi => "satoshi",
        }
    }

    /// Parse a comma-separated list (`"hyva, satoshi"`). Empty input yields `None`.
    pub fn parse_list(value: &str) -> std::result::Result<Option<Vec<SourceId>>, DocsError> {
        let mut sources = Vec::new();
        for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let source: SourceId = item.parse()?;
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
        Ok(if sources.is_empty() {
            None
        } else {
            Some(sources)
        })
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceId {
    type Err = DocsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mageos" => Ok(Self::Mageos),
            "hyva" => Ok(Self::Hyva),
            "satoshi" => Ok(Self::Satoshi),
            other => Err(DocsError::validation(format!(
                "unknown source '{other}': expected one of mageos, hyva, satoshi"
            ))),
        }
    }
}

/// Search scope: every source, or a single one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFilter {
    #[default]
    All,
    Only(SourceId),
}

impl std::str::FromStr for SourceFilter {
    type Err = DocsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

impl std::fmt::Display for SourceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(source) => source.fmt(f),
        }
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// A normalized page as produced by a source adapter, before storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    pub source: SourceId,
    /// Canonical URL, unique within `source`.
    pub url: String,
    pub title: String,
    /// Normalized plain text.
    pub content: String,
    pub last_fetched: DateTime<Utc>,
}

impl RawDocument {
    /// Build a document stamped with the current time.
    pub fn fetched_now(
        source: SourceId,
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            source,
            url: url.into(),
            title: title.into(),
            content: content.into(),
            last_fetched: Utc::now(),
        }
    }
}

/// A stored document row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub source: SourceId,
    pub url: String,
    pub title: String,
    pub content: String,
    /// SHA-256 (hex) of `content`.
    pub content_hash: String,
    pub last_fetched: DateTime<Utc>,
}

/// What an upsert did to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertStatus {
    Inserted,
    Updated,
    /// Content unchanged; only `last_fetched` was refreshed.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertOutcome {
    pub status: UpsertStatus,
    pub id: i64,
}

/// One ranked full-text search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: i64,
    pub source: SourceId,
    pub url: String,
    pub title: String,
    /// Highlighted excerpt (`<b>…</b>` around matches).
    pub snippet: String,
    /// bm25 rank (lower is better).
    pub score: f64,
}

// ---------------------------------------------------------------------------
// IndexingResult
// ---------------------------------------------------------------------------

/// Per-source statistics for one adapter run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexingResult {
    pub source: SourceId,
    pub processed: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl IndexingResult {
    pub fn new(source: SourceId) -> Self {
        Self {
            source,
            processed: 0,
            inserted: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            duration: Duration::ZERO,
        }
    }

    /// Count one successful upsert.
    pub fn record(&mut self, status: UpsertStatus) {
        match status {
            UpsertStatus::Inserted => self.inserted += 1,
            UpsertStatus::Updated => self.updated += 1,
            UpsertStatus::Skipped => self.skipped += 1,
        }
    }
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
