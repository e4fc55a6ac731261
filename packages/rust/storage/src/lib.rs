//! libSQL document store with FTS5 search.
//!
//! The [`DocumentStore`] owns the single `documents` table and its full-text
//! index. Upserts are change-aware: a document whose content hash matches the
//! stored row only has its `last_fetched` timestamp refreshed.

mod migrations;

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use magedocs_shared::{
    Document, DocsError, RawDocument, Result, SearchHit, SourceFilter, SourceId, UpsertOutcome,
    UpsertStatus,
};

/// Column weights for `bm25()`: source, title, content.
const BM25_RANK: &str = "bm25(documents_fts, 0.0, 4.0, 1.0)";

/// How the terms of a free-text query combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Every term must appear in the document.
    #[default]
    All,
    /// Any term may match; bm25 ranks documents matching more terms higher.
    Any,
}

/// Compute the SHA-256 (lowercase hex) of document content.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn storage_err(e: libsql::Error) -> DocsError {
    DocsError::Storage(e.to_string())
}

/// Primary storage handle wrapping a libSQL database.
pub struct DocumentStore {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl DocumentStore {
    /// Open or create the database at `path` and apply the schema.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DocsError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let store = Self { db, conn };
        store.configure().await?;
        store.run_migrations().await?;
        info!(path = %path.display(), "document store ready");
        Ok(store)
    }

    async fn configure(&self) -> Result<()> {
        // journal_mode reports the resulting mode as a row
        let mut rows = self
            .conn
            .query("PRAGMA journal_mode = WAL", params![])
            .await
            .map_err(storage_err)?;
        while let Ok(Some(_)) = rows.next().await {}

        self.conn
            .execute("PRAGMA synchronous = NORMAL", params![])
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    DocsError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 before the first migration.
    pub async fn schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => match rows.next().await {
                Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
                _ => 0,
            },
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Insert, refresh, or update a document keyed by `(source, url)`.
    pub async fn upsert(&self, doc: &RawDocument) -> Result<UpsertOutcome> {
        let hash = content_hash(&doc.content);
        let fetched = doc.last_fetched.to_rfc3339();

        let tx = self.conn.transaction().await.map_err(storage_err)?;
        let outcome = match write_document(&tx, doc, &hash, &fetched).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // Leave the shared connection outside any transaction
                if let Err(rollback) = tx.rollback().await {
                    warn!(url = %doc.url, error = %rollback, "rollback failed");
                }
                return Err(e);
            }
        };

        tx.commit().await.map_err(storage_err)?;
        debug!(source = %doc.source, url = %doc.url, status = ?outcome.status, "upserted document");
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Fetch a stored document by id.
    pub async fn get_document(&self, id: i64) -> Result<Option<Document>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, source, url, title, content, content_hash, last_fetched
                 FROM documents WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(Some(row_to_document(&row)?)),
            None => Ok(None),
        }
    }

    /// Ranked full-text search requiring every term. Queries without any
    /// searchable term return nothing.
    pub async fn search(
        &self,
        query: &str,
        filter: SourceFilter,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        self.search_with(query, filter, limit, MatchMode::All).await
    }

    /// Ranked full-text search where any term may match.
    pub async fn search_any(
        &self,
        query: &str,
        filter: SourceFilter,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        self.search_with(query, filter, limit, MatchMode::Any).await
    }

    /// Ranked full-text search with an explicit term combination.
    pub async fn search_with(
        &self,
        query: &str,
        filter: SourceFilter,
        limit: usize,
        mode: MatchMode,
    ) -> Result<Vec<SearchHit>> {
        let Some(fts_query) = fts_query(query, mode) else {
            return Ok(Vec::new());
        };
        let limit = limit as i64;

        let select = format!(
            "SELECT d.id, d.source, d.url, d.title,
                    snippet(documents_fts, -1, '<b>', '</b>', '...', 12),
                    {BM25_RANK} AS score
             FROM documents_fts
             JOIN documents d ON d.id = documents_fts.rowid
             WHERE documents_fts MATCH ?1"
        );

        let mut rows = match filter {
            SourceFilter::All => {
                self.conn
                    .query(
                        &format!("{select} ORDER BY score LIMIT ?2"),
                        params![fts_query.as_str(), limit],
                    )
                    .await
            }
            SourceFilter::Only(source) => {
                self.conn
                    .query(
                        &format!("{select} AND d.source = ?2 ORDER BY score LIMIT ?3"),
                        params![fts_query.as_str(), source.as_str(), limit],
                    )
                    .await
            }
        }
        .map_err(storage_err)?;

        let mut hits = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            hits.push(SearchHit {
                id: row.get::<i64>(0).map_err(storage_err)?,
                source: parse_source(&row.get::<String>(1).map_err(storage_err)?)?,
                url: row.get::<String>(2).map_err(storage_err)?,
                title: row.get::<String>(3).map_err(storage_err)?,
                snippet: row.get::<String>(4).unwrap_or_default(),
                score: row.get::<f64>(5).unwrap_or(0.0),
            });
        }
        debug!(query, %filter, ?mode, hits = hits.len(), "search complete");
        Ok(hits)
    }

    /// Document count for every known source (zero when absent).
    pub async fn count_by_source(&self) -> Result<BTreeMap<SourceId, u64>> {
        let mut counts: BTreeMap<SourceId, u64> =
            SourceId::ALL.iter().map(|s| (*s, 0)).collect();

        let mut rows = self
            .conn
            .query(
                "SELECT source, COUNT(*) FROM documents GROUP BY source",
                params![],
            )
            .await
            .map_err(storage_err)?;

        while let Some(row) = rows.next().await.map_err(storage_err)? {
            let source: String = row.get(0).map_err(storage_err)?;
            let count: i64 = row.get(1).map_err(storage_err)?;
            match source.parse::<SourceId>() {
                Ok(source) => {
                    counts.insert(source, count.max(0) as u64);
                }
                Err(_) => warn!(%source, "ignoring rows with unknown source"),
            }
        }
        Ok(counts)
    }

    pub async fn has_documents(&self) -> Result<bool> {
        let mut rows = self
            .conn
            .query("SELECT EXISTS(SELECT 1 FROM documents)", params![])
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(row.get::<i64>(0).map_err(storage_err)? != 0),
            None => Ok(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Turn free text into an FTS5 expression of quoted terms, implicitly ANDed
/// or joined with `OR`.
fn fts_query(raw: &str, mode: MatchMode) -> Option<String> {
    let terms: Vec<String> = raw
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{t}\""))
        .collect();

    if terms.is_empty() {
        None
    } else {
        let separator = match mode {
            MatchMode::All => " ",
            MatchMode::Any => " OR ",
        };
        Some(terms.join(separator))
    }
}

/// Insert or update one document inside the caller's transaction.
async fn write_document(
    conn: &Connection,
    doc: &RawDocument,
    hash: &str,
    fetched: &str,
) -> Result<UpsertOutcome> {
    let existing = {
        let mut rows = conn
            .query(
                "SELECT id, content_hash FROM documents WHERE source = ?1 AND url = ?2",
                params![doc.source.as_str(), doc.url.as_str()],
            )
            .await
            .map_err(storage_err)?;
        match rows.next().await.map_err(storage_err)? {
            Some(row) => Some((
                row.get::<i64>(0).map_err(storage_err)?,
                row.get::<String>(1).map_err(storage_err)?,
            )),
            None => None,
        }
    };

    let outcome = match existing {
        Some((id, stored_hash)) if stored_hash == hash => {
            conn.execute(
                "UPDATE documents SET last_fetched = ?1 WHERE id = ?2",
                params![fetched, id],
            )
            .await
            .map_err(storage_err)?;
            UpsertOutcome {
                status: UpsertStatus::Skipped,
                id,
            }
        }
        Some((id, _)) => {
            conn.execute(
                "UPDATE documents
                 SET title = ?1, content = ?2, content_hash = ?3, last_fetched = ?4
                 WHERE id = ?5",
                params![
                    doc.title.as_str(),
                    doc.content.as_str(),
                    hash,
                    fetched,
                    id
                ],
            )
            .await
            .map_err(storage_err)?;
            UpsertOutcome {
                status: UpsertStatus::Updated,
                id,
            }
        }
        None => {
            conn.execute(
                "INSERT INTO documents (source, url, title, content, content_hash, last_fetched)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    doc.source.as_str(),
                    doc.url.as_str(),
                    doc.title.as_str(),
                    doc.content.as_str(),
                    hash,
                    fetched
                ],
            )
            .await
            .map_err(storage_err)?;
            UpsertOutcome {
                status: UpsertStatus::Inserted,
                id: conn.last_insert_rowid(),
            }
        }
    };
    Ok(outcome)
}

fn parse_source(value: &str) -> Result<SourceId> {
    value
        .parse()
        .map_err(|_| DocsError::Storage(format!("unknown source in row: {value}")))
}

fn row_to_document(row: &libsql::Row) -> Result<Document> {
    let last_fetched: String = row.get(6).map_err(storage_err)?;
    let last_fetched = DateTime::parse_from_rfc3339(&last_fetched)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DocsError::Storage(format!("bad last_fetched {last_fetched:?}: {e}")))?;

    Ok(Document {
        id: row.get(0).map_err(storage_err)?,
        source: parse_source(&row.get::<String>(1).map_err(storage_err)?)?,
        url: row.get(2).map_err(storage_err)?,
        title: row.get(3).map_err(storage_err)?,
        content: row.get(4).map_err(storage_err)?,
        content_hash: row.get(5).map_err(storage_err)?,
        last_fetched,
    })
}
