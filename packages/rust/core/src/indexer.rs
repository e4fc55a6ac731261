//! Indexing orchestrator: runs source adapters in order and persists their documents.

use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};
use uuid::Uuid;

use magedocs_shared::{IndexingResult, SourceId};
use magedocs_storage::DocumentStore;

use crate::adapters::{AdapterRegistry, SourceAdapter};

/// Progress callback for reporting indexing status.
pub trait IndexingObserver: Send + Sync {
    /// Called before an adapter starts producing documents.
    fn on_start(&self, source: SourceId, description: &str);
    /// Called once the adapter's stream is exhausted.
    fn on_result(&self, result: &IndexingResult);
}

/// No-op observer for headless/test usage.
pub struct SilentObserver;

impl IndexingObserver for SilentObserver {
    fn on_start(&self, _source: SourceId, _description: &str) {}
    fn on_result(&self, _result: &IndexingResult) {}
}

/// Runs adapters sequentially against a shared store.
///
/// Runs never overlap: a second caller waits until the current run finishes.
pub struct Indexer {
    store: Arc<DocumentStore>,
    registry: AdapterRegistry,
    run_lock: Mutex<()>,
}

impl Indexer {
    pub fn new(store: Arc<DocumentStore>, registry: AdapterRegistry) -> Self {
        Self {
            store,
            registry,
            run_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Whether a run is currently in progress.
    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// Index the given sources (all when `None`) and return one result per adapter run.
    #[instrument(skip_all, fields(run_id = %Uuid::now_v7()))]
    pub async fn run(
        &self,
        sources: Option<&[SourceId]>,
        observer: &dyn IndexingObserver,
    ) -> Vec<IndexingResult> {
        let _guard = self.run_lock.lock().await;

        let adapters = self.registry.select(sources);
        info!(adapters = adapters.len(), "starting indexing run");

        let mut results = Vec::with_capacity(adapters.len());
        for adapter in adapters {
            observer.on_start(adapter.id(), adapter.description());
            let result = self.run_adapter(adapter).await;
            observer.on_result(&result);
            results.push(result);
        }

        info!(
            processed = results.iter().map(|r| r.processed).sum::<usize>(),
            failed = results.iter().map(|r| r.failed).sum::<usize>(),
            "indexing run finished"
        );
        results
    }

    #[instrument(skip_all, fields(source = %adapter.id()))]
    async fn run_adapter(&self, adapter: &dyn SourceAdapter) -> IndexingResult {
        let source = adapter.id();
        let start = Instant::now();
        let mut result = IndexingResult::new(source);

        info!(%source, description = adapter.description(), "starting adapter");

        let mut documents = adapter.fetch_documents();
        while let Some(doc) = documents.next().await {
            result.processed += 1;
            match self.store.upsert(&doc).await {
                Ok(outcome) => result.record(outcome.status),
                Err(e) => {
                    result.failed += 1;
                    error!(%source, url = %doc.url, error = %e, "failed to index document");
                }
            }
        }

        result.duration = start.elapsed();
        info!(
            %source,
            processed = result.processed,
            inserted = result.inserted,
            updated = result.updated,
            skipped = result.skipped,
            failed = result.failed,
            duration_ms = result.duration.as_millis() as u64,
            "adapter completed"
        );
        result
    }
}
