//! Source adapters and the indexing orchestrator for magedocs.
//!
//! Adapters turn each documentation source into a lazy stream of documents;
//! the [`Indexer`] drains those streams into the document store.

pub mod adapters;
pub mod indexer;

pub use adapters::{AdapterRegistry, ChainAdapter, DocumentStream, SourceAdapter};
pub use indexer::{Indexer, IndexingObserver, SilentObserver};
