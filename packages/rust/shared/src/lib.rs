//! Shared types, error model, and configuration for magedocs.
//!
//! This crate is the foundation depended on by all other magedocs crates.
//! It provides:
//! - [`DocsError`]: the unified error type
//! - Domain types ([`SourceId`], [`RawDocument`], [`Document`], [`IndexingResult`])
//! - Configuration ([`AppConfig`], config loading and environment overrides)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlSettings, GithubConfig, HttpConfig, HyvaConfig, MageosConfig, SatoshiConfig,
    ServerConfig, StorageConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{DocsError, Result};
pub use types::{
    Document, IndexingResult, RawDocument, SearchHit, SourceFilter, SourceId, UpsertOutcome,
    UpsertStatus,
};
