//! Search and refresh tools over the documentation index, and the MCP
//! server that exposes them.
//!
//! - [`DocsTools`]: transport-independent operations (also used by the CLI)
//! - [`DocsServer`]: rmcp `ServerHandler` served over stdio
//! - [`TOPICS`]: curated per-source topic shortcuts

pub mod server;
pub mod tools;
pub mod topics;

pub use server::DocsServer;
pub use tools::{
    DocsTools, RefreshReport, SearchResponse, StatusReport, TopicResponse, UPDATE_SHORTCUTS,
    UpdateShortcut, render_document,
};
pub use topics::{TOPICS, Topic, find_topic};
