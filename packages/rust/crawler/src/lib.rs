//! HTTP fetching and bounded site crawling.
//!
//! This crate provides:
//! - [`http`]: retrying GET client with linear backoff
//! - [`engine`]: lazy, same-host, page-budgeted crawler

pub mod engine;
pub mod http;

pub use engine::{
    CrawlOptions, CrawlPage, DEFAULT_MIN_CONTENT_LENGTH, PageContext, PageTransform, SiteCrawler,
    allowed_host_for, default_transform, page_title,
};
pub use http::{FetchOptions, HttpClient};
