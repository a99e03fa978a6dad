use std::fmt;

use async_trait::async_trait;

use super::types::{Category, Cursor, FeedItem, Page, Product};
use crate::core::query::ReviewQuery;

/// Errors that can occur while talking to the upstream API.
/// Every variant is recovered by the caller; none is fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Source misconfigured (missing base URL). Feature is treated as unavailable.
    Config(String),
    /// Network-level failure (timeout, DNS, connection refused).
    Network(String),
    /// API returned a non-success status.
    Api { status: u16, message: String },
    /// Response body did not match the expected shape.
    Parse(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Config(msg) => write!(f, "config error: {msg}"),
            FetchError::Network(msg) => write!(f, "network error: {msg}"),
            FetchError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            FetchError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Where feed, catalog and sitemap data comes from.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Returns the name of the source, for logs.
    fn name(&self) -> &str;

    /// Cursor-paginated review feed. `cursor: None` means the newest page.
    async fn reviews_after(
        &self,
        query: &ReviewQuery,
        cursor: Option<&Cursor>,
        limit: u32,
    ) -> Result<Page<FeedItem>, FetchError>;

    /// Offset-paginated review listing, used by list pages, sitemaps and RSS.
    async fn reviews_page(
        &self,
        query: &ReviewQuery,
        page: u32,
        page_size: u32,
    ) -> Result<Page<FeedItem>, FetchError>;

    async fn categories(&self) -> Result<Vec<Category>, FetchError>;

    async fn products_page(&self, page: u32, page_size: u32) -> Result<Page<Product>, FetchError>;
}
