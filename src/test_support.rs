//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::api::{
    Category, Cursor, FeedItem, FeedSource, FetchError, MockFeedSource, Page, Product,
};
use crate::core::query::ReviewQuery;

/// A review created `secs` seconds after a fixed epoch.
pub fn review(id: &str, secs: i64) -> FeedItem {
    FeedItem {
        id: id.to_string(),
        title: format!("Review {id}"),
        summary: None,
        image_url: None,
        author: Some("tester".to_string()),
        category: Some("tech".to_string()),
        rating: Some(4.0),
        like_count: 0,
        comment_count: 0,
        view_count: 0,
        created_at: Utc
            .timestamp_opt(1_700_000_000 + secs, 0)
            .single()
            .expect("valid timestamp"),
    }
}

pub fn page(items: Vec<FeedItem>, next: Option<&str>) -> Page<FeedItem> {
    Page {
        items,
        page_info: None,
        next_cursor: next.map(Cursor::new),
    }
}

/// Wraps [`MockFeedSource`], counting calls and optionally failing or
/// adding latency.
pub struct CountingSource {
    pub inner: MockFeedSource,
    cursor_fetches: AtomicUsize,
    newest_fetches: AtomicUsize,
    fetched_cursors: Mutex<Vec<Cursor>>,
    failing: AtomicBool,
    latency: Duration,
}

impl CountingSource {
    pub fn new(inner: MockFeedSource) -> Self {
        Self::with_latency(inner, Duration::ZERO)
    }

    pub fn with_latency(inner: MockFeedSource, latency: Duration) -> Self {
        Self {
            inner,
            cursor_fetches: AtomicUsize::new(0),
            newest_fetches: AtomicUsize::new(0),
            fetched_cursors: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            latency,
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Fetches that carried a cursor (load-more and prefetch).
    pub fn cursor_fetches(&self) -> usize {
        self.cursor_fetches.load(Ordering::SeqCst)
    }

    /// Fetches of the newest page (polls).
    pub fn newest_fetches(&self) -> usize {
        self.newest_fetches.load(Ordering::SeqCst)
    }

    pub fn fetched_cursors(&self) -> Vec<Cursor> {
        self.fetched_cursors.lock().unwrap().clone()
    }

    async fn gate(&self) -> Result<(), FetchError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Network("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl FeedSource for CountingSource {
    fn name(&self) -> &str {
        "counting"
    }

    async fn reviews_after(
        &self,
        query: &ReviewQuery,
        cursor: Option<&Cursor>,
        limit: u32,
    ) -> Result<Page<FeedItem>, FetchError> {
        match cursor {
            Some(c) => {
                self.cursor_fetches.fetch_add(1, Ordering::SeqCst);
                self.fetched_cursors.lock().unwrap().push(c.clone());
            }
            None => {
                self.newest_fetches.fetch_add(1, Ordering::SeqCst);
            }
        }
        self.gate().await?;
        self.inner.reviews_after(query, cursor, limit).await
    }

    async fn reviews_page(
        &self,
        query: &ReviewQuery,
        page: u32,
        page_size: u32,
    ) -> Result<Page<FeedItem>, FetchError> {
        self.gate().await?;
        self.inner.reviews_page(query, page, page_size).await
    }

    async fn categories(&self) -> Result<Vec<Category>, FetchError> {
        self.gate().await?;
        self.inner.categories().await
    }

    async fn products_page(&self, page: u32, page_size: u32) -> Result<Page<Product>, FetchError> {
        self.gate().await?;
        self.inner.products_page(page, page_size).await
    }
}
