//! HTTP source backed by the external review API.
//!
//! All list endpoints answer with `{ items, pageInfo?, nextCursor? }`.
//! Without a base URL every call fails with [`FetchError::Config`], which
//! callers treat as "feature unavailable" and render empty.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;

use super::source::{FeedSource, FetchError};
use super::types::{Category, Cursor, FeedItem, Page, Product};
use crate::core::query::ReviewQuery;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpFeedSource {
    base_url: Option<String>,
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        if base_url.is_none() {
            warn!("No API base URL configured; feeds will be empty");
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self { base_url, client }
    }

    fn endpoint(&self, path: &str) -> Result<String, FetchError> {
        self.base_url
            .as_ref()
            .map(|base| format!("{base}{path}"))
            .ok_or_else(|| FetchError::Config("API base URL is not set".to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = self.endpoint(path)?;
        debug!("GET {} {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("API error on {}: {} - {}", path, status, message);
            return Err(FetchError::Api { status, message });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))
    }
}

fn filter_params(query: &ReviewQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("sort", query.sort.as_str().to_string())];
    if let Some(ref category) = query.category {
        params.push(("category", category.clone()));
    }
    params
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn reviews_after(
        &self,
        query: &ReviewQuery,
        cursor: Option<&Cursor>,
        limit: u32,
    ) -> Result<Page<FeedItem>, FetchError> {
        let mut params = filter_params(query);
        params.push(("limit", limit.to_string()));
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }
        let page: Page<FeedItem> = self.get_json("/reviews", &params).await?;
        info!(
            "Fetched {} reviews (cursor={:?}, next={:?})",
            page.items.len(),
            cursor.map(Cursor::as_str),
            page.next_cursor.as_ref().map(Cursor::as_str)
        );
        Ok(page)
    }

    async fn reviews_page(
        &self,
        query: &ReviewQuery,
        page: u32,
        page_size: u32,
    ) -> Result<Page<FeedItem>, FetchError> {
        let mut params = filter_params(query);
        params.push(("page", page.to_string()));
        params.push(("pageSize", page_size.to_string()));
        let result: Page<FeedItem> = self.get_json("/reviews", &params).await?;
        info!("Fetched review page {} ({} items)", page, result.items.len());
        Ok(result)
    }

    async fn categories(&self) -> Result<Vec<Category>, FetchError> {
        let page: Page<Category> = self.get_json("/categories", &[]).await?;
        Ok(page.items)
    }

    async fn products_page(&self, page: u32, page_size: u32) -> Result<Page<Product>, FetchError> {
        let params = [("page", page.to_string()), ("pageSize", page_size.to_string())];
        self.get_json("/products", &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_base_url_is_unconfigured() {
        let source = HttpFeedSource::new(Some("   ".to_string()));
        assert!(matches!(source.endpoint("/reviews"), Err(FetchError::Config(_))));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let source = HttpFeedSource::new(Some("http://api.test/v1/".to_string()));
        assert_eq!(source.endpoint("/reviews").unwrap(), "http://api.test/v1/reviews");
    }

    #[test]
    fn test_filter_params_skip_missing_category() {
        let params = filter_params(&ReviewQuery::default());
        assert_eq!(params, vec![("sort", "latest".to_string())]);
    }

    #[tokio::test]
    async fn test_unconfigured_source_fails_softly() {
        let source = HttpFeedSource::new(None);
        let result = source.reviews_after(&ReviewQuery::default(), None, 20).await;
        assert!(matches!(result, Err(FetchError::Config(_))));
    }
}
