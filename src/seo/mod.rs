//! # SEO Artifacts
//!
//! Sitemaps, the RSS feed and robots.txt, generated from the same
//! [`FeedSource`](crate::api::FeedSource) the live feed uses.
//!
//! Every builder degrades instead of failing: when the upstream is down or
//! unconfigured the document is still well-formed, just empty.

pub mod robots;
pub mod rss;
pub mod sitemap;
pub mod xml;

use std::time::Duration;

use crate::core::config::ResolvedConfig;

pub const CONTENT_TYPE_XML: &str = "application/xml; charset=utf-8";
pub const CONTENT_TYPE_RSS: &str = "application/rss+xml; charset=utf-8";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// A generated document plus the headers to serve it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeoDocument {
    pub content_type: &'static str,
    pub cache_control: String,
    pub body: String,
}

/// Browsers always revalidate; shared caches keep the document for
/// `revalidate` and may serve it stale for as long again while refetching.
pub fn cache_control(revalidate: Duration) -> String {
    let secs = revalidate.as_secs();
    format!("public, max-age=0, s-maxage={secs}, stale-while-revalidate={secs}")
}

/// Site identity used to build absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteInfo {
    /// Absolute origin without trailing slash, e.g. `https://reviews.example.com`.
    pub url: String,
    pub name: String,
    pub description: String,
    /// Path of the review listing, e.g. `/reviews`.
    pub base_path: String,
    pub revalidate: Duration,
}

impl SiteInfo {
    pub fn absolute(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.url, path)
        } else {
            format!("{}/{}", self.url, path)
        }
    }

    pub fn review_url(&self, id: &str) -> String {
        let base = self.base_path.trim_end_matches('/');
        self.absolute(&format!("{base}/{id}"))
    }

    pub fn product_url(&self, id: &str) -> String {
        self.absolute(&format!("/products/{id}"))
    }

    fn document(&self, content_type: &'static str, body: String) -> SeoDocument {
        SeoDocument {
            content_type,
            cache_control: cache_control(self.revalidate),
            body,
        }
    }
}

impl From<&ResolvedConfig> for SiteInfo {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            url: config.site_url.clone(),
            name: config.site_name.clone(),
            description: config.site_description.clone(),
            base_path: config.base_path.clone(),
            revalidate: config.revalidate,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_site() -> SiteInfo {
    SiteInfo {
        url: "https://reviews.test".to_string(),
        name: "Test Reviews".to_string(),
        description: "Reviews & more".to_string(),
        base_path: "/reviews".to_string(),
        revalidate: Duration::from_secs(3600),
    }
}
