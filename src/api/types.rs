use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A single review as it appears in a feed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub comment_count: u32,
    #[serde(default)]
    pub view_count: u32,
    pub created_at: DateTime<Utc>,
}

impl FeedItem {
    /// Feed ordering: newest first, ties broken by id.
    pub fn newest_first(a: &FeedItem, b: &FeedItem) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Opaque continuation token issued by the upstream API.
///
/// Only [`Cursor::from_position`] and [`Cursor::position`] know the
/// `<millis>_<id>` layout, and only the fixture source relies on it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Cursor(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encodes "resume after this item" as a token.
    pub fn from_position(created_at: DateTime<Utc>, id: &str) -> Self {
        Cursor(format!("{}_{}", created_at.timestamp_millis(), id))
    }

    /// Decodes a token built by [`Cursor::from_position`].
    /// Returns None for tokens from anywhere else.
    pub fn position(&self) -> Option<(DateTime<Utc>, &str)> {
        let (millis, id) = self.0.split_once('_')?;
        let millis: i64 = millis.parse().ok()?;
        let at = Utc.timestamp_millis_opt(millis).single()?;
        Some((at, id))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Offset pagination descriptor. `page` may exceed `total_pages`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

impl PageInfo {
    pub fn new(page: u32, page_size: u32, total_items: u64) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(u64::from(page_size));
        Self {
            page: page.max(1),
            page_size,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
            total_items,
        }
    }
}

/// Upstream list response: `{ items, pageInfo?, nextCursor? }`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
    #[serde(default)]
    pub next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            page_info: None,
            next_cursor: None,
        }
    }

    /// Total page count, falling back to "this page only" when the
    /// upstream omitted `pageInfo`.
    pub fn total_pages(&self) -> u32 {
        match self.page_info {
            Some(info) => info.total_pages,
            None if self.items.is_empty() => 0,
            None => 1,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub review_count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
