//! Fixture-backed source used when the real API is switched off
//! (`use_mock_data = true` or `--mock`).
//!
//! Items live behind a mutex so a running feed can be fed new reviews with
//! [`MockFeedSource::publish`].

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use log::debug;

use super::source::{FeedSource, FetchError};
use super::types::{Category, Cursor, FeedItem, Page, PageInfo, Product};
use crate::core::query::{ReviewQuery, SortOrder};

const FIXTURE_CATEGORIES: &[(&str, &str)] = &[
    ("tech", "Tech"),
    ("beauty", "Beauty"),
    ("food", "Food"),
    ("travel", "Travel"),
    ("home", "Home & Living"),
];

const FIXTURE_TITLES: &[&str] = &[
    "Worth every penny",
    "Not what I expected",
    "Solid everyday pick",
    "Great value, minor flaws",
    "Would buy again",
    "Overhyped but fine",
    "Surprisingly good",
];

const FIXTURE_AUTHORS: &[&str] = &["mina", "jules", "okafor", "sato", "rivera", "lindqvist"];

pub struct MockFeedSource {
    items: Mutex<Vec<FeedItem>>,
    products: Vec<Product>,
}

impl MockFeedSource {
    /// `count` generated reviews, one hour apart, newest first.
    pub fn with_fixtures(count: usize) -> Self {
        let anchor = fixture_anchor();
        let items = (0..count).map(|i| fixture_item(i, anchor)).collect();
        let products = (0..count.div_ceil(3))
            .map(|i| Product {
                id: format!("prod-{:03}", i + 1),
                name: format!("Product {}", i + 1),
                category: Some(FIXTURE_CATEGORIES[i % FIXTURE_CATEGORIES.len()].0.to_string()),
                image_url: None,
                updated_at: Some(anchor - Duration::days(i as i64)),
            })
            .collect();
        Self::from_parts(items, products)
    }

    fn from_parts(mut items: Vec<FeedItem>, products: Vec<Product>) -> Self {
        items.sort_by(FeedItem::newest_first);
        Self {
            items: Mutex::new(items),
            products,
        }
    }

    /// Adds (or replaces, by id) a review, as if it was just published upstream.
    pub fn publish(&self, item: FeedItem) {
        let mut items = self.lock_items();
        items.retain(|existing| existing.id != item.id);
        items.push(item);
        items.sort_by(FeedItem::newest_first);
    }

    fn lock_items(&self) -> MutexGuard<'_, Vec<FeedItem>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn sorted_matching(&self, query: &ReviewQuery) -> Vec<FeedItem> {
        let mut matching: Vec<FeedItem> = self
            .lock_items()
            .iter()
            .filter(|item| match query.category {
                Some(ref category) => item.category.as_ref() == Some(category),
                None => true,
            })
            .cloned()
            .collect();
        match query.sort {
            SortOrder::Latest => matching.sort_by(FeedItem::newest_first),
            SortOrder::Popular => matching.sort_by(|a, b| {
                b.like_count
                    .cmp(&a.like_count)
                    .then_with(|| FeedItem::newest_first(a, b))
            }),
            SortOrder::Rating => matching.sort_by(|a, b| {
                let ra = a.rating.unwrap_or(0.0);
                let rb = b.rating.unwrap_or(0.0);
                rb.total_cmp(&ra).then_with(|| FeedItem::newest_first(a, b))
            }),
        }
        matching
    }
}

impl Default for MockFeedSource {
    fn default() -> Self {
        Self::with_fixtures(120)
    }
}

fn fixture_anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn fixture_item(i: usize, anchor: DateTime<Utc>) -> FeedItem {
    let (slug, _) = FIXTURE_CATEGORIES[i % FIXTURE_CATEGORIES.len()];
    FeedItem {
        id: format!("rev-{:04}", i + 1),
        title: FIXTURE_TITLES[i % FIXTURE_TITLES.len()].to_string(),
        summary: Some(format!("Fixture review #{} in {}.", i + 1, slug)),
        image_url: Some(format!("https://picsum.photos/seed/rev{}/640/480", i + 1)),
        author: Some(FIXTURE_AUTHORS[i % FIXTURE_AUTHORS.len()].to_string()),
        category: Some(slug.to_string()),
        rating: Some(1.0 + (i % 9) as f32 * 0.5),
        like_count: ((i * 37) % 250) as u32,
        comment_count: ((i * 11) % 40) as u32,
        view_count: ((i * 97) % 5000) as u32,
        created_at: anchor - Duration::hours(i as i64),
    }
}

fn offset_page<T: Clone>(all: &[T], page: u32, page_size: u32) -> Page<T> {
    let info = PageInfo::new(page, page_size, all.len() as u64);
    let start = (info.page as usize - 1).saturating_mul(info.page_size as usize);
    let items = all
        .iter()
        .skip(start)
        .take(info.page_size as usize)
        .cloned()
        .collect();
    Page {
        items,
        page_info: Some(info),
        next_cursor: None,
    }
}

#[async_trait]
impl FeedSource for MockFeedSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn reviews_after(
        &self,
        query: &ReviewQuery,
        cursor: Option<&Cursor>,
        limit: u32,
    ) -> Result<Page<FeedItem>, FetchError> {
        let all = self.sorted_matching(query);
        let start = match cursor {
            None => 0,
            Some(cursor) => {
                let (_, id) = cursor
                    .position()
                    .ok_or_else(|| FetchError::Parse(format!("unknown cursor '{cursor}'")))?;
                all.iter()
                    .position(|item| item.id == id)
                    .map(|idx| idx + 1)
                    .unwrap_or(all.len())
            }
        };
        let limit = limit.max(1) as usize;
        let items: Vec<FeedItem> = all.iter().skip(start).take(limit).cloned().collect();
        let next_cursor = if start + items.len() < all.len() {
            items
                .last()
                .map(|last| Cursor::from_position(last.created_at, &last.id))
        } else {
            None
        };
        debug!("mock reviews_after: start={} returned={}", start, items.len());
        Ok(Page {
            items,
            page_info: None,
            next_cursor,
        })
    }

    async fn reviews_page(
        &self,
        query: &ReviewQuery,
        page: u32,
        page_size: u32,
    ) -> Result<Page<FeedItem>, FetchError> {
        Ok(offset_page(&self.sorted_matching(query), page, page_size))
    }

    async fn categories(&self) -> Result<Vec<Category>, FetchError> {
        let items = self.lock_items();
        Ok(FIXTURE_CATEGORIES
            .iter()
            .map(|(slug, name)| Category {
                slug: slug.to_string(),
                name: name.to_string(),
                review_count: items
                    .iter()
                    .filter(|item| item.category.as_deref() == Some(*slug))
                    .count() as u64,
            })
            .collect())
    }

    async fn products_page(&self, page: u32, page_size: u32) -> Result<Page<Product>, FetchError> {
        Ok(offset_page(&self.products, page, page_size))
    }
}
