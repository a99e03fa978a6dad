//! # Listing Queries
//!
//! Turns raw request parameters (`?page=&sort=&category=`) into a
//! [`ReviewQuery`]. Bad input is never rejected: an unparseable page becomes
//! page 1, an unknown sort becomes the default, a malformed category is dropped.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

const MAX_CATEGORY_LEN: usize = 64;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Latest,
    Popular,
    Rating,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Latest => "latest",
            SortOrder::Popular => "popular",
            SortOrder::Rating => "rating",
        }
    }

    /// Lenient parse. Unknown values fall back to [`SortOrder::Latest`].
    pub fn parse_or_default(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "latest" | "newest" | "recent" => SortOrder::Latest,
            "popular" | "likes" => SortOrder::Popular,
            "rating" | "top" => SortOrder::Rating,
            other => {
                debug!("Unknown sort '{}', using default", other);
                SortOrder::default()
            }
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized review listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewQuery {
    pub sort: SortOrder,
    pub category: Option<String>,
    /// 1-based. May point past the last page.
    pub page: u32,
}

impl Default for ReviewQuery {
    fn default() -> Self {
        Self {
            sort: SortOrder::default(),
            category: None,
            page: 1,
        }
    }
}

impl ReviewQuery {
    pub fn from_params(page: Option<&str>, sort: Option<&str>, category: Option<&str>) -> Self {
        Self {
            sort: sort.map(SortOrder::parse_or_default).unwrap_or_default(),
            category: category.and_then(normalize_category),
            page: page.map(normalize_page).unwrap_or(1),
        }
    }

    /// Link to `page` of this listing under `base_path`.
    /// Defaults (page 1, latest, all categories) are left out of the URL.
    pub fn href(&self, base_path: &str, page: u32) -> String {
        let base = base_path.trim_end_matches('/');
        let base = if base.is_empty() { "/" } else { base };

        let mut params = Vec::new();
        if page > 1 {
            params.push(format!("page={page}"));
        }
        if self.sort != SortOrder::default() {
            params.push(format!("sort={}", self.sort));
        }
        if let Some(ref category) = self.category {
            params.push(format!("category={category}"));
        }

        if params.is_empty() {
            base.to_string()
        } else {
            format!("{}?{}", base, params.join("&"))
        }
    }
}

fn normalize_page(raw: &str) -> u32 {
    match raw.trim().parse::<u32>() {
        Ok(0) | Err(_) => {
            debug!("Invalid page '{}', using 1", raw);
            1
        }
        Ok(n) => n,
    }
}

/// Category slugs are lowercase ASCII letters, digits and dashes.
/// `all` and the empty string mean "no filter".
fn normalize_category(raw: &str) -> Option<String> {
    let slug = raw.trim().to_ascii_lowercase();
    if slug.is_empty() || slug == "all" {
        return None;
    }
    let valid = slug.len() <= MAX_CATEGORY_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Some(slug)
    } else {
        debug!("Dropping malformed category '{}'", raw);
        None
    }
}
