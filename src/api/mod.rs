//! # Upstream Data
//!
//! Everything that crosses the boundary to the review backend: the wire
//! types, the [`FeedSource`] seam, the HTTP implementation and the fixture
//! fallback.

pub mod client;
pub mod mock;
pub mod source;
pub mod types;

pub use client::HttpFeedSource;
pub use mock::MockFeedSource;
pub use source::{FeedSource, FetchError};
pub use types::{Category, Cursor, FeedItem, Page, PageInfo, Product};
