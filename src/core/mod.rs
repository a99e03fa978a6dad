//! # Core Feed Logic
//!
//! Paging, query normalization and the live feed state machine.
//! It knows nothing about how data is fetched or rendered.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • FeedState (data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • pager / query        │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │ FeedSession│      │    SEO     │      │    CLI     │
//!     │  (tokio)   │      │ (sitemaps, │      │  (clap)    │
//!     │            │      │  RSS)      │      │            │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `FeedState` struct — visible items, seen-set, pending items
//! - [`action`]: The `Action` enum and `update()` — everything that can happen to a feed
//! - [`session`]: `FeedSession` — drives `update()` with fetches, prefetch and polling
//! - [`pager`]: Page-number compression for pager controls
//! - [`query`]: Lenient parsing of listing parameters
//! - [`config`]: Config file and override resolution

pub mod action;
pub mod config;
pub mod pager;
pub mod query;
pub mod session;
pub mod state;
