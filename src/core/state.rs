//! # Feed State
//!
//! Everything one feed session knows. No I/O here.
//!
//! ```text
//! FeedState
//! ├── visible: Vec<FeedItem>          // what the viewer sees, in order
//! ├── seen: HashSet<String>           // ids ever shown this session
//! ├── pending: Vec<FeedItem>          // found by polling, not yet shown
//! ├── next_cursor: Option<Cursor>     // None = end of feed
//! ├── is_loading: bool                // a load-more fetch is in flight
//! └── prefetched: Option<Prefetched>  // completed prefetch, keyed by cursor
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::collections::HashSet;

use crate::api::{Cursor, FeedItem, Page};

/// A speculatively fetched page and the cursor it was fetched for.
#[derive(Debug, Clone, PartialEq)]
pub struct Prefetched {
    pub cursor: Cursor,
    pub page: Page<FeedItem>,
}

#[derive(Debug, Default)]
pub struct FeedState {
    pub visible: Vec<FeedItem>,
    seen: HashSet<String>,
    pub pending: Vec<FeedItem>,
    pub next_cursor: Option<Cursor>,
    pub is_loading: bool,
    pub prefetched: Option<Prefetched>,
    /// Items added by the most recent successful load-more.
    pub last_appended: usize,
    /// Items moved out of pending by the most recent apply.
    pub last_applied: usize,
    /// Last failure, for status display. Cleared by the next success.
    pub last_error: Option<String>,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    /// Polling only makes sense once something is on screen.
    pub fn should_poll(&self) -> bool {
        !self.visible.is_empty()
    }

    /// Appends items not seen before, keeping their order. Returns how many were added.
    /// An appended id leaves the pending queue, since it is no longer new.
    pub(crate) fn append_unseen(&mut self, items: Vec<FeedItem>) -> usize {
        let before = self.visible.len();
        for item in items {
            if self.seen.insert(item.id.clone()) {
                self.pending.retain(|p| p.id != item.id);
                self.visible.push(item);
            }
        }
        self.visible.len() - before
    }

    /// Moves pending items in front of everything visible.
    pub(crate) fn prepend_pending(&mut self) -> usize {
        let mut fresh: Vec<FeedItem> = std::mem::take(&mut self.pending)
            .into_iter()
            .filter(|item| self.seen.insert(item.id.clone()))
            .collect();
        let added = fresh.len();
        fresh.append(&mut self.visible);
        self.visible = fresh;
        added
    }

    /// Queues polled items that are neither seen nor already pending.
    /// A pending id that shows up again takes the newer payload.
    pub(crate) fn queue_pending(&mut self, items: Vec<FeedItem>) -> usize {
        let mut added = 0;
        for item in items {
            if self.seen.contains(&item.id) {
                continue;
            }
            match self.pending.iter_mut().find(|p| p.id == item.id) {
                Some(existing) => *existing = item,
                None => {
                    self.pending.push(item);
                    added += 1;
                }
            }
        }
        self.pending.sort_by(FeedItem::newest_first);
        added
    }
}
