//! # Actions
//!
//! Everything that can happen to a feed becomes an `Action`.
//! Viewer asks for more? That's `Action::LoadMore`.
//! Poll comes back? That's `Action::PollCompleted(page)`.
//!
//! The `update()` function applies an action to the state and returns the
//! [`Effect`] the session has to carry out. No I/O here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::{debug, info, warn};

use crate::api::{Cursor, FeedItem, FetchError, Page};
use crate::core::state::{FeedState, Prefetched};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// First page, rendered before the session starts.
    Init(Page<FeedItem>),
    LoadMore,
    PageLoaded { cursor: Cursor, page: Page<FeedItem> },
    PageFailed { cursor: Cursor, error: FetchError },
    PrefetchCompleted { cursor: Cursor, page: Page<FeedItem> },
    PrefetchFailed { cursor: Cursor, error: FetchError },
    PollCompleted(Page<FeedItem>),
    PollFailed(FetchError),
    ApplyNewItems,
}

/// Side effect requested by `update()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Fetch the page at this cursor and report back with `PageLoaded`/`PageFailed`.
    FetchPage(Cursor),
    /// `next_cursor` moved. Any scheduled prefetch is stale; schedule one for
    /// the new cursor if there is one.
    CursorChanged(Option<Cursor>),
}

pub fn update(state: &mut FeedState, action: Action) -> Effect {
    match action {
        Action::Init(page) => {
            state.append_unseen(page.items);
            state.next_cursor = page.next_cursor;
            state.prefetched = None;
            info!(
                "Feed initialized: {} visible, next={:?}",
                state.visible.len(),
                state.next_cursor.as_ref().map(Cursor::as_str)
            );
            Effect::CursorChanged(state.next_cursor.clone())
        }

        Action::LoadMore => {
            if state.is_loading {
                debug!("LoadMore ignored: already loading");
                return Effect::None;
            }
            let Some(cursor) = state.next_cursor.clone() else {
                debug!("LoadMore ignored: end of feed");
                return Effect::None;
            };

            match state.prefetched.take() {
                Some(prefetched) if prefetched.cursor == cursor => {
                    debug!("LoadMore served from prefetch for {}", cursor);
                    merge_page(state, prefetched.page)
                }
                _ => {
                    state.is_loading = true;
                    Effect::FetchPage(cursor)
                }
            }
        }

        Action::PageLoaded { cursor, page } => {
            state.is_loading = false;
            if state.next_cursor.as_ref() != Some(&cursor) {
                debug!("Discarding page for stale cursor {}", cursor);
                return Effect::None;
            }
            merge_page(state, page)
        }

        Action::PageFailed { cursor, error } => {
            warn!("Load more failed for cursor {}: {}", cursor, error);
            state.is_loading = false;
            state.last_error = Some(error.to_string());
            Effect::None
        }

        Action::PrefetchCompleted { cursor, page } => {
            if state.next_cursor.as_ref() == Some(&cursor) {
                debug!("Prefetch stored for {} ({} items)", cursor, page.items.len());
                state.prefetched = Some(Prefetched { cursor, page });
            } else {
                debug!("Discarding stale prefetch for {}", cursor);
            }
            Effect::None
        }

        Action::PrefetchFailed { cursor, error } => {
            warn!("Prefetch failed for cursor {}: {}", cursor, error);
            Effect::None
        }

        Action::PollCompleted(page) => {
            let added = state.queue_pending(page.items);
            if added > 0 {
                info!("Poll found {} new items ({} pending)", added, state.pending.len());
            }
            Effect::None
        }

        Action::PollFailed(error) => {
            warn!("Poll failed: {}", error);
            Effect::None
        }

        Action::ApplyNewItems => {
            let added = state.prepend_pending();
            state.last_applied = added;
            if added > 0 {
                info!("Applied {} new items", added);
            }
            Effect::None
        }
    }
}

/// Appends a loaded page and advances the cursor.
fn merge_page(state: &mut FeedState, page: Page<FeedItem>) -> Effect {
    let appended = state.append_unseen(page.items);
    state.last_appended = appended;
    state.next_cursor = page.next_cursor;
    state.prefetched = None;
    state.last_error = None;
    debug!(
        "Appended {} items, next={:?}",
        appended,
        state.next_cursor.as_ref().map(Cursor::as_str)
    );
    Effect::CursorChanged(state.next_cursor.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{page, review};

    fn ids(state: &FeedState) -> Vec<&str> {
        state.visible.iter().map(|i| i.id.as_str()).collect()
    }

    fn initialized() -> FeedState {
        let mut state = FeedState::new();
        update(
            &mut state,
            Action::Init(page(vec![review("a", 10), review("b", 9)], Some("c1"))),
        );
        state
    }

    #[test]
    fn test_init_announces_cursor() {
        let mut state = FeedState::new();
        let effect = update(&mut state, Action::Init(page(vec![review("a", 1)], Some("c1"))));
        assert_eq!(effect, Effect::CursorChanged(Some(Cursor::new("c1"))));
        assert_eq!(ids(&state), vec!["a"]);
    }

    #[test]
    fn test_load_more_requests_fetch_once() {
        let mut state = initialized();
        assert_eq!(update(&mut state, Action::LoadMore), Effect::FetchPage(Cursor::new("c1")));
        assert!(state.is_loading);
        assert_eq!(update(&mut state, Action::LoadMore), Effect::None);
    }

    #[test]
    fn test_load_more_at_end_is_noop() {
        let mut state = FeedState::new();
        update(&mut state, Action::Init(page(vec![review("a", 1)], None)));
        assert_eq!(update(&mut state, Action::LoadMore), Effect::None);
        assert!(!state.is_loading);
    }

    #[test]
    fn test_page_loaded_appends_after_visible() {
        let mut state = initialized();
        update(&mut state, Action::LoadMore);
        let effect = update(
            &mut state,
            Action::PageLoaded {
                cursor: Cursor::new("c1"),
                // "b" is a duplicate from an overlapping page boundary
                page: page(vec![review("b", 9), review("c", 8), review("d", 7)], Some("c2")),
            },
        );
        assert_eq!(effect, Effect::CursorChanged(Some(Cursor::new("c2"))));
        assert_eq!(ids(&state), vec!["a", "b", "c", "d"]);
        assert!(!state.is_loading);
    }

    #[test]
    fn test_page_failed_leaves_state_unchanged() {
        let mut state = initialized();
        update(&mut state, Action::LoadMore);
        let effect = update(
            &mut state,
            Action::PageFailed {
                cursor: Cursor::new("c1"),
                error: FetchError::Network("timeout".to_string()),
            },
        );
        assert_eq!(effect, Effect::None);
        assert!(!state.is_loading);
        assert_eq!(ids(&state), vec!["a", "b"]);
        assert_eq!(state.next_cursor, Some(Cursor::new("c1")));
        assert!(state.last_error.is_some());
        // Viewer may try again
        assert_eq!(update(&mut state, Action::LoadMore), Effect::FetchPage(Cursor::new("c1")));
    }

    #[test]
    fn test_load_more_consumes_matching_prefetch() {
        let mut state = initialized();
        update(
            &mut state,
            Action::PrefetchCompleted {
                cursor: Cursor::new("c1"),
                page: page(vec![review("c", 8)], None),
            },
        );
        let effect = update(&mut state, Action::LoadMore);
        assert_eq!(effect, Effect::CursorChanged(None));
        assert_eq!(ids(&state), vec!["a", "b", "c"]);
        assert!(state.prefetched.is_none());
        assert!(!state.is_loading);
    }

    #[test]
    fn test_stale_prefetch_is_ignored() {
        let mut state = initialized();
        update(
            &mut state,
            Action::PrefetchCompleted {
                cursor: Cursor::new("old"),
                page: page(vec![review("z", 1)], None),
            },
        );
        assert!(state.prefetched.is_none());
        assert_eq!(update(&mut state, Action::LoadMore), Effect::FetchPage(Cursor::new("c1")));
    }

    #[test]
    fn test_poll_then_apply_is_idempotent() {
        let mut state = initialized();
        update(
            &mut state,
            Action::PollCompleted(page(vec![review("n2", 12), review("n1", 11), review("a", 10)], None)),
        );
        assert_eq!(state.pending.len(), 2);

        update(&mut state, Action::ApplyNewItems);
        let after_first: Vec<String> = state.visible.iter().map(|i| i.id.clone()).collect();
        assert_eq!(after_first, vec!["n2", "n1", "a", "b"]);

        update(&mut state, Action::ApplyNewItems);
        let after_second: Vec<String> = state.visible.iter().map(|i| i.id.clone()).collect();
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn test_loaded_page_clears_matching_pending_item() {
        let mut state = initialized();
        update(&mut state, Action::PollCompleted(page(vec![review("c", 8)], None)));
        assert_eq!(state.pending.len(), 1);

        update(&mut state, Action::LoadMore);
        update(
            &mut state,
            Action::PageLoaded {
                cursor: Cursor::new("c1"),
                page: page(vec![review("c", 8)], None),
            },
        );
        assert_eq!(ids(&state), vec!["a", "b", "c"]);
        assert!(state.pending.is_empty());

        update(&mut state, Action::ApplyNewItems);
        assert_eq!(state.last_applied, 0);
        assert_eq!(ids(&state), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_init_clears_matching_pending_item() {
        let mut state = FeedState::new();
        update(&mut state, Action::PollCompleted(page(vec![review("a", 10)], None)));
        assert_eq!(state.pending.len(), 1);
        update(&mut state, Action::Init(page(vec![review("a", 10)], None)));
        assert!(state.pending.is_empty());
    }

    #[test]
    fn test_apply_records_applied_count() {
        let mut state = initialized();
        update(&mut state, Action::PollCompleted(page(vec![review("n2", 12), review("n1", 11)], None)));
        update(&mut state, Action::ApplyNewItems);
        assert_eq!(state.last_applied, 2);
        update(&mut state, Action::ApplyNewItems);
        assert_eq!(state.last_applied, 0);
    }

    #[test]
    fn test_repeated_poll_does_not_duplicate_pending() {
        let mut state = initialized();
        let polled = page(vec![review("n1", 11), review("a", 10)], None);
        update(&mut state, Action::PollCompleted(polled.clone()));
        update(&mut state, Action::PollCompleted(polled));
        assert_eq!(state.pending.len(), 1);
    }

    #[test]
    fn test_poll_failure_changes_nothing() {
        let mut state = initialized();
        update(&mut state, Action::PollFailed(FetchError::Api { status: 502, message: "bad gateway".into() }));
        assert!(state.pending.is_empty());
        assert_eq!(ids(&state), vec!["a", "b"]);
    }
}
