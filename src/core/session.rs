//! # Feed Session
//!
//! Runs one live feed: the viewer-driven "load more", a debounced prefetch of
//! the next page, and a periodic poll for newly published reviews.
//!
//! ```text
//!  load_more() ──► update(LoadMore) ──► FetchPage(c) ──► source ──► PageLoaded
//!                                   └─► served from prefetch
//!  CursorChanged(c) ──► [debounce] ──► source ──► PrefetchCompleted
//!  [poll interval]  ──► source (newest) ──► PollCompleted ──► pending
//!  apply_new_items() ──► update(ApplyNewItems)
//! ```
//!
//! The state mutex is never held across an `.await`. Closing (or dropping)
//! the session aborts both background tasks; results that still arrive are
//! discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};

use crate::api::{Cursor, FeedItem, FeedSource, FetchError, Page};
use crate::core::action::{Action, Effect, update};
use crate::core::query::ReviewQuery;
use crate::core::state::FeedState;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_PREFETCH_DEBOUNCE: Duration = Duration::from_millis(600);
pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub page_size: u32,
    pub poll_interval: Duration,
    pub prefetch_debounce: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            prefetch_debounce: DEFAULT_PREFETCH_DEBOUNCE,
        }
    }
}

/// What a `load_more()` call did.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// End of feed, or another load is already in flight.
    Skipped,
    Loaded { appended: usize, from_prefetch: bool },
    /// Attempt forfeited; state is unchanged and the caller may retry.
    Failed(FetchError),
}

/// Read-only view of the session for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub visible: Vec<FeedItem>,
    pub pending_count: usize,
    pub has_more: bool,
    pub is_loading: bool,
    /// The next page is already prefetched; load-more will be instant.
    pub prefetch_ready: bool,
    pub last_error: Option<String>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Shared {
    id: String,
    source: Arc<dyn FeedSource>,
    query: ReviewQuery,
    options: SessionOptions,
    state: Mutex<FeedState>,
    prefetch_task: Mutex<Option<AbortHandle>>,
    closed: AtomicBool,
}

impl Shared {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Runs the reducer and takes care of prefetch scheduling.
    /// Anything else in the effect is left to the caller.
    fn apply(self: &Arc<Self>, action: Action) -> Effect {
        self.apply_then(action, |_| ()).0
    }

    /// Like `apply`, and also reads `read` from the state under the same lock.
    fn apply_then<R, F>(self: &Arc<Self>, action: Action, read: F) -> (Effect, R)
    where
        R: Default,
        F: FnOnce(&FeedState) -> R,
    {
        if self.is_closed() {
            debug!("[{}] Session closed, dropping {:?}", self.id, action_name(&action));
            return (Effect::None, R::default());
        }
        let (effect, value) = {
            let mut state = lock(&self.state);
            let effect = update(&mut state, action);
            (effect, read(&*state))
        };
        if let Effect::CursorChanged(ref cursor) = effect {
            self.schedule_prefetch(cursor.clone());
        }
        (effect, value)
    }

    fn schedule_prefetch(self: &Arc<Self>, cursor: Option<Cursor>) {
        let mut slot = lock(&self.prefetch_task);
        if let Some(stale) = slot.take() {
            stale.abort();
        }
        let Some(cursor) = cursor else {
            return;
        };
        if self.is_closed() {
            return;
        }

        let shared = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(shared.options.prefetch_debounce).await;
            if !shared.wants_prefetch(&cursor) {
                debug!("[{}] Skipping prefetch for {}", shared.id, cursor);
                return;
            }
            debug!("[{}] Prefetching {}", shared.id, cursor);
            let action = match shared
                .source
                .reviews_after(&shared.query, Some(&cursor), shared.options.page_size)
                .await
            {
                Ok(page) => Action::PrefetchCompleted { cursor, page },
                Err(error) => Action::PrefetchFailed { cursor, error },
            };
            shared.apply(action);
        });
        *slot = Some(handle.abort_handle());
    }

    /// Prefetch only the current cursor, and not while load-more is already fetching it.
    fn wants_prefetch(&self, cursor: &Cursor) -> bool {
        let state = lock(&self.state);
        state.next_cursor.as_ref() == Some(cursor)
            && !state.is_loading
            && state.prefetched.as_ref().map(|p| &p.cursor) != Some(cursor)
    }

    async fn poll_once(self: &Arc<Self>) {
        if !lock(&self.state).should_poll() {
            return;
        }
        let action = match self
            .source
            .reviews_after(&self.query, None, self.options.page_size)
            .await
        {
            Ok(page) => Action::PollCompleted(page),
            Err(error) => Action::PollFailed(error),
        };
        self.apply(action);
    }

    fn abort_prefetch(&self) {
        if let Some(handle) = lock(&self.prefetch_task).take() {
            handle.abort();
        }
    }
}

fn action_name(action: &Action) -> &'static str {
    match action {
        Action::Init(_) => "Init",
        Action::LoadMore => "LoadMore",
        Action::PageLoaded { .. } => "PageLoaded",
        Action::PageFailed { .. } => "PageFailed",
        Action::PrefetchCompleted { .. } => "PrefetchCompleted",
        Action::PrefetchFailed { .. } => "PrefetchFailed",
        Action::PollCompleted(_) => "PollCompleted",
        Action::PollFailed(_) => "PollFailed",
        Action::ApplyNewItems => "ApplyNewItems",
    }
}

pub struct FeedSession {
    shared: Arc<Shared>,
    poll_task: Option<JoinHandle<()>>,
}

impl FeedSession {
    /// Fetches the newest page and starts the session on it.
    /// A failed first fetch starts an empty feed instead.
    pub async fn start(
        source: Arc<dyn FeedSource>,
        query: ReviewQuery,
        options: SessionOptions,
    ) -> Self {
        let initial = match source.reviews_after(&query, None, options.page_size).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Initial feed fetch from {} failed: {}", source.name(), e);
                Page::empty()
            }
        };
        Self::with_initial_page(source, query, options, initial)
    }

    /// Starts a session on an already fetched first page.
    /// Must be called inside a tokio runtime.
    pub fn with_initial_page(
        source: Arc<dyn FeedSource>,
        query: ReviewQuery,
        options: SessionOptions,
        initial: Page<FeedItem>,
    ) -> Self {
        let shared = Arc::new(Shared {
            id: uuid::Uuid::new_v4().to_string(),
            source,
            query,
            options,
            state: Mutex::new(FeedState::new()),
            prefetch_task: Mutex::new(None),
            closed: AtomicBool::new(false),
        });
        info!(
            "[{}] Feed session started (source={}, sort={}, category={:?})",
            shared.id,
            shared.source.name(),
            shared.query.sort,
            shared.query.category
        );
        shared.apply(Action::Init(initial));
        let poll_task = Some(spawn_poll(Arc::clone(&shared)));
        Self { shared, poll_task }
    }

    /// Appends the next page. At most one fetch runs at a time; a completed
    /// prefetch for the current cursor is used instead of the network.
    pub async fn load_more(&self) -> LoadOutcome {
        match self.shared.apply_then(Action::LoadMore, |state| state.last_appended) {
            (Effect::None, _) => LoadOutcome::Skipped,
            (Effect::CursorChanged(_), appended) => LoadOutcome::Loaded {
                appended,
                from_prefetch: true,
            },
            (Effect::FetchPage(cursor), _) => {
                let result = self
                    .shared
                    .source
                    .reviews_after(&self.shared.query, Some(&cursor), self.shared.options.page_size)
                    .await;
                match result {
                    Ok(page) => {
                        let (_, appended) = self
                            .shared
                            .apply_then(Action::PageLoaded { cursor, page }, |state| state.last_appended);
                        LoadOutcome::Loaded {
                            appended,
                            from_prefetch: false,
                        }
                    }
                    Err(error) => {
                        self.shared.apply(Action::PageFailed {
                            cursor,
                            error: error.clone(),
                        });
                        LoadOutcome::Failed(error)
                    }
                }
            }
        }
    }

    /// Moves polled items to the top of the feed. Returns how many were added.
    pub fn apply_new_items(&self) -> usize {
        let (_, added) = self
            .shared
            .apply_then(Action::ApplyNewItems, |state| state.last_applied);
        added
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.shared.state).pending.len()
    }

    pub fn visible(&self) -> Vec<FeedItem> {
        lock(&self.shared.state).visible.clone()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let state = lock(&self.shared.state);
        FeedSnapshot {
            visible: state.visible.clone(),
            pending_count: state.pending.len(),
            has_more: state.has_more(),
            is_loading: state.is_loading,
            prefetch_ready: match (&state.prefetched, &state.next_cursor) {
                (Some(prefetched), Some(cursor)) => &prefetched.cursor == cursor,
                _ => false,
            },
            last_error: state.last_error.clone(),
        }
    }

    /// Stops polling and prefetching. Idempotent.
    pub fn close(&mut self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
        self.shared.abort_prefetch();
        info!("[{}] Feed session closed", self.shared.id);
    }
}

impl Drop for FeedSession {
    fn drop(&mut self) {
        self.close();
    }
}

fn spawn_poll(shared: Arc<Shared>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = shared.options.poll_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if shared.is_closed() {
                break;
            }
            shared.poll_once().await;
        }
    })
}
