use std::num::NonZeroUsize;
use std::sync::Arc;

use anyhow::Result;
use lru::LruCache;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::catalog::{CatalogClient, CatalogError, SearchPage, VideoDetail, VideoSummary};
use crate::config::Config;
use crate::feed::{FeedController, FeedEvent, ViewportTrigger};
use crate::storage::{
    BoundedRecencyStore, Database, SEARCH_HISTORY_CAPACITY, SEARCH_HISTORY_KEY,
    WATCH_HISTORY_CAPACITY, WATCH_HISTORY_KEY,
};

/// Results requested for the one-shot search view.
pub const SEARCH_PAGE_SIZE: u8 = 24;

/// Related videos shown beside a detail record.
pub const RELATED_PAGE_SIZE: u8 = 15;

/// Detail records kept in the per-session cache.
const DETAIL_CACHE_SIZE: usize = 32;

/// How long a status message stays on screen.
const STATUS_TIMEOUT_SECS: u64 = 5;

/// First visible row of a list window that keeps `selected` on screen,
/// scrolling only when the cursor walks past the bottom. Shared by the
/// render pass and the sentinel-visibility check so the two never disagree.
pub fn window_offset(selected: usize, rows: usize) -> usize {
    selected.saturating_sub(rows.saturating_sub(1))
}

// ============================================================================
// Views
// ============================================================================

/// Current view mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Category feed with infinite scroll
    Feed,
    /// One-shot search results for a submitted query
    Search,
    /// Locally-persisted watch history
    History,
    /// Single-video detail with related list
    Detail,
}

// ============================================================================
// Background Task Events
// ============================================================================

/// Completion events from spawned background tasks.
///
/// Every variant carries the generation counter current when its task was
/// spawned; handlers drop events whose generation no longer matches, so a
/// slow response can never overwrite state belonging to a newer request.
pub enum AppEvent {
    /// One-shot search finished.
    SearchCompleted {
        generation: u64,
        query: String,
        result: Result<SearchPage, CatalogError>,
    },
    /// Detail + related fetch finished for the video the user opened.
    ///
    /// `summary` is the card the user activated; on success it is what gets
    /// written into the watch-history store.
    DetailLoaded {
        generation: u64,
        summary: VideoSummary,
        result: Result<(VideoDetail, Vec<VideoSummary>), CatalogError>,
    },
}

// ============================================================================
// Per-View State
// ============================================================================

/// State of the search input and the search-results view.
#[derive(Debug, Default)]
pub struct SearchState {
    /// Text in the search input (while editing).
    pub input: String,
    /// True while the input overlay is open.
    pub editing: bool,
    /// The submitted query the results belong to.
    pub query: Option<String>,
    pub results: Vec<VideoSummary>,
    pub selected: usize,
    pub loading: bool,
    pub error: Option<String>,
    /// Bumped on every submit; stale completions are dropped.
    pub generation: u64,
    /// Highlighted row in the history dropdown, if any.
    pub history_selected: Option<usize>,
}

/// A loaded detail record plus its related list.
pub struct DetailState {
    pub video: VideoDetail,
    pub related: Vec<VideoSummary>,
    pub selected_related: usize,
}

// ============================================================================
// App
// ============================================================================

/// Central application state, mutated only from the event loop.
pub struct App {
    pub db: Database,
    pub client: Arc<CatalogClient>,
    pub config: Config,

    pub view: View,
    pub needs_redraw: bool,

    // Feed
    pub feed: FeedController,
    pub trigger: ViewportTrigger,
    pub feed_selected: usize,
    /// Rows the video list occupies, written by the render pass; visibility
    /// of the end-of-list sentinel is computed against it.
    pub list_rows: u16,

    // Search
    pub search: SearchState,
    pub search_history: BoundedRecencyStore<String>,
    /// In-memory copy of the persisted search history, kept in sync after
    /// every mutation so the dropdown renders without a storage read.
    pub search_history_entries: Vec<String>,

    // Watch history
    pub watch_history: BoundedRecencyStore<VideoSummary>,
    pub watch_entries: Vec<VideoSummary>,
    pub history_selected: usize,

    // Detail
    pub detail: Option<DetailState>,
    /// Id of the video a detail fetch is in flight for.
    pub detail_loading: Option<String>,
    pub detail_error: Option<String>,
    pub detail_generation: u64,
    /// View to return to when the detail panel closes.
    pub detail_return: View,
    pub detail_cache: LruCache<String, (VideoDetail, Vec<VideoSummary>)>,

    status: Option<(String, Instant)>,
}

impl App {
    pub async fn new(
        db: Database,
        client: Arc<CatalogClient>,
        config: Config,
        feed_tx: mpsc::Sender<FeedEvent>,
    ) -> Result<Self> {
        let search_history: BoundedRecencyStore<String> =
            BoundedRecencyStore::new(db.clone(), SEARCH_HISTORY_KEY, SEARCH_HISTORY_CAPACITY);
        let watch_history: BoundedRecencyStore<VideoSummary> =
            BoundedRecencyStore::new(db.clone(), WATCH_HISTORY_KEY, WATCH_HISTORY_CAPACITY);

        let search_history_entries = search_history.load().await?;
        let watch_entries = watch_history.load().await?;

        let feed = FeedController::new(Arc::clone(&client), feed_tx);

        Ok(Self {
            db,
            client,
            config,
            view: View::Feed,
            needs_redraw: true,
            feed,
            trigger: ViewportTrigger::new(),
            feed_selected: 0,
            list_rows: 0,
            search: SearchState::default(),
            search_history,
            search_history_entries,
            watch_history,
            watch_entries,
            history_selected: 0,
            detail: None,
            detail_loading: None,
            detail_error: None,
            detail_generation: 0,
            detail_return: View::Feed,
            detail_cache: LruCache::new(
                NonZeroUsize::new(DETAIL_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
            ),
            status: None,
        })
    }

    // ========================================================================
    // Sentinel / Infinite Scroll
    // ========================================================================

    /// Whether the end-of-list sentinel (the tail of the loaded feed) is
    /// inside the visible window.
    pub fn sentinel_visible(&self) -> bool {
        let rows = self.list_rows as usize;
        let len = self.feed.items().len();
        if rows == 0 || len == 0 {
            return false;
        }
        window_offset(self.feed_selected, rows) + rows >= len
    }

    /// Sample sentinel visibility and, on a visible transition, ask the feed
    /// for more. Called from scroll handlers and after pages apply; never
    /// polled.
    pub fn poll_sentinel(&mut self) {
        let visible = self.sentinel_visible();
        if self.trigger.observe(visible) {
            self.feed.load_more();
        }
    }

    // ========================================================================
    // Status Line
    // ========================================================================

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), Instant::now()));
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status.as_ref().map(|(m, _)| m.as_str())
    }

    /// Drop the status message once it has been on screen long enough.
    /// Returns true if a message was cleared (the caller should redraw).
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, since)) = &self.status {
            if since.elapsed().as_secs() >= STATUS_TIMEOUT_SECS {
                self.status = None;
                return true;
            }
        }
        false
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Browser URL for a video id.
    pub fn watch_url(&self, video_id: &str) -> String {
        format!("{}{}", self.config.watch_url_base, video_id)
    }

    /// The video summary currently under the cursor in the active view.
    pub fn selected_summary(&self) -> Option<&VideoSummary> {
        match self.view {
            View::Feed => self.feed.items().get(self.feed_selected),
            View::Search => self.search.results.get(self.search.selected),
            View::History => self.watch_entries.get(self.history_selected),
            View::Detail => self
                .detail
                .as_ref()
                .and_then(|d| d.related.get(d.selected_related)),
        }
    }
}
