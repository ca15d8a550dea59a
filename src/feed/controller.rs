use std::sync::Arc;

use tokio::sync::mpsc;

use crate::catalog::{CatalogClient, CatalogError, SearchPage, VideoSummary};

/// Number of videos requested per feed page.
const FEED_PAGE_SIZE: u8 = 24;

/// Category filters shown in the feed's tab row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    All,
    Music,
    Gaming,
    News,
    Live,
    Sports,
    Learning,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::All,
        Category::Music,
        Category::Gaming,
        Category::News,
        Category::Live,
        Category::Sports,
        Category::Learning,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::All => "All",
            Category::Music => "Music",
            Category::Gaming => "Gaming",
            Category::News => "News",
            Category::Live => "Live",
            Category::Sports => "Sports",
            Category::Learning => "Learning",
        }
    }

    /// The term sent to the catalog. "All" is not a real catalog term and
    /// maps to the default trending query; every other category is used
    /// verbatim.
    pub fn search_term(self) -> &'static str {
        match self {
            Category::All => "trending",
            other => other.label(),
        }
    }
}

/// The query a feed is currently showing results for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeedQuery {
    pub category: Category,
}

impl FeedQuery {
    pub fn new(category: Category) -> Self {
        Self { category }
    }
}

/// Where the feed is in its fetch lifecycle.
///
/// `LoadingInitial` and `LoadingMore` are mutually exclusive; either one
/// means a fetch is in flight and blocks further fetches for this feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Idle,
    LoadingInitial,
    LoadingMore,
    Error,
}

/// Which logical fetch failed, so a manual retry re-issues the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Initial,
    NextPage,
}

/// Completion of a spawned page fetch, tagged with the generation that
/// issued it.
#[derive(Debug)]
pub struct FeedEvent {
    pub generation: u64,
    pub result: Result<SearchPage, CatalogError>,
}

/// Drives paged retrieval of videos for the active [`FeedQuery`].
///
/// Fetches run as spawned tasks reporting back through an mpsc channel, so
/// all state mutation happens on the event loop's single flow of control.
/// Every fetch carries the generation current at spawn time;
/// [`handle`](Self::handle) applies a completion only if its generation
/// still matches, which is what discards a slow category-A response landing
/// after the user switched to category B.
///
/// At most one fetch is in flight per feed: `load_more` refuses unless the
/// phase is `Idle`, and `set_query`'s generation bump orphans whatever was
/// in flight before it.
pub struct FeedController {
    client: Arc<CatalogClient>,
    events: mpsc::Sender<FeedEvent>,
    query: FeedQuery,
    generation: u64,
    items: Vec<VideoSummary>,
    cursor: Option<String>,
    has_more: bool,
    phase: FeedPhase,
    failed: Option<FetchKind>,
    last_error: Option<String>,
}

impl FeedController {
    /// Create an idle controller. No fetch is issued until the first
    /// [`set_query`](Self::set_query).
    pub fn new(client: Arc<CatalogClient>, events: mpsc::Sender<FeedEvent>) -> Self {
        Self {
            client,
            events,
            query: FeedQuery::default(),
            generation: 0,
            items: Vec::new(),
            cursor: None,
            has_more: true,
            phase: FeedPhase::Idle,
            failed: None,
            last_error: None,
        }
    }

    /// Replace the active query and fetch its first page.
    ///
    /// The previous query's state is discarded in full: no items or cursor
    /// carry over. Any fetch still in flight for the previous query keeps
    /// its old generation and is discarded on arrival.
    pub fn set_query(&mut self, query: FeedQuery) {
        self.generation = self.generation.wrapping_add(1);
        self.query = query;
        self.items.clear();
        self.cursor = None;
        self.has_more = true;
        self.phase = FeedPhase::LoadingInitial;
        self.failed = None;
        self.last_error = None;

        tracing::debug!(
            category = query.category.label(),
            generation = self.generation,
            "Feed query replaced"
        );
        self.spawn_fetch(None);
    }

    /// Fetch the next page, if the feed is idle and the catalog reported
    /// more results. Safe to call redundantly: anything else is a no-op.
    pub fn load_more(&mut self) {
        if self.phase != FeedPhase::Idle || !self.has_more {
            return;
        }

        self.phase = FeedPhase::LoadingMore;
        self.spawn_fetch(self.cursor.clone());
    }

    /// Re-issue the fetch that failed (initial page or next page, whichever
    /// it was). Only meaningful in the error phase.
    pub fn retry(&mut self) {
        if self.phase != FeedPhase::Error {
            return;
        }
        let Some(kind) = self.failed else {
            return;
        };

        match kind {
            FetchKind::Initial => {
                self.phase = FeedPhase::LoadingInitial;
                self.spawn_fetch(None);
            }
            FetchKind::NextPage => {
                self.phase = FeedPhase::LoadingMore;
                self.spawn_fetch(self.cursor.clone());
            }
        }
    }

    /// Apply a fetch completion.
    ///
    /// A completion whose generation no longer matches belonged to a query
    /// that has since been replaced; it is dropped without touching state.
    pub fn handle(&mut self, event: FeedEvent) {
        if event.generation != self.generation {
            tracing::debug!(
                stale = event.generation,
                current = self.generation,
                "Discarding feed page for a replaced query"
            );
            return;
        }

        match event.result {
            Ok(page) => {
                // Token absence is the only end-of-results signal; an empty
                // page with a token still means more may exist.
                self.has_more = page.next_page_token.is_some();
                self.cursor = page.next_page_token;
                self.items.extend(page.items);
                self.phase = FeedPhase::Idle;
                self.failed = None;
                self.last_error = None;
            }
            Err(e) => {
                self.failed = Some(match self.phase {
                    FeedPhase::LoadingInitial => FetchKind::Initial,
                    _ => FetchKind::NextPage,
                });
                self.last_error = Some(e.to_string());
                self.phase = FeedPhase::Error;
                tracing::warn!(
                    category = self.query.category.label(),
                    error = %e,
                    "Feed page fetch failed"
                );
            }
        }
    }

    fn spawn_fetch(&self, page_token: Option<String>) {
        let client = Arc::clone(&self.client);
        let events = self.events.clone();
        let generation = self.generation;
        let term = self.query.category.search_term();

        tokio::spawn(async move {
            let result = client
                .search(term, FEED_PAGE_SIZE, page_token.as_deref())
                .await;
            if events.send(FeedEvent { generation, result }).await.is_err() {
                tracing::debug!("Feed event receiver dropped, discarding page");
            }
        });
    }

    // ========================================================================
    // Read Accessors
    // ========================================================================

    pub fn items(&self) -> &[VideoSummary] {
        &self.items
    }

    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn query(&self) -> FeedQuery {
        self.query
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, FeedPhase::LoadingInitial | FeedPhase::LoadingMore)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
