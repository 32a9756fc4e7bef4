//! Infinite-scroll pagination state
//!
//! Each list screen owns a [`FeedLoader`]. The list widget asks for the next
//! batch when the user scrolls near the end; the loader decides whether there
//! is anything left and advances its [`FeedCursor`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Number of items per page
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Anything the loader can paginate over
///
/// Only the size matters to pagination; the items themselves are rendered by
/// the screen.
pub trait ContentSource {
    /// Number of items available
    fn len(&self) -> usize;

    /// Whether there are no items
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> ContentSource for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl<S: ContentSource + ?Sized> ContentSource for Arc<S> {
    fn len(&self) -> usize {
        (**self).len()
    }
}

/// Pagination configuration
///
/// The page size is never zero; deserialized values go through the same
/// clamp as [`FeedConfig::with_page_size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFeedConfig")]
pub struct FeedConfig {
    page_size: usize,
}

#[derive(Deserialize)]
struct RawFeedConfig {
    #[serde(default = "default_page_size")]
    page_size: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl From<RawFeedConfig> for FeedConfig {
    fn from(raw: RawFeedConfig) -> Self {
        Self::default().with_page_size(raw.page_size)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE }
    }
}

impl FeedConfig {
    /// Set the page size (values below 1 are raised to 1)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Items per page
    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

/// Per-screen pagination state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCursor {
    /// Next page to request, starting at 1
    pub page: u32,
    /// Total pages, 0 while unknown
    pub total: u32,
    /// Whether the first load has not completed yet
    pub loading: bool,
    /// Whether a pull-to-refresh is in progress
    pub refreshing: bool,
}

impl Default for FeedCursor {
    fn default() -> Self {
        Self { page: 1, total: 0, loading: true, refreshing: false }
    }
}

impl FeedCursor {
    /// Whether the total page count has been computed
    pub fn total_known(&self) -> bool {
        self.total != 0
    }

    /// Whether the cursor has moved past the last page
    pub fn is_exhausted(&self) -> bool {
        self.total_known() && self.page > self.total
    }
}

/// Result of a load request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The cursor moved forward
    Advanced {
        /// New cursor page
        page: u32,
        /// Total pages
        total: u32,
    },
    /// Nothing left to load; the cursor did not move
    Exhausted,
}

/// Pagination driver for one list screen
#[derive(Debug, Clone)]
pub struct FeedLoader<S> {
    source: S,
    config: FeedConfig,
    cursor: FeedCursor,
}

impl<S: ContentSource> FeedLoader<S> {
    /// Create a loader with the default page size
    pub fn new(source: S) -> Self {
        Self::with_config(source, FeedConfig::default())
    }

    /// Create a loader with a custom configuration
    pub fn with_config(source: S, config: FeedConfig) -> Self {
        Self { source, config, cursor: FeedCursor::default() }
    }

    /// Current cursor
    pub fn cursor(&self) -> FeedCursor {
        self.cursor
    }

    /// The content being paginated
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Active configuration
    pub fn config(&self) -> FeedConfig {
        self.config
    }

    /// Request a page
    ///
    /// `page_number` defaults to the cursor's current page. The request is a
    /// no-op once the total is known and either the requested page or the
    /// current page lies beyond it. Otherwise the total is recomputed from the
    /// source and the cursor advances by exactly one page, whatever
    /// `page_number` was.
    pub fn load_page(&mut self, page_number: Option<u32>, should_refresh: bool) -> LoadOutcome {
        let requested = page_number.unwrap_or(self.cursor.page);

        if self.cursor.total_known()
            && (requested > self.cursor.total || self.cursor.page > self.cursor.total)
        {
            tracing::trace!(requested, total = self.cursor.total, "no more pages");
            return LoadOutcome::Exhausted;
        }

        let pages = self.source.len() / self.config.page_size();
        self.cursor.total = u32::try_from(pages).unwrap_or(u32::MAX);
        self.cursor.page = self.cursor.page.saturating_add(1);
        self.cursor.loading = false;

        tracing::debug!(
            page = self.cursor.page,
            total = self.cursor.total,
            refresh = should_refresh,
            "loaded page"
        );

        LoadOutcome::Advanced { page: self.cursor.page, total: self.cursor.total }
    }

    /// Request the next page (list end reached)
    pub fn load_next(&mut self) -> LoadOutcome {
        self.load_page(None, false)
    }

    /// Pull-to-refresh
    pub fn refresh(&mut self) -> LoadOutcome {
        self.cursor.refreshing = true;
        let outcome = self.load_page(Some(1), true);
        self.cursor.refreshing = false;
        outcome
    }

    /// Start over as if the screen had just been mounted
    pub fn reset(&mut self) {
        self.cursor = FeedCursor::default();
    }
}
