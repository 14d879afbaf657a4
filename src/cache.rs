//! The process-wide article cache.
//!
//! All mutable state (the ordered articles, the page cursor, the readiness
//! flag) lives behind a single [`RwLock`], so readiness can never disagree
//! with the sequence it describes. Reads take the shared lock; refresh and
//! append take the exclusive lock only for the final swap, never while
//! scraping.
//!
//! # Lifecycle
//!
//! ```text
//! new() ──► not ready ──begin_refresh──► not ready (empty) ──complete_refresh──► ready
//!                                              │                                  │
//!                                              └──abort_refresh──► previous state  └──append_page──► ready
//! ```
//!
//! Every refresh bumps a generation counter. A page advance captures the
//! generation when it starts and its batch is only appended if no refresh has
//! replaced the contents in the meantime. An aborted refresh rolls the
//! counter back along with the contents.

use crate::error::{Result, ScrapeError};
use crate::models::Article;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct CacheState {
    articles: Vec<Article>,
    current_page: u32,
    ready: bool,
    generation: u64,
    refreshed_at: Option<DateTime<Utc>>,
}

/// A consistent copy of a ready cache.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub page: u32,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub articles: Vec<Article>,
}

/// Proof that a refresh is in progress; hands the previous state back on abort.
#[must_use = "a refresh must be completed or aborted"]
#[derive(Debug)]
pub struct RefreshTicket {
    generation: u64,
    previous_generation: u64,
    previous_articles: Vec<Article>,
    previous_page: u32,
    previous_ready: bool,
    previous_refreshed_at: Option<DateTime<Utc>>,
}

/// Where the next page advance should scrape, and against which generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub generation: u64,
    pub next_page: u32,
}

/// Ordered, enriched articles shared between the background refresh and
/// request handlers.
///
/// # Readiness
///
/// Every read returns [`ScrapeError::NotReady`] until the first refresh
/// completes, and again while any later refresh is in progress.
#[derive(Debug)]
pub struct ArticleCache {
    state: RwLock<CacheState>,
}

impl Default for ArticleCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleCache {
    /// An empty, not-ready cache positioned at page 1.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CacheState {
                current_page: 1,
                ..CacheState::default()
            }),
        }
    }

    /// Whether the cache holds a completed refresh and can serve reads.
    pub async fn is_ready(&self) -> bool {
        self.state.read().await.ready
    }

    /// The last listing page merged into the cache (1 right after a refresh).
    pub async fn current_page(&self) -> u32 {
        self.state.read().await.current_page
    }

    /// The full ordered sequence, rejected with [`ScrapeError::NotReady`] mid-rebuild.
    pub async fn snapshot(&self) -> Result<Snapshot> {
        let state = self.state.read().await;
        if !state.ready {
            return Err(ScrapeError::NotReady);
        }
        Ok(Snapshot {
            page: state.current_page,
            refreshed_at: state.refreshed_at,
            articles: state.articles.clone(),
        })
    }

    /// Articles from index `offset` onward; empty when `offset` is past the end.
    pub async fn articles_since(&self, offset: usize) -> Result<Vec<Article>> {
        let state = self.state.read().await;
        if !state.ready {
            return Err(ScrapeError::NotReady);
        }
        Ok(state.articles.get(offset..).map(<[Article]>::to_vec).unwrap_or_default())
    }

    /// Clear the cache and mark it not ready until the refresh finishes.
    pub async fn begin_refresh(&self) -> RefreshTicket {
        let mut state = self.state.write().await;
        let previous_generation = state.generation;
        state.generation += 1;
        let ticket = RefreshTicket {
            generation: state.generation,
            previous_generation,
            previous_articles: std::mem::take(&mut state.articles),
            previous_page: state.current_page,
            previous_ready: state.ready,
            previous_refreshed_at: state.refreshed_at,
        };
        state.current_page = 1;
        state.ready = false;
        debug!(generation = state.generation, "Cache refresh started");
        ticket
    }

    /// Install the freshly scraped first page and mark the cache ready.
    pub async fn complete_refresh(&self, ticket: RefreshTicket, batch: Vec<Article>) {
        let mut state = self.state.write().await;
        if state.generation != ticket.generation {
            warn!(
                ticket = ticket.generation,
                current = state.generation,
                "Superseded refresh discarded"
            );
            return;
        }
        state.articles = batch;
        state.current_page = 1;
        state.ready = true;
        state.refreshed_at = Some(Utc::now());
        info!(count = state.articles.len(), "Cache refreshed");
    }

    /// Put back whatever the cache held before the refresh began.
    ///
    /// The generation is rolled back too, so a page advance that started
    /// before the failed refresh can still append its batch.
    pub async fn abort_refresh(&self, ticket: RefreshTicket) {
        let mut state = self.state.write().await;
        if state.generation != ticket.generation {
            return;
        }
        state.articles = ticket.previous_articles;
        state.current_page = ticket.previous_page;
        state.ready = ticket.previous_ready;
        state.refreshed_at = ticket.previous_refreshed_at;
        state.generation = ticket.previous_generation;
        info!(
            count = state.articles.len(),
            ready = state.ready,
            "Cache refresh aborted; previous contents restored"
        );
    }

    /// Reserve the page after the current one for a page advance.
    pub async fn pagination_cursor(&self) -> Result<PageCursor> {
        let state = self.state.read().await;
        if !state.ready {
            return Err(ScrapeError::NotReady);
        }
        Ok(PageCursor {
            generation: state.generation,
            next_page: state.current_page + 1,
        })
    }

    /// Append a page's batch and advance the counter in one step.
    ///
    /// Returns `false` (and changes nothing) when a refresh started after the
    /// cursor was taken or the cursor's page was already appended.
    pub async fn append_page(&self, cursor: PageCursor, batch: &[Article]) -> bool {
        let mut state = self.state.write().await;
        if !state.ready
            || state.generation != cursor.generation
            || state.current_page + 1 != cursor.next_page
        {
            return false;
        }
        state.articles.extend_from_slice(batch);
        state.current_page = cursor.next_page;
        info!(
            page = state.current_page,
            added = batch.len(),
            total = state.articles.len(),
            "Appended page to cache"
        );
        true
    }
}
