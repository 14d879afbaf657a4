//! On-demand page advance.
//!
//! Each call scrapes the page after the cache's current one and appends the
//! batch. Advances are serialized so that concurrent callers scrape
//! consecutive pages instead of racing for the same one; the scrape itself
//! runs without holding the cache lock.

use crate::cache::ArticleCache;
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::models::Article;
use crate::pipeline::ScrapePipeline;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, instrument, warn};

/// Serves "load more" requests on top of the shared [`ArticleCache`].
pub struct PaginationService<F> {
    pipeline: Arc<ScrapePipeline<F>>,
    cache: Arc<ArticleCache>,
    advance: Mutex<()>,
}

impl<F: PageFetcher> PaginationService<F> {
    /// Create the service.
    ///
    /// # Arguments
    ///
    /// * `pipeline` - Scrapes and enriches the next listing page
    /// * `cache` - Shared cache that new batches are appended to
    pub fn new(pipeline: Arc<ScrapePipeline<F>>, cache: Arc<ArticleCache>) -> Self {
        Self {
            pipeline,
            cache,
            advance: Mutex::new(()),
        }
    }

    /// Scrape the next listing page, append it to the cache and return only the new articles.
    ///
    /// An exhausted listing yields an empty batch. A failed listing scrape
    /// leaves both the cache and the page counter untouched.
    #[instrument(level = "info", skip(self))]
    pub async fn load_more(&self) -> Result<Vec<Article>> {
        let _advance = self.advance.lock().await;
        let cursor = self.cache.pagination_cursor().await?;

        let batch = self
            .pipeline
            .scrape_page(cursor.next_page)
            .await
            .inspect_err(|e| error!(page = cursor.next_page, error = %e, "Page advance failed"))?;

        if !self.cache.append_page(cursor, &batch).await {
            warn!(
                page = cursor.next_page,
                "Cache was refreshed during page advance; batch not appended"
            );
        }
        Ok(batch)
    }

    /// Already cached articles from `offset` onward, without scraping.
    pub async fn articles_since(&self, offset: usize) -> Result<Vec<Article>> {
        self.cache.articles_since(offset).await
    }
}
