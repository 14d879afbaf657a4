//! The scrape pipeline: one listing page in, one ordered batch of articles out.
//!
//! ```text
//! listing page ──► [(title, link), ...] ──► enrich × N (bounded, ordered) ──► [Article, ...]
//! ```
//!
//! The pipeline never touches the cache. Callers (the refresh scheduler and
//! the pagination service) decide how a batch is merged, which keeps all
//! network work outside of the cache lock.

use crate::config::{CompiledLayout, Settings};
use crate::enrich::ArticleEnricher;
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::listing;
use crate::models::Article;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Composes the listing scraper with the article enricher.
pub struct ScrapePipeline<F> {
    fetcher: Arc<F>,
    layout: Arc<CompiledLayout>,
    enricher: ArticleEnricher<F>,
    settings: Settings,
}

impl<F: PageFetcher> ScrapePipeline<F> {
    /// Compile the site layout and wire the fetcher into both stages.
    pub fn new(fetcher: F, settings: Settings) -> Result<Self> {
        let fetcher = Arc::new(fetcher);
        let layout = Arc::new(settings.layout.compile()?);
        let enricher = ArticleEnricher::new(
            Arc::clone(&fetcher),
            Arc::clone(&layout),
            &settings.fallback_thumbnail,
        );

        Ok(Self {
            fetcher,
            layout,
            enricher,
            settings,
        })
    }

    /// Scrape listing page `page` and enrich every entry.
    ///
    /// Up to `enrich_concurrency` article pages are fetched at once; the
    /// returned batch is always in listing order. Fails only when the listing
    /// itself cannot be retrieved.
    #[instrument(level = "info", skip(self))]
    pub async fn scrape_page(&self, page: u32) -> Result<Vec<Article>> {
        let t0 = Instant::now();
        let entries =
            listing::index_page(self.fetcher.as_ref(), &self.settings, &self.layout, page).await?;
        let total = entries.len();

        let articles: Vec<Article> = stream::iter(entries)
            .map(|entry| {
                let enricher = self.enricher.clone();
                async move {
                    let enrichment = enricher.enrich(&entry.link).await;
                    Article::from_parts(entry, enrichment)
                }
            })
            .buffered(self.settings.enrich_concurrency.max(1))
            .collect()
            .await;

        info!(
            page,
            count = total,
            elapsed_ms = t0.elapsed().as_millis(),
            "Scraped listing page"
        );
        Ok(articles)
    }
}
