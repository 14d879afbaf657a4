//! Background refresh of the article cache.
//!
//! The scheduler owns a fixed interval timer. On every tick it clears the
//! cache (readers are rejected from then on), scrapes page 1 outside the
//! lock, and installs the result as the new, ready cache. The first tick
//! fires immediately, which populates the cache at startup.
//!
//! A failed listing scrape does not terminate the process: the previous
//! cache contents are restored, the failure is logged, and the next tick
//! tries again.

use crate::cache::ArticleCache;
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::pipeline::ScrapePipeline;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, instrument};

/// Periodically rebuilds the [`ArticleCache`] from listing page 1.
pub struct RefreshScheduler<F> {
    pipeline: Arc<ScrapePipeline<F>>,
    cache: Arc<ArticleCache>,
    every: Duration,
}

impl<F> RefreshScheduler<F>
where
    F: PageFetcher + 'static,
{
    /// Create a scheduler that refreshes `cache` every `every`.
    ///
    /// # Arguments
    ///
    /// * `pipeline` - Scrapes and enriches the first listing page
    /// * `cache` - Shared cache the refreshed batch is installed into
    /// * `every` - Interval between refreshes; the first one runs immediately
    ///
    /// Nothing runs until [`RefreshScheduler::spawn`] or [`RefreshScheduler::run`] is called.
    pub fn new(
        pipeline: Arc<ScrapePipeline<F>>,
        cache: Arc<ArticleCache>,
        every: Duration,
    ) -> Self {
        Self {
            pipeline,
            cache,
            every,
        }
    }

    /// Rebuild the cache from page 1 once. Returns the number of articles installed.
    #[instrument(level = "info", skip(self))]
    pub async fn refresh_once(&self) -> Result<usize> {
        let t0 = Instant::now();
        let ticket = self.cache.begin_refresh().await;

        match self.pipeline.scrape_page(1).await {
            Ok(batch) => {
                let count = batch.len();
                self.cache.complete_refresh(ticket, batch).await;
                info!(count, elapsed_ms = t0.elapsed().as_millis(), "Refresh completed");
                Ok(count)
            }
            Err(e) => {
                self.cache.abort_refresh(ticket).await;
                Err(e)
            }
        }
    }

    /// Refresh on every interval tick for as long as the process lives.
    pub async fn run(self) {
        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(every = ?self.every, "Refresh scheduler started");

        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh_once().await {
                error!(error = %e, "Refresh failed; keeping previous cache contents");
            }
        }
    }

    /// Run the scheduler as a detached tokio task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
