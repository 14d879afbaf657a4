//! # HN Digest
//!
//! A small service that keeps an enriched copy of the Hacker News front page
//! in memory. Every listing entry is paired with a thumbnail and a short text
//! preview scraped from the linked article, and the collection is exposed as
//! JSON with incremental pagination.
//!
//! ## Usage
//!
//! ```sh
//! hn_digest --port 8080 --refresh-interval-secs 600
//! ```
//!
//! ## Architecture
//!
//! The service follows a scrape-enrich-cache pipeline:
//! 1. **Listing**: Fetch one listing page and extract `(title, link)` rows
//! 2. **Enrichment**: Fetch each article once, extract thumbnail and preview
//!    (bounded concurrency, listing order preserved)
//! 3. **Cache**: Store the ordered batch behind a read/write lock with a readiness gate
//! 4. **Refresh**: A background task rebuilds page 1 on a fixed interval
//! 5. **Pagination**: Requests append the next listing page on demand

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cache;
mod cli;
mod config;
mod enrich;
mod error;
mod fetch;
mod listing;
mod models;
mod pagination;
mod pipeline;
mod retry;
mod scheduler;
mod server;
mod utils;

use cache::ArticleCache;
use cli::Cli;
use config::Settings;
use fetch::HttpFetcher;
use pagination::PaginationService;
use pipeline::ScrapePipeline;
use retry::RetryFetch;
use scheduler::RefreshScheduler;
use server::AppState;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "hn_digest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Settings ----
    let settings = Settings::load(args.config.as_deref())
        .await?
        .apply_cli(&args)
        .validate()
        .inspect_err(|e| error!(error = %e, "Invalid settings"))?;
    info!(
        base_url = %settings.base_url,
        refresh_interval_secs = settings.refresh_interval_secs,
        enrich_concurrency = settings.enrich_concurrency,
        "Settings loaded"
    );

    // ---- Pipeline & cache ----
    let fetcher = RetryFetch::new(
        HttpFetcher::new(&settings)?,
        settings.max_retries,
        settings.retry_base_delay(),
    );
    let refresh_interval = settings.refresh_interval();
    let pipeline = Arc::new(ScrapePipeline::new(fetcher, settings)?);
    let cache = Arc::new(ArticleCache::new());

    // First tick fires immediately and populates the cache.
    RefreshScheduler::new(Arc::clone(&pipeline), Arc::clone(&cache), refresh_interval).spawn();

    let pagination = Arc::new(PaginationService::new(pipeline, Arc::clone(&cache)));

    // ---- HTTP ----
    let bind_addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .inspect_err(|e| error!(addr = %bind_addr, error = %e, "Failed to bind"))?;
    info!("Server started on http://localhost:{}", args.port);

    server::serve(listener, AppState { cache, pagination }).await?;
    Ok(())
}
