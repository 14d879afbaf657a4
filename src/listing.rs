//! Listing page scraper.
//!
//! Fetches one page of the listing index and turns every row matching the
//! layout's row selector into a [`ListingEntry`], in document order.
//!
//! # URL Pattern
//!
//! Listing pages live at `{base_url}{listing_path}` with `{page}` substituted,
//! e.g. `https://news.ycombinator.com/news?p=2`. Row links that are not
//! already absolute (self posts such as `item?id=1`) are rewritten to start
//! with the base URL.
//!
//! A failure to fetch the listing is fatal for the scrape that asked for it:
//! the error is returned as [`ScrapeError::Listing`] and no partial listing is
//! ever produced.

use crate::config::{CompiledLayout, Settings};
use crate::error::{Result, ScrapeError};
use crate::fetch::PageFetcher;
use crate::models::ListingEntry;
use crate::utils::is_absolute_url;
use scraper::Html;
use tracing::{debug, info, instrument};

/// Fetch and parse listing page `page`.
#[instrument(level = "info", skip(fetcher, settings, layout))]
pub async fn index_page<F: PageFetcher>(
    fetcher: &F,
    settings: &Settings,
    layout: &CompiledLayout,
    page: u32,
) -> Result<Vec<ListingEntry>> {
    let listing_url = settings.listing_url(page);
    let html = fetcher
        .fetch_html(&listing_url)
        .await
        .map_err(|e| ScrapeError::listing(page, e))?;

    let entries = parse_listing(&html, layout, &settings.base_url);
    info!(
        count = entries.len(),
        source = %listing_url,
        "Indexed listing entries"
    );
    debug!(entries = ?entries, "Listing entries");

    Ok(entries)
}

/// Extract `(title, link)` pairs from a listing document.
///
/// Each row contributes exactly one entry, even when its title anchor is
/// missing; the title is then empty and the link degenerates to `base_url`.
pub fn parse_listing(html: &str, layout: &CompiledLayout, base_url: &str) -> Vec<ListingEntry> {
    let document = Html::parse_document(html);

    document
        .select(&layout.row)
        .map(|row| {
            let anchor = row.select(&layout.link).next();
            let title = anchor
                .map(|a| a.text().collect::<String>())
                .unwrap_or_default();
            let href = anchor
                .and_then(|a| a.value().attr("href"))
                .unwrap_or_default();

            ListingEntry {
                title,
                link: absolutize_link(base_url, href),
            }
        })
        .collect()
}

/// Rewrite a relative row link against the site's base URL.
///
/// `base_url` is expected to end with `/`; a leading `/` on the link is
/// dropped so that the result never contains a doubled slash.
pub fn absolutize_link(base_url: &str, href: &str) -> String {
    if is_absolute_url(href) {
        href.to_string()
    } else {
        format!("{}{}", base_url, href.trim_start_matches('/'))
    }
}
