//! Data models for scraped listing entries and enriched articles.
//!
//! This module defines the value types that flow through the scrape pipeline:
//! - [`ListingEntry`]: A raw `(title, link)` pair discovered on a listing page
//! - [`Enrichment`]: Thumbnail and preview derived from an article's own page
//! - [`Article`]: The fully populated record stored in the cache and served to clients
//!
//! The serialized field names (`Title`, `URL`, `Thumbnail`, `Preview`) are part
//! of the external contract consumed by the front end, hence the explicit renames.

use serde::{Deserialize, Serialize};

/// A single row discovered on a listing page.
///
/// The `link` is always absolute by the time an entry leaves the listing
/// parser; relative links are rewritten against the site's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Display text of the row's title anchor (may be empty).
    pub title: String,
    /// Absolute URL of the article.
    pub link: String,
}

/// Thumbnail and preview extracted from one article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    /// Absolute thumbnail URL, already substituted with the fallback image when needed.
    pub thumbnail: String,
    /// Truncated preview text.
    pub preview: String,
}

/// A fully enriched article as stored in the cache.
///
/// Articles are immutable once constructed; the cache only ever clones or
/// replaces them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    /// The article title as shown on the listing page.
    #[serde(rename = "Title")]
    pub title: String,
    /// Absolute URL of the article.
    #[serde(rename = "URL")]
    pub url: String,
    /// Absolute URL of the thumbnail image. Never empty.
    #[serde(rename = "Thumbnail")]
    pub thumbnail: String,
    /// Text preview, at most 40 words and 300 characters plus an ellipsis.
    #[serde(rename = "Preview")]
    pub preview: String,
}

impl Article {
    /// Combine a listing row with the data extracted from its page.
    pub fn from_parts(entry: ListingEntry, enrichment: Enrichment) -> Self {
        Self {
            title: entry.title,
            url: entry.link,
            thumbnail: enrichment.thumbnail,
            preview: enrichment.preview,
        }
    }
}
