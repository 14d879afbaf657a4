//! Error types for the scrape pipeline and the article cache.
//!
//! Failures fall into two tiers. Listing failures are fatal for a single
//! pipeline invocation and surface as [`ScrapeError::Listing`]. Article page
//! failures are degraded inside the enricher and never reach this type.

use reqwest::StatusCode;
use thiserror::Error;

/// Failures of the scrape pipeline, the article cache and settings validation.
///
/// [`ScrapeError::is_transient`] decides which variants
/// [`crate::retry::RetryFetch`] retries; the HTTP layer maps the rest onto
/// status codes.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to scrape listing page {page}: {source}")]
    Listing {
        page: u32,
        #[source]
        source: Box<ScrapeError>,
    },

    #[error("Invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Article cache is not ready")]
    NotReady,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScrapeError {
    /// Wrap any failure that happened while retrieving a listing page.
    pub fn listing(page: u32, source: ScrapeError) -> Self {
        ScrapeError::Listing {
            page,
            source: Box::new(source),
        }
    }

    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ScrapeError::Http(e) => e.is_timeout() || e.is_connect(),
            ScrapeError::Status { status, .. } => {
                StatusCode::from_u16(*status).is_ok_and(|status| {
                    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
                })
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_error_message_includes_page_and_cause() {
        let cause = ScrapeError::Status {
            url: "https://news.ycombinator.com/news?p=3".to_string(),
            status: 502,
        };
        let msg = ScrapeError::listing(3, cause).to_string();
        assert!(msg.contains("page 3"));
        assert!(msg.contains("status 502"));
    }

    #[test]
    fn test_transient_classification() {
        let status = |status| ScrapeError::Status {
            url: "https://a.test/".to_string(),
            status,
        };
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(404).is_transient());
        assert!(!ScrapeError::NotReady.is_transient());
        assert!(!ScrapeError::Config("bad".to_string()).is_transient());
    }

    #[test]
    fn test_not_ready_message() {
        assert_eq!(ScrapeError::NotReady.to_string(), "Article cache is not ready");
    }
}
