//! Runtime settings and the site extraction strategy.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! CLI flags. The [`SiteLayout`] holds every CSS selector that ties the
//! scraper to one site's markup, so pointing the service at a different site
//! means swapping the layout rather than touching the pipeline.
//!
//! # Example settings file
//!
//! ```yaml
//! base_url: https://news.ycombinator.com/
//! listing_path: news?p={page}
//! refresh_interval_secs: 600
//! enrich_concurrency: 4
//! layout:
//!   row_selector: tr.athing
//!   link_selector: td:nth-child(3) > span > a
//! ```

use crate::cli::Cli;
use crate::error::{Result, ScrapeError};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Image substituted whenever an article page yields no usable thumbnail.
pub const FALLBACK_THUMBNAIL: &str = "https://upload.wikimedia.org/wikipedia/commons/thumb/b/b2/Y_Combinator_logo.svg/1200px-Y_Combinator_logo.svg.png";

const PAGE_PLACEHOLDER: &str = "{page}";

/// CSS selectors describing one site's listing and article markup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteLayout {
    /// One match per listing row.
    pub row_selector: String,
    /// Title anchor inside a row; its text is the title, its `href` the link.
    pub link_selector: String,
    /// Open Graph image meta tag on an article page.
    pub og_image_selector: String,
    /// Image elements on an article page, the first one is the fallback thumbnail.
    pub image_selector: String,
    /// Description meta tag on an article page.
    pub description_selector: String,
    /// Element whose visible text is the preview fallback.
    pub body_selector: String,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            row_selector: "tr.athing".to_string(),
            link_selector: "td:nth-child(3) > span > a".to_string(),
            og_image_selector: "meta[property='og:image']".to_string(),
            image_selector: "img".to_string(),
            description_selector: "meta[name='description']".to_string(),
            body_selector: "body".to_string(),
        }
    }
}

impl SiteLayout {
    /// Parse every selector once so that the pipeline never re-parses them.
    pub fn compile(&self) -> Result<CompiledLayout> {
        Ok(CompiledLayout {
            row: parse_selector(&self.row_selector)?,
            link: parse_selector(&self.link_selector)?,
            og_image: parse_selector(&self.og_image_selector)?,
            image: parse_selector(&self.image_selector)?,
            description: parse_selector(&self.description_selector)?,
            body: parse_selector(&self.body_selector)?,
        })
    }
}

/// A [`SiteLayout`] with its selectors parsed.
#[derive(Debug, Clone)]
pub struct CompiledLayout {
    pub row: Selector,
    pub link: Selector,
    pub og_image: Selector,
    pub image: Selector,
    pub description: Selector,
    pub body: Selector,
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// All tunables of the scraper.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Origin the listing is served from. Relative links are resolved against it.
    pub base_url: String,
    /// Path of a listing page relative to `base_url`; `{page}` is replaced by the page number.
    pub listing_path: String,
    pub refresh_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
    pub enrich_concurrency: usize,
    pub fallback_thumbnail: String,
    pub user_agent: String,
    pub layout: SiteLayout,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "https://news.ycombinator.com/".to_string(),
            listing_path: "news?p={page}".to_string(),
            refresh_interval_secs: 600,
            request_timeout_secs: 10,
            max_retries: 2,
            retry_base_delay_ms: 500,
            enrich_concurrency: 4,
            fallback_thumbnail: FALLBACK_THUMBNAIL.to_string(),
            user_agent: concat!("hn_digest/", env!("CARGO_PKG_VERSION")).to_string(),
            layout: SiteLayout::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file, or the defaults when no path is given.
    ///
    /// Keys missing from the file keep their default values.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path)
            .await
            .map_err(|e| ScrapeError::Config(format!("cannot read {path}: {e}")))?;
        let settings = Self::from_yaml(&raw)?;
        info!(path, "Loaded settings file");
        Ok(settings)
    }

    /// Parse settings from YAML text.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).map_err(|e| ScrapeError::Config(e.to_string()))
    }

    /// Apply the CLI overrides that were actually given.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(secs) = cli.refresh_interval_secs {
            self.refresh_interval_secs = secs;
        }
        if let Some(secs) = cli.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(n) = cli.enrich_concurrency {
            self.enrich_concurrency = n;
        }
        if let Some(n) = cli.max_retries {
            self.max_retries = n;
        }
        self
    }

    /// Check invariants and normalise the base URL to end with `/`.
    pub fn validate(mut self) -> Result<Self> {
        Url::parse(&self.base_url)?;
        if !self.base_url.ends_with('/') {
            self.base_url.push('/');
        }
        if !self.listing_path.contains(PAGE_PLACEHOLDER) {
            return Err(ScrapeError::Config(format!(
                "listing_path `{}` has no {PAGE_PLACEHOLDER} placeholder",
                self.listing_path
            )));
        }
        if self.enrich_concurrency == 0 {
            return Err(ScrapeError::Config(
                "enrich_concurrency must be at least 1".to_string(),
            ));
        }
        if self.refresh_interval_secs == 0 {
            return Err(ScrapeError::Config(
                "refresh_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.fallback_thumbnail.is_empty() {
            return Err(ScrapeError::Config(
                "fallback_thumbnail must not be empty".to_string(),
            ));
        }
        Ok(self)
    }

    /// Absolute URL of the given listing page.
    pub fn listing_url(&self, page: u32) -> String {
        format!(
            "{}{}",
            self.base_url,
            self.listing_path.replace(PAGE_PLACEHOLDER, &page.to_string())
        )
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}
