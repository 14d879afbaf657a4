//! Article page enrichment.
//!
//! Each listing entry is enriched with a thumbnail and a short text preview
//! taken from the article's own page. The page is fetched once and both
//! extractions run against the same parsed document.
//!
//! # Thumbnail
//!
//! 1. `content` of the Open Graph image meta tag, used verbatim
//! 2. `src` of the first image; a relative value is appended to the article
//!    URL as plain string concatenation (not RFC 3986 resolution)
//! 3. the configured fallback thumbnail
//!
//! # Preview
//!
//! 1. `content` of the description meta tag
//! 2. the visible text of the page body
//!
//! The text is cut to its first 40 words joined by single spaces, then to 300
//! characters, and always gets a trailing `...`. When the page cannot be
//! fetched the preview is exactly [`NO_PREVIEW`], with no ellipsis.
//!
//! Enrichment never fails: every problem degrades to a fallback.

use crate::config::CompiledLayout;
use crate::fetch::PageFetcher;
use crate::models::Enrichment;
use crate::utils::{is_absolute_url, truncate_for_log};
use itertools::Itertools;
use scraper::{ElementRef, Html};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Preview used when the article page could not be retrieved.
pub const NO_PREVIEW: &str = "No preview available";

const MAX_PREVIEW_WORDS: usize = 40;
const MAX_PREVIEW_CHARS: usize = 300;
const ELLIPSIS: &str = "...";

/// Elements whose text never shows up on a rendered page.
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Fetches article pages and derives their [`Enrichment`].
pub struct ArticleEnricher<F> {
    fetcher: Arc<F>,
    layout: Arc<CompiledLayout>,
    fallback_thumbnail: Arc<str>,
}

impl<F> Clone for ArticleEnricher<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            layout: Arc::clone(&self.layout),
            fallback_thumbnail: Arc::clone(&self.fallback_thumbnail),
        }
    }
}

impl<F: PageFetcher> ArticleEnricher<F> {
    pub fn new(fetcher: Arc<F>, layout: Arc<CompiledLayout>, fallback_thumbnail: &str) -> Self {
        Self {
            fetcher,
            layout,
            fallback_thumbnail: Arc::from(fallback_thumbnail),
        }
    }

    /// Fetch `url` once and extract thumbnail and preview from it.
    #[instrument(level = "debug", skip(self))]
    pub async fn enrich(&self, url: &str) -> Enrichment {
        match self.fetcher.fetch_html(url).await {
            Ok(html) => self.enrich_document(&html, url),
            Err(e) => {
                warn!(%url, error = %e, "Article fetch failed; using fallbacks");
                Enrichment {
                    thumbnail: self.fallback_thumbnail.to_string(),
                    preview: NO_PREVIEW.to_string(),
                }
            }
        }
    }

    /// Run both extractions against an already fetched article page.
    pub fn enrich_document(&self, html: &str, url: &str) -> Enrichment {
        let document = Html::parse_document(html);

        let thumbnail = extract_thumbnail(&document, &self.layout, url).unwrap_or_else(|| {
            debug!(%url, "No thumbnail found; using fallback");
            self.fallback_thumbnail.to_string()
        });
        let preview = extract_preview(&document, &self.layout);
        debug!(%url, %thumbnail, preview = %truncate_for_log(&preview, 80), "Enriched article");

        Enrichment { thumbnail, preview }
    }
}

/// Thumbnail URL of an article page, or `None` when nothing usable is present.
pub fn extract_thumbnail(
    document: &Html,
    layout: &CompiledLayout,
    article_url: &str,
) -> Option<String> {
    let og_image = document
        .select(&layout.og_image)
        .filter_map(|meta| meta.value().attr("content"))
        .find(|content| !content.trim().is_empty());
    if let Some(content) = og_image {
        return Some(content.to_string());
    }

    let src = document
        .select(&layout.image)
        .next()
        .and_then(|img| img.value().attr("src"))
        .filter(|src| !src.trim().is_empty())?;

    if is_absolute_url(src) {
        Some(src.to_string())
    } else {
        Some(format!("{article_url}{src}"))
    }
}

/// Truncated preview text of an article page.
pub fn extract_preview(document: &Html, layout: &CompiledLayout) -> String {
    let description = document
        .select(&layout.description)
        .filter_map(|meta| meta.value().attr("content"))
        .find(|content| !content.trim().is_empty());

    let text = match description {
        Some(content) => content.to_string(),
        None => document
            .select(&layout.body)
            .next()
            .map(visible_text)
            .unwrap_or_default(),
    };

    truncate_preview(&text)
}

/// Apply the word limit, then the character limit, then the ellipsis.
pub fn truncate_preview(text: &str) -> String {
    let mut preview = text.split_whitespace().take(MAX_PREVIEW_WORDS).join(" ");
    if let Some((cut, _)) = preview.char_indices().nth(MAX_PREVIEW_CHARS) {
        preview.truncate(cut);
    }
    preview.push_str(ELLIPSIS);
    preview
}

/// Concatenated text nodes below `element`, skipping script-like elements.
fn visible_text(element: ElementRef<'_>) -> String {
    element
        .descendants()
        .filter_map(|node| node.value().as_text().map(|text| (node, text)))
        .filter(|(node, _)| {
            !node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| INVISIBLE_ELEMENTS.contains(&el.name()))
            })
        })
        .map(|(_, text)| &**text)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FALLBACK_THUMBNAIL, SiteLayout};
    use crate::fetch::testing::{StaticFetcher, article_html};

    const ARTICLE: &str = "https://blog.test/post/";

    fn layout() -> CompiledLayout {
        SiteLayout::default().compile().unwrap()
    }

    fn enricher(fetcher: StaticFetcher) -> ArticleEnricher<StaticFetcher> {
        ArticleEnricher::new(Arc::new(fetcher), Arc::new(layout()), FALLBACK_THUMBNAIL)
    }

    fn words(count: usize, width: usize) -> Vec<String> {
        (0..count).map(|i| format!("{i:0width$}")).collect()
    }

    #[test]
    fn test_short_preview_gets_ellipsis() {
        assert_eq!(truncate_preview("A tiny article"), "A tiny article...");
    }

    #[test]
    fn test_preview_keeps_first_forty_words() {
        let text = words(55, 4).join(" ");
        let preview = truncate_preview(&text);

        let expected = format!("{}...", words(40, 4).join(" "));
        assert_eq!(preview, expected);
    }

    #[test]
    fn test_preview_word_cut_happens_before_char_cut() {
        // 40 ten-char words joined are 439 chars, so the char cap applies too.
        let text = words(45, 10).join(" ");
        let preview = truncate_preview(&text);

        let joined = words(40, 10).join(" ");
        assert_eq!(preview, format!("{}...", &joined[..300]));
        assert_eq!(preview.chars().count(), 303);
    }

    #[test]
    fn test_preview_char_cut_respects_utf8() {
        let text = "é".repeat(350);
        let preview = truncate_preview(&text);

        assert_eq!(preview.chars().count(), 303);
        assert!(preview.ends_with("é..."));
    }

    #[test]
    fn test_preview_collapses_whitespace() {
        assert_eq!(truncate_preview("  one\n\ttwo   three "), "one two three...");
    }

    #[test]
    fn test_empty_text_is_just_ellipsis() {
        assert_eq!(truncate_preview(""), "...");
    }

    #[test]
    fn test_thumbnail_prefers_og_image() {
        let html = article_html(
            Some("https://cdn.test/og.png"),
            None,
            Some("https://cdn.test/first.png"),
            "body",
        );
        let doc = Html::parse_document(&html);

        assert_eq!(
            extract_thumbnail(&doc, &layout(), ARTICLE).as_deref(),
            Some("https://cdn.test/og.png")
        );
    }

    #[test]
    fn test_thumbnail_falls_back_to_first_image() {
        let html = article_html(Some(""), None, Some("https://cdn.test/first.png"), "body");
        let doc = Html::parse_document(&html);

        assert_eq!(
            extract_thumbnail(&doc, &layout(), ARTICLE).as_deref(),
            Some("https://cdn.test/first.png")
        );
    }

    #[test]
    fn test_relative_image_is_concatenated_onto_article_url() {
        let html = article_html(None, None, Some("img/hero.png"), "body");
        let doc = Html::parse_document(&html);

        assert_eq!(
            extract_thumbnail(&doc, &layout(), ARTICLE).as_deref(),
            Some("https://blog.test/post/img/hero.png")
        );
    }

    #[test]
    fn test_no_thumbnail_source() {
        let doc = Html::parse_document(&article_html(None, None, None, "body"));
        assert_eq!(extract_thumbnail(&doc, &layout(), ARTICLE), None);
    }

    #[test]
    fn test_preview_prefers_description() {
        let html = article_html(None, Some("A summary of the post"), None, "Body text here");
        let doc = Html::parse_document(&html);

        assert_eq!(extract_preview(&doc, &layout()), "A summary of the post...");
    }

    #[test]
    fn test_blank_description_falls_back_to_body() {
        let html = article_html(None, Some("   "), None, "Body wins");
        let doc = Html::parse_document(&html);

        assert_eq!(extract_preview(&doc, &layout()), "Body wins...");
    }

    #[test]
    fn test_preview_falls_back_to_visible_body_text() {
        let html = "<html><head><title>t</title></head><body>\
                    <script>var tracking = 1;</script>\
                    <h1>Hello</h1><p>from the <b>body</b></p>\
                    <style>p { color: red }</style></body></html>";
        let doc = Html::parse_document(html);

        assert_eq!(extract_preview(&doc, &layout()), "Hellofrom the body...");
    }

    #[test]
    fn test_long_body_without_description() {
        let body = words(500, 9).join(" ");
        let doc = Html::parse_document(&article_html(None, None, None, &body));
        let preview = extract_preview(&doc, &layout());

        let first_forty = words(40, 9).join(" ");
        assert!(preview.ends_with("..."));
        assert!(preview.chars().count() <= 303);
        assert!(first_forty.starts_with(preview.trim_end_matches("...")));
        assert!(preview.split_whitespace().count() <= 40);
    }

    #[tokio::test]
    async fn test_enrich_fetches_article_once() {
        let fetcher = StaticFetcher::new().with_page(
            ARTICLE,
            article_html(Some("https://cdn.test/og.png"), Some("Summary"), None, "body"),
        );
        let enrichment = enricher(fetcher.clone()).enrich(ARTICLE).await;

        assert_eq!(enrichment.thumbnail, "https://cdn.test/og.png");
        assert_eq!(enrichment.preview, "Summary...");
        assert_eq!(fetcher.request_count(ARTICLE), 1);
    }

    #[tokio::test]
    async fn test_enrich_missing_thumbnail_uses_fallback() {
        let fetcher = StaticFetcher::new().with_page(ARTICLE, article_html(None, None, None, "Text"));
        let enrichment = enricher(fetcher).enrich(ARTICLE).await;

        assert_eq!(enrichment.thumbnail, FALLBACK_THUMBNAIL);
        assert_eq!(enrichment.preview, "Text...");
    }

    #[tokio::test]
    async fn test_enrich_fetch_failure_degrades() {
        let enrichment = enricher(StaticFetcher::new()).enrich(ARTICLE).await;

        assert_eq!(enrichment.thumbnail, FALLBACK_THUMBNAIL);
        assert_eq!(enrichment.preview, NO_PREVIEW);
    }
}
