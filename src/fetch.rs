//! Page retrieval over HTTP.
//!
//! Every network access of the scraper goes through [`PageFetcher`], which
//! turns a URL into an HTML body. [`HttpFetcher`] is the production
//! implementation on top of `reqwest`; decorators such as
//! [`crate::retry::RetryFetch`] wrap it transparently.

use crate::config::Settings;
use crate::error::{Result, ScrapeError};
use reqwest::Client;
use std::future::Future;
use tracing::{debug, instrument};

/// Retrieves the HTML body of a page.
///
/// A non-success status, a timeout and a transport error are all reported as
/// `Err`; callers decide whether that is fatal (listing) or degraded (article).
pub trait PageFetcher: Send + Sync {
    fn fetch_html(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

/// `reqwest`-backed fetcher with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build the HTTP client from the timeout and user agent in `settings`.
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        debug!(bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

#[cfg(test)]
pub mod testing {
    //! In-memory fetcher and HTML builders shared by the unit tests.

    use super::PageFetcher;
    use crate::error::{Result, ScrapeError};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, RwLock};

    /// Serves pages from a URL → HTML map. Unknown URLs answer `503`, a transient failure.
    #[derive(Debug, Clone, Default)]
    pub struct StaticFetcher {
        pages: Arc<RwLock<HashMap<String, String>>>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl StaticFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_page(self, url: &str, html: impl Into<String>) -> Self {
            self.set_page(url, html);
            self
        }

        pub fn set_page(&self, url: &str, html: impl Into<String>) {
            self.pages
                .write()
                .unwrap()
                .insert(url.to_string(), html.into());
        }

        pub fn remove_page(&self, url: &str) {
            self.pages.write().unwrap().remove(url);
        }

        pub fn request_count(&self, url: &str) -> usize {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|requested| requested.as_str() == url)
                .count()
        }
    }

    impl PageFetcher for StaticFetcher {
        async fn fetch_html(&self, url: &str) -> Result<String> {
            self.requests.lock().unwrap().push(url.to_string());
            self.pages
                .read()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| ScrapeError::Status {
                    url: url.to_string(),
                    status: 503,
                })
        }
    }

    /// A listing page in Hacker News markup with one `tr.athing` row per entry.
    pub fn listing_html(rows: &[(&str, &str)]) -> String {
        let mut html = String::from("<html><body><table>");
        for (i, (title, href)) in rows.iter().enumerate() {
            html.push_str(&format!(
                "<tr class=\"athing\" id=\"{id}\">\
                 <td class=\"title\"><span class=\"rank\">{id}.</span></td>\
                 <td class=\"votelinks\"><a href=\"vote?id={id}\">up</a></td>\
                 <td class=\"title\"><span class=\"titleline\"><a href=\"{href}\">{title}</a></span></td>\
                 </tr>\
                 <tr><td colspan=\"2\"></td><td class=\"subtext\">1 point</td></tr>",
                id = i + 1,
            ));
        }
        html.push_str("</table></body></html>");
        html
    }

    /// An article page with optional Open Graph image, description and first image.
    pub fn article_html(
        og_image: Option<&str>,
        description: Option<&str>,
        img_src: Option<&str>,
        body: &str,
    ) -> String {
        let mut head = String::new();
        if let Some(content) = og_image {
            head.push_str(&format!("<meta property=\"og:image\" content=\"{content}\">"));
        }
        if let Some(content) = description {
            head.push_str(&format!("<meta name=\"description\" content=\"{content}\">"));
        }
        let img = img_src
            .map(|src| format!("<img src=\"{src}\">"))
            .unwrap_or_default();
        format!("<html><head>{head}</head><body>{img}<p>{body}</p></body></html>")
    }
}
