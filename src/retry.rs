//! Bounded retry with exponential backoff for page fetches.
//!
//! # Retry Strategy
//!
//! - Only transient failures are retried (timeouts, connection errors, 5xx, 429)
//! - Exponential backoff starting at the configured base delay
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd
//!
//! Once retries are exhausted the last error is returned unchanged, so the
//! caller's fallback policy applies exactly as it would without retries.

use crate::error::Result;
use crate::fetch::PageFetcher;
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

/// Wrapper that adds exponential backoff retry logic to any [`PageFetcher`].
///
/// # Backoff Strategy
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryFetch<T>
where
    T: PageFetcher,
{
    /// Wrap `inner`, allowing up to `max_retries` additional attempts per URL.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let fetcher = RetryFetch::new(HttpFetcher::new(&settings)?, 2, Duration::from_millis(500));
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX).min(16);
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + Duration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> PageFetcher for RetryFetch<T>
where
    T: PageFetcher,
{
    #[instrument(level = "debug", skip(self))]
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch_html(url).await {
                Ok(body) => return Ok(body),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    let elapsed_ms_total = total_t0.elapsed().as_millis();

                    if attempt > self.max_retries {
                        if self.max_retries > 0 {
                            error!(
                                attempt,
                                max = self.max_retries,
                                elapsed_ms_total,
                                error = %e,
                                "fetch exhausted retries"
                            );
                        }
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::fetch::testing::StaticFetcher;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `failures` calls, then succeeds.
    #[derive(Debug)]
    struct Flaky {
        failures: usize,
        calls: Arc<AtomicUsize>,
        error: fn() -> ScrapeError,
    }

    impl PageFetcher for Flaky {
        async fn fetch_html(&self, _url: &str) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err((self.error)())
            } else {
                Ok("<html></html>".to_string())
            }
        }
    }

    fn transient() -> ScrapeError {
        ScrapeError::Status {
            url: "https://a.test/".to_string(),
            status: 502,
        }
    }

    fn permanent() -> ScrapeError {
        ScrapeError::Status {
            url: "https://a.test/".to_string(),
            status: 404,
        }
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = RetryFetch::new(
            Flaky { failures: 2, calls: calls.clone(), error: transient },
            3,
            Duration::ZERO,
        );

        assert!(fetcher.fetch_html("https://a.test/").await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let inner = StaticFetcher::new();
        let fetcher = RetryFetch::new(inner.clone(), 2, Duration::ZERO);

        assert!(fetcher.fetch_html("https://missing.test/").await.is_err());
        assert_eq!(inner.request_count("https://missing.test/"), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = RetryFetch::new(
            Flaky { failures: 5, calls: calls.clone(), error: permanent },
            3,
            Duration::ZERO,
        );

        assert!(matches!(
            fetcher.fetch_html("https://a.test/").await,
            Err(ScrapeError::Status { status: 404, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_is_capped() {
        let fetcher = RetryFetch::new(StaticFetcher::new(), 10, Duration::from_secs(1));

        assert!(fetcher.backoff(1) >= Duration::from_secs(1));
        assert!(fetcher.backoff(10) <= Duration::from_secs(30) + Duration::from_millis(250));
    }
}
