//! Command-line interface definitions for HN Digest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Scraper options are optional overrides on top of the YAML settings file
//! (see [`crate::config::Settings`]); anything left unset keeps the file or
//! built-in default.

use clap::Parser;

/// Command-line arguments for the HN Digest service.
///
/// # Examples
///
/// ```sh
/// # Serve on the default port with built-in settings
/// hn_digest
///
/// # Use a settings file and refresh every five minutes
/// hn_digest --config ./hn_digest.yaml --refresh-interval-secs 300
///
/// # Port from the environment
/// PORT=3000 hn_digest
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Address to bind the HTTP server to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Base URL of the listing site (overrides the settings file)
    #[arg(long, env = "HN_DIGEST_BASE_URL")]
    pub base_url: Option<String>,

    /// Seconds between full cache refreshes
    #[arg(long, env = "HN_DIGEST_REFRESH_INTERVAL_SECS")]
    pub refresh_interval_secs: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// Number of article pages enriched concurrently
    #[arg(long)]
    pub enrich_concurrency: Option<usize>,

    /// Retries per request after the first failure
    #[arg(long)]
    pub max_retries: Option<usize>,
}
