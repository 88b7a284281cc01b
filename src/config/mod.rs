//! Configuration management for the gallwatch crawler
//!
//! Settings start from [`Config::default`], may be replaced by a TOML file
//! ([`Config::from_file`]) and are finally overridden by `GALLWATCH_*`
//! environment variables ([`Config::apply_env`]). Run tunables (lookback
//! months, page count) are command-line arguments and do not live here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::utils::retry::RetryConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transport and pacing
    pub crawler: CrawlerConfig,

    /// Which board to crawl
    pub board: BoardConfig,

    /// CSS selectors for listing and post pages
    pub selectors: SelectorConfig,

    /// Result file location
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Crawler-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Rate limit (requests per second)
    pub rate_limit: u32,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,

    /// Upper bound for one navigation including retries, in seconds
    pub navigation_timeout_secs: u64,

    /// Retry attempts for 429/5xx responses and transport timeouts
    pub max_retries: u32,

    /// Base backoff delay in milliseconds
    pub retry_base_delay_ms: u64,

    /// Fixed user agent; a realistic browser agent is rotated when unset
    pub user_agent: Option<String>,

    /// Lower bound of the randomized pause between page loads
    pub min_delay_ms: u64,

    /// Upper bound of the randomized pause between page loads
    pub max_delay_ms: u64,

    /// Stop paginating after this many consecutive pages without an
    /// in-window post. Unset scans every requested page.
    pub stop_after_empty_pages: Option<u32>,

    /// Rewrite the result file after this many visited posts
    pub flush_every: usize,
}

/// Board configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Listing URL without the page parameter
    pub listing_url: String,

    /// Origin post links must belong to; defaults to the listing origin
    pub site_origin: Option<String>,
}

/// Selectors used by the listing and post extraction schemas
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub post_link: String,
    pub listing_date: String,
    /// Attribute carrying the full timestamp on date cells
    pub date_attribute: String,
    pub post_title: String,
    pub post_content: String,
    pub comment: String,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving result files
    pub dir: PathBuf,

    /// File name prefix; files are named `{prefix}_{N}months.json`
    pub file_prefix: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            rate_limit: 2,
            request_timeout_secs: 30,
            navigation_timeout_secs: 90,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            user_agent: None,
            min_delay_ms: 500,
            max_delay_ms: 1500,
            stop_after_empty_pages: None,
            flush_every: 1,
        }
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            listing_url: String::from("https://gall.dcinside.com/board/lists/?id=wow_new3"),
            site_origin: None,
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            post_link: String::from(".gall_tit a:first-child"),
            listing_date: String::from(".gall_date"),
            date_attribute: String::from("title"),
            post_title: String::from(".title_subject"),
            post_content: String::from(".write_div"),
            comment: String::from(".comment_box .usertxt"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            file_prefix: String::from("wow_reviews"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Override fields from `GALLWATCH_*` environment variables
    pub fn apply_env(&mut self) {
        if let Some(v) = env_parse("GALLWATCH_RATE_LIMIT") {
            self.crawler.rate_limit = v;
        }
        if let Some(v) = env_parse("GALLWATCH_REQUEST_TIMEOUT") {
            self.crawler.request_timeout_secs = v;
        }
        if let Some(v) = env_parse("GALLWATCH_NAVIGATION_TIMEOUT") {
            self.crawler.navigation_timeout_secs = v;
        }
        if let Some(v) = env_parse("GALLWATCH_MAX_RETRIES") {
            self.crawler.max_retries = v;
        }
        if let Some(v) = env_string("GALLWATCH_USER_AGENT") {
            self.crawler.user_agent = Some(v);
        }
        if let Some(v) = env_parse("GALLWATCH_MIN_DELAY_MS") {
            self.crawler.min_delay_ms = v;
        }
        if let Some(v) = env_parse("GALLWATCH_MAX_DELAY_MS") {
            self.crawler.max_delay_ms = v;
        }
        if let Some(v) = env_string("GALLWATCH_LISTING_URL") {
            self.board.listing_url = v;
        }
        if let Some(v) = env_string("GALLWATCH_SITE_ORIGIN") {
            self.board.site_origin = Some(v);
        }
        if let Some(v) = env_string("GALLWATCH_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(v);
        }
        if let Some(v) = env_string("GALLWATCH_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = env_string("GALLWATCH_LOG_FORMAT") {
            self.logging.format = v;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.crawler.rate_limit == 0 {
            anyhow::bail!("rate_limit must be greater than 0");
        }

        if self.crawler.request_timeout_secs == 0 || self.crawler.navigation_timeout_secs == 0 {
            anyhow::bail!("timeouts must be greater than 0");
        }

        if self.crawler.max_delay_ms < self.crawler.min_delay_ms {
            anyhow::bail!(
                "max_delay_ms ({}) must be >= min_delay_ms ({})",
                self.crawler.max_delay_ms,
                self.crawler.min_delay_ms
            );
        }

        if self.crawler.flush_every == 0 {
            anyhow::bail!("flush_every must be greater than 0");
        }

        if self.crawler.stop_after_empty_pages == Some(0) {
            anyhow::bail!("stop_after_empty_pages must be greater than 0 when set");
        }

        let listing = self.listing_url()?;
        if !matches!(listing.scheme(), "http" | "https") {
            anyhow::bail!("listing_url must be an http(s) URL: {listing}");
        }

        self.site_origin()?;

        if self.output.file_prefix.trim().is_empty() {
            anyhow::bail!("output.file_prefix must not be empty");
        }

        Ok(())
    }

    pub fn listing_url(&self) -> Result<Url> {
        Url::parse(&self.board.listing_url)
            .with_context(|| format!("Invalid listing_url: {}", self.board.listing_url))
    }

    /// Origin post links must share, e.g. `https://gall.dcinside.com`
    pub fn site_origin(&self) -> Result<Url> {
        match &self.board.site_origin {
            Some(origin) => {
                Url::parse(origin).with_context(|| format!("Invalid site_origin: {origin}"))
            }
            None => {
                let listing = self.listing_url()?;
                let origin = listing.origin().ascii_serialization();
                Url::parse(&origin).with_context(|| format!("Listing URL has no origin: {listing}"))
            }
        }
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.crawler.request_timeout_secs)
    }

    /// Get navigation timeout as Duration
    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.crawler.navigation_timeout_secs)
    }

    #[must_use]
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::with_delays(
            self.crawler.max_retries,
            self.crawler.retry_base_delay_ms,
            30_000,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_rate_limit() {
        let mut config = Config::default();
        config.crawler.rate_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_delay_bounds_must_be_ordered() {
        let mut config = Config::default();
        config.crawler.min_delay_ms = 2000;
        config.crawler.max_delay_ms = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_listing_url_must_be_http() {
        let mut config = Config::default();
        config.board.listing_url = "ftp://gall.dcinside.com/board".into();
        assert!(config.validate().is_err());

        config.board.listing_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_site_origin_defaults_to_listing_origin() {
        let config = Config::default();
        assert_eq!(
            config.site_origin().unwrap().as_str(),
            "https://gall.dcinside.com/"
        );
    }

    #[test]
    fn test_timeout_conversion() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.navigation_timeout(), Duration::from_secs(90));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            rate_limit = 5

            [board]
            listing_url = "https://gall.dcinside.com/board/lists/?id=lostark"
            "#,
        )
        .unwrap();

        assert_eq!(config.crawler.rate_limit, 5);
        assert_eq!(config.crawler.max_retries, 3);
        assert_eq!(config.selectors.post_title, ".title_subject");
        assert!(config.validate().is_ok());
    }
}
