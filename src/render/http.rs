//! HTTP-backed rendering session
//!
//! [`HttpRenderer`] loads documents with a plain HTTP client and evaluates
//! extraction schemas against the returned HTML. It never fetches
//! subresources, so the installed request filter only ever sees the document
//! request itself. Features:
//! - User-Agent rotation
//! - Rate limiting with governor
//! - Retry with exponential backoff on 429/5xx and transport timeouts
//! - UTF-8 decoding with EUC-KR fallback
//! - The previously loaded page is sent as referer

use async_trait::async_trait;
use encoding_rs::{EUC_KR, UTF_8};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use rand::seq::SliceRandom;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER, USER_AGENT},
    Client,
};
use std::num::NonZeroU32;
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::render::{
    ExtractionSchema, Extracted, PageRenderer, RequestDecision, RequestFilter, ResourceType,
    WaitPolicy,
};
use crate::utils::error::{ExtractionError, NavigationError};
use crate::utils::retry::{with_retry_if, RetryConfig};

/// Pool of realistic User-Agent strings for rotation
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// A document loaded into the session
#[derive(Debug, Clone)]
struct LoadedPage {
    url: Url,
    html: String,
}

pub struct HttpRenderer {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Rate limiter to control request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    retry: RetryConfig,

    /// Per-request timeout
    timeout: Duration,

    /// Fixed user agent; rotated from [`USER_AGENTS`] when `None`
    user_agent: Option<String>,

    filter: RequestFilter,

    current: Option<LoadedPage>,

    closed: bool,
}

impl HttpRenderer {
    /// Create a renderer from the crawler configuration
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Http` if the HTTP client cannot be created
    pub fn new(config: &Config) -> Result<Self, NavigationError> {
        Self::with_settings(
            config.crawler.rate_limit,
            config.retry(),
            config.request_timeout(),
            config.crawler.user_agent.clone(),
        )
    }

    /// Create a renderer with explicit settings
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Http` if the HTTP client cannot be created
    pub fn with_settings(
        requests_per_second: u32,
        retry: RetryConfig,
        timeout: Duration,
        user_agent: Option<String>,
    ) -> Result<Self, NavigationError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .cookie_store(true)
            .build()?;

        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            client,
            rate_limiter,
            retry,
            timeout,
            user_agent,
            filter: RequestFilter::allow_all(),
            current: None,
            closed: false,
        })
    }

    /// URL of the current document after redirects
    pub fn current_url(&self) -> Option<&Url> {
        self.current.as_ref().map(|page| &page.url)
    }

    async fn fetch_document(
        &self,
        url: &Url,
        referer: Option<&Url>,
    ) -> Result<LoadedPage, NavigationError> {
        let response = self
            .client
            .get(url.clone())
            .headers(self.build_headers(referer))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NavigationError::Timeout {
                        url: url.to_string(),
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    NavigationError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NavigationError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();
        let bytes = response.bytes().await?;

        Ok(LoadedPage {
            url: final_url,
            html: decode_bytes(&bytes, &content_type)?,
        })
    }

    fn build_headers(&self, referer: Option<&Url>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        let agent = match &self.user_agent {
            Some(agent) => HeaderValue::from_str(agent).ok(),
            None => Some(HeaderValue::from_static(random_user_agent())),
        };
        if let Some(agent) = agent {
            headers.insert(USER_AGENT, agent);
        }

        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"),
        );

        if let Some(value) = referer.and_then(|r| HeaderValue::from_str(r.as_str()).ok()) {
            headers.insert(REFERER, value);
        }

        headers
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn navigate(&mut self, url: &str, wait: WaitPolicy) -> Result<(), NavigationError> {
        if self.closed {
            return Err(NavigationError::SessionClosed);
        }

        let target = Url::parse(url).map_err(|_| NavigationError::InvalidUrl(url.to_string()))?;

        let resource = ResourceType::from_url(&target);
        if self.filter.decide(resource) == RequestDecision::Abort {
            tracing::debug!(url = %target, resource = resource.as_str(), "Request aborted by filter");
            return Err(NavigationError::Blocked {
                url: url.to_string(),
                resource: resource.as_str().to_string(),
            });
        }

        tracing::trace!(url = %target, wait = ?wait, "Navigating");

        let previous = self.current.as_ref().map(|page| page.url.clone());
        let this = &*self;
        let target = &target;
        let referer = previous.as_ref();
        let page = with_retry_if(
            &this.retry,
            move || async move {
                this.rate_limiter.until_ready().await;
                this.fetch_document(target, referer).await
            },
            NavigationError::is_retryable,
        )
        .await?;

        tracing::debug!(url = %page.url, bytes = page.html.len(), "Page loaded");
        self.current = Some(page);
        Ok(())
    }

    async fn evaluate(&self, schema: &ExtractionSchema) -> Result<Extracted, ExtractionError> {
        let page = self.current.as_ref().ok_or(ExtractionError::NoDocument)?;
        tracing::trace!(url = %page.url, schema = schema.name(), "Evaluating schema");
        Ok(schema.evaluate(&page.html, Some(&page.url)))
    }

    fn intercept_requests(&mut self, filter: RequestFilter) {
        self.filter = filter;
    }

    async fn close(&mut self) -> Result<(), NavigationError> {
        self.closed = true;
        self.current = None;
        Ok(())
    }
}

/// Get a random user agent from the pool
fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0])
}

/// Decode bytes to a UTF-8 string
///
/// 1. Honor an explicit charset in the Content-Type header
/// 2. Try UTF-8
/// 3. Fall back to EUC-KR
///
/// # Errors
///
/// Returns `NavigationError::Decode` if no strategy succeeds
pub fn decode_bytes(bytes: &[u8], content_type: &str) -> Result<String, NavigationError> {
    let content_type = content_type.to_lowercase();

    if content_type.contains("charset=euc-kr") {
        return decode_with(EUC_KR, bytes);
    }

    if content_type.contains("charset=utf-8") {
        return decode_with(UTF_8, bytes);
    }

    if let Ok(text) = decode_with(UTF_8, bytes) {
        return Ok(text);
    }

    decode_with(EUC_KR, bytes)
        .map_err(|_| NavigationError::Decode("Failed to decode content with UTF-8 or EUC-KR".into()))
}

fn decode_with(
    encoding: &'static encoding_rs::Encoding,
    bytes: &[u8],
) -> Result<String, NavigationError> {
    let (cow, _encoding, had_errors) = encoding.decode(bytes);

    if had_errors {
        return Err(NavigationError::Decode(format!(
            "{} decoding errors",
            encoding.name()
        )));
    }

    Ok(cow.into_owned())
}
