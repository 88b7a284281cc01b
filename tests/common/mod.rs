//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

use gallwatch::config::Config;
use gallwatch::crawler::{Crawler, PolitenessDelay};
use gallwatch::render::{
    ExtractionSchema, Extracted, PageRenderer, RequestFilter, WaitPolicy,
};
use gallwatch::utils::error::{ExtractionError, NavigationError};

/// Test fixture paths
const FIXTURES_DIR: &str = "tests/fixtures/html";

pub const LISTING_URL: &str = "https://gall.dcinside.com/board/lists/?id=wow_new3";

pub fn load_fixture(filename: &str) -> String {
    let path = format!("{FIXTURES_DIR}/{filename}");
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to load fixture: {path}"))
}

pub fn page_url(page: u32) -> String {
    format!("{LISTING_URL}&page={page}")
}

pub fn post_url(no: u32) -> String {
    format!("https://gall.dcinside.com/board/view/?id=wow_new3&no={no}")
}

/// Listing pages 1 and 2 plus the three recent posts they link to
pub fn board() -> FakeRenderer {
    FakeRenderer::new()
        .with_page(&page_url(1), load_fixture("listing_page1.html"))
        .with_page(&page_url(2), load_fixture("listing_page2.html"))
        .with_page(&post_url(101), load_fixture("post_with_comments.html"))
        .with_page(&post_url(100), load_fixture("post_no_comments.html"))
        .with_page(&post_url(98), load_fixture("post_with_comments.html"))
}

/// Crawler writing into `output_dir` without politeness pauses
pub fn crawler(output_dir: &Path) -> Crawler {
    crawler_with(Config::default(), output_dir)
}

pub fn crawler_with(mut config: Config, output_dir: &Path) -> Crawler {
    config.output.dir = output_dir.to_path_buf();
    Crawler::new(&config)
        .unwrap()
        .with_delay(PolitenessDelay::disabled())
}

/// In-memory renderer serving fixed HTML per URL
///
/// Counters are shared, so clones observe the same navigations and closes
/// after the renderer has been moved into a crawl.
#[derive(Clone, Default)]
pub struct FakeRenderer {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    hanging: HashSet<String>,
    current: Option<(Url, String)>,
    closed: bool,
    pub navigations: Arc<Mutex<Vec<String>>>,
    pub closes: Arc<AtomicUsize>,
    pub filter: Arc<Mutex<Option<RequestFilter>>>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    /// Answer `url` with a 503
    pub fn failing_on(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn panicking_on(mut self, url: &str) -> Self {
        self.panicking.insert(url.to_string());
        self
    }

    /// Never finish navigating to `url`
    pub fn hanging_on(mut self, url: &str) -> Self {
        self.hanging.insert(url.to_string());
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn installed_filter(&self) -> Option<RequestFilter> {
        self.filter.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn navigate(&mut self, url: &str, _wait: WaitPolicy) -> Result<(), NavigationError> {
        if self.closed {
            return Err(NavigationError::SessionClosed);
        }
        self.navigations.lock().unwrap().push(url.to_string());

        if self.panicking.contains(url) {
            panic!("renderer crashed while loading {url}");
        }
        if self.hanging.contains(url) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(url) {
            return Err(NavigationError::Status {
                url: url.to_string(),
                status: 503,
            });
        }

        let html = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| NavigationError::Status {
                url: url.to_string(),
                status: 404,
            })?;
        let parsed = Url::parse(url).map_err(|_| NavigationError::InvalidUrl(url.to_string()))?;
        self.current = Some((parsed, html));
        Ok(())
    }

    async fn evaluate(&self, schema: &ExtractionSchema) -> Result<Extracted, ExtractionError> {
        let (url, html) = self.current.as_ref().ok_or(ExtractionError::NoDocument)?;
        Ok(schema.evaluate(html, Some(url)))
    }

    fn intercept_requests(&mut self, filter: RequestFilter) {
        *self.filter.lock().unwrap() = Some(filter);
    }

    async fn close(&mut self) -> Result<(), NavigationError> {
        self.closed = true;
        self.current = None;
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
