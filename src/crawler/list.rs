//! Board listing crawler with pagination support
//!
//! Walks listing pages `1..=max_pages`, reads the post anchors and their
//! parallel date cells, and keeps the posts that belong to the board's
//! origin and fall inside the crawl window.

use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::crawler::delay::PolitenessDelay;
use crate::crawler::window::NO_DATE;
use crate::crawler::CrawlContext;
use crate::error::{Classify, Error, Result};
use crate::models::PostSummary;
use crate::render::{
    navigate_bounded, ExtractionSchema, Extracted, PageRenderer, ValueSource, WaitPolicy,
};

const LINKS: &str = "links";
const TITLES: &str = "titles";
const DATES: &str = "dates";

/// Builds listing page URLs from the board's base listing URL
#[derive(Debug, Clone)]
pub struct ListUrlBuilder {
    base: Url,
}

impl ListUrlBuilder {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// Listing URL for 1-based `page`, replacing any existing `page` parameter
    pub fn page_url(&self, page: u32) -> Url {
        let kept: Vec<(String, String)> = self
            .base
            .query_pairs()
            .filter(|(key, _)| key != "page")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        let mut url = self.base.clone();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("page", &page.to_string());
        url
    }
}

/// Listing page crawler
#[derive(Debug, Clone)]
pub struct ListingPaginator {
    urls: ListUrlBuilder,
    origin: Url,
    schema: ExtractionSchema,
    timeout: Duration,
    delay: PolitenessDelay,
    stop_after_empty_pages: Option<u32>,
}

impl ListingPaginator {
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid listing URL or site origin, and
    /// `Error::Extraction` for a malformed selector
    pub fn from_config(config: &Config) -> Result<Self> {
        let listing = config
            .listing_url()
            .map_err(|e| Error::config(format!("{e:#}")))?;
        let origin = config
            .site_origin()
            .map_err(|e| Error::config(format!("{e:#}")))?;

        let selectors = &config.selectors;
        let schema = ExtractionSchema::new("listing")
            .all(LINKS, &selectors.post_link, ValueSource::Href)?
            .all(TITLES, &selectors.post_link, ValueSource::Text)?
            .all(
                DATES,
                &selectors.listing_date,
                ValueSource::AttrOrText(selectors.date_attribute.clone()),
            )?;

        Ok(Self {
            urls: ListUrlBuilder::new(listing),
            origin,
            schema,
            timeout: config.navigation_timeout(),
            delay: PolitenessDelay::from_config(&config.crawler),
            stop_after_empty_pages: config.crawler.stop_after_empty_pages,
        })
    }

    /// Replace the pause between listing pages
    #[must_use]
    pub fn with_delay(mut self, delay: PolitenessDelay) -> Self {
        self.delay = delay;
        self
    }

    pub fn schema(&self) -> &ExtractionSchema {
        &self.schema
    }

    pub fn urls(&self) -> &ListUrlBuilder {
        &self.urls
    }

    /// Collect in-window posts from listing pages `1..=max_pages`
    ///
    /// Pages that fail to load are logged and skipped. Cancellation aborts
    /// the walk.
    ///
    /// # Errors
    ///
    /// Returns the first non-recoverable error (cancellation)
    pub async fn collect_candidates<R>(
        &self,
        renderer: &mut R,
        ctx: &mut CrawlContext,
        max_pages: u32,
    ) -> Result<Vec<PostSummary>>
    where
        R: PageRenderer + ?Sized,
    {
        let mut candidates = Vec::new();
        let mut empty_streak = 0u32;

        tracing::info!(
            max_pages = max_pages,
            cutoff = %ctx.window.cutoff(),
            "Starting listing scan"
        );

        for page in 1..=max_pages {
            if page > 1 {
                self.delay.wait(&ctx.cancel).await?;
            }

            let url = self.urls.page_url(page);
            match self.scan_page(renderer, ctx, &url).await {
                Ok(found) => {
                    ctx.stats.record_page();
                    tracing::info!(page = page, found = found.len(), "Listing page scanned");

                    if found.is_empty() {
                        empty_streak += 1;
                    } else {
                        empty_streak = 0;
                    }
                    candidates.extend(found);

                    if let Some(limit) = self.stop_after_empty_pages {
                        if empty_streak >= limit {
                            tracing::info!(
                                page = page,
                                empty_pages = empty_streak,
                                "No recent posts on consecutive pages, stopping"
                            );
                            break;
                        }
                    }
                }
                Err(e) if e.is_recoverable() => {
                    ctx.stats.record_page_failure();
                    tracing::warn!(
                        page = page,
                        url = %url,
                        category = %e.category(),
                        error = %e,
                        "Failed to scan listing page, skipping"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            candidates = candidates.len(),
            pages = ctx.stats.pages_scanned,
            failed_pages = ctx.stats.pages_failed,
            "Listing scan finished"
        );
        Ok(candidates)
    }

    async fn scan_page<R>(
        &self,
        renderer: &mut R,
        ctx: &mut CrawlContext,
        url: &Url,
    ) -> Result<Vec<PostSummary>>
    where
        R: PageRenderer + ?Sized,
    {
        navigate_bounded(
            renderer,
            url.as_str(),
            WaitPolicy::DomContentLoaded,
            self.timeout,
            &ctx.cancel,
        )
        .await?;

        let extracted = renderer.evaluate(&self.schema).await?;
        Ok(self.select(ctx, &extracted))
    }

    /// Turn an evaluated listing into in-window summaries
    ///
    /// Anchors and date cells are paired by position. Links outside the site
    /// origin, unparsable dates and posts older than the cutoff are dropped
    /// and counted in the run statistics.
    pub fn select(&self, ctx: &mut CrawlContext, extracted: &Extracted) -> Vec<PostSummary> {
        let links = extracted.all(LINKS);
        let titles = extracted.all(TITLES);
        let dates = extracted.all(DATES);

        let mut selected = Vec::new();

        for (index, link) in links.iter().enumerate() {
            if !self.is_same_origin(link) {
                ctx.stats.foreign_links += 1;
                tracing::trace!(link = %link, "Dropping link outside site origin");
                continue;
            }

            let raw_date = dates
                .get(index)
                .map(|d| d.trim())
                .filter(|d| !d.is_empty())
                .unwrap_or(NO_DATE)
                .to_string();

            let (date, parsed) = ctx.window.resolve(&raw_date);
            let published_at = match parsed {
                Ok(at) => at,
                Err(e) => {
                    ctx.stats.unparsable_dates += 1;
                    tracing::debug!(link = %link, error = %e, "Skipping post with unparsable date");
                    continue;
                }
            };

            if !ctx.window.contains(Some(published_at)) {
                ctx.stats.expired += 1;
                continue;
            }

            ctx.stats.candidates += 1;
            selected.push(PostSummary {
                title: titles.get(index).cloned().unwrap_or_default(),
                link: link.clone(),
                raw_date,
                date,
                published_at: Some(published_at),
            });
        }

        selected
    }

    fn is_same_origin(&self, link: &str) -> bool {
        Url::parse(link)
            .map(|url| url.origin() == self.origin.origin())
            .unwrap_or(false)
    }
}
