//! Time-windowed board crawling
//!
//! A run scans listing pages for posts inside the crawl window, visits each
//! post in discovery order, fans it out into output records and persists
//! them. All run state travels in an explicit [`CrawlContext`].
//!
//! Failure policy:
//! - a listing page or post that fails to load is logged and skipped;
//! - cancellation and persistence failures abort the run;
//! - records are flushed every `flush_every` posts and once more when the
//!   run ends, aborted or not;
//! - the rendering session is closed on every exit path, including panics.

pub mod assemble;
pub mod delay;
pub mod list;
pub mod oneshot;
pub mod post;
pub mod window;

pub use assemble::assemble;
pub use delay::PolitenessDelay;
pub use list::{ListUrlBuilder, ListingPaginator};
pub use oneshot::{fetch_once, fetch_once_with, FetchResponse};
pub use post::PostExtractor;
pub use window::CrawlWindow;

use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Classify, Error, Result};
use crate::models::CrawlStats;
use crate::render::{catching, CancelToken, PageRenderer, RenderSession, RequestFilter};
use crate::storage::{output_path, ResultSink};
use crate::utils::truncate_text;

/// State owned by one crawl run
#[derive(Debug)]
pub struct CrawlContext {
    pub window: CrawlWindow,
    pub sink: ResultSink,
    pub output_path: PathBuf,
    pub stats: CrawlStats,
    pub cancel: CancelToken,
}

impl CrawlContext {
    pub fn new(
        window: CrawlWindow,
        sink: ResultSink,
        output_path: PathBuf,
        cancel: CancelToken,
    ) -> Self {
        Self {
            window,
            sink,
            output_path,
            stats: CrawlStats::default(),
            cancel,
        }
    }

    /// Write every collected record to the output path
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush(&self.output_path)?;
        Ok(())
    }
}

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub output_path: PathBuf,
    pub cutoff: NaiveDateTime,
    pub stats: CrawlStats,
}

/// Main crawler structure
pub struct Crawler {
    paginator: ListingPaginator,
    extractor: PostExtractor,
    delay: PolitenessDelay,
    output_dir: PathBuf,
    file_prefix: String,
    flush_every: usize,
}

impl Crawler {
    /// Create a new crawler instance
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid
    pub fn new(config: &Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::config(format!("{e:#}")))?;

        Ok(Self {
            paginator: ListingPaginator::from_config(config)?,
            extractor: PostExtractor::new(&config.selectors, config.navigation_timeout())?,
            delay: PolitenessDelay::from_config(&config.crawler),
            output_dir: config.output.dir.clone(),
            file_prefix: config.output.file_prefix.clone(),
            flush_every: config.crawler.flush_every,
        })
    }

    /// Replace the pause used between listing pages and between posts
    #[must_use]
    pub fn with_delay(mut self, delay: PolitenessDelay) -> Self {
        self.paginator = self.paginator.with_delay(delay);
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Where a run with this lookback writes its results
    pub fn output_path(&self, months_back: u32) -> PathBuf {
        output_path(&self.output_dir, &self.file_prefix, months_back)
    }

    /// Run one crawl over listing pages `1..=max_pages`
    ///
    /// The renderer becomes the run's rendering session and is closed before
    /// this returns. A panic inside the run is resumed after the session is
    /// closed and the collected records are flushed.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the run (cancellation or persistence)
    pub async fn run<R>(
        &self,
        mut renderer: R,
        months_back: u32,
        max_pages: u32,
        reference: NaiveDateTime,
        cancel: CancelToken,
    ) -> Result<CrawlReport>
    where
        R: PageRenderer,
    {
        let window = CrawlWindow::new(reference, months_back);
        let path = self.output_path(months_back);
        let mut ctx = CrawlContext::new(
            window,
            ResultSink::new(self.flush_every),
            path,
            cancel,
        );

        tracing::info!(
            months_back = months_back,
            max_pages = max_pages,
            reference = %reference,
            cutoff = %window.cutoff(),
            output = %ctx.output_path.display(),
            "Starting crawl"
        );

        renderer.intercept_requests(RequestFilter::skip_heavy_assets());
        let mut session = RenderSession::open(renderer);

        let outcome = catching(self.crawl(session.renderer_mut(), &mut ctx, max_pages)).await;

        let flushed = ctx.flush();
        if let Err(e) = &flushed {
            tracing::error!(path = %ctx.output_path.display(), error = %e, "Final flush failed");
        }

        let result = session.finish(outcome).await;

        match result {
            Ok(()) => {
                flushed?;
                log_summary(&ctx.stats, &ctx.output_path);
                Ok(CrawlReport {
                    output_path: ctx.output_path,
                    cutoff: window.cutoff(),
                    stats: ctx.stats,
                })
            }
            Err(e) => {
                tracing::error!(
                    category = %e.category(),
                    error = %e,
                    records = ctx.sink.len(),
                    "Crawl aborted; collected records were kept"
                );
                Err(e)
            }
        }
    }

    async fn crawl<R>(&self, renderer: &mut R, ctx: &mut CrawlContext, max_pages: u32) -> Result<()>
    where
        R: PageRenderer + ?Sized,
    {
        let candidates = self
            .paginator
            .collect_candidates(renderer, ctx, max_pages)
            .await?;

        for (index, summary) in candidates.iter().enumerate() {
            if index > 0 {
                self.delay.wait(&ctx.cancel).await?;
            }

            match self.extractor.extract(renderer, &ctx.cancel, &summary.link).await {
                Ok(detail) => {
                    let records = assemble(summary, &detail);
                    ctx.stats.record_post(records.len());
                    tracing::info!(
                        url = %summary.link,
                        title = %truncate_text(&summary.title, 40),
                        date = %summary.date,
                        records = records.len(),
                        position = index + 1,
                        total = candidates.len(),
                        "Post collected"
                    );

                    ctx.sink.append(records);
                    if ctx.sink.should_flush() {
                        ctx.flush()?;
                    }
                }
                Err(e) if e.is_recoverable() => {
                    ctx.stats.record_post_failure();
                    tracing::warn!(
                        url = %summary.link,
                        category = %e.category(),
                        error = %e,
                        "Failed to extract post, skipping"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}

fn log_summary(stats: &CrawlStats, path: &Path) {
    tracing::info!(
        pages = stats.pages_scanned,
        failed_pages = stats.pages_failed,
        candidates = stats.candidates,
        foreign_links = stats.foreign_links,
        unparsable_dates = stats.unparsable_dates,
        expired = stats.expired,
        posts = stats.posts_visited,
        failed_posts = stats.posts_failed,
        failure_rate = stats.failure_rate(),
        records = stats.records,
        path = %path.display(),
        "Crawl completed"
    );
}
