use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::path::PathBuf;

use gallwatch::config::Config;
use gallwatch::crawler::Crawler;
use gallwatch::render::{CancelHandle, HttpRenderer};

/// Run tunables taken from the command line
#[derive(Debug, Clone)]
pub struct CrawlParams {
    pub months_back: u32,
    pub max_pages: u32,
    pub reference_date: Option<NaiveDate>,
    pub listing_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub stop_after_empty_pages: Option<u32>,
}

pub async fn crawl(mut config: Config, params: CrawlParams) -> Result<()> {
    if let Some(url) = params.listing_url {
        config.board.listing_url = url;
    }
    if let Some(dir) = params.output_dir {
        config.output.dir = dir;
    }
    if params.stop_after_empty_pages.is_some() {
        config.crawler.stop_after_empty_pages = params.stop_after_empty_pages;
    }
    config.validate().context("Invalid configuration")?;

    let reference = reference_instant(params.reference_date);

    println!("Starting board crawl");
    println!("====================");
    println!("Listing: {}", config.board.listing_url);
    println!("Months back: {}", params.months_back);
    println!("Max pages: {}", params.max_pages);
    println!("Reference: {reference}");

    let crawler = Crawler::new(&config).context("Failed to create crawler")?;
    let renderer = HttpRenderer::new(&config).context("Failed to create HTTP renderer")?;

    // Ctrl-C cancels in-flight navigation; collected records are still flushed
    let (handle, token) = CancelHandle::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling crawl");
            handle.cancel();
        }
    });

    let report = crawler
        .run(renderer, params.months_back, params.max_pages, reference, token)
        .await
        .with_context(|| {
            format!(
                "Crawl aborted (partial results in {})",
                crawler.output_path(params.months_back).display()
            )
        })?;

    let stats = &report.stats;
    println!("\nCrawl Summary");
    println!("=============");
    println!("Cutoff: {}", report.cutoff);
    println!(
        "Pages scanned: {} (failed: {})",
        stats.pages_scanned, stats.pages_failed
    );
    println!("Recent posts found: {}", stats.candidates);
    println!(
        "Dropped: {} foreign, {} undated, {} too old",
        stats.foreign_links, stats.unparsable_dates, stats.expired
    );
    println!(
        "Posts visited: {} (failed: {}, {:.1}%)",
        stats.posts_visited,
        stats.posts_failed,
        stats.failure_rate()
    );
    println!("Records written: {}", stats.records);
    println!("Output file: {}", report.output_path.display());

    Ok(())
}

fn reference_instant(date: Option<NaiveDate>) -> NaiveDateTime {
    match date {
        Some(date) => date.and_time(NaiveTime::MIN),
        None => chrono::Local::now().naive_local(),
    }
}
