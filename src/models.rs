// Core data structures for the gallwatch crawler

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One post as it appears on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    pub title: String,
    /// Absolute post URL
    pub link: String,
    /// Date text exactly as rendered in the listing
    pub raw_date: String,
    /// Date text after normalization into `YYYY-MM-DD[ HH:MM[:SS]]`
    pub date: String,
    /// `None` when the normalized date could not be parsed
    pub published_at: Option<NaiveDateTime>,
}

/// Content extracted from a single post page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetail {
    pub title: String,
    pub content: String,
    /// Comment texts in rendered order, duplicates included
    pub comments: Vec<String>,
}

/// The durable unit written to the result document
///
/// Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub url: String,
    pub date: String,
    pub title: String,
    pub content: String,
    pub comment: Option<String>,
}

/// Counters for a single crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    pub pages_scanned: u32,
    pub pages_failed: u32,
    pub candidates: usize,
    pub foreign_links: usize,
    pub unparsable_dates: usize,
    pub expired: usize,
    pub posts_visited: usize,
    pub posts_failed: usize,
    pub records: usize,
}

impl CrawlStats {
    pub fn record_page(&mut self) {
        self.pages_scanned += 1;
    }

    pub fn record_page_failure(&mut self) {
        self.pages_failed += 1;
    }

    pub fn record_post(&mut self, records: usize) {
        self.posts_visited += 1;
        self.records += records;
    }

    pub fn record_post_failure(&mut self) {
        self.posts_failed += 1;
    }

    /// Share of visited posts that failed, in percent
    pub fn failure_rate(&self) -> f64 {
        let attempted = self.posts_visited + self.posts_failed;
        if attempted == 0 {
            return 0.0;
        }
        (self.posts_failed as f64 / attempted as f64) * 100.0
    }
}
