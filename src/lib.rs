//! gallwatch - Time-windowed discussion board crawler
//!
//! Scans the listing pages of a board, keeps the posts published inside a
//! trailing window of calendar months, and fans every visited post out into
//! one record per comment.
//!
//! # Architecture
//!
//! - [`config`] - Configuration management and settings
//! - [`render`] - Page rendering capability, extraction schemas and sessions
//! - [`crawler`] - Listing pagination, post extraction and run orchestration
//! - [`models`] - Core data structures and types
//! - [`storage`] - Result document persistence
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use gallwatch::config::Config;
//! use gallwatch::crawler::Crawler;
//! use gallwatch::render::{CancelToken, HttpRenderer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let crawler = Crawler::new(&config)?;
//!     let renderer = HttpRenderer::new(&config)?;
//!     let reference = chrono::Local::now().naive_local();
//!     let report = crawler
//!         .run(renderer, 1, 3, reference, CancelToken::never())
//!         .await?;
//!     println!("{} records", report.stats.records);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod render;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{CrawlContext, CrawlReport, CrawlWindow, Crawler, FetchResponse};
    pub use crate::error::{Classify, Error, ErrorCategory, Result};
    pub use crate::models::{CrawlStats, OutputRecord, PostDetail, PostSummary};
    pub use crate::render::{
        CancelHandle, CancelToken, ExtractionSchema, HttpRenderer, PageRenderer, RequestFilter,
        WaitPolicy,
    };
    pub use crate::storage::ResultSink;
}
