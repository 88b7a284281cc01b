//! Persistence of crawl results
//!
//! Records are written as a single JSON array per run, named after the
//! lookback window.

pub mod sink;

pub use sink::{output_path, ResultSink};
