//! Error types for the gallwatch crawler
//!
//! This module defines the per-domain error types used throughout the crawl
//! pipeline. They are unified by [`crate::error::Error`].

use thiserror::Error;

/// Errors raised while loading a page into the rendering session
#[derive(Error, Debug)]
pub enum NavigationError {
    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server responded with status {status} for {url}")]
    Status { url: String, status: u16 },

    /// Navigation did not finish within the allotted time
    #[error("Navigation to {url} timed out after {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u64 },

    /// The request filter aborted the document request
    #[error("Request to {url} blocked by request filter ({resource})")]
    Blocked { url: String, resource: String },

    /// Navigation was cancelled through the crawl cancel token
    #[error("Navigation cancelled")]
    Cancelled,

    /// Content decoding error
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The rendering session was already closed
    #[error("Rendering session is closed")]
    SessionClosed,
}

impl NavigationError {
    /// Whether a fresh attempt at the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

/// Errors raised while evaluating an extraction schema
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// `evaluate` was called before any page was loaded
    #[error("No document loaded in the rendering session")]
    NoDocument,

    /// A selector in the schema could not be parsed
    #[error("Invalid selector for field '{field}': {selector}")]
    InvalidSelector { field: String, selector: String },
}

/// A listing date that could not be understood
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unrecognized date: {raw:?}")]
pub struct DateParseError {
    pub raw: String,
}

impl DateParseError {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

/// Errors raised while persisting crawl results
#[derive(Error, Debug)]
pub enum SinkError {
    /// File system error while writing or reading the result document
    #[error("Failed to write results to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("Failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SinkError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
