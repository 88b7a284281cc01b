//! Unified error handling for the gallwatch crate
//!
//! This module provides a unified error type that consolidates the
//! domain-specific errors into a single `Error` enum, while keeping the
//! domain errors available when a caller needs the detail.
//!
//! # Architecture
//!
//! - [`Classify`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! The crawl loop uses [`Classify::is_recoverable`] to decide whether a failed
//! listing page or post is skipped or whether the whole run stops.

use std::io;
use thiserror::Error;

pub use crate::utils::error::{DateParseError, ExtractionError, NavigationError, SinkError};

/// Common trait for all gallwatch error types
pub trait Classify: std::error::Error {
    /// Whether the failing unit of work can be skipped while the run continues
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Page loading errors (HTTP, timeout, request filter)
    Navigation,
    /// Schema evaluation and date parsing errors
    Extraction,
    /// Result persistence errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// The run was cancelled
    Cancelled,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::Extraction => "extraction",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Cancelled => "cancelled",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the gallwatch crate
#[derive(Error, Debug)]
pub enum Error {
    /// Page loading errors
    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    /// Schema evaluation errors
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Date parsing errors
    #[error("Date error: {0}")]
    Date(#[from] DateParseError),

    /// Persistence errors
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Classify for NavigationError {
    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::SessionClosed)
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Cancelled => ErrorCategory::Cancelled,
            _ => ErrorCategory::Navigation,
        }
    }
}

impl Classify for ExtractionError {
    fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoDocument)
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::NoDocument => ErrorCategory::Extraction,
            Self::InvalidSelector { .. } => ErrorCategory::Config,
        }
    }
}

impl Classify for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Navigation(e) => e.is_recoverable(),
            Self::Extraction(e) => e.is_recoverable(),
            Self::Date(_) => true,
            Self::Sink(_) => false,
            Self::Io(_) => false,
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Navigation(e) => e.category(),
            Self::Extraction(e) => e.category(),
            Self::Date(_) => ErrorCategory::Extraction,
            Self::Sink(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Whether this error came from the cancel token
    pub fn is_cancelled(&self) -> bool {
        self.category() == ErrorCategory::Cancelled
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
