//! Unified error handling for the job ingestion pipeline
//!
//! This module provides a consolidated error handling system that:
//! - Re-exports all domain-specific error types
//! - Provides a common `PipelineErrorExt` trait for consistent behavior
//! - Offers a unified `Error` enum for cross-domain error handling
//!
//! # Error Hierarchy
//!
//! ```text
//! Error (unified)
//! ├── Browser (BrowserError)
//! ├── Parse (ParseError)
//! ├── Validation (ValidationError)
//! ├── Storage (StorageError)
//! ├── Extraction (ExtractionError)
//! ├── Config(String)
//! └── Other (anyhow::Error)
//! ```

use thiserror::Error;

/// Unified result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while driving the browser automation runtime
#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("navigation timed out after {0:?}")]
    NavigationTimeout(std::time::Duration),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("page returned HTTP {0}")]
    HttpStatus(u16),

    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("page already closed")]
    PageClosed,
}

/// Errors raised while extracting URLs or structured data from a listing/detail page
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("job id could not be extracted from url: {0}")]
    IdExtractionFailed(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("no listings found on page")]
    NoListingsFound,
}

/// Gate-1 validation failure, carrying the symbolic reason named by the validator
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("job_id invalid")]
    InvalidJobId,
    #[error("url invalid")]
    InvalidUrl,
    #[error("description too short")]
    DescriptionTooShort,
    #[error("description word count too low")]
    DescriptionTooFewWords,
    #[error("average word length out of range")]
    AverageWordLengthOutOfRange,
    #[error("placeholder content detected")]
    PlaceholderDetected,
    #[error("non-english content")]
    NonEnglish,
    #[error("posted_date out of sane range")]
    InvalidPostedDate,
    #[error("skills list invalid")]
    InvalidSkills,
}

/// Errors raised by the Store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("constraint violation: {0}")]
    Constraint(String),
}

/// Errors raised while loading or applying the skill/role vocabularies
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("vocabulary file missing or unreadable: {0}")]
    VocabularyIo(String),

    #[error("vocabulary malformed: {0}")]
    VocabularyMalformed(String),

    #[error("duplicate skill name in vocabulary: {0}")]
    DuplicateName(String),

    #[error("vocabulary entry has no patterns: {0}")]
    EmptyPatterns(String),

    #[error("invalid regex pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Unified error type for cross-domain operations
#[derive(Error, Debug)]
pub enum Error {
    /// Browser automation errors
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Parse/extraction-boundary errors
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Gate-1 validation errors
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Store errors
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Skill/role vocabulary errors
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Configuration errors
    #[error("config error: {0}")]
    Config(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Broad error categorisation used for log grouping and the controller's retry decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Browser,
    Parsing,
    Validation,
    Storage,
    Extraction,
    Config,
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Parsing => "parsing",
            Self::Validation => "validation",
            Self::Storage => "storage",
            Self::Extraction => "extraction",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

/// Common trait queried by the worker pool when deciding retry-vs-drop
pub trait PipelineErrorExt: std::error::Error {
    /// Whether a retry could plausibly change the outcome (transient conditions only).
    fn is_recoverable(&self) -> bool;

    fn category(&self) -> ErrorCategory;
}

impl PipelineErrorExt for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Error::Browser(BrowserError::NavigationTimeout(_)) => true,
            Error::Browser(BrowserError::Navigation(_)) => true,
            Error::Browser(BrowserError::HttpStatus(status)) => {
                matches!(*status, 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Error::Browser(_) => ErrorCategory::Browser,
            Error::Parse(_) => ErrorCategory::Parsing,
            Error::Validation(_) => ErrorCategory::Validation,
            Error::Storage(_) => ErrorCategory::Storage,
            Error::Extraction(_) => ErrorCategory::Extraction,
            Error::Config(_) => ErrorCategory::Config,
            Error::Other(_) => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a storage constraint error
    pub fn storage_constraint(msg: impl Into<String>) -> Self {
        Error::Storage(StorageError::Constraint(msg.into()))
    }
}
