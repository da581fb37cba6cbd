//! jobcrate - resilient, checkpointed job-listing ingestion pipeline
//!
//! Harvests job-listing URLs from LinkedIn/Naukri, fetches detail pages
//! through an automated browser, validates and deduplicates them, extracts a
//! controlled vocabulary of technical skills, and atomically persists results
//! so an interrupted run can always resume without loss or duplication.
//!
//! # Architecture
//!
//! - [`config`] - configuration management and settings
//! - [`models`] - core data structures and types
//! - [`storage`] - the `JobStore` trait and its SQLite/mock backends
//! - [`browser`] - the browser automation runtime interface and its chromium backend
//! - [`crawler`] - URL extraction, harvesting, the page state machine, and the worker pool
//! - [`controller`] - the AIMD + circuit-breaker adaptive concurrency controller
//! - [`validator`] - gate-1 structural/content validation
//! - [`extractor`] - the 3-layer skill extraction pipeline
//! - [`parser`] - text cleanup helpers
//! - [`commands`] - CLI subcommand implementations
//!
//! # Example
//!
//! ```no_run
//! use jobcrate::config::Config;
//! use jobcrate::crawler::pipeline::PipelineCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     config.validate()?;
//!     // let coordinator = PipelineCoordinator::new(config, store, browser)?;
//!     // coordinator.run().await?;
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod commands;
pub mod config;
pub mod controller;
pub mod crawler;
pub mod error;
pub mod extractor;
pub mod models;
pub mod parser;
pub mod storage;
pub mod validator;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, PipelineErrorExt, Result};
    pub use crate::models::{JobDetail, JobUrl, Platform, SessionSummary};
    pub use crate::storage::{JobStore, SqliteJobStore};
}

// Direct re-exports for convenience
pub use error::{Error, Result};
pub use models::{JobDetail, JobUrl, Platform, SessionSummary};
