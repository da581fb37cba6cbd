//! End-to-end coverage of the harvest-then-fetch pipeline
//!
//! Runs `PipelineCoordinator` against a real (in-memory) `SqliteJobStore`
//! with `MockBrowserRuntime` standing in for the browser, so these exercise
//! the exact sequencing the coordinator promises without a real network or
//! browser.

pub mod fixtures;
pub mod pipeline_test;
