//! Persistent storage for the job ingestion pipeline
//!
//! A single embedded SQLite file (two tables: `job_urls`, `jobs`) is the only
//! shared mutable resource in the system (§5). [`store`] defines the `JobStore`
//! trait plus a concrete SQLite backend and an in-memory mock for tests.

pub mod store;

pub use store::{JobStore, MockJobStore, SqliteJobStore};
