//! Two-phase job-listing ingestion: URL harvesting and detail fetching
//!
//! [`url`] extracts and validates listing/detail URLs; [`harvester`] drives
//! phase 1; [`state_machine`] classifies each phase-2 navigation outcome;
//! [`worker_pool`] drains a batch of URLs concurrently under the adaptive
//! controller; [`pipeline`] sequences the whole run.

pub mod harvester;
pub mod pipeline;
pub mod state_machine;
pub mod url;
pub mod worker_pool;

pub use pipeline::PipelineCoordinator;
