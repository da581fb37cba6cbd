//! Text cleanup helpers applied to browser-extracted page content
//!
//! The orchestrator runs [`sanitize`] over raw extracted text before the
//! validator and skill extractor ever see it.

pub mod sanitize;
