//! Integration tests entry point
//!
//! Cargo only treats top-level files under `tests/` as separate test
//! binaries; everything else lives under `integration_tests/` and is pulled
//! in here as ordinary submodules.

mod integration_tests;
