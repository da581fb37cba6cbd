//! Browser automation runtime interface (§6)
//!
//! The pipeline treats the browser as a black box: open a page, navigate with
//! a timeout, read back the resolved URL, query a selector for text, read the
//! full HTML content, and close. [`chromium`] backs this with a real
//! `chromiumoxide` browser; [`mock`] replays canned outcomes for tests.

pub mod chromium;
pub mod mock;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::BrowserError;

/// Options recognised when opening a new page (§6)
#[derive(Debug, Clone)]
pub struct PageOptions {
    pub headless: bool,
    pub user_agent: String,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: "Mozilla/5.0 (compatible; jobcrate/0.1)".to_string(),
        }
    }
}

/// A browser automation runtime capable of opening pages
#[async_trait]
pub trait BrowserRuntime: Send + Sync {
    async fn open_page(&self, options: &PageOptions) -> Result<Box<dyn Page>, BrowserError>;
}

/// A single browser tab/page, driven through one detail-fetch lifecycle
#[async_trait]
pub trait Page: Send + Sync {
    /// Navigate, bounded by `timeout`. Returns the HTTP status when the
    /// runtime can surface one (§4.3's 429-authoritative rule depends on this).
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<Option<u16>, BrowserError>;

    /// The URL the page resolved to after navigation (redirects, SPA routing)
    fn url(&self) -> String;

    /// Text content of the first element matching `selector`, if present
    async fn query_text(&mut self, selector: &str) -> Result<Option<String>, BrowserError>;

    /// Full rendered HTML content of the page
    async fn content(&mut self) -> Result<String, BrowserError>;

    /// Close the page and release its resources. Safe to call more than once.
    async fn close(&mut self) -> Result<(), BrowserError>;
}
