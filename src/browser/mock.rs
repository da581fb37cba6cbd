//! Canned-outcome `BrowserRuntime`/`Page` for tests
//!
//! Lets the state machine, worker pool, and pipeline coordinator be exercised
//! without a real browser: each `open_page` call pops the next scripted
//! [`CannedPage`] from a queue.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{BrowserRuntime, Page, PageOptions};
use crate::error::BrowserError;

/// A scripted page outcome
#[derive(Debug, Clone, Default)]
pub struct CannedPage {
    pub final_url: String,
    pub content: String,
    pub selectors: HashMap<String, String>,
    pub status: Option<u16>,
    pub fail_navigation: bool,
}

impl CannedPage {
    pub fn success(url: impl Into<String>, description: impl Into<String>) -> Self {
        let mut selectors = HashMap::new();
        let description = description.into();
        selectors.insert("description".to_string(), description.clone());
        Self {
            final_url: url.into(),
            content: description,
            selectors,
            status: None,
            fail_navigation: false,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>, text: impl Into<String>) -> Self {
        self.selectors.insert(selector.into(), text.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn navigation_failure() -> Self {
        Self {
            fail_navigation: true,
            ..Default::default()
        }
    }
}

/// Hands out canned pages in order; the last one repeats once exhausted.
pub struct MockBrowserRuntime {
    pages: Mutex<VecDeque<CannedPage>>,
}

impl MockBrowserRuntime {
    pub fn new(pages: Vec<CannedPage>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
        }
    }

    fn next_page(&self) -> CannedPage {
        let mut pages = self.pages.lock().unwrap();
        pages.pop_front().unwrap_or_default()
    }
}

#[async_trait]
impl BrowserRuntime for MockBrowserRuntime {
    async fn open_page(&self, _options: &PageOptions) -> Result<Box<dyn Page>, BrowserError> {
        Ok(Box::new(MockPage {
            canned: self.next_page(),
            current_url: String::new(),
        }))
    }
}

struct MockPage {
    canned: CannedPage,
    current_url: String,
}

#[async_trait]
impl Page for MockPage {
    async fn goto(&mut self, _url: &str, _timeout: Duration) -> Result<Option<u16>, BrowserError> {
        if self.canned.fail_navigation {
            return Err(BrowserError::Navigation("mock navigation failure".to_string()));
        }
        self.current_url = self.canned.final_url.clone();
        Ok(self.canned.status)
    }

    fn url(&self) -> String {
        self.current_url.clone()
    }

    async fn query_text(&mut self, selector: &str) -> Result<Option<String>, BrowserError> {
        Ok(self.canned.selectors.get(selector).cloned())
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        Ok(self.canned.content.clone())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_canned_pages_in_order() {
        let runtime = MockBrowserRuntime::new(vec![
            CannedPage::success("https://x.example/jobs/view/1", "first"),
            CannedPage::success("https://x.example/jobs/view/2", "second"),
        ]);

        let mut page1 = runtime.open_page(&PageOptions::default()).await.unwrap();
        page1.goto("https://x.example/jobs/view/1", Duration::from_secs(5)).await.unwrap();
        assert_eq!(page1.url(), "https://x.example/jobs/view/1");

        let mut page2 = runtime.open_page(&PageOptions::default()).await.unwrap();
        page2.goto("https://x.example/jobs/view/2", Duration::from_secs(5)).await.unwrap();
        assert_eq!(page2.url(), "https://x.example/jobs/view/2");
    }

    #[tokio::test]
    async fn navigation_failure_surfaces_as_browser_error() {
        let runtime = MockBrowserRuntime::new(vec![CannedPage::navigation_failure()]);
        let mut page = runtime.open_page(&PageOptions::default()).await.unwrap();
        let result = page.goto("https://x.example/jobs/view/1", Duration::from_secs(5)).await;
        assert!(result.is_err());
    }
}
