//! Phase-1 URL harvester (§4.2)
//!
//! Drives the listings page through successive pagination requests,
//! extracting stable per-job identifiers until `target_count` unique URLs
//! have been collected or two consecutive pages yield nothing new. The
//! shared `Page` abstraction has no scroll/JS-eval primitive, so "scroll or
//! paginate" here is page-index pagination against each platform's listings
//! URL, which is how both LinkedIn and Naukri actually expose further
//! results.

use std::collections::HashSet;

use crate::browser::{BrowserRuntime, PageOptions};
use crate::config::BrowserConfig;
use crate::crawler::url::JobUrlExtractor;
use crate::error::Error;
use crate::extractor::RoleVocabulary;
use crate::models::Platform;
use crate::storage::store::NewJobUrl;
use crate::storage::JobStore;

const RESULTS_PER_PAGE: usize = 25;
const MAX_EMPTY_CYCLES: u32 = 2;
const MAX_PAGES: usize = 80;

fn listing_url(platform: Platform, role: &str, location: Option<&str>, page_index: usize) -> String {
    let encoded_role: String = url::form_urlencoded::byte_serialize(role.as_bytes()).collect();

    match platform {
        Platform::LinkedIn => {
            let start = page_index * RESULTS_PER_PAGE;
            let mut url = format!(
                "https://www.linkedin.com/jobs/search/?keywords={encoded_role}&start={start}"
            );
            if let Some(loc) = location {
                let encoded_loc: String = url::form_urlencoded::byte_serialize(loc.as_bytes()).collect();
                url.push_str(&format!("&location={encoded_loc}"));
            }
            url
        }
        Platform::Naukri => {
            let slug = role.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-");
            format!("https://www.naukri.com/{slug}-jobs-{}", page_index + 1)
        }
    }
}

/// Collects listing URLs for one `(platform, role, location)` query
pub struct UrlHarvester<'a> {
    runtime: &'a dyn BrowserRuntime,
    browser_config: &'a BrowserConfig,
    roles: &'a RoleVocabulary,
}

impl<'a> UrlHarvester<'a> {
    pub fn new(runtime: &'a dyn BrowserRuntime, browser_config: &'a BrowserConfig, roles: &'a RoleVocabulary) -> Self {
        Self { runtime, browser_config, roles }
    }

    /// Harvest up to `target_count` new listing URLs, persisting as it goes.
    /// Returns the number of rows newly inserted.
    pub async fn harvest(
        &self,
        store: &dyn JobStore,
        platform: Platform,
        input_role: &str,
        location: Option<&str>,
        target_count: usize,
    ) -> Result<usize, Error> {
        if target_count == 0 {
            return Ok(0);
        }

        let existing = store.existing_urls(platform)?;
        let actual_role = self.roles.normalize(input_role);
        let extractor = JobUrlExtractor::new();

        let options = PageOptions {
            headless: true,
            user_agent: self.browser_config.user_agent.clone(),
        };
        let mut page = self.runtime.open_page(&options).await?;

        let mut collected: Vec<NewJobUrl> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut empty_cycles = 0u32;

        for page_index in 0..MAX_PAGES {
            if collected.len() >= target_count || empty_cycles >= MAX_EMPTY_CYCLES {
                break;
            }

            let url = listing_url(platform, input_role, location, page_index);
            let nav_result = page.goto(&url, self.browser_config.nav_timeout()).await;
            let html = match nav_result {
                Ok(_) => page.content().await.unwrap_or_default(),
                Err(e) => {
                    tracing::warn!(error = %e, page_index, "listings page navigation failed");
                    empty_cycles += 1;
                    continue;
                }
            };

            let listings = extractor.extract_listings(platform, &html);
            let mut new_this_cycle = 0usize;

            for listing in listings {
                if existing.contains(&listing.url) || !seen.insert(listing.url.clone()) {
                    continue;
                }
                if !extractor.is_valid_detail_url(platform, &listing.url) {
                    continue;
                }
                collected.push(NewJobUrl {
                    job_id: listing.job_id,
                    actual_role: actual_role.clone(),
                    url: listing.url,
                });
                new_this_cycle += 1;
                if collected.len() >= target_count {
                    break;
                }
            }

            if new_this_cycle == 0 {
                empty_cycles += 1;
            } else {
                empty_cycles = 0;
            }
        }

        let _ = page.close().await;

        if collected.is_empty() {
            return Ok(0);
        }

        let (inserted, skipped) = store.insert_urls(platform, input_role, &collected)?;
        tracing::info!(inserted, skipped, platform = %platform, "harvest complete");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::{CannedPage, MockBrowserRuntime};
    use crate::storage::SqliteJobStore;

    fn roles() -> RoleVocabulary {
        RoleVocabulary::load_from_str(r#"[{"name": "Data_Engineer", "patterns": ["data engineer"]}]"#).unwrap()
    }

    fn linkedin_listing_html(ids: &[&str]) -> String {
        ids.iter()
            .map(|id| format!(r#"<a href="/jobs/view/{id}">Job</a>"#))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn harvests_until_target_count_reached() {
        let html = linkedin_listing_html(&["job0001", "job0002", "job0003"]);
        let runtime = MockBrowserRuntime::new(vec![CannedPage::success(
            "https://www.linkedin.com/jobs/search/",
            &html,
        )]);
        let browser_config = BrowserConfig {
            headless: true,
            nav_timeout_s: 5,
            user_agent: "test-agent".to_string(),
        };
        let roles = roles();
        let harvester = UrlHarvester::new(&runtime, &browser_config, &roles);
        let store = SqliteJobStore::in_memory().unwrap();

        let inserted = harvester
            .harvest(&store, Platform::LinkedIn, "Data Engineer", None, 3)
            .await
            .unwrap();

        assert_eq!(inserted, 3);
        assert_eq!(store.count_unscraped(Platform::LinkedIn, "Data Engineer").unwrap(), 3);
    }

    #[tokio::test]
    async fn stops_after_two_empty_cycles_below_target() {
        let html = linkedin_listing_html(&["job0001"]);
        let runtime = MockBrowserRuntime::new(vec![CannedPage::success(
            "https://www.linkedin.com/jobs/search/",
            &html,
        )]);
        let browser_config = BrowserConfig {
            headless: true,
            nav_timeout_s: 5,
            user_agent: "test-agent".to_string(),
        };
        let roles = roles();
        let harvester = UrlHarvester::new(&runtime, &browser_config, &roles);
        let store = SqliteJobStore::in_memory().unwrap();

        let inserted = harvester
            .harvest(&store, Platform::LinkedIn, "Data Engineer", None, 50)
            .await
            .unwrap();

        assert_eq!(inserted, 1);
    }

    #[tokio::test]
    async fn zero_target_count_is_a_no_op() {
        let runtime = MockBrowserRuntime::new(vec![]);
        let browser_config = BrowserConfig {
            headless: true,
            nav_timeout_s: 5,
            user_agent: "test-agent".to_string(),
        };
        let roles = roles();
        let harvester = UrlHarvester::new(&runtime, &browser_config, &roles);
        let store = SqliteJobStore::in_memory().unwrap();

        let inserted = harvester
            .harvest(&store, Platform::LinkedIn, "Data Engineer", None, 0)
            .await
            .unwrap();

        assert_eq!(inserted, 0);
    }
}
