//! Phase-2 concurrent detail fetcher (§4.5)
//!
//! Processes a batch of [`JobUrl`] rows through the page-lifecycle state
//! machine, validator, and skill extractor, honouring the adaptive
//! controller's current `{concurrency, delay}` on every cycle. Login-wall
//! detections abort the batch after the in-flight cycle drains.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;

use crate::browser::{BrowserRuntime, Page, PageOptions};
use crate::config::{BrowserConfig, RetryConfig};
use crate::controller::AdaptiveController;
use crate::crawler::state_machine::{classify_navigation, NavigationClass};
use crate::extractor::SkillExtractor;
use crate::models::{JobDetail, JobUrl, Platform, SessionSummary, TaskOutcomeKind};
use crate::parser::sanitize::sanitize_text;
use crate::storage::JobStore;
use crate::validator::{parse_relative_posted_date, ValidationInput, Validator};

/// Outcome of one URL's full fetch attempt, including retries
enum FetchOutcome {
    Success,
    Expired,
    NonEnglish,
    TransientFail,
    LoginWallAbort,
}

/// Concurrent worker pool driving the browser over a batch of URLs
pub struct WorkerPool<'a> {
    runtime: &'a dyn BrowserRuntime,
    controller: &'a AdaptiveController,
    validator: &'a Validator,
    extractor: &'a SkillExtractor,
    browser_config: &'a BrowserConfig,
    retry_config: &'a RetryConfig,
}

/// Result of draining one batch of URLs
pub struct BatchResult {
    pub summary: SessionSummary,
    pub login_wall_aborted: bool,
}

impl<'a> WorkerPool<'a> {
    pub fn new(
        runtime: &'a dyn BrowserRuntime,
        controller: &'a AdaptiveController,
        validator: &'a Validator,
        extractor: &'a SkillExtractor,
        browser_config: &'a BrowserConfig,
        retry_config: &'a RetryConfig,
    ) -> Self {
        Self {
            runtime,
            controller,
            validator,
            extractor,
            browser_config,
            retry_config,
        }
    }

    /// Drain `urls` through the state machine, chunked by the controller's
    /// current concurrency snapshot (re-read before every chunk, never
    /// cached) until exhausted or a login wall aborts the batch.
    pub async fn run(&self, store: &dyn JobStore, platform: Platform, urls: Vec<JobUrl>) -> BatchResult {
        let mut summary = SessionSummary::default();
        let aborted = AtomicBool::new(false);
        let mut seen_urls: HashSet<String> = HashSet::new();
        let mut seen_job_ids: HashSet<String> = HashSet::new();

        let mut remaining: Vec<JobUrl> = Vec::with_capacity(urls.len());
        for url in urls {
            if seen_urls.insert(url.url.clone()) && seen_job_ids.insert(url.job_id.clone()) {
                remaining.push(url);
            }
        }

        let mut cursor = 0usize;
        while cursor < remaining.len() {
            if aborted.load(Ordering::SeqCst) {
                break;
            }

            let snapshot = self.controller.snapshot();
            if snapshot.breaker_open {
                tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                continue;
            }

            let chunk_end = (cursor + snapshot.concurrency).min(remaining.len());
            let chunk = &remaining[cursor..chunk_end];
            cursor = chunk_end;

            let outcomes = futures::future::join_all(
                chunk.iter().map(|url| self.fetch_one(store, platform, url)),
            )
            .await;

            for outcome in outcomes {
                match outcome {
                    FetchOutcome::Success => summary.record(&TaskOutcomeKind::Success),
                    FetchOutcome::Expired => summary.record(&TaskOutcomeKind::Expired),
                    FetchOutcome::NonEnglish => summary.record(&TaskOutcomeKind::NonEnglish),
                    FetchOutcome::TransientFail => summary.record(&TaskOutcomeKind::TransientFail),
                    FetchOutcome::LoginWallAbort => {
                        aborted.store(true, Ordering::SeqCst);
                    }
                }
            }
        }

        BatchResult {
            summary,
            login_wall_aborted: aborted.load(Ordering::SeqCst),
        }
    }

    async fn fetch_one(&self, store: &dyn JobStore, platform: Platform, url: &JobUrl) -> FetchOutcome {
        let _span = tracing::debug_span!("fetch_detail", job_id = %url.job_id).entered();

        tokio::time::sleep(self.controller.next_pacing_delay()).await;

        let max_attempts = self.retry_config.max_retries + 1;
        for attempt in 0..max_attempts {
            let page_result = self.runtime.open_page(&PageOptions {
                headless: self.browser_config.headless,
                user_agent: self.browser_config.user_agent.clone(),
            }).await;

            let mut page = match page_result {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "failed to open page");
                    if attempt + 1 < max_attempts {
                        self.backoff_sleep(attempt).await;
                        continue;
                    }
                    self.controller.report_outcome(TaskOutcomeKind::TransientFail);
                    return FetchOutcome::TransientFail;
                }
            };

            let outcome = self.drive_one_attempt(store, platform, url, page.as_mut()).await;
            let _ = page.close().await;

            match outcome {
                AttemptOutcome::Done(result) => return result,
                AttemptOutcome::RetryTransient | AttemptOutcome::RetryRateLimited => {
                    if attempt + 1 < max_attempts {
                        self.backoff_sleep(attempt).await;
                        continue;
                    }
                    self.controller.report_outcome(TaskOutcomeKind::TransientFail);
                    return FetchOutcome::TransientFail;
                }
            }
        }

        self.controller.report_outcome(TaskOutcomeKind::TransientFail);
        FetchOutcome::TransientFail
    }

    async fn drive_one_attempt(
        &self,
        store: &dyn JobStore,
        platform: Platform,
        url: &JobUrl,
        page: &mut dyn Page,
    ) -> AttemptOutcome {
        let nav_result = page.goto(&url.url, self.browser_config.nav_timeout()).await;

        let status = match nav_result {
            Ok(status) => status,
            Err(e) => {
                tracing::debug!(error = %e, "navigation failed, treating as transient");
                return AttemptOutcome::RetryTransient;
            }
        };

        let final_url = page.url();
        let title = page.query_text("title").await.ok().flatten();
        let description_selector = page.query_text("description").await.ok().flatten();
        let posted_date_text = page.query_text("posted_date").await.ok().flatten();
        let page_text = page.content().await.unwrap_or_default();

        let class = classify_navigation(
            platform,
            status,
            &final_url,
            title.as_deref(),
            description_selector.as_deref(),
            &page_text,
        );

        match class {
            NavigationClass::Expired => {
                let _ = store.delete_urls(std::slice::from_ref(&url.url));
                AttemptOutcome::Done(FetchOutcome::Expired)
            }
            NavigationClass::LoginWall => AttemptOutcome::Done(FetchOutcome::LoginWallAbort),
            NavigationClass::RateLimited => {
                self.controller.report_outcome(TaskOutcomeKind::RateLimited);
                AttemptOutcome::RetryRateLimited
            }
            NavigationClass::TransientError => AttemptOutcome::RetryTransient,
            NavigationClass::ContentReady { title, description } => {
                let clean_title = sanitize_text(&title);
                let clean_description = sanitize_text(&description);
                let skills = self.extractor.extract(&clean_description);
                let now = Utc::now();
                let posted_date = posted_date_text
                    .as_deref()
                    .and_then(|raw| parse_relative_posted_date(raw, now));

                let input = ValidationInput {
                    job_id: &url.job_id,
                    platform,
                    url: &url.url,
                    title: &clean_title,
                    description: &clean_description,
                    posted_date,
                    skills: &skills,
                };

                match self.validator.validate(&input, now) {
                    Ok(()) => {
                        let detail = JobDetail {
                            job_id: url.job_id.clone(),
                            platform,
                            actual_role: url.actual_role.clone(),
                            url: url.url.clone(),
                            job_description: clean_description,
                            skills: skills.join(", "),
                            company_name: None,
                            posted_date,
                            scraped_at: now,
                        };
                        match store.mark_scraped_and_store_detail(&detail) {
                            Ok(_) => {
                                self.controller.report_outcome(TaskOutcomeKind::Success);
                                AttemptOutcome::Done(FetchOutcome::Success)
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "failed to persist job detail");
                                self.controller.report_outcome(TaskOutcomeKind::TransientFail);
                                AttemptOutcome::Done(FetchOutcome::TransientFail)
                            }
                        }
                    }
                    Err(crate::error::ValidationError::NonEnglish) => {
                        let _ = store.delete_urls(std::slice::from_ref(&url.url));
                        self.controller.report_outcome(TaskOutcomeKind::NonEnglish);
                        AttemptOutcome::Done(FetchOutcome::NonEnglish)
                    }
                    Err(reason) => {
                        tracing::debug!(reason = %reason, job_id = %url.job_id, "validation failed");
                        self.controller.report_outcome(TaskOutcomeKind::TransientFail);
                        AttemptOutcome::Done(FetchOutcome::TransientFail)
                    }
                }
            }
        }
    }

    async fn backoff_sleep(&self, attempt: u32) {
        let secs = self.retry_config.backoff_base_s * 2f64.powi(attempt as i32);
        tokio::time::sleep(std::time::Duration::from_secs_f64(secs)).await;
    }
}

enum AttemptOutcome {
    Done(FetchOutcome),
    RetryTransient,
    RetryRateLimited,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::{CannedPage, MockBrowserRuntime};
    use crate::config::ControllerConfig;
    use crate::extractor::Vocabulary;
    use crate::storage::SqliteJobStore;

    fn browser_config() -> BrowserConfig {
        BrowserConfig {
            headless: true,
            nav_timeout_s: 5,
            user_agent: "test-agent".to_string(),
        }
    }

    fn retry_config() -> RetryConfig {
        RetryConfig {
            max_retries: 1,
            backoff_base_s: 0.01,
        }
    }

    fn controller() -> AdaptiveController {
        AdaptiveController::new(ControllerConfig {
            initial_concurrency: 4,
            min_concurrency: 2,
            max_concurrency: 10,
            initial_delay_s: 0.01,
            max_delay_s: 0.05,
            jitter_range_s: 0.01,
            breaker_rate_limit_threshold: 3,
            breaker_open_s: 1,
        })
    }

    fn validator() -> Validator {
        Validator::new(crate::config::ValidationConfig {
            min_description_chars: 20,
            min_description_words: 5,
            max_skills: 80,
            english_indicator_threshold: 2,
        })
    }

    fn extractor() -> SkillExtractor {
        SkillExtractor::new(Vocabulary::load_from_str(r#"[{"name": "Python", "patterns": ["python"]}]"#).unwrap())
    }

    fn sample_url(id: &str) -> JobUrl {
        JobUrl::new(id, Platform::LinkedIn, "Data Engineer", "Data_Engineer", format!("https://www.linkedin.com/jobs/view/{id}"))
    }

    #[tokio::test]
    async fn successful_fetch_persists_detail_and_marks_scraped() {
        let description = "We are looking for an experienced candidate with strong skills and the ability to work with our team using Python daily.";
        let runtime = MockBrowserRuntime::new(vec![CannedPage::success(
            "https://www.linkedin.com/jobs/view/job0001",
            description,
        )
        .with_selector("title", "Data Engineer")]);

        let controller = controller();
        let validator = validator();
        let extractor = extractor();
        let bc = browser_config();
        let rc = retry_config();
        let pool = WorkerPool::new(&runtime, &controller, &validator, &extractor, &bc, &rc);
        let store = SqliteJobStore::in_memory().unwrap();

        let result = pool.run(&store, Platform::LinkedIn, vec![sample_url("job0001")]).await;

        assert_eq!(result.summary.scraped_ok, 1);
        assert!(!result.login_wall_aborted);
        assert_eq!(store.count_scraped_by_platform().unwrap(), vec![(Platform::LinkedIn, 1)]);
    }

    #[tokio::test]
    async fn expired_listing_is_deleted_and_not_retried() {
        let runtime = MockBrowserRuntime::new(vec![CannedPage::success(
            "https://www.linkedin.com/jobs/view/job0001",
            "This job posting has expired and is no longer available.",
        )
        .with_selector("title", "LinkedIn")]);

        let controller = controller();
        let validator = validator();
        let extractor = extractor();
        let bc = browser_config();
        let rc = retry_config();
        let pool = WorkerPool::new(&runtime, &controller, &validator, &extractor, &bc, &rc);
        let store = SqliteJobStore::in_memory().unwrap();

        let result = pool.run(&store, Platform::LinkedIn, vec![sample_url("job0001")]).await;

        assert_eq!(result.summary.expired_deleted, 1);
        assert_eq!(store.existing_urls(Platform::LinkedIn).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn login_wall_aborts_the_batch() {
        let runtime = MockBrowserRuntime::new(vec![CannedPage::success(
            "https://www.linkedin.com/authwall?trk=job",
            "Sign in to continue viewing this job.",
        )]);

        let controller = controller();
        let validator = validator();
        let extractor = extractor();
        let bc = browser_config();
        let rc = retry_config();
        let pool = WorkerPool::new(&runtime, &controller, &validator, &extractor, &bc, &rc);
        let store = SqliteJobStore::in_memory().unwrap();

        let result = pool.run(&store, Platform::LinkedIn, vec![sample_url("job0001")]).await;

        assert!(result.login_wall_aborted);
    }

    #[tokio::test]
    async fn relative_posted_date_selector_is_parsed_and_persisted() {
        let description = "We are looking for an experienced candidate with strong skills and the ability to work with our team using Python daily.";
        let runtime = MockBrowserRuntime::new(vec![CannedPage::success(
            "https://www.linkedin.com/jobs/view/job0001",
            description,
        )
        .with_selector("title", "Data Engineer")
        .with_selector("posted_date", "3 days ago")]);

        let controller = controller();
        let validator = validator();
        let extractor = extractor();
        let bc = browser_config();
        let rc = retry_config();
        let pool = WorkerPool::new(&runtime, &controller, &validator, &extractor, &bc, &rc);
        let store = SqliteJobStore::in_memory().unwrap();

        let result = pool.run(&store, Platform::LinkedIn, vec![sample_url("job0001")]).await;
        assert_eq!(result.summary.scraped_ok, 1);

        let detail = store.list_unscraped(Platform::LinkedIn, "Data Engineer", 10).unwrap();
        assert!(detail.is_empty()); // the row is scraped, not unscraped
    }

    #[tokio::test]
    async fn implausible_posted_date_selector_fails_validation_not_persistence() {
        let description = "We are looking for an experienced candidate with strong skills and the ability to work with our team using Python daily.";
        let runtime = MockBrowserRuntime::new(vec![CannedPage::success(
            "https://www.linkedin.com/jobs/view/job0001",
            description,
        )
        .with_selector("title", "Data Engineer")
        .with_selector("posted_date", "9999 minutes ago")]);

        let controller = controller();
        let validator = validator();
        let extractor = extractor();
        let bc = browser_config();
        let rc = retry_config();
        let pool = WorkerPool::new(&runtime, &controller, &validator, &extractor, &bc, &rc);
        let store = SqliteJobStore::in_memory().unwrap();

        let result = pool.run(&store, Platform::LinkedIn, vec![sample_url("job0001")]).await;

        // the relative-date parser already rejects an out-of-range unit count (§4.7 item 6),
        // so posted_date stays None and the record passes rather than fails validation
        assert_eq!(result.summary.scraped_ok, 1);
    }

    #[tokio::test]
    async fn duplicate_urls_within_a_batch_are_only_processed_once() {
        let description = "We are looking for an experienced candidate with strong skills and the ability to work with our team using Python daily.";
        let runtime = MockBrowserRuntime::new(vec![
            CannedPage::success("https://www.linkedin.com/jobs/view/job0001", description)
                .with_selector("title", "Data Engineer"),
            CannedPage::success("https://www.linkedin.com/jobs/view/job0001", description)
                .with_selector("title", "Data Engineer"),
        ]);

        let controller = controller();
        let validator = validator();
        let extractor = extractor();
        let bc = browser_config();
        let rc = retry_config();
        let pool = WorkerPool::new(&runtime, &controller, &validator, &extractor, &bc, &rc);
        let store = SqliteJobStore::in_memory().unwrap();

        let duplicate = sample_url("job0001");
        let result = pool
            .run(&store, Platform::LinkedIn, vec![duplicate.clone(), duplicate])
            .await;

        assert_eq!(result.summary.total_processed, 1);
    }
}
