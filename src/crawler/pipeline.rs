//! Pipeline coordinator (§4.6)
//!
//! Sequences harvest-then-fetch and carries no persistent state of its own:
//! a crash-and-restart is equivalent to a fresh invocation, since the
//! harvester skips existing URLs and the worker pool picks up every
//! `scraped=false` row, including ones left over from a prior partial run.

use crate::browser::BrowserRuntime;
use crate::config::Config;
use crate::controller::AdaptiveController;
use crate::crawler::harvester::UrlHarvester;
use crate::crawler::worker_pool::WorkerPool;
use crate::error::Error;
use crate::extractor::{RoleVocabulary, SkillExtractor};
use crate::models::{PipelineOutcome, SessionSummary};
use crate::storage::JobStore;
use crate::validator::Validator;

/// Orchestrates one harvest-then-fetch run for a `(platform, input_role)` query
pub struct PipelineCoordinator<'a> {
    store: &'a dyn JobStore,
    runtime: &'a dyn BrowserRuntime,
    controller: AdaptiveController,
    validator: Validator,
    extractor: SkillExtractor,
    roles: RoleVocabulary,
    config: Config,
}

impl<'a> PipelineCoordinator<'a> {
    pub fn new(
        store: &'a dyn JobStore,
        runtime: &'a dyn BrowserRuntime,
        extractor: SkillExtractor,
        roles: RoleVocabulary,
        config: Config,
    ) -> Self {
        let controller = AdaptiveController::new(config.controller.clone());
        let validator = Validator::new(config.validation.clone());
        Self {
            store,
            runtime,
            controller,
            validator,
            extractor,
            roles,
            config,
        }
    }

    /// Run one harvest-then-fetch cycle, returning the session summary and
    /// the coordinator's terminal outcome (§7).
    pub async fn run(&self) -> Result<(SessionSummary, PipelineOutcome), Error> {
        let platform = self.config.pipeline.platform().ok_or_else(|| {
            Error::config(format!("unknown platform: {}", self.config.pipeline.platform))
        })?;
        let role = self.config.pipeline.input_role.clone();
        let target_count = self.config.pipeline.target_count;

        if target_count == 0 {
            return Ok((SessionSummary::default(), PipelineOutcome::Completed));
        }

        let session_span = tracing::info_span!(
            "pipeline_session",
            platform = %platform,
            role = %role,
            target_count,
        );
        let _entered = session_span.enter();

        let unscraped_before = self.store.count_unscraped(platform, &role)?;
        if unscraped_before < target_count {
            let harvester = UrlHarvester::new(self.runtime, &self.config.browser, &self.roles);
            match harvester
                .harvest(
                    self.store,
                    platform,
                    &role,
                    self.config.pipeline.location.as_deref(),
                    target_count,
                )
                .await
            {
                Ok(inserted) => tracing::info!(inserted, "harvester topped up unscraped urls"),
                Err(e) => tracing::warn!(error = %e, "harvester failed, continuing with existing urls"),
            }
        }

        let unscraped_count = self.store.count_unscraped(platform, &role)?;
        let urls = self.store.list_unscraped(platform, &role, unscraped_count)?;

        let pool = WorkerPool::new(
            self.runtime,
            &self.controller,
            &self.validator,
            &self.extractor,
            &self.config.browser,
            &self.config.retry,
        );
        let batch = pool.run(self.store, platform, urls).await;

        let outcome = if batch.login_wall_aborted {
            PipelineOutcome::AbortedLoginWall
        } else if batch.summary.scraped_ok < target_count as u32 {
            PipelineOutcome::CompletedPartial
        } else {
            PipelineOutcome::Completed
        };

        tracing::info!(
            scraped_ok = batch.summary.scraped_ok,
            expired_deleted = batch.summary.expired_deleted,
            non_english_deleted = batch.summary.non_english_deleted,
            failed = batch.summary.failed,
            success_rate = batch.summary.success_rate(),
            outcome = %outcome,
            "session complete"
        );

        Ok((batch.summary, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::{CannedPage, MockBrowserRuntime};
    use crate::extractor::Vocabulary;
    use crate::storage::SqliteJobStore;

    fn test_config(target_count: usize) -> Config {
        let mut config = Config::default();
        config.pipeline.target_count = target_count;
        config.pipeline.platform = "linkedin".to_string();
        config.pipeline.input_role = "Data Engineer".to_string();
        config.validation.min_description_chars = 20;
        config.validation.min_description_words = 5;
        config.validation.english_indicator_threshold = 2;
        config.controller.initial_delay_s = 0.01;
        config.controller.max_delay_s = 0.02;
        config.controller.jitter_range_s = 0.01;
        config.retry.max_retries = 1;
        config.retry.backoff_base_s = 0.01;
        config
    }

    fn roles() -> RoleVocabulary {
        RoleVocabulary::load_from_str(r#"[{"name": "Data_Engineer", "patterns": ["data engineer"]}]"#).unwrap()
    }

    fn extractor() -> SkillExtractor {
        SkillExtractor::new(Vocabulary::load_from_str(r#"[{"name": "Python", "patterns": ["python"]}]"#).unwrap())
    }

    #[tokio::test]
    async fn zero_target_count_is_a_no_op() {
        let config = test_config(0);
        let runtime = MockBrowserRuntime::new(vec![]);
        let store = SqliteJobStore::in_memory().unwrap();
        let coordinator = PipelineCoordinator::new(&store, &runtime, extractor(), roles(), config);

        let (summary, outcome) = coordinator.run().await.unwrap();
        assert_eq!(summary.total_processed, 0);
        assert_eq!(outcome, PipelineOutcome::Completed);
    }

    #[tokio::test]
    async fn harvests_then_fetches_a_single_listing() {
        let config = test_config(1);
        let listing_html = r#"<a href="/jobs/view/job0001">Data Engineer</a>"#.to_string();
        let description = "We are looking for an experienced candidate with strong skills and \
            the ability to work with our team using Python daily.";
        let runtime = MockBrowserRuntime::new(vec![
            CannedPage::success("https://www.linkedin.com/jobs/search/", listing_html),
            CannedPage::success("https://www.linkedin.com/jobs/view/job0001", description)
                .with_selector("title", "Data Engineer"),
        ]);
        let store = SqliteJobStore::in_memory().unwrap();
        let coordinator = PipelineCoordinator::new(&store, &runtime, extractor(), roles(), config);

        let (summary, outcome) = coordinator.run().await.unwrap();
        assert_eq!(summary.scraped_ok, 1);
        assert_eq!(outcome, PipelineOutcome::Completed);
    }

    #[tokio::test]
    async fn rerunning_after_completion_inserts_nothing_new() {
        let config = test_config(1);
        let listing_html = r#"<a href="/jobs/view/job0001">Data Engineer</a>"#.to_string();
        let description = "We are looking for an experienced candidate with strong skills and \
            the ability to work with our team using Python daily.";
        let runtime = MockBrowserRuntime::new(vec![
            CannedPage::success("https://www.linkedin.com/jobs/search/", listing_html.clone()),
            CannedPage::success("https://www.linkedin.com/jobs/view/job0001", description)
                .with_selector("title", "Data Engineer"),
        ]);
        let store = SqliteJobStore::in_memory().unwrap();
        let coordinator = PipelineCoordinator::new(&store, &runtime, extractor(), roles(), config.clone());
        coordinator.run().await.unwrap();

        let runtime2 = MockBrowserRuntime::new(vec![CannedPage::success(
            "https://www.linkedin.com/jobs/search/",
            listing_html,
        )]);
        let coordinator2 = PipelineCoordinator::new(&store, &runtime2, extractor(), roles(), config);
        let (summary, _) = coordinator2.run().await.unwrap();

        assert_eq!(summary.total_processed, 0);
        assert_eq!(
            store.count_scraped_by_platform().unwrap(),
            vec![(crate::models::Platform::LinkedIn, 1)]
        );
    }

    #[tokio::test]
    async fn login_wall_during_fetch_yields_aborted_outcome() {
        let config = test_config(1);
        let listing_html = r#"<a href="/jobs/view/job0001">Data Engineer</a>"#.to_string();
        let runtime = MockBrowserRuntime::new(vec![
            CannedPage::success("https://www.linkedin.com/jobs/search/", listing_html),
            CannedPage::success(
                "https://www.linkedin.com/authwall?trk=job",
                "Sign in to continue viewing this job.",
            ),
        ]);
        let store = SqliteJobStore::in_memory().unwrap();
        let coordinator = PipelineCoordinator::new(&store, &runtime, extractor(), roles(), config);

        let (_summary, outcome) = coordinator.run().await.unwrap();
        assert_eq!(outcome, PipelineOutcome::AbortedLoginWall);
    }
}
