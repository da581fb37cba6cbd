//! CLI subcommand implementations
//!
//! Thin glue between the parsed CLI arguments in `main.rs` and the library's
//! `PipelineCoordinator`/`JobStore`. Kept free of argument parsing so the
//! core crate stays usable as a library independent of the binary.

use anyhow::{Context, Result};

use crate::browser::chromium::ChromiumRuntime;
use crate::browser::PageOptions;
use crate::config::Config;
use crate::crawler::pipeline::PipelineCoordinator;
use crate::extractor::{RoleVocabulary, SkillExtractor, Vocabulary};
use crate::storage::{JobStore, SqliteJobStore};

fn load_extractor(config: &Config) -> Result<SkillExtractor> {
    let vocab = Vocabulary::load_from_file(&config.pipeline.skills_vocab_path)
        .with_context(|| format!("loading skills vocabulary from {}", config.pipeline.skills_vocab_path.display()))?;
    Ok(SkillExtractor::new(vocab))
}

fn load_roles(config: &Config) -> Result<RoleVocabulary> {
    RoleVocabulary::load_from_file(&config.pipeline.roles_vocab_path)
        .with_context(|| format!("loading role vocabulary from {}", config.pipeline.roles_vocab_path.display()))
}

/// Run one full harvest-then-fetch session against a fresh or existing store.
pub async fn crawl(config: Config) -> Result<()> {
    config.validate()?;

    let extractor = load_extractor(&config)?;
    let roles = load_roles(&config)?;
    let store = SqliteJobStore::new(&config.pipeline.db_path)
        .with_context(|| format!("opening store at {}", config.pipeline.db_path.display()))?;

    let page_options = PageOptions {
        headless: config.browser.headless,
        user_agent: config.browser.user_agent.clone(),
    };
    let runtime = ChromiumRuntime::launch(&page_options)
        .await
        .context("launching browser runtime")?;

    let coordinator = PipelineCoordinator::new(&store, &runtime, extractor, roles, config);
    let (summary, outcome) = coordinator.run().await?;

    tracing::info!(
        total_processed = summary.total_processed,
        scraped_ok = summary.scraped_ok,
        outcome = %outcome,
        "crawl session finished"
    );
    Ok(())
}

/// Resume a prior session: same entrypoint as `crawl`, since the coordinator
/// keeps no state of its own and resumes purely from what the store already
/// holds (unscraped rows left over from an interrupted run).
pub async fn resume(config: Config) -> Result<()> {
    tracing::info!(db_path = %config.pipeline.db_path.display(), "resuming from existing store");
    crawl(config).await
}

/// Print per-platform scraped-job counts from an existing store.
pub fn stats(config: Config) -> Result<()> {
    let store = SqliteJobStore::new(&config.pipeline.db_path)
        .with_context(|| format!("opening store at {}", config.pipeline.db_path.display()))?;

    let counts = store.count_scraped_by_platform()?;
    if counts.is_empty() {
        println!("no scraped jobs yet");
        return Ok(());
    }

    for (platform, count) in counts {
        println!("{platform}: {count}");
    }
    Ok(())
}
