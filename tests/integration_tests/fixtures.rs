//! Shared sample data for the pipeline integration tests

use jobcrate::config::Config;
use jobcrate::extractor::{RoleVocabulary, SkillExtractor, Vocabulary};

/// A description long enough and English enough to pass Gate-1 with the
/// default validation thresholds, mentioning a couple of recognised skills.
pub const SAMPLE_DESCRIPTION: &str = "We are looking for an experienced Data Engineer to join our \
    growing team. You will design and maintain data pipelines, working closely with analysts and \
    the wider engineering organisation. Strong knowledge of Python and experience with Apache \
    Airflow is required. Responsibilities include building reliable ETL jobs and mentoring junior \
    engineers on our team.";

/// A `Config` tuned so tests run fast and deterministically: tiny validation
/// thresholds, near-zero controller delays, a single retry.
pub fn test_config(target_count: usize) -> Config {
    let mut config = Config::default();
    config.pipeline.platform = "linkedin".to_string();
    config.pipeline.input_role = "Data Engineer".to_string();
    config.pipeline.target_count = target_count;
    config.controller.initial_delay_s = 0.01;
    config.controller.max_delay_s = 0.02;
    config.controller.jitter_range_s = 0.01;
    config.retry.max_retries = 1;
    config.retry.backoff_base_s = 0.01;
    config
}

pub fn roles() -> RoleVocabulary {
    RoleVocabulary::load_from_str(
        r#"[{"name": "Data_Engineer", "patterns": ["data engineer"]}]"#,
    )
    .unwrap()
}

pub fn extractor() -> SkillExtractor {
    SkillExtractor::new(
        Vocabulary::load_from_str(
            r#"[{"name": "Python", "patterns": ["python"]}, {"name": "Apache Airflow", "patterns": ["airflow"]}]"#,
        )
        .unwrap(),
    )
}
