//! Configuration management for the job ingestion pipeline
//!
//! This module handles loading and validating configuration from environment variables
//! and TOML files, following the option groups named in the external interface (§6).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::Platform;

/// Top-level configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub browser: BrowserConfig,
    pub validation: ValidationConfig,
    pub retry: RetryConfig,
    pub controller: ControllerConfig,
}

/// Pipeline-wide configuration: what to harvest and where to persist it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub platform: String,
    pub input_role: String,
    pub location: Option<String>,
    pub target_count: usize,
    pub db_path: PathBuf,
    pub skills_vocab_path: PathBuf,
    pub roles_vocab_path: PathBuf,
}

impl PipelineConfig {
    pub fn platform(&self) -> Option<Platform> {
        Platform::parse(&self.platform)
    }
}

/// Browser runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    pub nav_timeout_s: u64,
    pub user_agent: String,
}

impl BrowserConfig {
    pub fn nav_timeout(&self) -> Duration {
        Duration::from_secs(self.nav_timeout_s)
    }
}

/// Gate-1 validator thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub min_description_chars: usize,
    pub min_description_words: usize,
    pub max_skills: usize,
    pub english_indicator_threshold: usize,
}

/// Retry/backoff configuration for transient fetch failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff_base_s: f64,
}

/// Adaptive controller configuration (§4.4)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub initial_concurrency: usize,
    pub min_concurrency: usize,
    pub max_concurrency: usize,
    pub initial_delay_s: f64,
    pub max_delay_s: f64,
    pub jitter_range_s: f64,
    pub breaker_rate_limit_threshold: usize,
    pub breaker_open_s: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let platform =
            std::env::var("JOBCRATE_PLATFORM").unwrap_or_else(|_| String::from("linkedin"));

        let input_role =
            std::env::var("JOBCRATE_INPUT_ROLE").unwrap_or_else(|_| String::from("Data Engineer"));

        let location = std::env::var("JOBCRATE_LOCATION").ok();

        let target_count = std::env::var("JOBCRATE_TARGET_COUNT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(100);

        let db_path = std::env::var("JOBCRATE_DB_PATH")
            .unwrap_or_else(|_| String::from("data/jobs.db"))
            .into();

        let skills_vocab_path = std::env::var("JOBCRATE_SKILLS_VOCAB_PATH")
            .unwrap_or_else(|_| String::from("data/skills.json"))
            .into();

        let roles_vocab_path = std::env::var("JOBCRATE_ROLES_VOCAB_PATH")
            .unwrap_or_else(|_| String::from("data/roles.json"))
            .into();

        let headless = std::env::var("JOBCRATE_HEADLESS")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(true);

        let nav_timeout_s = std::env::var("JOBCRATE_NAV_TIMEOUT_S")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let user_agent = std::env::var("JOBCRATE_USER_AGENT")
            .unwrap_or_else(|_| format!("jobcrate/{}", env!("CARGO_PKG_VERSION")));

        let min_description_chars = std::env::var("JOBCRATE_MIN_DESCRIPTION_CHARS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(100);

        let min_description_words = std::env::var("JOBCRATE_MIN_DESCRIPTION_WORDS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(10);

        let max_skills = std::env::var("JOBCRATE_MAX_SKILLS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(80);

        let english_indicator_threshold = std::env::var("JOBCRATE_ENGLISH_INDICATOR_THRESHOLD")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(3);

        let max_retries = std::env::var("JOBCRATE_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let backoff_base_s = std::env::var("JOBCRATE_BACKOFF_BASE_S")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(2.0);

        let initial_concurrency = std::env::var("JOBCRATE_INITIAL_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(8);

        let min_concurrency = std::env::var("JOBCRATE_MIN_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(2);

        let max_concurrency = std::env::var("JOBCRATE_MAX_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(10);

        let initial_delay_s = std::env::var("JOBCRATE_INITIAL_DELAY_S")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(2.5);

        let max_delay_s = std::env::var("JOBCRATE_MAX_DELAY_S")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(8.0);

        let jitter_range_s = std::env::var("JOBCRATE_JITTER_RANGE_S")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(1.0);

        let breaker_rate_limit_threshold = std::env::var("JOBCRATE_BREAKER_RATE_LIMIT_THRESHOLD")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(3);

        let breaker_open_s = std::env::var("JOBCRATE_BREAKER_OPEN_S")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        Ok(Self {
            pipeline: PipelineConfig {
                platform,
                input_role,
                location,
                target_count,
                db_path,
                skills_vocab_path,
                roles_vocab_path,
            },
            browser: BrowserConfig {
                headless,
                nav_timeout_s,
                user_agent,
            },
            validation: ValidationConfig {
                min_description_chars,
                min_description_words,
                max_skills,
                english_indicator_threshold,
            },
            retry: RetryConfig {
                max_retries,
                backoff_base_s,
            },
            controller: ControllerConfig {
                initial_concurrency,
                min_concurrency,
                max_concurrency,
                initial_delay_s,
                max_delay_s,
                jitter_range_s,
                breaker_rate_limit_threshold,
                breaker_open_s,
            },
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from `path` if it exists, falling back to env-derived defaults with a warning
    /// if the path is simply absent; a present-but-malformed file is a fatal error (§7).
    pub fn load_with_fallback(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::from_file(p),
            Some(p) => {
                tracing::warn!(path = %p.display(), "config file not found, falling back to environment");
                Self::from_env()
            }
            None => Self::from_env(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.platform().is_none() {
            anyhow::bail!("unknown platform: {}", self.pipeline.platform);
        }

        if !(1..=10_000).contains(&self.pipeline.target_count) {
            anyhow::bail!("target_count must be in [1, 10000]");
        }

        if self.controller.min_concurrency == 0
            || self.controller.min_concurrency > self.controller.max_concurrency
        {
            anyhow::bail!("controller concurrency bounds are invalid");
        }

        if !(self.controller.min_concurrency..=self.controller.max_concurrency)
            .contains(&self.controller.initial_concurrency)
        {
            anyhow::bail!("initial_concurrency must fall within [min_concurrency, max_concurrency]");
        }

        if self.controller.initial_delay_s <= 0.0 || self.controller.max_delay_s <= 0.0 {
            anyhow::bail!("controller delay bounds must be positive");
        }

        if self.validation.min_description_chars == 0 || self.validation.min_description_words == 0 {
            anyhow::bail!("validation thresholds must be greater than 0");
        }

        if self.retry.max_retries == 0 {
            anyhow::bail!("max_retries must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig {
                platform: String::from("linkedin"),
                input_role: String::from("Data Engineer"),
                location: None,
                target_count: 100,
                db_path: PathBuf::from("data/jobs.db"),
                skills_vocab_path: PathBuf::from("data/skills.json"),
                roles_vocab_path: PathBuf::from("data/roles.json"),
            },
            browser: BrowserConfig {
                headless: true,
                nav_timeout_s: 30,
                user_agent: format!("jobcrate/{}", env!("CARGO_PKG_VERSION")),
            },
            validation: ValidationConfig {
                min_description_chars: 100,
                min_description_words: 10,
                max_skills: 80,
                english_indicator_threshold: 3,
            },
            retry: RetryConfig {
                max_retries: 3,
                backoff_base_s: 2.0,
            },
            controller: ControllerConfig {
                initial_concurrency: 8,
                min_concurrency: 2,
                max_concurrency: 10,
                initial_delay_s: 2.5,
                max_delay_s: 8.0,
                jitter_range_s: 1.0,
                breaker_rate_limit_threshold: 3,
                breaker_open_s: 60,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_target_count_fails_validation() {
        let mut config = Config::default();
        config.pipeline.target_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_platform_fails_validation() {
        let mut config = Config::default();
        config.pipeline.platform = "indeed".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_concurrency_bounds_fail_validation() {
        let mut config = Config::default();
        config.controller.min_concurrency = 10;
        config.controller.max_concurrency = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn nav_timeout_conversion() {
        let config = Config::default();
        assert_eq!(config.browser.nav_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn missing_config_path_falls_back_to_env_default() {
        let config = Config::load_with_fallback(Some(Path::new("/nonexistent/path.toml"))).unwrap();
        assert_eq!(config.pipeline.target_count, 100);
    }
}
