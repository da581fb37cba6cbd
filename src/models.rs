//! Core data structures for the job ingestion pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source platform a job listing was harvested from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    LinkedIn,
    Naukri,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinkedIn => "linkedin",
            Self::Naukri => "naukri",
        }
    }

    /// Domain expected to appear in a detail-page URL for this platform
    pub fn expected_domain(&self) -> &'static str {
        match self {
            Self::LinkedIn => "linkedin.com",
            Self::Naukri => "naukri.com",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linkedin" => Some(Self::LinkedIn),
            "naukri" => Some(Self::Naukri),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown platform: {s}"))
    }
}

/// A harvested listing URL, awaiting (or having completed) detail extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobUrl {
    pub job_id: String,
    pub platform: Platform,
    pub input_role: String,
    pub actual_role: String,
    pub url: String,
    pub scraped: bool,
}

impl JobUrl {
    pub fn new(
        job_id: impl Into<String>,
        platform: Platform,
        input_role: impl Into<String>,
        actual_role: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            platform,
            input_role: input_role.into(),
            actual_role: actual_role.into(),
            url: url.into(),
            scraped: false,
        }
    }
}

/// A fully extracted job detail record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetail {
    pub job_id: String,
    pub platform: Platform,
    pub actual_role: String,
    pub url: String,
    pub job_description: String,
    /// Canonical, deduplicated, comma-joined skill names (I4)
    pub skills: String,
    pub company_name: Option<String>,
    pub posted_date: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
}

impl JobDetail {
    /// Skill names as a deduplicated, ordered list
    pub fn skill_list(&self) -> Vec<&str> {
        if self.skills.trim().is_empty() {
            Vec::new()
        } else {
            self.skills.split(',').map(str::trim).collect()
        }
    }

    /// I5: posted_date, when present, must fall within [scraped_at - 5y, scraped_at]
    pub fn posted_date_is_sane(&self) -> bool {
        match self.posted_date {
            None => true,
            Some(posted) => {
                let five_years_ago = self.scraped_at - chrono::Duration::days(5 * 365);
                posted >= five_years_ago && posted <= self.scraped_at
            }
        }
    }
}

/// Terminal outcome of a pipeline coordinator run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineOutcome {
    Completed,
    CompletedPartial,
    AbortedLoginWall,
}

impl std::fmt::Display for PipelineOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Completed => "completed",
            Self::CompletedPartial => "completed_partial",
            Self::AbortedLoginWall => "aborted_login_wall",
        };
        write!(f, "{s}")
    }
}

/// Summary emitted at the end of a coordinator run (§4.6)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_processed: u32,
    pub scraped_ok: u32,
    pub expired_deleted: u32,
    pub non_english_deleted: u32,
    pub failed: u32,
}

impl SessionSummary {
    pub fn success_rate(&self) -> f64 {
        if self.total_processed == 0 {
            0.0
        } else {
            (self.scraped_ok as f64 / self.total_processed as f64) * 100.0
        }
    }

    pub fn record(&mut self, outcome: &TaskOutcomeKind) {
        self.total_processed += 1;
        match outcome {
            TaskOutcomeKind::Success => self.scraped_ok += 1,
            TaskOutcomeKind::Expired => self.expired_deleted += 1,
            TaskOutcomeKind::NonEnglish => self.non_english_deleted += 1,
            TaskOutcomeKind::TransientFail | TaskOutcomeKind::RateLimited => self.failed += 1,
        }
    }
}

/// The throughput-relevant outcome of a single detail-fetch task, as reported to the
/// adaptive controller. `LoginWall` is not a throughput signal; it is handled as a
/// batch-abort before it ever reaches the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcomeKind {
    Success,
    Expired,
    NonEnglish,
    TransientFail,
    RateLimited,
}
