//! Gate-1 validator (§4.7)
//!
//! Ordered checks; the first failure classifies the record and short-circuits
//! the rest. The validator never mutates its input — cleanup (HTML unescape,
//! whitespace collapse, skill dedup) happens in the orchestrator beforehand.

use std::sync::OnceLock;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use regex::Regex;

use crate::config::ValidationConfig;
use crate::error::ValidationError;
use crate::models::Platform;

/// Indicator vocabulary for the English-language heuristic (§4.7 item 5).
/// Common, high-frequency job-posting words; distinct count ≥ threshold wins.
const ENGLISH_INDICATORS: &[&str] = &[
    "the", "and", "with", "experience", "team", "work", "job", "role", "skills",
    "required", "responsibilities", "you", "our", "we", "will", "years", "ability",
    "knowledge", "strong", "candidate", "working", "environment", "opportunity",
    "company", "position",
];

const PLACEHOLDER_PHRASES: &[&str] = &[
    "tbd",
    "to be determined",
    "coming soon",
    "lorem ipsum",
    "placeholder",
];

fn job_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap())
}

fn placeholder_title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)test\s+(company|job|posting)").unwrap())
}

fn dashes_or_dots_only_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\.\-]+$").unwrap())
}

fn relative_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(\d+)\s*(minute|hour|day|week|month|year)s?\s*ago\s*$").unwrap()
    })
}

/// Everything the validator needs to judge one candidate detail record
pub struct ValidationInput<'a> {
    pub job_id: &'a str,
    pub platform: Platform,
    pub url: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub posted_date: Option<DateTime<Utc>>,
    pub skills: &'a [String],
}

pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Run all ordered checks, returning the first failure.
    pub fn validate(&self, input: &ValidationInput<'_>, now: DateTime<Utc>) -> Result<(), ValidationError> {
        self.check_job_id(input.job_id)?;
        self.check_url(input.platform, input.url)?;
        self.check_description_shape(input.description)?;
        self.check_placeholder(input.title, input.description)?;
        self.check_english(input.description)?;
        self.check_posted_date(input.posted_date, now)?;
        self.check_skills(input.skills)?;
        Ok(())
    }

    fn check_job_id(&self, job_id: &str) -> Result<(), ValidationError> {
        if job_id.len() < 5 || !job_id_re().is_match(job_id) {
            return Err(ValidationError::InvalidJobId);
        }
        Ok(())
    }

    fn check_url(&self, platform: Platform, url: &str) -> Result<(), ValidationError> {
        let parsed = url::Url::parse(url).map_err(|_| ValidationError::InvalidUrl)?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ValidationError::InvalidUrl);
        }
        let host = parsed.host_str().ok_or(ValidationError::InvalidUrl)?;
        let expected = platform.expected_domain();
        if host != expected && !host.ends_with(&format!(".{expected}")) {
            return Err(ValidationError::InvalidUrl);
        }
        Ok(())
    }

    fn check_description_shape(&self, description: &str) -> Result<(), ValidationError> {
        if description.len() < self.config.min_description_chars {
            return Err(ValidationError::DescriptionTooShort);
        }

        let words: Vec<&str> = description.split_whitespace().collect();
        if words.len() < self.config.min_description_words {
            return Err(ValidationError::DescriptionTooFewWords);
        }

        let total_len: usize = words.iter().map(|w| w.len()).sum();
        let avg_len = total_len as f64 / words.len() as f64;
        if !(3.0..=20.0).contains(&avg_len) {
            return Err(ValidationError::AverageWordLengthOutOfRange);
        }

        Ok(())
    }

    fn check_placeholder(&self, title: &str, description: &str) -> Result<(), ValidationError> {
        let lower_desc = description.to_lowercase();
        let lower_title = title.to_lowercase();

        if PLACEHOLDER_PHRASES.iter().any(|p| lower_desc.contains(p) || lower_title.contains(p)) {
            return Err(ValidationError::PlaceholderDetected);
        }

        if placeholder_title_re().is_match(title) || placeholder_title_re().is_match(description) {
            return Err(ValidationError::PlaceholderDetected);
        }

        if description
            .lines()
            .any(|line| dashes_or_dots_only_re().is_match(line.trim()))
        {
            return Err(ValidationError::PlaceholderDetected);
        }

        Ok(())
    }

    fn check_english(&self, description: &str) -> Result<(), ValidationError> {
        let lower = description.to_lowercase();
        let distinct_hits = ENGLISH_INDICATORS
            .iter()
            .filter(|word| {
                let pattern = format!(r"\b{}\b", regex::escape(word));
                Regex::new(&pattern).map(|re| re.is_match(&lower)).unwrap_or(false)
            })
            .count();

        if distinct_hits < self.config.english_indicator_threshold {
            return Err(ValidationError::NonEnglish);
        }
        Ok(())
    }

    fn check_posted_date(&self, posted_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(posted) = posted_date {
            let five_years_ago = now - ChronoDuration::days(5 * 365);
            if posted > now || posted < five_years_ago {
                return Err(ValidationError::InvalidPostedDate);
            }
        }
        Ok(())
    }

    fn check_skills(&self, skills: &[String]) -> Result<(), ValidationError> {
        if skills.iter().any(|s| s.trim().len() < 2) {
            return Err(ValidationError::InvalidSkills);
        }
        if skills.len() > self.config.max_skills {
            return Err(ValidationError::InvalidSkills);
        }
        Ok(())
    }
}

/// Parse a relative-date string (`"3 days ago"`) into an absolute timestamp,
/// sanity-checking the unit count before conversion (§4.7 item 6):
/// minutes ≤ 1440, days ≤ 365, years ≤ 5 (weeks/months/hours are bounded
/// proportionally against the same ceilings).
pub fn parse_relative_posted_date(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let caps = relative_date_re().captures(raw)?;
    let amount: i64 = caps[1].parse().ok()?;
    let unit = caps[2].to_lowercase();

    let duration = match unit.as_str() {
        "minute" if amount <= 1440 => ChronoDuration::minutes(amount),
        "hour" if amount <= 24 * 365 => ChronoDuration::hours(amount),
        "day" if amount <= 365 => ChronoDuration::days(amount),
        "week" if amount <= 260 => ChronoDuration::weeks(amount),
        "month" if amount <= 60 => ChronoDuration::days(amount * 30),
        "year" if amount <= 5 => ChronoDuration::days(amount * 365),
        _ => return None,
    };

    Some(now - duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ValidationConfig {
        ValidationConfig {
            min_description_chars: 20,
            min_description_words: 5,
            max_skills: 10,
            english_indicator_threshold: 2,
        }
    }

    fn good_description() -> &'static str {
        "We are looking for an experienced candidate with strong skills and the ability to work with our team on a great opportunity role."
    }

    #[test]
    fn accepts_a_well_formed_candidate() {
        let validator = Validator::new(config());
        let input = ValidationInput {
            job_id: "abc12345",
            platform: Platform::LinkedIn,
            url: "https://www.linkedin.com/jobs/view/abc12345",
            title: "Data Engineer",
            description: good_description(),
            posted_date: None,
            skills: &["Python".to_string(), "SQL".to_string()],
        };
        assert!(validator.validate(&input, Utc::now()).is_ok());
    }

    #[test]
    fn rejects_short_job_id() {
        let validator = Validator::new(config());
        let input = ValidationInput {
            job_id: "ab",
            platform: Platform::LinkedIn,
            url: "https://www.linkedin.com/jobs/view/ab",
            title: "Data Engineer",
            description: good_description(),
            posted_date: None,
            skills: &[],
        };
        assert_eq!(validator.validate(&input, Utc::now()), Err(ValidationError::InvalidJobId));
    }

    #[test]
    fn rejects_wrong_domain() {
        let validator = Validator::new(config());
        let input = ValidationInput {
            job_id: "abc12345",
            platform: Platform::LinkedIn,
            url: "https://www.naukri.com/job-listings/abc12345",
            title: "Data Engineer",
            description: good_description(),
            posted_date: None,
            skills: &[],
        };
        assert_eq!(validator.validate(&input, Utc::now()), Err(ValidationError::InvalidUrl));
    }

    #[test]
    fn rejects_too_short_description() {
        let validator = Validator::new(config());
        let input = ValidationInput {
            job_id: "abc12345",
            platform: Platform::LinkedIn,
            url: "https://www.linkedin.com/jobs/view/abc12345",
            title: "Data Engineer",
            description: "Too short.",
            posted_date: None,
            skills: &[],
        };
        assert_eq!(
            validator.validate(&input, Utc::now()),
            Err(ValidationError::DescriptionTooShort)
        );
    }

    #[test]
    fn rejects_placeholder_content() {
        let validator = Validator::new(config());
        let input = ValidationInput {
            job_id: "abc12345",
            platform: Platform::LinkedIn,
            url: "https://www.linkedin.com/jobs/view/abc12345",
            title: "Data Engineer",
            description: "This description is TBD and content is coming soon for everyone here today.",
            posted_date: None,
            skills: &[],
        };
        assert_eq!(
            validator.validate(&input, Utc::now()),
            Err(ValidationError::PlaceholderDetected)
        );
    }

    #[test]
    fn rejects_non_english_content() {
        let validator = Validator::new(config());
        let input = ValidationInput {
            job_id: "abc12345",
            platform: Platform::LinkedIn,
            url: "https://www.linkedin.com/jobs/view/abc12345",
            title: "Ingenieur",
            description: "Nous recherchons un developpeur experimente pour notre equipe dynamique aujourd'hui",
            posted_date: None,
            skills: &[],
        };
        assert_eq!(validator.validate(&input, Utc::now()), Err(ValidationError::NonEnglish));
    }

    #[test]
    fn rejects_future_posted_date() {
        let validator = Validator::new(config());
        let now = Utc::now();
        let input = ValidationInput {
            job_id: "abc12345",
            platform: Platform::LinkedIn,
            url: "https://www.linkedin.com/jobs/view/abc12345",
            title: "Data Engineer",
            description: good_description(),
            posted_date: Some(now + ChronoDuration::days(1)),
            skills: &[],
        };
        assert_eq!(
            validator.validate(&input, now),
            Err(ValidationError::InvalidPostedDate)
        );
    }

    #[test]
    fn rejects_too_many_skills() {
        let validator = Validator::new(config());
        let skills: Vec<String> = (0..11).map(|i| format!("Skill{i}")).collect();
        let input = ValidationInput {
            job_id: "abc12345",
            platform: Platform::LinkedIn,
            url: "https://www.linkedin.com/jobs/view/abc12345",
            title: "Data Engineer",
            description: good_description(),
            posted_date: None,
            skills: &skills,
        };
        assert_eq!(validator.validate(&input, Utc::now()), Err(ValidationError::InvalidSkills));
    }

    #[test]
    fn parses_relative_dates_within_sane_bounds() {
        let now = Utc::now();
        assert!(parse_relative_posted_date("3 days ago", now).is_some());
        assert!(parse_relative_posted_date("2 years ago", now).is_some());
        assert!(parse_relative_posted_date("10 years ago", now).is_none());
        assert!(parse_relative_posted_date("9999 minutes ago", now).is_none());
    }
}
