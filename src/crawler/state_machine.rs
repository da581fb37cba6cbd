//! Per-fetch page-lifecycle classification (§4.3)
//!
//! `classify_navigation` turns one completed (or failed) navigation into a
//! [`NavigationClass`]. Expired is always checked before content is handed to
//! the validator, so dead listings never waste a validation/extraction pass.

use std::sync::OnceLock;

use regex::Regex;

use crate::crawler::url::JobUrlExtractor;
use crate::models::Platform;

/// Closure phrases that indicate a listing has expired, checked against raw
/// page text (case-insensitive).
const CLOSURE_PHRASES: &[&str] = &[
    "no longer available",
    "job posting has expired",
    "this job is closed",
    "page not found",
    "404",
    "expired",
    "unavailable",
    "removed",
    "this job posting no longer exists",
];

/// Query-param/fragment markers that authoritatively indicate expiration
const EXPIRATION_URL_MARKERS: &[&str] = &["expired", "removed", "unavailable", "closed"];

/// Phrases indicating an authentication wall rather than real content
const LOGIN_WALL_PHRASES: &[&str] = &[
    "sign in to continue",
    "join now to see",
    "please log in",
    "log in to view this job",
];

const LOGIN_WALL_URL_MARKERS: &[&str] = &["/login", "/authwall", "/uas/login", "/signin"];

/// Content-based rate-limit fallback phrases, consulted only when no HTTP
/// status is available from the browser runtime (§9).
const RATE_LIMIT_PHRASES: &[&str] = &["too many requests", "rate limit exceeded", "try again later"];

fn generic_site_title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(linkedin|naukri(\.com)?)\s*[-|]?\s*$|^(sign up|log in)").unwrap()
    })
}

/// Outcome of navigating to one detail-page URL, before Gate-1 validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationClass {
    /// Content is present; hand off to the validator/extractor to decide
    /// between `Success` and `NonEnglish`.
    ContentReady { title: String, description: String },
    Expired,
    LoginWall,
    /// Layout drift, missing selectors without an expiration/login signal
    TransientError,
    /// An explicit 429 (or, failing that, a content-based rate-limit phrase)
    RateLimited,
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    needles.iter().any(|n| lower.contains(n))
}

fn url_has_expiration_marker(url: &str) -> bool {
    let lower = url.to_lowercase();
    EXPIRATION_URL_MARKERS
        .iter()
        .any(|marker| lower.contains(&format!("{marker}=")) || lower.ends_with(&format!("#{marker}")))
}

fn url_is_login_endpoint(url: &str) -> bool {
    let lower = url.to_lowercase();
    LOGIN_WALL_URL_MARKERS.iter().any(|m| lower.contains(m))
}

/// Classify a completed navigation. `status`, when the browser runtime can
/// surface one, takes priority for rate-limit detection (§4.3, §9).
#[allow(clippy::too_many_arguments)]
pub fn classify_navigation(
    platform: Platform,
    status: Option<u16>,
    final_url: &str,
    title: Option<&str>,
    description: Option<&str>,
    page_text: &str,
) -> NavigationClass {
    if status == Some(429) {
        return NavigationClass::RateLimited;
    }

    if url_has_expiration_marker(final_url) || contains_any(page_text, CLOSURE_PHRASES) {
        return NavigationClass::Expired;
    }

    if url_is_login_endpoint(final_url) || contains_any(page_text, LOGIN_WALL_PHRASES) {
        return NavigationClass::LoginWall;
    }

    let extractor = JobUrlExtractor::new();
    let url_still_detail_path = extractor.extract_job_id(platform, final_url).is_ok();
    if !url_still_detail_path {
        return NavigationClass::Expired;
    }

    if status.is_none() && contains_any(page_text, RATE_LIMIT_PHRASES) {
        return NavigationClass::RateLimited;
    }

    match (title, description) {
        (_, Some(desc)) if !desc.trim().is_empty() => NavigationClass::ContentReady {
            title: title.unwrap_or_default().to_string(),
            description: desc.to_string(),
        },
        (Some(t), _) if generic_site_title_re().is_match(t) => NavigationClass::Expired,
        _ => NavigationClass::TransientError,
    }
}
