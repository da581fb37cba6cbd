//! Job-listing URL extraction and normalization
//!
//! Provides per-platform extraction of stable job identifiers from listing
//! page HTML, URL canonicalisation, and SSRF-safety validation before any
//! page is ever navigated to.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

use crate::error::ParseError;
use crate::models::Platform;

/// A single `(job_id, url)` pair harvested from a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedListing {
    pub job_id: String,
    pub url: String,
}

/// Extracts job identifiers and canonical URLs from listing-page HTML
pub struct JobUrlExtractor {
    href_pattern: Regex,
    linkedin_view_pattern: Regex,
    naukri_job_id_pattern: Regex,
}

impl JobUrlExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            href_pattern: Regex::new(r#"href=["']([^"']+)["']"#).unwrap(),
            linkedin_view_pattern: Regex::new(r"/jobs/view/([A-Za-z0-9_-]+)").unwrap(),
            naukri_job_id_pattern: Regex::new(r#"data-job-id=["']([A-Za-z0-9_-]+)["']"#).unwrap(),
        }
    }

    /// Extract all listings present in a rendered listing-page HTML snapshot,
    /// deduplicated by URL. Deterministic order (sorted) for reproducible tests.
    pub fn extract_listings(&self, platform: Platform, html: &str) -> Vec<ExtractedListing> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        match platform {
            Platform::LinkedIn => {
                for cap in self.href_pattern.captures_iter(html) {
                    let href = &cap[1];
                    if let Some(job_id) = self.linkedin_job_id(href) {
                        let canonical = self.canonicalize(platform, &job_id);
                        if seen.insert(canonical.clone()) {
                            out.push(ExtractedListing { job_id, url: canonical });
                        }
                    }
                }
            }
            Platform::Naukri => {
                for cap in self.naukri_job_id_pattern.captures_iter(html) {
                    let job_id = cap[1].to_string();
                    let canonical = self.canonicalize(platform, &job_id);
                    if seen.insert(canonical.clone()) {
                        out.push(ExtractedListing { job_id, url: canonical });
                    }
                }
            }
        }

        out.sort_by(|a, b| a.url.cmp(&b.url));
        out
    }

    fn linkedin_job_id(&self, href: &str) -> Option<String> {
        self.linkedin_view_pattern
            .captures(href)
            .map(|c| c[1].to_string())
    }

    /// Platform-specific stable slug extraction from a single detail-page URL
    /// (last path segment for LinkedIn, `data-job-id` is page-side only for
    /// Naukri so its detail URLs carry the id as the final segment too).
    pub fn extract_job_id(&self, platform: Platform, url: &str) -> Result<String, ParseError> {
        match platform {
            Platform::LinkedIn => self
                .linkedin_job_id(url)
                .ok_or_else(|| ParseError::IdExtractionFailed(url.to_string())),
            Platform::Naukri => {
                let parsed = Url::parse(url).map_err(|_| ParseError::InvalidUrl(url.to_string()))?;
                parsed
                    .path_segments()
                    .and_then(|mut segs| segs.next_back())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .ok_or_else(|| ParseError::IdExtractionFailed(url.to_string()))
            }
        }
    }

    /// Canonical detail-page URL for a given platform and stable slug
    pub fn canonicalize(&self, platform: Platform, job_id: &str) -> String {
        match platform {
            Platform::LinkedIn => format!("https://www.linkedin.com/jobs/view/{job_id}"),
            Platform::Naukri => format!("https://www.naukri.com/job-listings/{job_id}"),
        }
    }

    /// Resolve a possibly-relative URL against a base
    pub fn to_absolute(&self, url: &str, base: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }

        let base_url = match Url::parse(base) {
            Ok(u) => u,
            Err(_) => return url.to_string(),
        };

        match base_url.join(url) {
            Ok(absolute) => absolute.to_string(),
            Err(_) => url.to_string(),
        }
    }

    /// Full validity check: parseable, safe (no SSRF), and on the expected
    /// platform domain.
    pub fn is_valid_detail_url(&self, platform: Platform, url: &str) -> bool {
        validators::is_safe_url(url) && validators::is_allowed_domain(platform, url)
    }
}

impl Default for JobUrlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn private_ip_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$").unwrap())
}

/// URL validation and security functions, independent of platform
pub mod validators {
    use super::private_ip_regex;
    use crate::models::Platform;
    use url::Url;

    /// Check if URL's host matches the platform's expected domain (allows subdomains)
    pub fn is_allowed_domain(platform: Platform, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(_) => return false,
        };

        let host = match parsed.host_str() {
            Some(h) => h,
            None => return false,
        };

        let expected = platform.expected_domain();
        host == expected || host.ends_with(&format!(".{expected}"))
    }

    /// SSRF prevention: block internal/private IPs, non-http(s) schemes
    pub fn is_safe_url(url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(_) => return false,
        };

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return false;
        }

        let host = match parsed.host_str() {
            Some(h) => h,
            None => return false,
        };

        if host == "localhost" || host == "127.0.0.1" || host == "::1" {
            return false;
        }

        if is_private_ip(host) {
            return false;
        }

        true
    }

    fn is_private_ip(host: &str) -> bool {
        if !private_ip_regex().is_match(host) {
            return false;
        }

        let octets: Vec<u8> = host.split('.').filter_map(|s| s.parse::<u8>().ok()).collect();
        if octets.len() != 4 {
            return false;
        }

        if octets[0] == 10 {
            return true;
        }
        if octets[0] == 172 && (16..=31).contains(&octets[1]) {
            return true;
        }
        if octets[0] == 192 && octets[1] == 168 {
            return true;
        }
        if octets[0] == 169 && octets[1] == 254 {
            return true;
        }

        false
    }

    /// Validate URL format and safety, returning a descriptive error
    pub fn validate_url(platform: Platform, url: &str) -> Result<(), String> {
        if Url::parse(url).is_err() {
            return Err(format!("invalid url format: {url}"));
        }
        if !is_safe_url(url) {
            return Err(format!("unsafe url (SSRF risk): {url}"));
        }
        if !is_allowed_domain(platform, url) {
            return Err(format!("domain not allowed for {platform}: {url}"));
        }
        Ok(())
    }
}
