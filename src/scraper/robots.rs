//! Robots policy for polite scraping.
//!
//! Supports `User-agent: *` with `Disallow: /path` rules plus the
//! `Crawl-delay` directive. The policy is fetched and parsed exactly once at
//! process start and injected into the client; it is never mutated afterwards.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

/// Errors from fetching the robots policy.
#[derive(Debug, Error)]
pub enum RobotsError {
    /// The upstream base URL could not be joined with `robots.txt`.
    #[error("invalid robots URL for base {0}")]
    InvalidUrl(String),
    /// Fetch failed at the transport level.
    #[error("failed to fetch robots.txt: {0}")]
    Fetch(#[source] reqwest::Error),
    /// Upstream answered with a non-success status other than 404.
    #[error("robots.txt returned status {1} for {0}")]
    Status(String, u16),
    /// Body could not be read.
    #[error("failed to read robots.txt body: {0}")]
    Body(#[source] reqwest::Error),
}

/// Immutable crawl policy: disallowed path prefixes and the crawl delay.
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    disallowed_prefixes: Vec<String>,
    crawl_delay: Option<Duration>,
}

impl RobotsPolicy {
    /// Parses a robots.txt body for `User-agent: *` rules.
    ///
    /// Rules for named agents are ignored. Disallow prefixes are
    /// deduplicated and sorted longest-first so most-specific rules win
    /// during matching.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        let mut in_star = false;
        let mut disallowed: Vec<String> = Vec::new();
        let mut crawl_delay = None;

        for line in body.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(rest) = line.strip_prefix("User-agent:") {
                let rest = rest.trim();
                in_star = rest == "*" || rest.is_empty();
                continue;
            }
            if !in_star {
                continue;
            }
            if let Some(suffix) = line.strip_prefix("Disallow:") {
                let prefix = normalize_disallow_path(suffix);
                if !prefix.is_empty() && !disallowed.contains(&prefix) {
                    disallowed.push(prefix);
                }
            } else if let Some(suffix) = line.strip_prefix("Crawl-delay:") {
                if let Ok(secs) = suffix.trim().parse::<f64>() {
                    if secs > 0.0 {
                        crawl_delay = Some(Duration::from_secs_f64(secs));
                    }
                }
            }
        }

        disallowed.sort_by_key(|p| std::cmp::Reverse(p.len()));
        Self {
            disallowed_prefixes: disallowed,
            crawl_delay,
        }
    }

    /// Fetches and parses the upstream's robots.txt once.
    ///
    /// A 404 means "no policy" and yields an empty (allow-everything)
    /// policy, matching crawler convention.
    ///
    /// # Errors
    ///
    /// Returns [`RobotsError`] when the URL is invalid, the fetch fails, or
    /// the upstream answers with an unexpected status.
    #[instrument(skip(http))]
    pub async fn fetch(http: &reqwest::Client, base: &Url) -> Result<Self, RobotsError> {
        let robots_url = base
            .join("/robots.txt")
            .map_err(|_| RobotsError::InvalidUrl(base.to_string()))?;

        let response = http
            .get(robots_url.clone())
            .send()
            .await
            .map_err(RobotsError::Fetch)?;
        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 404 {
                debug!(%robots_url, "no robots.txt upstream, allowing all paths");
                return Ok(Self::default());
            }
            return Err(RobotsError::Status(robots_url.to_string(), status.as_u16()));
        }

        let body = response.text().await.map_err(RobotsError::Body)?;
        let policy = Self::parse(&body);
        debug!(
            rules = policy.disallowed_prefixes.len(),
            crawl_delay = ?policy.crawl_delay,
            "parsed robots policy"
        );
        Ok(policy)
    }

    /// Returns whether the path is allowed by the policy.
    #[must_use]
    pub fn allows(&self, path: &str) -> bool {
        !self
            .disallowed_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// The `Crawl-delay` the upstream asked for, if any.
    #[must_use]
    pub fn crawl_delay(&self) -> Option<Duration> {
        self.crawl_delay
    }
}

fn normalize_disallow_path(path: &str) -> String {
    let s = path.trim();
    if s.is_empty() {
        return String::new();
    }
    let mut s = s.to_string();
    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_body_allows_everything() {
        let policy = RobotsPolicy::parse("");
        assert!(policy.allows("/view/1/"));
        assert_eq!(policy.crawl_delay(), None);
    }

    #[test]
    fn test_parse_star_disallow_rules() {
        let policy = RobotsPolicy::parse("User-agent: *\nDisallow: /msg/\nDisallow: /search/\n");
        assert!(!policy.allows("/msg/chat/"));
        assert!(!policy.allows("/search/"));
        assert!(policy.allows("/view/1/"));
    }

    #[test]
    fn test_parse_named_agent_rules_ignored() {
        let policy = RobotsPolicy::parse("User-agent: Googlebot\nDisallow: /nobot/\n");
        assert!(policy.allows("/nobot/"));
    }

    #[test]
    fn test_parse_crawl_delay() {
        let policy = RobotsPolicy::parse("User-agent: *\nCrawl-delay: 1\n");
        assert_eq!(policy.crawl_delay(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_parse_fractional_crawl_delay() {
        let policy = RobotsPolicy::parse("User-agent: *\nCrawl-delay: 0.5\n");
        assert_eq!(policy.crawl_delay(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_parse_empty_disallow_line_skipped() {
        // Empty Disallow: means "allow all" and must not add a rule
        let policy = RobotsPolicy::parse("User-agent: *\nDisallow: \n");
        assert!(policy.allows("/anything/"));
    }

    #[test]
    fn test_parse_comments_ignored() {
        let policy = RobotsPolicy::parse("# policy\nUser-agent: *\nDisallow: /secret/\n");
        assert!(!policy.allows("/secret/page"));
    }

    #[test]
    fn test_parse_adds_leading_slash() {
        let policy = RobotsPolicy::parse("User-agent: *\nDisallow: msg/\n");
        assert!(!policy.allows("/msg/"));
    }
}
