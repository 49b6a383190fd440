//! URL policy for Ripple-Search
//!
//! This module provides URL normalization, domain extraction, allow-list
//! checks and the exclude-pattern pre-filter. Everything here is pure and
//! total: invalid input yields a rejection, never a panic.

mod domain;
mod matcher;
mod normalize;

use ::url::Url;

// Re-export main functions
pub use domain::{domain_of, extract_domain, strip_www};
pub use matcher::{matches_domain, matches_exclude_pattern, ExcludeSet};
pub use normalize::normalize_url;

/// Checks whether a URL's host is inside the allow-list
///
/// The host (lowercased, `www.` removed) must equal an allowed domain or be
/// a subdomain of one. An empty allow-list admits every host.
///
/// # Examples
///
/// ```
/// use ripple_search::url::is_allowed;
/// use url::Url;
///
/// let allowed = vec!["example.com".to_string()];
/// assert!(is_allowed(&Url::parse("https://www.example.com/").unwrap(), &allowed));
/// assert!(is_allowed(&Url::parse("https://sub.example.com/").unwrap(), &allowed));
/// assert!(!is_allowed(&Url::parse("https://other.com/").unwrap(), &allowed));
/// ```
pub fn is_allowed(url: &Url, allowed_domains: &[String]) -> bool {
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }

    let host = match extract_domain(url) {
        Some(host) if !host.is_empty() => host,
        _ => return false,
    };

    if allowed_domains.is_empty() {
        return true;
    }

    allowed_domains
        .iter()
        .map(|d| strip_www(d.trim()))
        .any(|allowed| matches_domain(&allowed, &host))
}

/// String form of [`is_allowed`]; unparseable input is rejected
pub fn is_allowed_str(url: &str, allowed_domains: &[String]) -> bool {
    normalize_url(url)
        .map(|u| is_allowed(&u, allowed_domains))
        .unwrap_or(false)
}

/// Combined admission policy applied to every seed and discovered link
#[derive(Debug, Clone, Default)]
pub struct UrlPolicy {
    allowed_domains: Vec<String>,
    excludes: ExcludeSet,
}

impl UrlPolicy {
    /// Builds the policy, compiling the exclude patterns once
    pub fn new(allowed_domains: Vec<String>, exclude_patterns: Vec<String>) -> Self {
        Self {
            allowed_domains,
            excludes: ExcludeSet::new(&exclude_patterns),
        }
    }

    /// Builds the policy from crawler configuration
    pub fn from_config(config: &crate::config::CrawlerConfig) -> Self {
        Self::new(
            config.allowed_domains.clone(),
            config.exclude_patterns.clone(),
        )
    }

    pub fn allowed_domains(&self) -> &[String] {
        &self.allowed_domains
    }

    /// Returns true if the URL path hits any exclude pattern
    pub fn is_excluded(&self, url: &Url) -> bool {
        self.excludes.is_match(url.path())
    }

    /// Normalizes a URL and admits it if it passes every check
    ///
    /// Returns `None` for malformed URLs, unsupported schemes, excluded
    /// paths and hosts outside the allow-list.
    pub fn admit(&self, url: &str) -> Option<Url> {
        let url = match normalize_url(url) {
            Ok(url) => url,
            Err(e) => {
                tracing::trace!("Rejected {}: {}", url, e);
                return None;
            }
        };

        if self.is_excluded(&url) {
            tracing::trace!("Excluded by pattern: {}", url);
            return None;
        }

        if !is_allowed(&url, &self.allowed_domains) {
            tracing::trace!("Outside allowed domains: {}", url);
            return None;
        }

        Some(url)
    }
}
