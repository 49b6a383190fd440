use crate::crawler::TraversalOrder;
use serde::Deserialize;
use std::time::Duration;

/// Longest accepted politeness delay (seconds)
pub const MAX_CRAWL_DELAY_SECS: f64 = 3600.0;

/// Longest accepted cache lifetime: ten years (seconds)
pub const MAX_CACHE_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Main configuration structure for Ripple-Search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// URLs the traversal starts from (depth 0)
    pub seed_urls: Vec<String>,

    /// Maximum number of pages fetched successfully per crawl
    pub max_pages: usize,

    /// Maximum depth to crawl from seed URLs
    pub max_depth: u32,

    /// Politeness delay after each successful fetch (seconds)
    pub crawl_delay: f64,

    /// Traversal order over the discovered link graph
    pub algorithm: TraversalOrder,

    /// Upper bound on idle pooled connections per host
    pub max_concurrent_requests: u32,

    /// Total per-request timeout (seconds)
    pub request_timeout: u64,

    /// Domains (and their subdomains) the crawl may visit
    pub allowed_domains: Vec<String>,

    /// Accepted response Content-Type prefixes
    pub content_types: Vec<String>,

    /// URL path patterns that are never fetched
    pub exclude_patterns: Vec<String>,
}

impl CrawlerConfig {
    /// Returns the politeness delay as a Duration
    ///
    /// Out-of-range values are clamped; NaN yields no delay.
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.crawl_delay.clamp(0.0, MAX_CRAWL_DELAY_SECS))
            .unwrap_or(Duration::ZERO)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed_urls: Vec::new(),
            max_pages: 100,
            max_depth: 3,
            crawl_delay: 1.0,
            algorithm: TraversalOrder::BreadthFirst,
            max_concurrent_requests: 10,
            request_timeout: 30,
            allowed_domains: Vec::new(),
            content_types: vec!["text/html".to_string(), "text/plain".to_string()],
            exclude_patterns: [
                "*.pdf", "*.doc*", "*.ppt*", "*.xls*", "/admin/", "/login/", "/logout/",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "InternalSearchBot".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: None,
        }
    }
}

/// Search, cache and index configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SearchConfig {
    /// Whether search responses are memoized
    pub cache_enabled: bool,

    /// Lifetime of a cached response (seconds)
    pub cache_ttl: u64,

    /// Vocabulary cap for the term-weight index
    pub max_features: usize,

    /// Number of content characters shown per result
    pub snippet_length: usize,

    /// Default number of history rows returned
    pub history_limit: usize,
}

impl SearchConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl.min(MAX_CACHE_TTL_SECS))
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl: 3600,
            max_features: 10_000,
            snippet_length: 200,
            history_limit: 50,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "database/search_index.db".to_string(),
        }
    }
}
